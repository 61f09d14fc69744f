//! Windows finalization.

pub mod nsis;
