//! Configuration structures for finalization runs.
//!
//! [`Settings`] is built once from the packaging manifest and passed by
//! reference through every stage. Nothing in here is mutated after
//! [`SettingsBuilder::build`] returns.

#![allow(dead_code)] // Public API - Settings structs preserve all fields for external consumers

mod arch;
mod builder;
mod bundle;
mod core;
mod linux;
mod macos;
mod package;
mod target;
mod windows;

// Re-export all public types
pub use arch::Arch;
pub use builder::SettingsBuilder;
pub use bundle::BundleSettings;
pub use core::Settings;
pub use linux::{LinuxSettings, PermissionRemap};
pub use macos::{
    DmgSettings, LibrarySettings, MacOsSettings, NestedBundleSettings, RelinkSettings,
    RetrySettings, SharedResourceSettings,
};
pub use package::PackageSettings;
pub use target::{PackagingTarget, Platform};
pub use windows::{NSISInstallerMode, NsisCompression, NsisSettings, WindowsSettings};
