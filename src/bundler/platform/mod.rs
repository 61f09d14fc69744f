//! Platform-specific finalization stages.
//!
//! Exactly one of these runs per invocation, selected by the
//! [`PackagingTarget`](crate::bundler::PackagingTarget).

pub mod linux;
pub mod macos;
pub mod windows;

use std::fmt;

/// Kind of artifact a finalization run produces.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum PackageType {
    /// Compressed read-only macOS disk image (`.dmg`)
    Dmg,
    /// NSIS-compiled Windows installer (`_Setup.exe`)
    Nsis,
    /// Gzip-compressed tarball of the Linux tree (`.tar.gz`)
    Archive,
}

impl PackageType {
    /// Short identifier used in logs and CLI output.
    pub fn short_name(self) -> &'static str {
        match self {
            PackageType::Dmg => "dmg",
            PackageType::Nsis => "nsis",
            PackageType::Archive => "archive",
        }
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}
