//! Packaging target selection.

use super::Arch;
use crate::bundler::platform::PackageType;
use std::fmt;

/// Host platform family a run finalizes for.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Mountable disk image containing a signed application bundle
    #[serde(alias = "macos", alias = "mac")]
    Darwin,
    /// Self-installing executable generated from an NSIS script
    #[serde(alias = "win")]
    Windows,
    /// Compressed archive of a permission-normalized tree
    #[serde(alias = "lnx")]
    Linux,
}

/// The {platform x architecture} pair selected once per run.
///
/// Every stage receives this value through [`Settings`](super::Settings)
/// instead of consulting mutable platform state.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum PackagingTarget {
    /// macOS disk image
    Darwin(Arch),
    /// Windows NSIS installer
    Windows(Arch),
    /// Linux tarball
    Linux(Arch),
}

impl PackagingTarget {
    /// Combines a platform and an architecture.
    pub fn new(platform: Platform, arch: Arch) -> Self {
        match platform {
            Platform::Darwin => PackagingTarget::Darwin(arch),
            Platform::Windows => PackagingTarget::Windows(arch),
            Platform::Linux => PackagingTarget::Linux(arch),
        }
    }

    /// Returns the platform family.
    pub fn platform(self) -> Platform {
        match self {
            PackagingTarget::Darwin(_) => Platform::Darwin,
            PackagingTarget::Windows(_) => Platform::Windows,
            PackagingTarget::Linux(_) => Platform::Linux,
        }
    }

    /// Returns the architecture.
    pub fn arch(self) -> Arch {
        match self {
            PackagingTarget::Darwin(arch)
            | PackagingTarget::Windows(arch)
            | PackagingTarget::Linux(arch) => arch,
        }
    }

    /// Address size in bits, used by installer registry views.
    pub fn address_size(self) -> u32 {
        self.arch().address_size()
    }

    /// The artifact kind this target produces.
    pub fn package_type(self) -> PackageType {
        match self {
            PackagingTarget::Darwin(_) => PackageType::Dmg,
            PackagingTarget::Windows(_) => PackageType::Nsis,
            PackagingTarget::Linux(_) => PackageType::Archive,
        }
    }
}

impl fmt::Display for PackagingTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let platform = match self.platform() {
            Platform::Darwin => "darwin",
            Platform::Windows => "windows",
            Platform::Linux => "linux",
        };
        write!(f, "{}-{}", platform, self.arch())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_carries_address_size_and_package_type() {
        let target = PackagingTarget::new(Platform::Windows, Arch::X86);
        assert_eq!(target.address_size(), 32);
        assert_eq!(target.package_type(), PackageType::Nsis);
        assert_eq!(target.to_string(), "windows-i686");

        let target = PackagingTarget::new(Platform::Darwin, Arch::AArch64);
        assert_eq!(target.address_size(), 64);
        assert_eq!(target.package_type(), PackageType::Dmg);
    }
}
