//! CPU architecture types and utilities.

use std::fmt;

/// CPU architecture of the staged binaries.
///
/// The architecture decides the address size used by installer scripts and
/// the suffix of the installer base name.
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_finalize::bundler::Arch;
///
/// let arch = Arch::X86_64;
/// assert_eq!(arch.address_size(), 64);
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    /// x86_64 / AMD64 (64-bit)
    #[serde(alias = "x64", alias = "amd64")]
    X86_64,
    /// x86 / i686 (32-bit)
    #[serde(alias = "i686", alias = "i386")]
    X86,
    /// AArch64 / ARM64 (64-bit)
    #[serde(alias = "arm64")]
    AArch64,
    /// macOS universal binary - Contains both x86_64 and AArch64
    Universal,
}

impl Arch {
    /// Pointer width of the target in bits.
    pub fn address_size(self) -> u32 {
        match self {
            Arch::X86 => 32,
            Arch::X86_64 | Arch::AArch64 | Arch::Universal => 64,
        }
    }

    /// Name used in installer file names.
    pub fn as_str(self) -> &'static str {
        match self {
            Arch::X86_64 => "x86_64",
            Arch::X86 => "i686",
            Arch::AArch64 => "arm64",
            Arch::Universal => "universal",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
