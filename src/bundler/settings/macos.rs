//! macOS platform-specific settings.

use std::path::PathBuf;
use std::time::Duration;

/// macOS application bundle configuration.
///
/// Describes how the staged `.app` is finalized: which heavyweight resource
/// is shared across nested bundles, which binaries must be relinked to it,
/// and how the result is signed.
///
/// # Configuration
///
/// ```toml
/// [macos]
/// signing_identity = "Developer ID Application: Kodegen Labs"
/// entitlements = "slplugin.entitlements"
/// plain_sign = ["Contents/Resources/llplugin/*.dylib"]
/// deep_sign = ["Contents/Resources/SLPlugin.app/Contents/MacOS/SLPlugin"]
///
/// [macos.shared_resource]
/// name = "Chromium Embedded Framework.framework"
/// source = "packages/lib/release/Chromium Embedded Framework.framework"
///
/// [[macos.bundles]]
/// name = "SLPlugin.app"
/// source = "llplugin/slplugin/Release/SLPlugin.app"
/// ```
///
/// # See Also
///
/// - [`DmgSettings`] - Disk image configuration
#[derive(Clone, Debug, serde::Deserialize)]
pub struct MacOsSettings {
    /// Code signing identity name.
    ///
    /// An empty string selects the generic "Developer ID Application"
    /// identity.
    ///
    /// Default: None (unsigned)
    #[serde(default)]
    pub signing_identity: Option<String>,

    /// Keychain holding the signing identity.
    ///
    /// Default: None (default keychain search list)
    #[serde(default)]
    pub keychain: Option<PathBuf>,

    /// File whose first line unlocks `keychain`.
    ///
    /// Default: None (keychain assumed unlocked)
    #[serde(default)]
    pub keychain_password_file: Option<PathBuf>,

    /// Entitlements descriptor used for deep signing, relative to the
    /// source root.
    ///
    /// Default: None
    #[serde(default)]
    pub entitlements: Option<PathBuf>,

    /// Glob patterns (relative to the app bundle) of loose libraries signed
    /// shallowly before any deep signing.
    #[serde(default)]
    pub plain_sign: Vec<String>,

    /// Paths (relative to the app bundle) deep signed in order. The app
    /// bundle itself is always deep signed last.
    #[serde(default)]
    pub deep_sign: Vec<PathBuf>,

    /// Script run against the signed bundle to notarize it, relative to the
    /// source root.
    ///
    /// Default: None (notarization skipped)
    #[serde(default)]
    pub notarize_script: Option<PathBuf>,

    /// Skip the Gatekeeper assessment after signing.
    #[serde(default)]
    pub skip_verification: bool,

    /// Retry behaviour for transient signing failures.
    #[serde(default)]
    pub retry: RetrySettings,

    /// Resource copied once and shared by nested bundles through links.
    #[serde(default)]
    pub shared_resource: Option<SharedResourceSettings>,

    /// Directory (relative to the app bundle) that holds nested bundles.
    #[serde(default = "default_children_dir")]
    pub children_dir: PathBuf,

    /// Directory (relative to the app bundle) that holds shared libraries.
    #[serde(default = "default_children_dir")]
    pub library_dir: PathBuf,

    /// Nested bundles, outermost first.
    #[serde(default)]
    pub bundles: Vec<NestedBundleSettings>,

    /// Shared libraries linked into nested bundles when present.
    #[serde(default)]
    pub libraries: Vec<LibrarySettings>,

    /// Binaries whose recorded shared-resource reference is rewritten.
    #[serde(default)]
    pub relink: Vec<RelinkSettings>,
}

impl Default for MacOsSettings {
    fn default() -> Self {
        Self {
            signing_identity: None,
            keychain: None,
            keychain_password_file: None,
            entitlements: None,
            plain_sign: Vec::new(),
            deep_sign: Vec::new(),
            notarize_script: None,
            skip_verification: false,
            retry: RetrySettings::default(),
            shared_resource: None,
            children_dir: default_children_dir(),
            library_dir: default_children_dir(),
            bundles: Vec::new(),
            libraries: Vec::new(),
            relink: Vec::new(),
        }
    }
}

/// Backoff base for signing. The attempt bound is fixed.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct RetrySettings {
    /// Delay before the first retry, in seconds. Doubles on every retry.
    #[serde(default = "default_base_delay_secs")]
    pub base_delay_secs: u64,
}

impl RetrySettings {
    /// Base delay as a [`Duration`].
    pub fn base_delay(&self) -> Duration {
        Duration::from_secs(self.base_delay_secs)
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            base_delay_secs: default_base_delay_secs(),
        }
    }
}

/// The heavyweight resource physically copied exactly once.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct SharedResourceSettings {
    /// Directory name of the resource, e.g.
    /// `Chromium Embedded Framework.framework`.
    pub name: String,

    /// Where the resource is copied from, relative to the source root.
    pub source: PathBuf,

    /// Directory (relative to the app bundle) holding the physical copy.
    #[serde(default = "default_shared_dir")]
    pub dir: PathBuf,

    /// Binary inside the resource that compiled artifacts reference.
    ///
    /// Default: None (resource name without its extension)
    #[serde(default)]
    pub binary: Option<String>,

    /// Reference stamped into dependent binaries at build time.
    ///
    /// Default: None (read from the resource binary's install name)
    #[serde(default)]
    pub old_reference: Option<String>,
}

impl SharedResourceSettings {
    /// Name of the binary inside the resource.
    pub fn binary_name(&self) -> String {
        match &self.binary {
            Some(binary) => binary.clone(),
            None => std::path::Path::new(&self.name)
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.name.clone()),
        }
    }
}

/// One nested bundle in the bundle tree.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct NestedBundleSettings {
    /// Bundle directory name, e.g. `SLPlugin.app`.
    pub name: String,

    /// Where the bundle is copied from, relative to the source root.
    ///
    /// Default: None (already present in the staged tree)
    #[serde(default)]
    pub source: Option<PathBuf>,

    /// Directory (relative to this bundle) holding its own nested bundles.
    #[serde(default = "default_shared_dir")]
    pub children_dir: PathBuf,

    /// Directory (relative to this bundle) where the shared resource link
    /// is placed.
    #[serde(default = "default_shared_dir")]
    pub shared_dir: PathBuf,

    /// Whether this bundle links to the shared resource.
    #[serde(default = "default_true")]
    pub depends_on_shared: bool,

    /// Directory (relative to this bundle) that receives shared library
    /// links.
    ///
    /// Default: None (no library links)
    #[serde(default)]
    pub library_dir: Option<PathBuf>,

    /// Bundles nested inside this one.
    #[serde(default)]
    pub children: Vec<NestedBundleSettings>,
}

/// A shared library that dependent bundles link to when present.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct LibrarySettings {
    /// File name or glob pattern inside the library directory.
    pub pattern: String,

    /// Whether absence is tolerated.
    #[serde(default = "default_true")]
    pub optional: bool,
}

/// A binary whose shared-resource reference must be rewritten.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct RelinkSettings {
    /// Binary path relative to the app bundle.
    pub binary: PathBuf,

    /// Nested bundle whose shared-resource link the binary should use.
    ///
    /// Default: None (the top-level physical copy)
    #[serde(default)]
    pub bundle: Option<String>,

    /// Runtime execution directory relative to the app bundle.
    ///
    /// Default: None (the binary's own directory)
    #[serde(default)]
    pub anchor: Option<PathBuf>,
}

/// macOS DMG disk image configuration.
///
/// # Configuration
///
/// ```toml
/// [dmg]
/// volume_name = "Kodegen Installer"
/// template_dir = "installers/darwin/beta-dmg"
/// fallback_template_dir = "installers/darwin/release-dmg"
/// ```
#[derive(Clone, Debug, serde::Deserialize)]
pub struct DmgSettings {
    /// Mounted volume name.
    ///
    /// Default: None (`<product> Installer`)
    #[serde(default)]
    pub volume_name: Option<String>,

    /// Decorative asset directory, relative to the source root.
    #[serde(default = "default_template_dir")]
    pub template_dir: PathBuf,

    /// Used when `template_dir` does not exist.
    #[serde(default = "default_template_dir")]
    pub fallback_template_dir: PathBuf,

    /// Alias resource compiled into the drag-target entry, relative to the
    /// source root.
    ///
    /// Default: None (`Applications-alias.r` in the fallback template dir)
    #[serde(default)]
    pub alias_resource: Option<PathBuf>,

    /// Maximum capacity of the sparse image in megabytes.
    #[serde(default = "default_megabytes")]
    pub megabytes: u32,

    /// zlib level of the final compressed image.
    #[serde(default = "default_zlib_level")]
    pub zlib_level: u8,
}

impl Default for DmgSettings {
    fn default() -> Self {
        Self {
            volume_name: None,
            template_dir: default_template_dir(),
            fallback_template_dir: default_template_dir(),
            alias_resource: None,
            megabytes: default_megabytes(),
            zlib_level: default_zlib_level(),
        }
    }
}

fn default_base_delay_secs() -> u64 {
    15
}

fn default_children_dir() -> PathBuf {
    PathBuf::from("Contents/Resources")
}

fn default_shared_dir() -> PathBuf {
    PathBuf::from("Contents/Frameworks")
}

fn default_true() -> bool {
    true
}

fn default_template_dir() -> PathBuf {
    PathBuf::from("installers/darwin/release-dmg")
}

fn default_megabytes() -> u32 {
    1300
}

fn default_zlib_level() -> u8 {
    9
}
