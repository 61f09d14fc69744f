//! Package metadata and configuration.

/// Package metadata and configuration.
///
/// Contains the product identity shared by all platforms. Channel and
/// version derivation happen upstream; this struct only records the results.
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_finalize::bundler::PackageSettings;
///
/// let settings = PackageSettings {
///     product_name: "Kodegen Viewer".into(),
///     version: "7.1.2.500".into(),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, serde::Deserialize)]
pub struct PackageSettings {
    /// Product name displayed to users.
    pub product_name: String,

    /// Dotted version string, usually four numeric components.
    ///
    /// Example: "7.1.2.500"
    pub version: String,

    /// Name of the application bundle inside the disk image (without `.app`).
    ///
    /// Default: None (uses `product_name`)
    #[serde(default)]
    pub app_name: Option<String>,

    /// Explicit installer base name.
    ///
    /// Default: None (derived from product name, version and architecture)
    #[serde(default)]
    pub installer_base_name: Option<String>,

    /// Whether this is a release build.
    ///
    /// Release builds strip binaries and produce archives; other builds leave
    /// the tree in place.
    ///
    /// Default: true
    #[serde(default = "default_release")]
    pub release: bool,
}

fn default_release() -> bool {
    true
}

impl Default for PackageSettings {
    fn default() -> Self {
        Self {
            product_name: String::new(),
            version: String::new(),
            app_name: None,
            installer_base_name: None,
            release: default_release(),
        }
    }
}
