//! External tool preflight.
//!
//! Every tool a target will invoke is located before the first stage runs,
//! so a missing tool fails the run without touching the staged tree.

use crate::bundler::{
    error::{Error, Result},
    platform::windows::nsis,
    settings::{Platform, Settings},
};

/// Tools found through `PATH` that the selected target will invoke.
pub fn required_tools(settings: &Settings, scripts_only: bool) -> Vec<&'static str> {
    let bundle = settings.bundle_settings();
    match settings.target().platform() {
        Platform::Darwin => {
            let mut tools = vec!["hdiutil", "SetFile", "Rez"];
            if !bundle.macos.relink.is_empty() {
                tools.push("install_name_tool");
            }
            if bundle.macos.signing_identity.is_some() {
                tools.push("codesign");
                if !bundle.macos.skip_verification {
                    tools.push("spctl");
                }
                if bundle.macos.keychain.is_some() && bundle.macos.keychain_password_file.is_some() {
                    tools.push("security");
                }
            }
            tools
        }
        // makensis is located separately, outside PATH as well
        Platform::Windows => Vec::new(),
        Platform::Linux => {
            if !scripts_only && bundle.linux.strip.unwrap_or(settings.is_release()) {
                vec!["strip"]
            } else {
                Vec::new()
            }
        }
    }
}

/// Fails with [`Error::Configuration`] naming the first missing tool.
pub fn preflight(settings: &Settings, scripts_only: bool) -> Result<()> {
    for tool in required_tools(settings, scripts_only) {
        match which::which(tool) {
            Ok(path) => log::debug!("Found {} at {}", tool, path.display()),
            Err(e) => {
                return Err(Error::Configuration(format!(
                    "required tool `{}` not found: {}",
                    tool, e
                )));
            }
        }
    }

    if settings.target().platform() == Platform::Windows && !scripts_only {
        let makensis = nsis::locate_makensis()?;
        log::debug!("Found makensis at {}", makensis.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{
        Arch, BundleSettings, PackageSettings, PackagingTarget, SettingsBuilder,
    };

    fn settings(platform: Platform, bundle: BundleSettings, release: bool) -> Settings {
        SettingsBuilder::new()
            .package_settings(PackageSettings {
                product_name: "Viewer".into(),
                version: "1.2.3.4".into(),
                release,
                ..Default::default()
            })
            .bundle_settings(bundle)
            .target(PackagingTarget::new(platform, Arch::X86_64))
            .staged_root("/tmp/staged")
            .build()
            .unwrap()
    }

    #[test]
    fn signing_tools_are_required_only_with_an_identity() {
        let unsigned = settings(Platform::Darwin, BundleSettings::default(), true);
        assert_eq!(required_tools(&unsigned, false), vec!["hdiutil", "SetFile", "Rez"]);

        let mut bundle = BundleSettings::default();
        bundle.macos.signing_identity = Some(String::new());
        let signed = settings(Platform::Darwin, bundle, true);
        let tools = required_tools(&signed, false);
        assert!(tools.contains(&"codesign"));
        assert!(tools.contains(&"spctl"));
        assert!(!tools.contains(&"security"));
    }

    #[test]
    fn strip_is_required_for_release_archives_only() {
        let release = settings(Platform::Linux, BundleSettings::default(), true);
        assert_eq!(required_tools(&release, false), vec!["strip"]);

        let debug = settings(Platform::Linux, BundleSettings::default(), false);
        assert!(required_tools(&debug, false).is_empty());
    }
}
