//! Signing the application bundle copy inside the mounted volume.
//!
//! Signatures live partly in extended attributes, which a plain copy into
//! the final image would drop, so the volume copy is what gets signed.

use crate::bundler::{
    error::{Error, Result},
    settings::Settings,
    sign::{self, Codesign, RetryPolicy, SignPlan, SigningPipeline},
};
use std::path::Path;

/// Builds the signing plan for `app`: loose libraries shallowly, then the
/// configured nested executables deeply, then the bundle itself.
pub fn sign_plan(settings: &Settings, app: &Path) -> Result<SignPlan> {
    let macos = &settings.bundle_settings().macos;
    let mut plan = SignPlan::new();

    let app_pattern = glob::Pattern::escape(&app.to_string_lossy());
    for pattern in &macos.plain_sign {
        let mut matches: Vec<_> = glob::glob(&format!("{}/{}", app_pattern, pattern))?
            .filter_map(|entry| entry.ok())
            .collect();
        matches.sort();
        if matches.is_empty() {
            log::info!("Skipping plain signing of {} (no match)", pattern);
        }
        for target in matches {
            plan = plan.plain(target);
        }
    }

    for relative in &macos.deep_sign {
        let target = app.join(relative);
        if !target.exists() {
            return Err(Error::MissingResource { path: target });
        }
        plan = plan.deep(target);
    }

    Ok(plan.deep(app))
}

/// Signs, verifies and notarizes `app` when a signing identity is set.
pub async fn sign_volume_copy(settings: &Settings, app: &Path) -> Result<()> {
    let macos = &settings.bundle_settings().macos;
    let Some(identity) = &macos.signing_identity else {
        log::info!("Skipping code signing: no signing identity configured");
        return Ok(());
    };

    if let (Some(keychain), Some(password_file)) = (&macos.keychain, &macos.keychain_password_file) {
        sign::unlock_keychain(keychain, &settings.source_path_of(password_file)).await?;
    }

    let entitlements = macos
        .entitlements
        .as_ref()
        .map(|path| settings.source_path_of(path));
    if let Some(entitlements) = &entitlements {
        if !entitlements.is_file() {
            return Err(Error::Configuration(format!(
                "entitlements {} not found",
                entitlements.display()
            )));
        }
    }

    let signer = Codesign::new(identity, macos.keychain.clone(), entitlements);
    let plan = sign_plan(settings, app)?;
    SigningPipeline::new(signer, RetryPolicy::from(macos.retry.clone()))
        .run(&plan)
        .await?;

    if !macos.skip_verification {
        sign::verify_gatekeeper(app).await?;
    }
    if let Some(script) = &macos.notarize_script {
        sign::notarize(&settings.source_path_of(script), app).await?;
    }
    Ok(())
}
