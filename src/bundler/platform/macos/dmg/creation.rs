//! Sparse image creation, attaching and detaching with hdiutil.

use crate::bundler::{
    error::{Error, Result},
    settings::DmgSettings,
    utils::process,
};
use regex::Regex;
use std::ffi::OsStr;
use std::future::Future;
use std::path::{Path, PathBuf};

/// An attached image: the device node to detach and the volume mount point.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MountedVolume {
    /// Device node, e.g. `/dev/disk4`.
    pub device: String,
    /// Mount point of the HFS+ volume.
    pub volume: PathBuf,
}

/// Creates a growable sparse HFS+ image of bounded capacity.
pub async fn create_sparse_image(sparse: &Path, volume_name: &str, dmg: &DmgSettings) -> Result<()> {
    log::info!("Creating sparse image {}", sparse.display());
    let megabytes = dmg.megabytes.to_string();
    process::run_tool(
        "dmg",
        "hdiutil",
        [
            OsStr::new("create"),
            sparse.as_os_str(),
            OsStr::new("-volname"),
            OsStr::new(volume_name),
            OsStr::new("-fs"),
            OsStr::new("HFS+"),
            OsStr::new("-type"),
            OsStr::new("SPARSE"),
            OsStr::new("-megabytes"),
            OsStr::new(&megabytes),
            OsStr::new("-layout"),
            OsStr::new("SPUD"),
        ],
    )
    .await?;
    Ok(())
}

/// The attach and detach primitives the image builder drives.
#[allow(async_fn_in_trait)]
pub trait DiskImageTool {
    /// Attaches `image` privately and returns the tool's report.
    async fn attach(&self, image: &Path) -> Result<String>;

    /// Force-detaches a device node or image path.
    async fn detach(&self, target: &OsStr) -> Result<()>;
}

/// Attaches and detaches with `hdiutil`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Hdiutil;

impl DiskImageTool for Hdiutil {
    async fn attach(&self, image: &Path) -> Result<String> {
        let output = process::run_tool(
            "dmg",
            "hdiutil",
            [OsStr::new("attach"), OsStr::new("-private"), image.as_os_str()],
        )
        .await?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn detach(&self, target: &OsStr) -> Result<()> {
        process::run_tool("dmg", "hdiutil", [OsStr::new("detach"), OsStr::new("-force"), target])
            .await?;
        Ok(())
    }
}

/// Attaches `sparse` privately (hidden from the Finder) and returns where.
///
/// When the report cannot be parsed the image is detached by path before
/// the error is returned.
pub async fn attach_private<D: DiskImageTool>(tool: &D, sparse: &Path) -> Result<MountedVolume> {
    let report = tool.attach(sparse).await?;
    let mounted = match parse_attach_output(&report) {
        Ok(mounted) => mounted,
        Err(e) => {
            if let Err(detach_error) = tool.detach(sparse.as_os_str()).await {
                log::warn!("Failed to detach {}: {}", sparse.display(), detach_error);
            }
            return Err(e);
        }
    };
    log::debug!(
        "Attached {} as {} at {}",
        sparse.display(),
        mounted.device,
        mounted.volume.display()
    );
    Ok(mounted)
}

/// Runs `work` against the attached volume and always detaches afterwards.
///
/// A failure of `work` wins over a failure to detach; the latter is logged.
pub async fn with_attached<D, F, Fut, T>(tool: &D, sparse: &Path, work: F) -> Result<T>
where
    D: DiskImageTool,
    F: FnOnce(MountedVolume) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mounted = attach_private(tool, sparse).await?;
    let outcome = work(mounted.clone()).await;
    let detached = detach(tool, &mounted).await;
    if let (Err(_), Err(e)) = (&outcome, &detached) {
        log::warn!("Failed to detach {}: {}", mounted.device, e);
    }
    let value = outcome?;
    detached?;
    Ok(value)
}

/// Extracts the whole-disk device node and the HFS mount point from
/// `hdiutil attach` output.
pub fn parse_attach_output(output: &str) -> Result<MountedVolume> {
    let device_re = Regex::new(r"(/dev/disk[0-9]+)(?:[^s0-9]|$)")
        .map_err(|e| Error::GenericError(e.to_string()))?;
    let volume_re = Regex::new(r"HFS\s+(.+)").map_err(|e| Error::GenericError(e.to_string()))?;

    let unparsable = |what: &str| Error::ExternalTool {
        stage: "dmg".to_string(),
        command: "hdiutil attach -private".to_string(),
        status: "exit status: 0".to_string(),
        stderr: format!("no {} in output: {}", what, output.trim()),
    };

    let device = device_re
        .captures(output)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| unparsable("device node"))?;
    let volume = volume_re
        .captures(output)
        .and_then(|c| c.get(1))
        .map(|m| PathBuf::from(m.as_str().trim()))
        .ok_or_else(|| unparsable("mount point"))?;

    Ok(MountedVolume { device, volume })
}

/// Force-detaches the device.
pub async fn detach<D: DiskImageTool>(tool: &D, mounted: &MountedVolume) -> Result<()> {
    log::debug!("Detaching {}", mounted.device);
    tool.detach(OsStr::new(&mounted.device)).await
}
