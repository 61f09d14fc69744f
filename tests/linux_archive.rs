//! Linux finalization through the orchestrator.
#![cfg(unix)]

use flate2::read::GzDecoder;
use kodegen_bundler_finalize::bundler::{
    Arch, BundleSettings, Bundler, FinalizeOptions, PackageSettings, PackageType,
    PackagingTarget, Platform, Settings, SettingsBuilder, StagedTree,
};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

fn stage(root: &Path) {
    std::fs::create_dir_all(root.join("bin")).unwrap();
    std::fs::create_dir_all(root.join("lib")).unwrap();
    std::fs::write(root.join("bin/viewer"), b"#!/bin/sh\n").unwrap();
    std::fs::write(root.join("lib/libviewer.so"), b"elf").unwrap();
    std::fs::set_permissions(root.join("bin/viewer"), std::fs::Permissions::from_mode(0o700)).unwrap();
    std::fs::set_permissions(root.join("lib"), std::fs::Permissions::from_mode(0o700)).unwrap();
}

fn settings(root: &Path, out: &Path, release: bool, archive: Option<bool>) -> Settings {
    let mut bundle = BundleSettings::default();
    bundle.linux.strip = Some(false);
    bundle.linux.archive = archive;
    SettingsBuilder::new()
        .package_settings(PackageSettings {
            product_name: "Kodegen Viewer".into(),
            version: "7.1.2.500".into(),
            release,
            ..Default::default()
        })
        .bundle_settings(bundle)
        .target(PackagingTarget::new(Platform::Linux, Arch::X86_64))
        .staged_root(root)
        .project_out_directory(out)
        .build()
        .unwrap()
}

#[tokio::test]
async fn release_tree_is_archived_under_the_base_name() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("staged");
    let out = tmp.path().join("out");
    stage(&root);

    let artifact = Bundler::new(settings(&root, &out, true, None), StagedTree::new(&root, Vec::new()))
        .unwrap()
        .finalize()
        .await
        .unwrap();

    assert_eq!(artifact.package_type, PackageType::Archive);
    let archive = out.join("Kodegen_Viewer_7_1_2_500_x86_64.tar.gz");
    assert_eq!(artifact.paths, vec![archive.clone()]);
    assert_eq!(artifact.checksum.len(), 64);
    assert!(root.join("bin/viewer").is_file());

    let mut reader = tar::Archive::new(GzDecoder::new(std::fs::File::open(&archive).unwrap()));
    let mut viewer_mode = None;
    for entry in reader.entries().unwrap() {
        let entry = entry.unwrap();
        let path = entry.path().unwrap().into_owned();
        assert!(path.starts_with("Kodegen_Viewer_7_1_2_500_x86_64"));
        assert_eq!(entry.header().uid().unwrap(), 0);
        if path.ends_with("bin/viewer") {
            viewer_mode = Some(entry.header().mode().unwrap() & 0o7777);
        }
    }
    assert_eq!(viewer_mode, Some(0o755));
}

#[tokio::test]
async fn skipping_the_archive_reports_the_normalized_tree() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("staged");
    let out = tmp.path().join("out");
    stage(&root);

    let artifact = Bundler::new(settings(&root, &out, true, None), StagedTree::new(&root, Vec::new()))
        .unwrap()
        .with_options(FinalizeOptions {
            skip_archive: true,
            ..Default::default()
        })
        .finalize()
        .await
        .unwrap();

    assert_eq!(artifact.paths, vec![root.clone()]);
    assert!(!out.exists());
    let mode = std::fs::metadata(root.join("lib")).unwrap().permissions().mode() & 0o7777;
    assert_eq!(mode, 0o755);
}

#[tokio::test]
async fn non_release_builds_are_not_archived_by_default() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("staged");
    let out = tmp.path().join("out");
    stage(&root);

    let artifact = Bundler::new(settings(&root, &out, false, None), StagedTree::new(&root, Vec::new()))
        .unwrap()
        .finalize()
        .await
        .unwrap();
    assert_eq!(artifact.paths, vec![root.clone()]);

    let artifact = Bundler::new(
        settings(&root, &out, false, Some(true)),
        StagedTree::new(&root, Vec::new()),
    )
    .unwrap()
    .finalize()
    .await
    .unwrap();
    assert!(artifact.paths[0].ends_with("Kodegen_Viewer_7_1_2_500_x86_64.tar.gz"));
}
