//! Relative link creation against real directory trees.
#![cfg(unix)]

use kodegen_bundler_finalize::bundler::{
    Error,
    utils::link::{self, LinkPolicy},
};
use std::path::{Path, PathBuf};

fn make_file(path: &Path) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, b"payload").unwrap();
}

#[test]
fn creating_the_same_link_twice_is_a_no_op() {
    let tmp = tempfile::tempdir().unwrap();
    let target = tmp.path().join("Frameworks/CEF.framework/CEF");
    make_file(&target);
    let link_path = tmp.path().join("Plugin.app/Frameworks/CEF");

    let first = link::link_to(&target, &link_path, false, LinkPolicy::Strict).unwrap();
    let stored = std::fs::read_link(&link_path).unwrap();
    let second = link::link_to(&target, &link_path, false, LinkPolicy::Strict).unwrap();

    assert_eq!(first, second);
    assert_eq!(std::fs::read_link(&link_path).unwrap(), stored);
    assert_eq!(stored, PathBuf::from("../../Frameworks/CEF.framework/CEF"));
}

#[test]
fn relative_links_reach_the_same_file_at_every_depth() {
    let tmp = tempfile::tempdir().unwrap();
    let target = tmp.path().join("shared/resource.bin");
    make_file(&target);
    let physical = std::fs::canonicalize(&target).unwrap();

    for depth in 1..=6 {
        let mut dir = tmp.path().join("nest");
        for level in 0..depth {
            dir.push(format!("level{}", level));
        }
        let link_path = dir.join("resource.bin");

        let record = link::link_to(&target, &link_path, false, LinkPolicy::Strict)
            .unwrap()
            .unwrap();
        assert!(record.target.is_relative());
        assert_eq!(std::fs::canonicalize(&link_path).unwrap(), physical);
    }
}

#[test]
fn a_stale_link_is_repointed() {
    let tmp = tempfile::tempdir().unwrap();
    let good = tmp.path().join("good/lib.so");
    let bad = tmp.path().join("bad/lib.so");
    make_file(&good);
    make_file(&bad);
    let link_path = tmp.path().join("app/lib.so");

    link::link_to(&bad, &link_path, false, LinkPolicy::Strict).unwrap();
    link::link_to(&good, &link_path, false, LinkPolicy::Strict).unwrap();

    assert_eq!(
        std::fs::canonicalize(&link_path).unwrap(),
        std::fs::canonicalize(&good).unwrap()
    );
}

#[test]
fn a_directory_in_the_way_is_replaced() {
    let tmp = tempfile::tempdir().unwrap();
    let target = tmp.path().join("Frameworks/CEF.framework");
    std::fs::create_dir_all(&target).unwrap();
    let link_path = tmp.path().join("Plugin.app/CEF.framework");
    make_file(&link_path.join("stale copy"));

    link::link_to(&target, &link_path, false, LinkPolicy::Strict).unwrap();

    assert!(std::fs::symlink_metadata(&link_path).unwrap().file_type().is_symlink());
}

#[test]
fn absolute_targets_are_rejected_even_when_lenient() {
    let tmp = tempfile::tempdir().unwrap();
    let err = link::symlink_relative(
        Path::new("/usr/lib/libz.dylib"),
        &tmp.path().join("libz.dylib"),
        LinkPolicy::Lenient,
    )
    .unwrap_err();
    assert!(matches!(err, Error::Link { .. }));
    assert!(err.is_cosmetic());
}

#[test]
fn identical_paths_resolve_to_current_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let relative = link::resolve_relative(tmp.path(), tmp.path(), false).unwrap();
    assert_eq!(relative, PathBuf::from("."));
}

#[test]
fn a_plain_file_in_the_way_is_replaced() {
    let tmp = tempfile::tempdir().unwrap();
    let target = tmp.path().join("lib/libvlc.so.5");
    make_file(&target);
    let link_path = tmp.path().join("plugin/libvlc.so.5");
    make_file(&link_path);

    let record = link::link_to(&target, &link_path, false, LinkPolicy::Strict)
        .unwrap()
        .unwrap();

    assert!(std::fs::symlink_metadata(&link_path).unwrap().file_type().is_symlink());
    assert_eq!(record.target, PathBuf::from("../lib/libvlc.so.5"));
    assert_eq!(
        std::fs::canonicalize(&link_path).unwrap(),
        std::fs::canonicalize(&target).unwrap()
    );
}

#[test]
fn lenient_links_swallow_an_unresolvable_link_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let target = tmp.path().join("lib/libz.so");
    make_file(&target);
    let blocker = tmp.path().join("blocker");
    make_file(&blocker);

    let outcome = link::link_to(&target, &blocker.join("sub/libz.so"), false, LinkPolicy::Lenient)
        .unwrap();

    assert_eq!(outcome, None);
    assert!(blocker.is_file());
}

#[test]
fn strict_links_report_an_unresolvable_link_directory_as_a_link_error() {
    let tmp = tempfile::tempdir().unwrap();
    let target = tmp.path().join("lib/libz.so");
    make_file(&target);
    let blocker = tmp.path().join("blocker");
    make_file(&blocker);

    let err = link::link_to(&target, &blocker.join("sub/libz.so"), false, LinkPolicy::Strict)
        .unwrap_err();

    assert!(matches!(err, Error::Link { .. }));
}

#[test]
fn lenient_links_swallow_a_failed_placement() {
    let tmp = tempfile::tempdir().unwrap();
    let blocker = tmp.path().join("blocker");
    make_file(&blocker);

    let outcome = link::symlink_relative(
        Path::new("../lib/libz.so"),
        &blocker.join("sub/libz.so"),
        LinkPolicy::Lenient,
    )
    .unwrap();

    assert_eq!(outcome, None);
}
