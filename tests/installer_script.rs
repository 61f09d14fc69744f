//! Installer directive ordering and NSIS script rendering.

use kodegen_bundler_finalize::bundler::{
    Arch, Bundler, FinalizeOptions, PackageSettings, PackagingTarget, Platform, SettingsBuilder,
    StagedFileEntry, StagedTree,
    platform::windows::nsis::{self, InstallerDirective},
};
use std::path::{Path, PathBuf};

#[test]
fn uninstall_removes_each_directory_once_deepest_first() {
    let root = Path::new("/");
    let files = vec![
        PathBuf::from("/a/b/c.txt"),
        PathBuf::from("/a/b/d.txt"),
        PathBuf::from("/a/e.txt"),
    ];

    let directives = nsis::uninstall_directives(&files, root).unwrap();
    let removals: Vec<_> = directives
        .iter()
        .filter(|d| matches!(d, InstallerDirective::RemoveDir(_)))
        .cloned()
        .collect();

    assert_eq!(
        removals,
        vec![
            InstallerDirective::RemoveDir(PathBuf::from("a/b")),
            InstallerDirective::RemoveDir(PathBuf::from("a")),
        ]
    );
    let deletes = directives
        .iter()
        .filter(|d| matches!(d, InstallerDirective::DeleteFile(_)))
        .count();
    assert_eq!(deletes, 3);
}

#[test]
fn output_directory_changes_once_between_groups() {
    let root = Path::new("/");
    let files = vec![PathBuf::from("/x/2.txt"), PathBuf::from("/x/y/1.txt")];

    let directives = nsis::install_directives(&files, root).unwrap();

    assert_eq!(
        directives,
        vec![
            InstallerDirective::SetOutputDir(PathBuf::from("x/y")),
            InstallerDirective::InstallFile(PathBuf::from("/x/y/1.txt")),
            InstallerDirective::SetOutputDir(PathBuf::from("x")),
            InstallerDirective::InstallFile(PathBuf::from("/x/2.txt")),
        ]
    );
}

#[tokio::test]
async fn dry_run_renders_the_script_without_makensis() {
    let tmp = tempfile::tempdir().unwrap();
    let staged = tmp.path().join("staged");
    let out = tmp.path().join("out");
    for file in ["KodegenViewer.exe", "llplugin/dullahan_host.exe", "skins/default/colors.xml"] {
        let path = staged.join(file);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"x").unwrap();
    }
    let entries = ["KodegenViewer.exe", "llplugin/dullahan_host.exe", "skins/default/colors.xml"]
        .iter()
        .map(|file| StagedFileEntry::new(PathBuf::from("src").join(file), staged.join(file)))
        .collect();
    let tree = StagedTree::new(&staged, entries);

    let settings = SettingsBuilder::new()
        .package_settings(PackageSettings {
            product_name: "Kodegen Viewer".into(),
            version: "7.1.2.500".into(),
            ..Default::default()
        })
        .target(PackagingTarget::new(Platform::Windows, Arch::X86_64))
        .staged_root(&staged)
        .project_out_directory(&out)
        .build()
        .unwrap();

    let artifact = Bundler::new(settings, tree)
        .unwrap()
        .with_options(FinalizeOptions {
            scripts_only: true,
            ..Default::default()
        })
        .finalize()
        .await
        .unwrap();

    let script_path = &artifact.paths[0];
    assert_eq!(
        script_path,
        &out.join("Kodegen_Viewer_7_1_2_500_x86_64_setup.nsi")
    );
    let bytes = std::fs::read(script_path).unwrap();
    assert_eq!(&bytes[..3], b"\xEF\xBB\xBF");
    let script = String::from_utf8_lossy(&bytes[3..]).into_owned();

    assert!(script.contains("Kodegen_Viewer_7_1_2_500_x86_64_Setup.exe"));
    assert!(script.contains("SetRegView 64"));
    assert!(script.contains("SetOutPath \"$INSTDIR\\skins\\default\""));
    assert!(script.contains("Delete \"$INSTDIR\\KodegenViewer.exe\""));

    let deeper = script.find("RMDir \"$INSTDIR\\skins\\default\"").unwrap();
    let shallower = script.find("RMDir \"$INSTDIR\\skins\"").unwrap();
    assert!(deeper < shallower);
    assert!(!script.contains("{{"));
}
