//! Bundle assembly and relinking over a staged application bundle.
#![cfg(unix)]

use kodegen_bundler_finalize::bundler::{
    Arch, BundleSettings, Error, PackageSettings, PackagingTarget, Platform, Result, Settings,
    SettingsBuilder, StagedTree,
    assembly::BundleAssembler,
    platform::macos::relink::{self, ReferenceRewriter, RelinkDirective},
    settings::{NestedBundleSettings, RelinkSettings, SharedResourceSettings},
    utils::link,
};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const FRAMEWORK: &str = "CEF.framework";

struct Fixture {
    _tmp: tempfile::TempDir,
    staged: PathBuf,
    source: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let staged = tmp.path().join("staged");
        let source = tmp.path().join("source");

        let framework = source.join("cef").join(FRAMEWORK);
        std::fs::create_dir_all(framework.join("Resources")).unwrap();
        std::fs::write(framework.join("CEF"), b"mach-o").unwrap();
        std::fs::write(framework.join("Resources/icudtl.dat"), b"data").unwrap();

        let app = staged.join("Viewer.app");
        std::fs::create_dir_all(app.join("Contents/MacOS")).unwrap();
        std::fs::write(app.join("Contents/MacOS/Viewer"), b"main").unwrap();

        Self { _tmp: tmp, staged, source }
    }

    fn app(&self) -> PathBuf {
        self.staged.join("Viewer.app")
    }

    fn settings(&self, bundles: Vec<NestedBundleSettings>, relink: Vec<RelinkSettings>) -> Settings {
        let mut bundle = BundleSettings::default();
        bundle.macos.shared_resource = Some(SharedResourceSettings {
            name: FRAMEWORK.into(),
            source: PathBuf::from("cef").join(FRAMEWORK),
            dir: PathBuf::from("Contents/Frameworks"),
            binary: None,
            old_reference: Some("@rpath/CEF.framework/CEF".into()),
        });
        bundle.macos.bundles = bundles;
        bundle.macos.relink = relink;

        SettingsBuilder::new()
            .package_settings(PackageSettings {
                product_name: "Viewer".into(),
                version: "7.1.2.500".into(),
                ..Default::default()
            })
            .bundle_settings(bundle)
            .target(PackagingTarget::new(Platform::Darwin, Arch::X86_64))
            .staged_root(&self.staged)
            .source_root(&self.source)
            .build()
            .unwrap()
    }

    fn tree(&self) -> StagedTree {
        StagedTree::new(&self.staged, Vec::new())
    }
}

fn nested(name: &str, children: Vec<NestedBundleSettings>) -> NestedBundleSettings {
    NestedBundleSettings {
        name: name.into(),
        source: None,
        children_dir: PathBuf::from("Contents/Frameworks"),
        shared_dir: PathBuf::from("Contents/Frameworks"),
        depends_on_shared: true,
        library_dir: None,
        children,
    }
}

/// Real (non-link) directories named like the framework.
fn physical_copies(root: &Path) -> usize {
    walkdir::WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_dir() && entry.file_name() == FRAMEWORK)
        .count()
}

#[tokio::test]
async fn shared_framework_is_copied_once_and_linked_everywhere() {
    let fx = Fixture::new();
    let settings = fx.settings(
        vec![nested("SLPlugin.app", vec![]), nested("Helper.app", vec![])],
        vec![],
    );
    let tree = fx.tree();

    let report = BundleAssembler::new(&settings, &tree).assemble().await.unwrap();

    let physical = fx.app().join("Contents/Frameworks").join(FRAMEWORK);
    assert_eq!(report.shared_copy.as_deref(), Some(physical.as_path()));
    assert_eq!(report.shared_links.len(), 2);
    assert_eq!(physical_copies(&fx.app()), 1);

    let expected = std::fs::canonicalize(physical.join("CEF")).unwrap();
    for plugin in ["SLPlugin.app", "Helper.app"] {
        let link_path = fx
            .app()
            .join("Contents/Resources")
            .join(plugin)
            .join("Contents/Frameworks")
            .join(FRAMEWORK);
        assert!(std::fs::symlink_metadata(&link_path).unwrap().file_type().is_symlink());
        assert_eq!(std::fs::canonicalize(link_path.join("CEF")).unwrap(), expected);
    }
}

#[tokio::test]
async fn rerunning_assembly_repairs_a_corrupted_link() {
    let fx = Fixture::new();
    let settings = fx.settings(
        vec![nested("SLPlugin.app", vec![]), nested("Helper.app", vec![])],
        vec![],
    );
    let tree = fx.tree();
    let assembler = BundleAssembler::new(&settings, &tree);
    assembler.assemble().await.unwrap();

    let link_path = fx
        .app()
        .join("Contents/Resources/Helper.app/Contents/Frameworks")
        .join(FRAMEWORK);
    let intended = std::fs::read_link(&link_path).unwrap();
    let decoy = fx.app().join("Contents/Decoy");
    std::fs::create_dir_all(&decoy).unwrap();
    std::fs::remove_file(&link_path).unwrap();
    std::os::unix::fs::symlink("../../../../Decoy", &link_path).unwrap();

    assembler.assemble().await.unwrap();

    assert_eq!(std::fs::read_link(&link_path).unwrap(), intended);
    assert_eq!(physical_copies(&fx.app()), 1);
}

#[tokio::test]
async fn nested_chains_never_revisit_a_directory() {
    let fx = Fixture::new();
    let settings = fx.settings(
        vec![nested(
            "Outer.app",
            vec![nested("Middle.app", vec![nested("Inner.app", vec![])])],
        )],
        vec![],
    );
    let tree = fx.tree();

    let report = BundleAssembler::new(&settings, &tree).assemble().await.unwrap();

    assert_eq!(report.shared_links.len(), 3);
    for record in &report.shared_links {
        let hops = link::check_link_chain(&record.link).unwrap();
        assert!(!hops.is_empty());
        let resolved = std::fs::canonicalize(&record.link).unwrap();
        let link_dir = std::fs::canonicalize(record.link.parent().unwrap()).unwrap();
        assert!(!link_dir.starts_with(&resolved));
    }
    assert_eq!(physical_copies(&fx.app()), 1);
}

#[tokio::test]
async fn missing_app_bundle_is_reported() {
    let fx = Fixture::new();
    std::fs::remove_dir_all(fx.app()).unwrap();
    let settings = fx.settings(vec![], vec![]);
    let tree = fx.tree();

    let err = BundleAssembler::new(&settings, &tree).assemble().await.unwrap_err();
    assert!(matches!(err, Error::MissingResource { .. }));
}

#[derive(Default)]
struct RecordingRewriter {
    seen: Mutex<Vec<RelinkDirective>>,
    fail: bool,
}

impl ReferenceRewriter for RecordingRewriter {
    async fn rewrite(&self, directive: &RelinkDirective) -> Result<()> {
        self.seen.lock().unwrap().push(directive.clone());
        if self.fail {
            return Err(Error::GenericError("rewrite tool crashed".into()));
        }
        Ok(())
    }
}

fn relink_entry(binary: &str, bundle: Option<&str>) -> RelinkSettings {
    RelinkSettings {
        binary: PathBuf::from(binary),
        bundle: bundle.map(String::from),
        anchor: None,
    }
}

#[tokio::test]
async fn relink_references_follow_the_assembled_links() {
    let fx = Fixture::new();
    let plugin_binary = "Contents/Resources/SLPlugin.app/Contents/MacOS/SLPlugin";
    std::fs::create_dir_all(fx.app().join(plugin_binary).parent().unwrap()).unwrap();
    std::fs::write(fx.app().join(plugin_binary), b"plugin").unwrap();

    let settings = fx.settings(
        vec![nested("SLPlugin.app", vec![])],
        vec![
            relink_entry("Contents/MacOS/Viewer", None),
            relink_entry(plugin_binary, Some("SLPlugin.app")),
            relink_entry("Contents/MacOS/Viewer", None),
        ],
    );
    let tree = fx.tree();
    let assembler = BundleAssembler::new(&settings, &tree);
    assembler.assemble().await.unwrap();

    let directives = relink::plan_relinks(&settings, &assembler.plan()).unwrap();
    assert_eq!(directives.len(), 2);
    assert_eq!(directives[0].old_reference, "@rpath/CEF.framework/CEF");
    assert_eq!(
        directives[0].new_reference,
        "@executable_path/../Frameworks/CEF.framework/CEF"
    );
    assert_eq!(
        directives[1].new_reference,
        "@executable_path/../Frameworks/CEF.framework/CEF"
    );
    assert_eq!(directives[1].binary, fx.app().join(plugin_binary));

    let rewriter = RecordingRewriter::default();
    relink::apply_relinks(&rewriter, &directives).await.unwrap();
    assert_eq!(*rewriter.seen.lock().unwrap(), directives);
}

#[tokio::test]
async fn second_level_relink_goes_through_the_parent_link() {
    let fx = Fixture::new();
    let helper_binary =
        "Contents/Resources/SLPlugin.app/Contents/Frameworks/Helper.app/Contents/MacOS/Helper";
    std::fs::create_dir_all(fx.app().join(helper_binary).parent().unwrap()).unwrap();
    std::fs::write(fx.app().join(helper_binary), b"helper").unwrap();

    let settings = fx.settings(
        vec![nested("SLPlugin.app", vec![nested("Helper.app", vec![])])],
        vec![relink_entry(helper_binary, Some("Helper.app"))],
    );
    let tree = fx.tree();
    let assembler = BundleAssembler::new(&settings, &tree);
    assembler.assemble().await.unwrap();

    let helper_link = fx
        .app()
        .join("Contents/Resources/SLPlugin.app/Contents/Frameworks/Helper.app/Contents/Frameworks")
        .join(FRAMEWORK);
    let hops = link::check_link_chain(&helper_link).unwrap();
    assert!(hops.len() >= 2);

    let directives = relink::plan_relinks(&settings, &assembler.plan()).unwrap();
    assert_eq!(directives.len(), 1);
    assert_eq!(
        directives[0].new_reference,
        "@executable_path/../Frameworks/CEF.framework/CEF"
    );

    let runtime_dir = fx.app().join(helper_binary).parent().unwrap().to_path_buf();
    let referenced = runtime_dir.join("../Frameworks/CEF.framework/CEF");
    let physical = fx.app().join("Contents/Frameworks").join(FRAMEWORK).join("CEF");
    assert_eq!(
        std::fs::canonicalize(referenced).unwrap(),
        std::fs::canonicalize(physical).unwrap()
    );
}

#[tokio::test]
async fn a_failed_rewrite_is_fatal() {
    let fx = Fixture::new();
    let settings = fx.settings(vec![], vec![relink_entry("Contents/MacOS/Viewer", None)]);
    let tree = fx.tree();
    let assembler = BundleAssembler::new(&settings, &tree);
    assembler.assemble().await.unwrap();

    let directives = relink::plan_relinks(&settings, &assembler.plan()).unwrap();
    let rewriter = RecordingRewriter {
        fail: true,
        ..Default::default()
    };
    let err = relink::apply_relinks(&rewriter, &directives).await.unwrap_err();
    assert!(matches!(err, Error::Relink { .. }));
    assert_eq!(rewriter.seen.lock().unwrap().len(), 1);
}
