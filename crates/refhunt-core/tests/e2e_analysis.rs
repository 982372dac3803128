/// End-to-end analysis tests.
///
/// These tests drive `HuntEngine` through a manifest and settings file
/// written to a temporary directory, so the manifest loader, on-disk size
/// lookup, settings persistence, export and deletion all run for real.
use refhunt_core::index::progress::{AnalysisProgress, ChannelProgress, NoopProgress};
use refhunt_core::model::{AnalysisMode, DependencyDepth};
use refhunt_core::monitor::{change_feed, RepositoryChange};
use refhunt_core::provider::{AssetMetadataProvider, Manifest, ManifestEntry, ManifestProvider};
use refhunt_core::query::{deletion_candidates, export, QueryState, SortField};
use refhunt_core::rules::IgnoreRules;
use refhunt_core::settings::{AnalysisConfig, JsonSettingsStore, SettingsStore};
use refhunt_core::HuntEngine;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Lay out a small project and its manifest:
///
/// ```text
/// root/
///   manifest.json
///   Assets/
///     a.png        (100 bytes)          <- b.mat
///     b.mat        (200 bytes)  -> a.png
///     scene.unity  (300 bytes)  registered scene
///     notes.txt    (40 bytes)
/// ```
fn build_project(root: &Path) -> std::path::PathBuf {
    let assets = root.join("Assets");
    fs::create_dir_all(&assets).unwrap();
    write_bytes(&assets.join("a.png"), 100);
    write_bytes(&assets.join("b.mat"), 200);
    write_bytes(&assets.join("scene.unity"), 300);
    write_bytes(&assets.join("notes.txt"), 40);

    let manifest = Manifest {
        assets: vec![
            ManifestEntry::new("Assets/a.png"),
            ManifestEntry::new("Assets/b.mat").with_dependencies(["Assets/a.png"]),
            ManifestEntry::new("Assets/scene.unity"),
            ManifestEntry::new("Assets/notes.txt"),
        ],
        scenes: vec!["Assets/scene.unity".into()],
        ..Manifest::default()
    };
    let path = root.join("manifest.json");
    ManifestProvider::new(manifest, None).save(&path).unwrap();
    path
}

fn write_bytes(path: &Path, n: usize) {
    let mut f = fs::File::create(path).unwrap();
    f.write_all(&vec![0u8; n]).unwrap();
}

fn engine(mode: AnalysisMode, patterns: &[&str]) -> HuntEngine {
    let config = AnalysisConfig {
        unreferenced_only: mode == AnalysisMode::UnreferencedOnly,
        ..AnalysisConfig::default()
    };
    HuntEngine::new(config, IgnoreRules::new(patterns.iter().copied()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

/// a.png is referenced by b.mat, b.mat by nothing, the scene is a build root.
#[test]
fn reference_counts_and_build_roots() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let manifest_path = build_project(tmp.path());
    let meta = ManifestProvider::load(&manifest_path).unwrap();

    let mut engine = engine(AnalysisMode::AllAssets, &[]);
    let result = engine.analyse(&meta, &meta, &NoopProgress);

    assert_eq!(result.get("Assets/a.png").unwrap().references_count, 1);
    assert_eq!(result.get("Assets/b.mat").unwrap().references_count, 0);
    assert!(result.get("Assets/scene.unity").is_none());

    let index = engine.index(DependencyDepth::Direct).unwrap();
    assert_eq!(index.references_count("Assets/scene.unity"), 0);
    assert_eq!(index.len(), 4);
}

/// Sizes missing from the manifest are read from disk.
#[test]
fn sizes_come_from_disk() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let manifest_path = build_project(tmp.path());
    let meta = ManifestProvider::load(&manifest_path).unwrap();

    assert_eq!(meta.file_size_bytes("Assets/b.mat"), 200);
    // Listed but absent on disk: soft failure.
    fs::remove_file(tmp.path().join("Assets/a.png")).unwrap();
    assert_eq!(meta.file_size_bytes("Assets/a.png"), 0);
}

/// An ignore pattern hides an unreferenced asset from the report.
#[test]
fn ignore_pattern_excludes_unreferenced_asset() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let manifest_path = build_project(tmp.path());
    let meta = ManifestProvider::load(&manifest_path).unwrap();

    let mut plain = engine(AnalysisMode::UnreferencedOnly, &[]);
    assert!(plain
        .analyse(&meta, &meta, &NoopProgress)
        .get("Assets/notes.txt")
        .is_some());

    let mut filtered = engine(AnalysisMode::UnreferencedOnly, &[r"\.txt$"]);
    let result = filtered.analyse(&meta, &meta, &NoopProgress);
    assert!(result.get("Assets/notes.txt").is_none());
    assert_eq!(result.ignored(), ["Assets/notes.txt".to_string()]);
    assert_eq!(result.summary(), "Unreferenced assets: 1");
}

/// Patterns survive a round trip through the JSON settings file.
#[test]
fn ignore_patterns_persist() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let settings_path = tmp.path().join("settings").join("refhunt.json");

    {
        let store = JsonSettingsStore::open(&settings_path).unwrap();
        let mut rules = IgnoreRules::load(&store);
        assert_eq!(rules.len(), 13);
        rules.set_pattern(0, "/Generated/").unwrap();
        rules.resize(2, &store);
        assert!(rules.save_if_dirty(&store).unwrap());
    }

    let store = JsonSettingsStore::open(&settings_path).unwrap();
    assert_eq!(store.get_int("RefHuntIgnorePatterns", -1), 2);
    let rules = IgnoreRules::load(&store);
    assert_eq!(rules.patterns(), ["/Generated/", "/Editor/"]);
    assert!(!rules.is_allowed("Assets/Generated/x.asset"));
    assert!(rules.is_allowed("Assets/Art/x.asset"));
}

/// Deleting candidates removes the file, rewrites the manifest and forces a
/// full rebuild on the next analysis.
#[test]
fn delete_candidates_and_rebuild() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let manifest_path = build_project(tmp.path());
    let mut meta = ManifestProvider::load(&manifest_path)
        .unwrap()
        .with_file_deletion(true);

    let mut engine = engine(AnalysisMode::UnreferencedOnly, &[r"\.txt$"]);
    engine.analyse(&meta, &meta, &NoopProgress);

    let result = engine.result().unwrap();
    let candidates: Vec<String> = deletion_candidates(result, &QueryState::new())
        .iter()
        .map(|r| r.path.clone())
        .collect();
    assert_eq!(candidates, vec!["Assets/b.mat".to_string()]);

    assert_eq!(engine.delete_selected(&mut meta, &candidates), 1);
    assert!(engine.result().is_none());
    assert!(!tmp.path().join("Assets/b.mat").exists());
    meta.save(&manifest_path).unwrap();

    let reloaded = ManifestProvider::load(&manifest_path).unwrap();
    let result = engine.analyse(&reloaded, &reloaded, &NoopProgress);
    assert_eq!(result.len(), 1);
    assert!(result.get("Assets/a.png").is_some());
}

/// Progress goes through the channel and ends at 1.0 for both phases.
#[test]
fn progress_reaches_completion() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let manifest_path = build_project(tmp.path());
    let meta = ManifestProvider::load(&manifest_path).unwrap();

    let (sink, rx) = ChannelProgress::channel();
    let mut engine = engine(AnalysisMode::UnreferencedOnly, &[]);
    engine.analyse(&meta, &meta, &sink);

    let messages: Vec<AnalysisProgress> = rx.try_iter().collect();
    let finished = messages
        .iter()
        .filter(|m| matches!(m, AnalysisProgress::Finished { .. }))
        .count();
    assert_eq!(finished, 2);
    assert!(messages.iter().all(|m| match m {
        AnalysisProgress::Update { fraction, .. } => (0.0..=1.0).contains(fraction),
        AnalysisProgress::Finished { .. } => true,
    }));
}

/// An external change drops the cached result.
#[test]
fn external_change_invalidates() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let manifest_path = build_project(tmp.path());
    let meta = ManifestProvider::load(&manifest_path).unwrap();

    let (notifier, feed) = change_feed();
    let mut engine = engine(AnalysisMode::UnreferencedOnly, &[]);
    engine.attach_changes(feed);
    engine.analyse(&meta, &meta, &NoopProgress);

    notifier.notify(RepositoryChange::Added("Assets/new.png".into()));
    assert!(engine.poll_changes() > 0);
    assert!(engine.result().is_none());
    assert!(engine.index(DependencyDepth::Direct).is_none());
}

/// Export writes the filtered, sorted rows.
#[test]
fn csv_export_of_query() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let manifest_path = build_project(tmp.path());
    let meta = ManifestProvider::load(&manifest_path).unwrap();

    let mut engine = engine(AnalysisMode::AllAssets, &[]);
    engine.analyse(&meta, &meta, &NoopProgress);

    let mut state = QueryState::new();
    state.toggle_sort(SortField::Size);
    state.toggle_sort(SortField::Size);
    let page = engine.query(&state).unwrap();

    let csv_path = tmp.path().join("out.csv");
    export::export_csv(&csv_path, &page.items).unwrap();
    let text = fs::read_to_string(&csv_path).unwrap();
    let rows: Vec<&str> = text.lines().skip(1).collect();
    assert_eq!(rows.len(), 3);
    assert!(rows[0].starts_with("Assets/b.mat,Material,200,"));
    assert!(rows[2].starts_with("Assets/notes.txt,TextAsset,40,"));
}

/// A manifest with duplicate paths is rejected.
#[test]
fn duplicate_manifest_paths_are_rejected() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let path = tmp.path().join("manifest.json");
    fs::write(
        &path,
        r#"{ "assets": [ { "path": "Assets/a.png" }, { "path": "Assets/a.png" } ] }"#,
    )
    .unwrap();
    assert!(ManifestProvider::load(&path).is_err());
}

/// A manifest path that climbs out of the project is neither sized nor
/// deleted, even with file deletion on.
#[test]
fn paths_outside_the_project_are_left_alone() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let project = tmp.path().join("project");
    fs::create_dir_all(&project).unwrap();
    let outside = tmp.path().join("outside.txt");
    write_bytes(&outside, 64);

    let manifest = Manifest {
        assets: vec![ManifestEntry::new("../outside.txt")],
        ..Manifest::default()
    };
    let manifest_path = project.join("manifest.json");
    ManifestProvider::new(manifest, None).save(&manifest_path).unwrap();
    let mut meta = ManifestProvider::load(&manifest_path)
        .unwrap()
        .with_file_deletion(true);

    assert_eq!(meta.file_size_bytes("../outside.txt"), 0);
    let mut engine = engine(AnalysisMode::UnreferencedOnly, &[]);
    engine.analyse(&meta, &meta, &NoopProgress);
    assert_eq!(
        engine.delete_selected(&mut meta, &["../outside.txt".to_string()]),
        0
    );
    assert!(outside.exists());
}

/// A change reported after the scan hides the stale result from queries
/// until the next analysis.
#[test]
fn unpolled_change_hides_query_results() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let manifest_path = build_project(tmp.path());
    let meta = ManifestProvider::load(&manifest_path).unwrap();

    let (notifier, feed) = change_feed();
    let mut engine = engine(AnalysisMode::UnreferencedOnly, &[]);
    engine.attach_changes(feed);
    engine.analyse(&meta, &meta, &NoopProgress);
    assert!(engine.query(&QueryState::new()).is_some());

    fs::remove_file(tmp.path().join("Assets/a.png")).unwrap();
    notifier.notify(RepositoryChange::Removed("Assets/a.png".into()));
    assert!(engine.query(&QueryState::new()).is_none());
    assert!(engine.result().is_none());
}
