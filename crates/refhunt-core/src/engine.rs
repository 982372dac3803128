/// The analysis engine.
///
/// `HuntEngine` owns every piece of derived state: one cached reverse index
/// per dependency depth and the current [`AnalysisResult`]. All of it is a
/// point-in-time snapshot. Deleting assets through the engine, or any change
/// arriving on the attached [`ChangeFeed`], throws the whole lot away; the
/// next analysis rebuilds from scratch.
///
/// Everything runs synchronously on the caller's thread. Borrowing rules
/// keep a build and a query from overlapping.
use crate::index::progress::ProgressSink;
use crate::index::ReverseIndexBuilder;
use crate::model::{
    AnalysisMode, AnalysisResult, AssetRecord, DependencyDepth, ReverseIndex,
};
use crate::monitor::ChangeFeed;
use crate::provider::{AssetMetadataProvider, AssetRepository, BuildRootsProvider};
use crate::query::{run_query, QueryPage, QueryState};
use crate::rules::{AssetClassifier, BuildRoots, IgnoreRules, Verdict};
use crate::settings::AnalysisConfig;
use compact_str::CompactString;
use std::fmt::Write as _;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Progress label of the classification phase.
const CLASSIFY_LABEL: &str = "Searching for unreferenced assets";

/// Referencers of one requested path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceReport {
    pub path: String,
    /// Assets that directly depend on `path`, in index order.
    pub referencers: Vec<String>,
    /// `false` when `path` was not in the index; `referencers` is then empty.
    pub found: bool,
    /// Loadable by address, so it may be used without any reference.
    pub is_addressable: bool,
    /// Inside a `Resources` folder, so it may be loaded from code.
    pub in_resources: bool,
}

/// `true` for paths inside a `Resources` folder.
pub fn is_in_resources(path: &str) -> bool {
    path.contains("/Resources/") || path.contains("\\Resources\\")
}

#[derive(Debug, Default)]
pub struct HuntEngine {
    config: AnalysisConfig,
    rules: IgnoreRules,
    direct: Option<ReverseIndex>,
    transitive: Option<ReverseIndex>,
    result: Option<AnalysisResult>,
    changes: Option<ChangeFeed>,
}

impl HuntEngine {
    pub fn new(config: AnalysisConfig, rules: IgnoreRules) -> Self {
        Self {
            config,
            rules,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Mutable config. Takes effect on the next [`analyse`](Self::analyse).
    pub fn config_mut(&mut self) -> &mut AnalysisConfig {
        &mut self.config
    }

    pub fn rules(&self) -> &IgnoreRules {
        &self.rules
    }

    /// Mutable ignore rules. Takes effect on the next [`analyse`](Self::analyse).
    pub fn rules_mut(&mut self) -> &mut IgnoreRules {
        &mut self.rules
    }

    /// Invalidate on every change reported through `feed`.
    pub fn attach_changes(&mut self, feed: ChangeFeed) {
        self.changes = Some(feed);
    }

    /// The current result, if an analysis has run since the last invalidation.
    /// `None` while the attached feed holds changes that were not polled yet.
    pub fn result(&self) -> Option<&AnalysisResult> {
        if self.is_stale() {
            return None;
        }
        self.result.as_ref()
    }

    /// Cached index for `depth`, if one is held and no change is pending.
    pub fn index(&self, depth: DependencyDepth) -> Option<&ReverseIndex> {
        if self.is_stale() {
            return None;
        }
        match depth {
            DependencyDepth::Direct => self.direct.as_ref(),
            DependencyDepth::Transitive => self.transitive.as_ref(),
        }
    }

    fn is_stale(&self) -> bool {
        self.changes.as_ref().is_some_and(ChangeFeed::is_dirty)
    }

    fn slot(&mut self, depth: DependencyDepth) -> &mut Option<ReverseIndex> {
        match depth {
            DependencyDepth::Direct => &mut self.direct,
            DependencyDepth::Transitive => &mut self.transitive,
        }
    }

    fn builder(&self, depth: DependencyDepth) -> ReverseIndexBuilder {
        ReverseIndexBuilder::new(depth).with_unknown_dependencies(self.config.unknown_dependencies)
    }

    /// Full scan: rebuild the reverse index at the configured depth, then
    /// classify every asset into a fresh [`AnalysisResult`].
    pub fn analyse(
        &mut self,
        meta: &dyn AssetMetadataProvider,
        roots: &dyn BuildRootsProvider,
        progress: &dyn ProgressSink,
    ) -> &AnalysisResult {
        self.poll_changes();
        let start = Instant::now();
        let depth = self.config.depth;
        let mode = self.config.mode();
        info!("Analysis started ({mode:?}, {} dependencies)", depth.label());

        let index = self.builder(depth).build(meta, progress);
        let classifier = AssetClassifier::new(BuildRoots::from_provider(roots));
        let result = classify_all(&index, meta, &classifier, &self.rules, mode, progress);

        info!(
            "Analysis finished in {:?}: {}",
            start.elapsed(),
            result.summary()
        );
        *self.slot(depth) = Some(index);
        self.result.insert(result)
    }

    /// Run `state` against the current result using the configured page size.
    /// `None` under the same conditions as [`result`](Self::result).
    pub fn query(&self, state: &QueryState) -> Option<QueryPage<'_>> {
        self.result()
            .map(|result| run_query(result, state, self.config.page_size))
    }

    /// Point query with a freshly built direct index.
    pub fn find_references(
        &mut self,
        paths: &[String],
        meta: &dyn AssetMetadataProvider,
        progress: &dyn ProgressSink,
    ) -> Vec<ReferenceReport> {
        self.poll_changes();
        self.direct = Some(self.builder(DependencyDepth::Direct).build(meta, progress));
        self.lookup_references(paths, meta)
    }

    /// Point query reusing the cached direct index when there is one.
    pub fn find_references_cached(
        &mut self,
        paths: &[String],
        meta: &dyn AssetMetadataProvider,
        progress: &dyn ProgressSink,
    ) -> Vec<ReferenceReport> {
        self.poll_changes();
        if self.direct.is_none() {
            self.direct = Some(self.builder(DependencyDepth::Direct).build(meta, progress));
        } else {
            debug!("Reusing cached direct reverse index");
        }
        self.lookup_references(paths, meta)
    }

    fn lookup_references(
        &self,
        paths: &[String],
        meta: &dyn AssetMetadataProvider,
    ) -> Vec<ReferenceReport> {
        if paths.is_empty() {
            info!("No paths passed to find references for");
        }
        let index = self.direct.as_ref();
        paths
            .iter()
            .map(|path| {
                let referencers = index.and_then(|index| index.referencers(path));
                if referencers.is_none() {
                    warn!("{path} is not in the reverse dependency index");
                }
                ReferenceReport {
                    path: path.clone(),
                    referencers: referencers.map(<[String]>::to_vec).unwrap_or_default(),
                    found: referencers.is_some(),
                    is_addressable: meta.is_addressable(path),
                    in_resources: is_in_resources(path),
                }
            })
            .collect()
    }

    /// Delete `paths` through `repo`. Only successful removals are counted.
    /// Any removal refreshes the repository and invalidates all cached state.
    pub fn delete_selected(&mut self, repo: &mut dyn AssetRepository, paths: &[String]) -> usize {
        let mut deleted = 0;
        for path in paths {
            if repo.delete(path) {
                deleted += 1;
            } else {
                debug!("Nothing to delete at {path}");
            }
        }
        info!("Deleted {deleted} assets");

        if deleted > 0 {
            repo.refresh();
            self.invalidate();
            // Our own deletions may echo back through the feed; everything
            // is already invalid, so drop all of them.
            if let Some(feed) = &self.changes {
                while !feed.drain().is_empty() {}
            }
        }
        deleted
    }

    /// Drop both cached indices and the current result.
    pub fn invalidate(&mut self) {
        if self.direct.is_some() || self.transitive.is_some() || self.result.is_some() {
            debug!("Invalidating cached reverse index and analysis result");
        }
        self.direct = None;
        self.transitive = None;
        self.result = None;
    }

    /// Drain pending repository changes; invalidate if there were any.
    /// Returns the number of changes drained.
    pub fn poll_changes(&mut self) -> usize {
        let Some(feed) = &self.changes else {
            return 0;
        };
        let batch = feed.drain();
        if batch.is_empty() {
            return 0;
        }
        debug!("{} repository changes received", batch.changes.len());
        self.invalidate();
        batch.changes.len().max(1)
    }
}

/// Classify every indexed asset.
///
/// Per asset: atlas override, unreferenced-only cut, ignore check, type
/// validity (unknown types are only reported for paths that are not
/// ignored), then ignored paths are collected and the rest become records.
fn classify_all(
    index: &ReverseIndex,
    meta: &dyn AssetMetadataProvider,
    classifier: &AssetClassifier,
    rules: &IgnoreRules,
    mode: AnalysisMode,
    progress: &dyn ProgressSink,
) -> AnalysisResult {
    let start = Instant::now();
    let total = index.len();
    let mut assets = Vec::new();
    let mut ignored = Vec::new();

    for (i, (path, referencers)) in index.iter().enumerate() {
        progress.report(CLASSIFY_LABEL, (i + 1) as f32 / total as f32);

        let asset_type = meta.type_of(path);
        let classification =
            classifier.classify(path, asset_type.as_ref(), referencers, |p| meta.type_of(p));

        if mode == AnalysisMode::UnreferencedOnly && classification.references_count != 0 {
            continue;
        }

        let allowed = rules.is_allowed(path);
        if classification.verdict == Verdict::UnknownType && allowed {
            warn!("Invalid asset type found at {path}");
        }
        let Some(asset_type) = asset_type.filter(|_| classification.valid()) else {
            continue;
        };
        if !allowed {
            ignored.push(path.to_string());
            continue;
        }

        assets.push(AssetRecord {
            path: path.to_string(),
            type_name: CompactString::new(asset_type.name()),
            size_bytes: meta.file_size_bytes(path),
            is_addressable: meta.is_addressable(path),
            references_count: classification.references_count,
            warning: classification.warning,
            valid: true,
        });
    }

    if total == 0 {
        progress.report(CLASSIFY_LABEL, 1.0);
    }
    if !ignored.is_empty() {
        let listing = ignored.iter().fold(
            String::from("Assets ignored by pattern:"),
            |mut out, path| {
                let _ = write!(out, "\n{path}");
                out
            },
        );
        debug!("{listing}");
    }
    progress.finish(CLASSIFY_LABEL, start.elapsed());

    AnalysisResult::new(mode, assets, ignored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::progress::NoopProgress;
    use crate::index::UnknownDependencyPolicy;
    use crate::monitor::{change_feed, RepositoryChange, MAX_CHANGES_PER_POLL};
    use crate::provider::{Manifest, ManifestEntry, ManifestProvider};
    use std::cell::Cell;

    fn provider() -> ManifestProvider {
        ManifestProvider::new(
            Manifest {
                assets: vec![
                    ManifestEntry::new("Assets/a.png").with_size(100),
                    ManifestEntry::new("Assets/b.mat")
                        .with_dependencies(["Assets/a.png"])
                        .with_size(200),
                    ManifestEntry::new("Assets/scene.unity").with_size(300),
                    ManifestEntry::new("Assets/notes.txt").with_size(10),
                    ManifestEntry::new("Assets/Player.cs").with_size(50),
                    ManifestEntry::new("Assets/blob.xyz").with_size(1),
                    ManifestEntry::new("Assets/button.png").with_size(400),
                    ManifestEntry::new("Assets/ui.spriteatlas")
                        .with_dependencies(["Assets/button.png"])
                        .with_size(500),
                    ManifestEntry::new("Assets/Resources/loaded.prefab")
                        .with_size(600)
                        .addressable(),
                ],
                scenes: vec!["Assets/scene.unity".into()],
                ..Manifest::default()
            },
            None,
        )
    }

    fn engine(unreferenced_only: bool) -> HuntEngine {
        let config = AnalysisConfig {
            unreferenced_only,
            ..AnalysisConfig::default()
        };
        HuntEngine::new(config, IgnoreRules::new([r"\.txt$"]))
    }

    fn paths(result: &AnalysisResult) -> Vec<&str> {
        result.assets().iter().map(|a| a.path.as_str()).collect()
    }

    #[test]
    fn unreferenced_scan_reports_orphans_only() {
        let meta = provider();
        let mut engine = engine(true);
        let result = engine.analyse(&meta, &meta, &NoopProgress);

        assert_eq!(
            paths(result),
            vec![
                "Assets/Resources/loaded.prefab",
                "Assets/b.mat",
                "Assets/button.png",
                "Assets/ui.spriteatlas",
            ]
        );
        assert_eq!(result.ignored(), ["Assets/notes.txt".to_string()]);
        let button = result.get("Assets/button.png").unwrap();
        assert_eq!(button.references_count, 0);
        assert!(button.warning.as_deref().unwrap().contains("Assets/ui.spriteatlas"));
    }

    #[test]
    fn all_assets_scan_keeps_counts() {
        let meta = provider();
        let mut engine = engine(false);
        let result = engine.analyse(&meta, &meta, &NoopProgress);

        assert_eq!(result.get("Assets/a.png").unwrap().references_count, 1);
        assert_eq!(result.get("Assets/b.mat").unwrap().references_count, 0);
        assert!(result.get("Assets/scene.unity").is_none());
        assert!(result.get("Assets/Player.cs").is_none());
        assert!(result.get("Assets/blob.xyz").is_none());
        assert_eq!(result.mode(), AnalysisMode::AllAssets);
        assert!(result.summary().starts_with("Assets: total = 5"));
    }

    #[test]
    fn records_carry_metadata() {
        let meta = provider();
        let mut engine = engine(true);
        let result = engine.analyse(&meta, &meta, &NoopProgress);
        let prefab = result.get("Assets/Resources/loaded.prefab").unwrap();
        assert_eq!(prefab.size_bytes, 600);
        assert!(prefab.is_addressable);
        assert!(prefab.valid);
        assert_eq!(prefab.type_name, "GameObject");
    }

    #[test]
    fn analyse_caches_the_configured_depth_only() {
        let meta = provider();
        let mut engine = engine(true);
        engine.analyse(&meta, &meta, &NoopProgress);
        assert!(engine.index(DependencyDepth::Direct).is_some());
        assert!(engine.index(DependencyDepth::Transitive).is_none());

        engine.config_mut().depth = DependencyDepth::Transitive;
        engine.analyse(&meta, &meta, &NoopProgress);
        assert!(engine.index(DependencyDepth::Transitive).is_some());
        assert!(engine.index(DependencyDepth::Direct).is_some());
    }

    #[test]
    fn query_uses_configured_page_size() {
        let meta = provider();
        let mut engine = engine(true);
        assert!(engine.query(&QueryState::new()).is_none());

        engine.config_mut().page_size = 3;
        engine.analyse(&meta, &meta, &NoopProgress);
        let state = QueryState {
            page: Some(1),
            ..QueryState::default()
        };
        let page = engine.query(&state).unwrap();
        assert_eq!(page.total_filtered, 4);
        assert_eq!(page.page_count, 2);
        assert_eq!(page.items.len(), 1);
    }

    #[test]
    fn find_references_reports_hints_and_misses() {
        let meta = provider();
        let mut engine = engine(true);
        let reports = engine.find_references(
            &[
                "Assets/a.png".to_string(),
                "Assets/Resources/loaded.prefab".to_string(),
                "Assets/missing.png".to_string(),
            ],
            &meta,
            &NoopProgress,
        );

        assert_eq!(reports[0].referencers, vec!["Assets/b.mat".to_string()]);
        assert!(reports[0].found);
        assert!(!reports[0].in_resources);

        assert!(reports[1].referencers.is_empty());
        assert!(reports[1].is_addressable);
        assert!(reports[1].in_resources);

        assert!(!reports[2].found);
        assert!(reports[2].referencers.is_empty());
    }

    #[test]
    fn cached_lookup_reuses_the_index() {
        let meta = provider();
        let mut engine = engine(true);
        let builds = Cell::new(0);
        let counting = |label: &str, fraction: f32| {
            if label.starts_with("Creating a map") && fraction >= 1.0 {
                builds.set(builds.get() + 1);
            }
        };
        let query = ["Assets/a.png".to_string()];

        engine.find_references_cached(&query, &meta, &counting);
        engine.find_references_cached(&query, &meta, &counting);
        assert_eq!(builds.get(), 1);

        engine.find_references(&query, &meta, &counting);
        assert_eq!(builds.get(), 2);
    }

    #[test]
    fn deletion_invalidates_everything() {
        let mut meta = provider();
        let mut engine = engine(true);
        engine.analyse(&meta, &meta, &NoopProgress);

        let deleted = engine.delete_selected(
            &mut meta,
            &["Assets/b.mat".to_string(), "Assets/nope.mat".to_string()],
        );
        assert_eq!(deleted, 1);
        assert!(engine.result().is_none());
        assert!(engine.index(DependencyDepth::Direct).is_none());

        let result = engine.analyse(&meta, &meta, &NoopProgress);
        assert!(result.get("Assets/b.mat").is_none());
        assert!(result.get("Assets/a.png").is_some());
    }

    #[test]
    fn failed_deletion_keeps_state() {
        let mut meta = provider();
        let mut engine = engine(true);
        engine.analyse(&meta, &meta, &NoopProgress);
        let deleted = engine.delete_selected(&mut meta, &["Assets/nope.mat".to_string()]);
        assert_eq!(deleted, 0);
        assert!(engine.result().is_some());
    }

    #[test]
    fn repository_changes_invalidate() {
        let meta = provider();
        let mut engine = engine(true);
        let (notifier, feed) = change_feed();
        engine.attach_changes(feed);
        engine.analyse(&meta, &meta, &NoopProgress);
        assert_eq!(engine.poll_changes(), 0);
        assert!(engine.result().is_some());

        notifier.notify(RepositoryChange::Modified("Assets/b.mat".into()));
        assert_eq!(engine.poll_changes(), 1);
        assert!(engine.result().is_none());
    }

    #[test]
    fn unpolled_change_hides_the_snapshot() {
        let meta = provider();
        let mut engine = engine(true);
        let (notifier, feed) = change_feed();
        engine.attach_changes(feed);
        engine.analyse(&meta, &meta, &NoopProgress);
        assert!(engine.query(&QueryState::new()).is_some());

        notifier.notify(RepositoryChange::Removed("Assets/a.png".into()));
        assert!(engine.query(&QueryState::new()).is_none());
        assert!(engine.result().is_none());
        assert!(engine.index(DependencyDepth::Direct).is_none());

        // Polling drops the snapshot for good.
        assert_eq!(engine.poll_changes(), 1);
        assert!(engine.query(&QueryState::new()).is_none());
        engine.analyse(&meta, &meta, &NoopProgress);
        assert!(engine.query(&QueryState::new()).is_some());
    }

    #[test]
    fn deletion_discards_every_echo() {
        let mut meta = provider();
        let mut engine = engine(true);
        let (notifier, feed) = change_feed();
        engine.attach_changes(feed);
        engine.analyse(&meta, &meta, &NoopProgress);

        for i in 0..MAX_CHANGES_PER_POLL * 2 + 1 {
            notifier.notify(RepositoryChange::Removed(format!("Assets/gone{i}.png")));
        }
        assert_eq!(engine.delete_selected(&mut meta, &["Assets/b.mat".to_string()]), 1);
        assert_eq!(engine.poll_changes(), 0);

        let builds = Cell::new(0);
        let counting = |label: &str, fraction: f32| {
            if label.starts_with("Creating a map") && fraction >= 1.0 {
                builds.set(builds.get() + 1);
            }
        };
        let query = ["Assets/a.png".to_string()];
        engine.find_references_cached(&query, &meta, &counting);
        engine.find_references_cached(&query, &meta, &counting);
        assert_eq!(builds.get(), 1);
    }

    #[test]
    fn dangling_policy_flows_into_the_index() {
        let meta = ManifestProvider::new(
            Manifest {
                assets: vec![ManifestEntry::new("Assets/b.mat")
                    .with_dependencies(["Assets/gone.png"])
                    .with_size(1)],
                ..Manifest::default()
            },
            None,
        );
        let config = AnalysisConfig {
            unknown_dependencies: UnknownDependencyPolicy::Report,
            ..AnalysisConfig::default()
        };
        let mut engine = HuntEngine::new(config, IgnoreRules::empty());
        engine.analyse(&meta, &meta, &NoopProgress);
        let index = engine.index(DependencyDepth::Direct).unwrap();
        assert_eq!(index.dangling().len(), 1);
        assert_eq!(index.dangling()[0].to, "Assets/gone.png");
    }

    #[test]
    fn resources_detection() {
        assert!(is_in_resources("Assets/Resources/a.png"));
        assert!(is_in_resources("Assets\\Resources\\a.png"));
        assert!(!is_in_resources("Assets/MyResources/a.png"));
    }
}
