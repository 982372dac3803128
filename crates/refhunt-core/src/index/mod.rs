/// Reverse-dependency index construction.
///
/// Walks every known asset once, asks the metadata provider for its forward
/// dependencies and inverts the edges. The build is synchronous and
/// reports progress after each asset.
pub mod progress;

use crate::model::{DanglingEdge, DependencyDepth, ReverseIndex};
use crate::provider::AssetMetadataProvider;
use progress::ProgressSink;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

/// What to do with a dependency whose target is not a known path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownDependencyPolicy {
    /// Drop the edge silently.
    #[default]
    Ignore,
    /// Keep the edge on [`ReverseIndex::dangling`] and log a warning.
    Report,
}

/// Builds a [`ReverseIndex`] for one dependency depth.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReverseIndexBuilder {
    depth: DependencyDepth,
    unknown_dependencies: UnknownDependencyPolicy,
}

impl ReverseIndexBuilder {
    pub fn new(depth: DependencyDepth) -> Self {
        Self {
            depth,
            unknown_dependencies: UnknownDependencyPolicy::default(),
        }
    }

    pub fn with_unknown_dependencies(mut self, policy: UnknownDependencyPolicy) -> Self {
        self.unknown_dependencies = policy;
        self
    }

    pub fn depth(&self) -> DependencyDepth {
        self.depth
    }

    /// Progress label shown while this builder runs.
    pub fn label(&self) -> String {
        format!("Creating a map of {} dependencies", self.depth.label())
    }

    /// Build from everything the provider knows about.
    pub fn build(
        &self,
        provider: &dyn AssetMetadataProvider,
        progress: &dyn ProgressSink,
    ) -> ReverseIndex {
        let paths = provider.list_all_paths();
        info!("Total assets count: {}", paths.len());
        self.build_from(&paths, |path| provider.dependencies(path, self.depth), progress)
    }

    /// Build from an explicit path list and dependency function.
    ///
    /// Referencer lists follow the order of `paths`, so a fixed input always
    /// produces an identical index.
    pub fn build_from<F>(
        &self,
        paths: &[String],
        mut deps_of: F,
        progress: &dyn ProgressSink,
    ) -> ReverseIndex
    where
        F: FnMut(&str) -> Vec<String>,
    {
        let start = Instant::now();
        let label = self.label();
        let mut index = ReverseIndex::with_paths(self.depth, paths.iter().cloned());
        let mut dropped: u64 = 0;

        let total = paths.len();
        if total == 0 {
            progress.report(&label, 1.0);
        }

        for (i, path) in paths.iter().enumerate() {
            for dependency in deps_of(path) {
                if dependency == *path {
                    continue;
                }
                if index.add_edge(&dependency, path) {
                    continue;
                }
                match self.unknown_dependencies {
                    UnknownDependencyPolicy::Ignore => dropped += 1,
                    UnknownDependencyPolicy::Report => {
                        warn!("{path} depends on unknown asset {dependency}");
                        index.push_dangling(DanglingEdge {
                            from: path.clone(),
                            to: dependency,
                        });
                    }
                }
            }
            progress.report(&label, (i + 1) as f32 / total as f32);
        }

        if dropped > 0 {
            debug!("Dropped {dropped} dependency edges pointing outside the known asset set");
        }
        let duration = start.elapsed();
        debug!(
            "Built {} reverse index over {} assets in {duration:?}",
            self.depth.label(),
            index.len()
        );
        progress.finish(&label, duration);
        index
    }
}
