/// Analysis configuration, loadable from a JSON file.
use crate::error::Result;
use crate::index::UnknownDependencyPolicy;
use crate::model::{AnalysisMode, DependencyDepth};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default number of rows per result page.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Knobs for one analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Keep only unreferenced assets (`true`) or every asset (`false`).
    pub unreferenced_only: bool,
    /// Handling of dependency edges that point at unknown paths.
    pub unknown_dependencies: UnknownDependencyPolicy,
    /// Dependency depth used for the whole-repository scan.
    pub depth: DependencyDepth,
    /// Rows per page for paginated queries.
    pub page_size: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            unreferenced_only: true,
            unknown_dependencies: UnknownDependencyPolicy::Ignore,
            depth: DependencyDepth::Direct,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl AnalysisConfig {
    pub fn mode(&self) -> AnalysisMode {
        if self.unreferenced_only {
            AnalysisMode::UnreferencedOnly
        } else {
            AnalysisMode::AllAssets
        }
    }

    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&content)?;
        if config.page_size == 0 {
            config.page_size = DEFAULT_PAGE_SIZE;
        }
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}
