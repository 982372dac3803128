/// Immutable snapshot of one analysis run.
use super::asset::AssetRecord;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What an analysis run keeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    /// Only assets whose (overridden) reference count is zero.
    #[default]
    UnreferencedOnly,
    /// Every classified asset, with its reference count.
    AllAssets,
}

/// The classified asset list plus per-type totals.
///
/// `type_counts` is computed once, here, from the full asset list. Query
/// filters never touch it.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    mode: AnalysisMode,
    assets: Vec<AssetRecord>,
    type_counts: BTreeMap<String, usize>,
    ignored: Vec<String>,
    analysed_at: DateTime<Local>,
}

impl AnalysisResult {
    /// Build a snapshot. Assets are put in path-ascending order, which is
    /// the baseline order every query sort starts from.
    pub fn new(mode: AnalysisMode, mut assets: Vec<AssetRecord>, ignored: Vec<String>) -> Self {
        assets.sort_by(|a, b| a.path.cmp(&b.path));

        let mut type_counts: BTreeMap<String, usize> = BTreeMap::new();
        for asset in &assets {
            *type_counts.entry(asset.type_name.to_string()).or_insert(0) += 1;
        }

        Self {
            mode,
            assets,
            type_counts,
            ignored,
            analysed_at: Local::now(),
        }
    }

    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    /// All reportable assets, path-ascending.
    pub fn assets(&self) -> &[AssetRecord] {
        &self.assets
    }

    /// Asset count per type name over the unfiltered result.
    pub fn type_counts(&self) -> &BTreeMap<String, usize> {
        &self.type_counts
    }

    /// Paths that would have been reported but matched an ignore pattern.
    pub fn ignored(&self) -> &[String] {
        &self.ignored
    }

    pub fn analysed_at(&self) -> DateTime<Local> {
        self.analysed_at
    }

    pub fn get(&self, path: &str) -> Option<&AssetRecord> {
        self.assets
            .binary_search_by(|a| a.path.as_str().cmp(path))
            .ok()
            .map(|i| &self.assets[i])
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// One-line description of the run, e.g. `Unreferenced assets: 12`.
    ///
    /// The addressable split is only included when at least one asset is
    /// addressable.
    pub fn summary(&self) -> String {
        let total = self.assets.len();
        let addressable = self.assets.iter().filter(|a| a.is_addressable).count();

        match self.mode {
            AnalysisMode::UnreferencedOnly => {
                if addressable > 0 {
                    format!(
                        "Unreferenced assets: total = {total}, addressable = {addressable}, common = {}",
                        total - addressable
                    )
                } else {
                    format!("Unreferenced assets: {total}")
                }
            }
            AnalysisMode::AllAssets => {
                let unreferenced = self
                    .assets
                    .iter()
                    .filter(|a| a.references_count == 0)
                    .count();
                if addressable > 0 {
                    let unreferenced_addressable = self
                        .assets
                        .iter()
                        .filter(|a| a.is_addressable && a.references_count == 0)
                        .count();
                    format!(
                        "Assets: total = {total}, unreferenced = {unreferenced}, \
                         unreferenced addressable = {unreferenced_addressable}, \
                         unreferenced common = {}",
                        unreferenced - unreferenced_addressable
                    )
                } else {
                    format!("Assets: total = {total}, unreferenced = {unreferenced}")
                }
            }
        }
    }
}
