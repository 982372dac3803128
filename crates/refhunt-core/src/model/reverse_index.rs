/// Reverse-dependency map: for every known asset, the assets that
/// directly (or transitively) depend on it.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which forward-dependency set an index was built from.
///
/// Direct and transitive indexes answer different questions and are kept
/// as separate values; nothing ever merges one into the other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyDepth {
    #[default]
    Direct,
    Transitive,
}

impl DependencyDepth {
    pub fn label(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Transitive => "transitive",
        }
    }
}

/// A forward edge whose target is not in the known path set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingEdge {
    /// The asset declaring the dependency.
    pub from: String,
    /// The unknown dependency target.
    pub to: String,
}

/// Reverse-dependency index produced by
/// [`ReverseIndexBuilder`](crate::index::ReverseIndexBuilder).
///
/// Invariants:
/// - every known path has an entry, possibly empty;
/// - no path appears in its own referencer list;
/// - a referencer appears at most once per entry.
///
/// Keys are kept in a `BTreeMap` so iteration order is independent of the
/// order the provider listed paths in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReverseIndex {
    depth: DependencyDepth,
    entries: BTreeMap<String, Vec<String>>,
    dangling: Vec<DanglingEdge>,
}

impl ReverseIndex {
    /// Create an index with one empty entry per path.
    pub fn with_paths<I, S>(depth: DependencyDepth, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            depth,
            entries: paths.into_iter().map(|p| (p.into(), Vec::new())).collect(),
            dangling: Vec::new(),
        }
    }

    /// Record that `referencer` depends on `target`.
    ///
    /// Returns `false` (and records nothing) when `target` is unknown or the
    /// edge is a self-reference.
    pub(crate) fn add_edge(&mut self, target: &str, referencer: &str) -> bool {
        if target == referencer {
            return false;
        }
        match self.entries.get_mut(target) {
            Some(list) => {
                if !list.iter().any(|r| r == referencer) {
                    list.push(referencer.to_string());
                }
                true
            }
            None => false,
        }
    }

    pub(crate) fn push_dangling(&mut self, edge: DanglingEdge) {
        self.dangling.push(edge);
    }

    /// Referencers of `path`, or `None` if the path was not known at build time.
    pub fn referencers(&self, path: &str) -> Option<&[String]> {
        self.entries.get(path).map(Vec::as_slice)
    }

    /// Number of referencers of `path` (0 for unknown paths).
    pub fn references_count(&self, path: &str) -> usize {
        self.entries.get(path).map_or(0, Vec::len)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Iterate `(path, referencers)` in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(path, refs)| (path.as_str(), refs.as_slice()))
    }

    /// Edges that pointed outside the known set. Only populated when the
    /// builder runs with [`UnknownDependencyPolicy::Report`](crate::index::UnknownDependencyPolicy).
    pub fn dangling(&self) -> &[DanglingEdge] {
        &self.dangling
    }

    pub fn depth(&self) -> DependencyDepth {
        self.depth
    }

    /// Number of known paths.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
