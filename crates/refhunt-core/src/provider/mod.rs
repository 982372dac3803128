/// Collaborators the engine depends on but does not implement itself.
///
/// The engine only ever talks to these traits. [`manifest`] provides a
/// JSON-backed implementation of all three, used by the CLI and the tests.
pub mod manifest;

pub use manifest::{Manifest, ManifestEntry, ManifestProvider};

use crate::model::{AssetType, DependencyDepth};
use std::collections::HashSet;

/// Source of the asset list, forward dependency edges and per-asset metadata.
pub trait AssetMetadataProvider {
    /// Every asset path in the repository.
    fn list_all_paths(&self) -> Vec<String>;

    /// Assets `path` needs directly.
    fn direct_dependencies(&self, path: &str) -> Vec<String>;

    /// Assets `path` needs directly or through any chain of dependencies.
    fn transitive_dependencies(&self, path: &str) -> Vec<String>;

    /// Resolved type of `path`, or `None` if it cannot be determined.
    fn type_of(&self, path: &str) -> Option<AssetType>;

    /// On-disk size of `path`. Must not fail: log and return 0 instead.
    fn file_size_bytes(&self, path: &str) -> u64;

    /// Whether `path` is loadable by address at runtime.
    fn is_addressable(&self, _path: &str) -> bool {
        false
    }

    /// Forward dependencies at the requested depth.
    fn dependencies(&self, path: &str, depth: DependencyDepth) -> Vec<String> {
        match depth {
            DependencyDepth::Direct => self.direct_dependencies(path),
            DependencyDepth::Transitive => self.transitive_dependencies(path),
        }
    }
}

/// Assets that are always in use regardless of reference count.
pub trait BuildRootsProvider {
    /// Scenes registered in the build.
    fn registered_scene_roots(&self) -> HashSet<String>;

    /// Icon textures, aggregated across every target configuration.
    fn registered_icon_paths(&self) -> HashSet<String>;
}

/// Mutation side of the repository.
pub trait AssetRepository {
    /// Remove `path`. Returns `true` only if something was actually removed.
    fn delete(&mut self, path: &str) -> bool;

    /// Called once after a batch of successful deletions.
    fn refresh(&mut self) {}
}
