/// JSON manifest provider.
///
/// A manifest is a snapshot of a repository's asset metadata:
///
/// ```json
/// {
///   "assets": [
///     { "path": "Assets/a.png" },
///     { "path": "Assets/b.mat", "type": "Material", "dependencies": ["Assets/a.png"] },
///     { "path": "Assets/Main.unity", "size": 2048, "addressable": false }
///   ],
///   "scenes": ["Assets/Main.unity"],
///   "icons": { "Android": ["Assets/icon.png"], "iOS": ["Assets/icon.png"] }
/// }
/// ```
///
/// Missing `type` tags are inferred from the file extension. Missing sizes
/// are read from disk relative to the manifest's directory.
use super::{AssetMetadataProvider, AssetRepository, BuildRootsProvider};
use crate::error::{HuntError, Result};
use crate::model::{infer_type_from_path, AssetType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// One asset in a manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub path: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub addressable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl ManifestEntry {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_type(mut self, tag: impl Into<String>) -> Self {
        self.type_tag = Some(tag.into());
        self
    }

    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn addressable(mut self) -> Self {
        self.addressable = true;
        self
    }
}

/// Serialised manifest document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub assets: Vec<ManifestEntry>,
    /// Scenes registered in the build.
    #[serde(default)]
    pub scenes: Vec<String>,
    /// Icon textures per target configuration.
    #[serde(default)]
    pub icons: BTreeMap<String, Vec<String>>,
}

/// [`AssetMetadataProvider`], [`BuildRootsProvider`] and [`AssetRepository`]
/// backed by an in-memory [`Manifest`].
#[derive(Debug, Clone)]
pub struct ManifestProvider {
    manifest: Manifest,
    /// Directory sizes and deletable files are resolved against.
    root: Option<PathBuf>,
    /// Also remove the file under `root` when an asset is deleted.
    delete_files: bool,
    lookup: HashMap<String, usize>,
}

impl ManifestProvider {
    /// Wrap an already-parsed manifest. `root` is used to read sizes that
    /// the manifest does not carry.
    pub fn new(manifest: Manifest, root: Option<PathBuf>) -> Self {
        let lookup = build_lookup(&manifest.assets);
        Self {
            manifest,
            root,
            delete_files: false,
            lookup,
        }
    }

    /// Load a manifest file. Its parent directory becomes the size root.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let manifest: Manifest = serde_json::from_str(&content)?;
        if let Some(dup) = first_duplicate(&manifest.assets) {
            return Err(HuntError::Manifest(format!(
                "duplicate asset path `{dup}` in {}",
                path.display()
            )));
        }
        let root = path.parent().map(Path::to_path_buf);
        debug!(
            "Loaded manifest {} with {} assets",
            path.display(),
            manifest.assets.len()
        );
        Ok(Self::new(manifest, root))
    }

    /// Write the (possibly mutated) manifest back as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.manifest)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Make [`AssetRepository::delete`] remove files under the root too.
    pub fn with_file_deletion(mut self, enabled: bool) -> Self {
        self.delete_files = enabled;
        self
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    fn entry(&self, path: &str) -> Option<&ManifestEntry> {
        self.lookup.get(path).map(|&i| &self.manifest.assets[i])
    }
}

fn build_lookup(assets: &[ManifestEntry]) -> HashMap<String, usize> {
    assets
        .iter()
        .enumerate()
        .map(|(i, entry)| (entry.path.clone(), i))
        .collect()
}

fn first_duplicate(assets: &[ManifestEntry]) -> Option<&str> {
    let mut seen = HashSet::with_capacity(assets.len());
    assets
        .iter()
        .find(|entry| !seen.insert(entry.path.as_str()))
        .map(|entry| entry.path.as_str())
}

impl AssetMetadataProvider for ManifestProvider {
    fn list_all_paths(&self) -> Vec<String> {
        self.manifest.assets.iter().map(|e| e.path.clone()).collect()
    }

    fn direct_dependencies(&self, path: &str) -> Vec<String> {
        self.entry(path)
            .map(|e| e.dependencies.clone())
            .unwrap_or_default()
    }

    /// Depth-first closure over direct dependencies, in discovery order.
    /// Cycles are legal and simply stop at already-visited nodes.
    fn transitive_dependencies(&self, path: &str) -> Vec<String> {
        let mut visited: HashSet<&str> = HashSet::new();
        visited.insert(path);
        let mut out = Vec::new();
        let mut stack: Vec<&str> = match self.entry(path) {
            Some(e) => e.dependencies.iter().rev().map(String::as_str).collect(),
            None => return out,
        };

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            out.push(current.to_string());
            if let Some(e) = self.entry(current) {
                stack.extend(e.dependencies.iter().rev().map(String::as_str));
            }
        }
        out
    }

    fn type_of(&self, path: &str) -> Option<AssetType> {
        let entry = self.entry(path)?;
        match entry.type_tag.as_deref() {
            Some(tag) => AssetType::from_tag(tag),
            None => infer_type_from_path(path),
        }
    }

    fn file_size_bytes(&self, path: &str) -> u64 {
        if let Some(size) = self.entry(path).and_then(|e| e.size) {
            return size;
        }
        let Some(root) = &self.root else {
            return 0;
        };
        let Some(file) = resolve_under(root, path) else {
            return 0;
        };
        match std::fs::metadata(file) {
            Ok(meta) => meta.len(),
            Err(e) => {
                warn!("Error reading file {path}: {e}. Unable to detect its size.");
                0
            }
        }
    }

    fn is_addressable(&self, path: &str) -> bool {
        self.entry(path).is_some_and(|e| e.addressable)
    }
}

impl BuildRootsProvider for ManifestProvider {
    fn registered_scene_roots(&self) -> HashSet<String> {
        self.manifest.scenes.iter().cloned().collect()
    }

    fn registered_icon_paths(&self) -> HashSet<String> {
        self.manifest.icons.values().flatten().cloned().collect()
    }
}

impl AssetRepository for ManifestProvider {
    fn delete(&mut self, path: &str) -> bool {
        let Some(&index) = self.lookup.get(path) else {
            return false;
        };

        if self.delete_files {
            if let Some(root) = &self.root {
                let Some(file) = resolve_under(root, path) else {
                    return false;
                };
                if let Err(e) = std::fs::remove_file(&file) {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        warn!("Failed to delete {}: {e}", file.display());
                        return false;
                    }
                }
            }
        }

        self.manifest.assets.remove(index);
        self.manifest.scenes.retain(|s| s != path);
        for icons in self.manifest.icons.values_mut() {
            icons.retain(|i| i != path);
        }
        self.lookup = build_lookup(&self.manifest.assets);
        true
    }
}

/// Join a manifest path onto `root`, refusing anything that could land
/// outside it: absolute paths, drive prefixes and `..` components.
fn resolve_under(root: &Path, path: &str) -> Option<PathBuf> {
    let relative = Path::new(path);
    let escapes = relative.is_absolute()
        || relative
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
    if escapes {
        warn!("Refusing path outside the repository root: {path}");
        return None;
    }
    Some(root.join(relative))
}
