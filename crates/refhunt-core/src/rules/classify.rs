/// Asset classification: which assets may be reported, and whose reference
/// count should be overridden.
use crate::model::AssetType;
use crate::provider::BuildRootsProvider;
use std::collections::HashSet;

/// Snapshot of the always-in-use paths for one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildRoots {
    scenes: HashSet<String>,
    icons: HashSet<String>,
}

impl BuildRoots {
    pub fn new(scenes: HashSet<String>, icons: HashSet<String>) -> Self {
        Self { scenes, icons }
    }

    pub fn from_provider(provider: &dyn BuildRootsProvider) -> Self {
        Self::new(
            provider.registered_scene_roots(),
            provider.registered_icon_paths(),
        )
    }

    pub fn is_registered_scene(&self, path: &str) -> bool {
        self.scenes.contains(path)
    }

    pub fn is_icon(&self, path: &str) -> bool {
        self.icons.contains(path)
    }
}

/// Why an asset is (or is not) reportable. Rules are checked in
/// declaration order and the first that applies wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// Type could not be resolved.
    UnknownType,
    /// Scripts and folder markers are never reported.
    NeverReportable,
    /// Scene registered in the build.
    RegisteredScene,
    /// Texture used as a platform icon.
    PlatformIcon,
    Valid,
}

impl Verdict {
    #[inline]
    pub fn is_valid(self) -> bool {
        self == Self::Valid
    }
}

/// Result of [`AssetClassifier::classify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub verdict: Verdict,
    /// Referencer count after the atlas-only override.
    pub references_count: usize,
    pub warning: Option<String>,
}

impl Classification {
    #[inline]
    pub fn valid(&self) -> bool {
        self.verdict.is_valid()
    }
}

/// Pure classifier over a fixed [`BuildRoots`] snapshot.
#[derive(Debug, Clone, Default)]
pub struct AssetClassifier {
    roots: BuildRoots,
}

impl AssetClassifier {
    pub fn new(roots: BuildRoots) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &BuildRoots {
        &self.roots
    }

    /// Classify one asset.
    ///
    /// `type_of` resolves the type of a referencer; it is only consulted for
    /// the atlas-only rule. The output depends on nothing but the arguments
    /// and the roots snapshot.
    pub fn classify<F>(
        &self,
        path: &str,
        asset_type: Option<&AssetType>,
        referencers: &[String],
        type_of: F,
    ) -> Classification
    where
        F: Fn(&str) -> Option<AssetType>,
    {
        let (references_count, warning) = reference_override(asset_type, referencers, type_of);
        Classification {
            verdict: self.verdict(path, asset_type),
            references_count,
            warning,
        }
    }

    /// Validity rules only.
    pub fn verdict(&self, path: &str, asset_type: Option<&AssetType>) -> Verdict {
        match asset_type {
            None => Verdict::UnknownType,
            Some(AssetType::Script | AssetType::FolderMarker) => Verdict::NeverReportable,
            Some(AssetType::Scene) if self.roots.is_registered_scene(path) => {
                Verdict::RegisteredScene
            }
            Some(AssetType::Texture) if self.roots.is_icon(path) => Verdict::PlatformIcon,
            Some(_) => Verdict::Valid,
        }
    }
}

/// Atlas-only rule: a texture whose single referencer is a sprite atlas is
/// not used by anything else, so its count drops to 0 with a warning.
pub fn reference_override<F>(
    asset_type: Option<&AssetType>,
    referencers: &[String],
    type_of: F,
) -> (usize, Option<String>)
where
    F: Fn(&str) -> Option<AssetType>,
{
    if let ([atlas], Some(AssetType::Texture)) = (referencers, asset_type) {
        if type_of(atlas) == Some(AssetType::SpriteAtlas) {
            return (
                0,
                Some(format!("Texture is referenced only by its sprite atlas {atlas}")),
            );
        }
    }
    (referencers.len(), None)
}
