/// Asset identity, type tags and the per-asset record produced by analysis.
use compact_str::CompactString;
use serde::Serialize;

/// The type of an asset as far as classification cares.
///
/// Only the handful of types that carry special rules get their own
/// variant; everything else keeps its display name in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssetType {
    /// Source code. Never reportable.
    Script,
    /// Folder or other placeholder without loadable content. Never reportable.
    FolderMarker,
    /// A scene; registered build scenes are always in use.
    Scene,
    /// A 2D texture; platform icons are always in use.
    Texture,
    /// A sprite atlas packing several textures.
    SpriteAtlas,
    /// Any other resolvable type, by display name (e.g. `Material`).
    Other(CompactString),
}

impl AssetType {
    /// Parse a type tag as supplied by a metadata provider.
    ///
    /// Accepts both the short snake-case tags (`texture`, `sprite_atlas`)
    /// and the engine display names (`Texture2D`, `SpriteAtlas`). An empty
    /// tag or `unknown` yields `None`: the type could not be resolved.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        if tag.is_empty() || tag.eq_ignore_ascii_case("unknown") {
            return None;
        }
        let parsed = match tag {
            "script" | "MonoScript" => Self::Script,
            "folder" | "folder_marker" | "DefaultAsset" => Self::FolderMarker,
            "scene" | "SceneAsset" => Self::Scene,
            "texture" | "Texture2D" => Self::Texture,
            "sprite_atlas" | "SpriteAtlas" => Self::SpriteAtlas,
            other => Self::Other(CompactString::new(other)),
        };
        Some(parsed)
    }

    /// Display name used for grouping, sorting and type filters.
    pub fn name(&self) -> &str {
        match self {
            Self::Script => "MonoScript",
            Self::FolderMarker => "DefaultAsset",
            Self::Scene => "SceneAsset",
            Self::Texture => "Texture2D",
            Self::SpriteAtlas => "SpriteAtlas",
            Self::Other(name) => name.as_str(),
        }
    }
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Infer an asset type from the extension of `path`.
///
/// Used when a provider has no explicit type tag. A final path segment
/// without an extension is treated as a folder marker. Unrecognised
/// extensions return `None` and the asset is later excluded as
/// unclassifiable.
///
/// Zero-heap-allocation hot path: the extension is lowercased into a
/// fixed-size stack buffer. Extensions longer than 16 bytes are unknown.
pub fn infer_type_from_path(path: &str) -> Option<AssetType> {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let ext = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext,
        Some(_) => return None, // dot-files such as `.gitignore`
        None => return Some(AssetType::FolderMarker),
    };

    let bytes = ext.as_bytes();
    if bytes.is_empty() || bytes.len() > 16 {
        return None;
    }
    let mut lower = [0u8; 16];
    for (dest, &src) in lower.iter_mut().zip(bytes.iter()) {
        *dest = src.to_ascii_lowercase();
    }
    let lower_str = std::str::from_utf8(&lower[..bytes.len()]).ok()?;

    let other = |name: &str| Some(AssetType::Other(CompactString::new(name)));
    match lower_str {
        "cs" => Some(AssetType::Script),
        "unity" => Some(AssetType::Scene),
        "png" | "jpg" | "jpeg" | "tga" | "psd" | "tif" | "tiff" | "bmp" | "gif" | "exr" | "hdr"
        | "iff" | "pict" => Some(AssetType::Texture),
        "spriteatlas" | "spriteatlasv2" => Some(AssetType::SpriteAtlas),
        "mat" => other("Material"),
        "prefab" | "fbx" | "obj" | "blend" | "dae" => other("GameObject"),
        "anim" => other("AnimationClip"),
        "controller" => other("AnimatorController"),
        "overridecontroller" => other("AnimatorOverrideController"),
        "shader" | "shadergraph" => other("Shader"),
        "wav" | "mp3" | "ogg" | "aif" | "aiff" => other("AudioClip"),
        "mixer" => other("AudioMixerController"),
        "mp4" | "mov" | "webm" => other("VideoClip"),
        "ttf" | "otf" => other("Font"),
        "asset" => other("ScriptableObject"),
        "physicmaterial" => other("PhysicMaterial"),
        "rendertexture" => other("RenderTexture"),
        "cubemap" => other("Cubemap"),
        "txt" | "json" | "xml" | "csv" | "md" | "bytes" | "yaml" => other("TextAsset"),
        "asmdef" | "asmref" => other("AssemblyDefinitionAsset"),
        _ => None,
    }
}

/// One reportable asset in an [`AnalysisResult`](super::AnalysisResult).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetRecord {
    /// Repository-relative path; the unique key.
    pub path: String,
    /// Display name of the asset type.
    pub type_name: CompactString,
    /// On-disk size. 0 when the size could not be read.
    pub size_bytes: u64,
    /// Whether the asset can be loaded by address at runtime.
    pub is_addressable: bool,
    /// Number of referencers, after the atlas-only override.
    pub references_count: usize,
    /// Explanation when the reference count was overridden.
    pub warning: Option<String>,
    /// Passed type classification.
    pub valid: bool,
}

impl AssetRecord {
    /// Path with the leading `Assets/` root stripped, for compact display.
    pub fn short_path(&self) -> &str {
        self.path.strip_prefix("Assets/").unwrap_or(&self.path)
    }

    /// Final path segment.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// `true` when a warning is attached (implicitly unused asset).
    pub fn has_warning(&self) -> bool {
        self.warning.as_deref().is_some_and(|w| !w.is_empty())
    }
}
