//! Media asset types.
//!
//! An asset is an imported or generated media source, independent of any
//! placement on the timeline. Dropping an asset onto the timeline creates
//! a [`Clip`](crate::clip::Clip) that copies the relevant intrinsic
//! properties; the asset itself is not reference-counted.

use serde::{Deserialize, Serialize};

/// Intrinsic duration assigned to still images.
pub const IMAGE_DEFAULT_DURATION_SECS: f64 = 5.0;

/// An imported or generated media source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    /// Unique asset identifier.
    pub id: String,

    /// Human-readable display name.
    pub name: String,

    /// Media kind.
    pub kind: AssetKind,

    /// Source URL or file handle.
    pub source: String,

    /// Intrinsic duration in seconds. Images default to 5s.
    pub duration_secs: f64,

    /// Intrinsic resolution in pixels; absent for non-visual media.
    pub resolution: Option<(u32, u32)>,

    /// Generation metadata for AI-produced assets. Mutated in place
    /// when the asset is regenerated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<GenerationMetadata>,
}

/// Kind of media an asset holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetKind {
    Video,
    Audio,
    Image,
    GeneratedHtml,
    GeneratedScript,
}

/// Metadata tracked for generated assets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationMetadata {
    /// Prompt the asset was generated from.
    pub prompt: String,

    /// Generated source code (HTML or script), editable by the user.
    pub source_code: String,

    /// Current processing state.
    pub state: GenerationState,

    /// Last error reported by the generation service, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Processing state of a generated asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GenerationState {
    #[default]
    Idle,
    Generating,
    Rendering,
    Failed,
}

impl AssetKind {
    /// Whether this kind contributes pixels to the composite.
    pub fn is_visual(self) -> bool {
        !matches!(self, AssetKind::Audio)
    }

    /// Whether this kind carries an audio stream.
    pub fn has_audio(self) -> bool {
        matches!(self, AssetKind::Video | AssetKind::Audio)
    }

    /// File extension used when staging media of this kind.
    pub fn file_extension(self) -> &'static str {
        match self {
            AssetKind::Video | AssetKind::GeneratedHtml | AssetKind::GeneratedScript => "mp4",
            AssetKind::Audio => "mp3",
            AssetKind::Image => "png",
        }
    }
}

impl Asset {
    /// Create a video asset.
    pub fn video(
        id: impl Into<String>,
        name: impl Into<String>,
        source: impl Into<String>,
        duration_secs: f64,
        resolution: (u32, u32),
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: AssetKind::Video,
            source: source.into(),
            duration_secs,
            resolution: Some(resolution),
            generation: None,
        }
    }

    /// Create an audio asset.
    pub fn audio(
        id: impl Into<String>,
        name: impl Into<String>,
        source: impl Into<String>,
        duration_secs: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: AssetKind::Audio,
            source: source.into(),
            duration_secs,
            resolution: None,
            generation: None,
        }
    }

    /// Create an image asset with the default still duration.
    pub fn image(
        id: impl Into<String>,
        name: impl Into<String>,
        source: impl Into<String>,
        resolution: (u32, u32),
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: AssetKind::Image,
            source: source.into(),
            duration_secs: IMAGE_DEFAULT_DURATION_SECS,
            resolution: Some(resolution),
            generation: None,
        }
    }

    /// Create a generated asset from a prompt and its rendered output.
    pub fn generated(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: AssetKind,
        source: impl Into<String>,
        duration_secs: f64,
        resolution: (u32, u32),
        prompt: impl Into<String>,
        source_code: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            source: source.into(),
            duration_secs,
            resolution: Some(resolution),
            generation: Some(GenerationMetadata {
                prompt: prompt.into(),
                source_code: source_code.into(),
                state: GenerationState::Idle,
                last_error: None,
            }),
        }
    }

    /// Whether this asset contributes pixels to the composite.
    pub fn is_visual(&self) -> bool {
        self.kind.is_visual()
    }
}
