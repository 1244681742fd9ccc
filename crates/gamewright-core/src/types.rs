use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for one pipeline run.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a single step within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    /// An upstream on every path to this step failed.
    Skipped,
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        };
        write!(f, "{}", s)
    }
}

/// Declarative description of one file the planning stage wants generated.
///
/// `filename` is relative to the output root; a trailing separator denotes
/// a directory entry rather than a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSpec {
    pub filename: String,
    pub purpose: String,
    pub content_guidelines: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// The planning stage's full output: an ordered list of file specs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilePlan {
    pub files: Vec<FileSpec>,
}

/// Target classification for a generated file, derived from its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Html,
    Css,
    Js,
    Json,
    Audio,
    Asset,
}

impl FileKind {
    /// Classify a filename by extension, with the audio subtree taking
    /// precedence over unknown extensions.
    pub fn classify(filename: &str) -> Self {
        let lower = filename.to_lowercase();
        if lower.ends_with(".html") {
            Self::Html
        } else if lower.ends_with(".css") {
            Self::Css
        } else if lower.ends_with(".js") {
            Self::Js
        } else if lower.ends_with(".json") {
            Self::Json
        } else if lower.contains("assets/audio/") {
            Self::Audio
        } else {
            Self::Asset
        }
    }

    /// Reporting label for the unit responsible for this kind of file.
    pub fn responsible_unit(&self) -> &'static str {
        match self {
            Self::Html => "HTML Crew",
            Self::Css => "CSS Crew",
            Self::Js => "Core JavaScript Crew",
            Self::Json => "Data/Config Crew",
            Self::Audio => "Audio Crew",
            Self::Asset => "Asset Crew",
        }
    }
}

/// What happened to one generated file during the write pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "disposition", rename_all = "snake_case")]
pub enum FileDisposition {
    /// Written under the output root.
    Written { path: String },
    /// Realized as an empty directory.
    DirectoryCreated { path: String },
    /// Content retained in the run state only (escaping path or I/O failure).
    MemoryOnly { reason: String },
    /// The generation task itself failed; nothing to write.
    Failed,
}

/// One generated file after the fan-out stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedFile {
    pub filename: String,
    pub kind: FileKind,
    pub content: String,
    pub responsible_unit: String,
    pub disposition: FileDisposition,
}

/// Asset media categories handled by the store and the generation tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Image,
    Audio,
}

impl AssetKind {
    /// File extensions that count as this kind during copy sweeps.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Image => &["png", "jpg", "jpeg", "gif", "webp"],
            Self::Audio => &["mp3", "wav", "ogg"],
        }
    }

    /// Canonical subdirectory under `assets/`.
    pub fn subdir(&self) -> &'static str {
        match self {
            Self::Image => "assets/images",
            Self::Audio => "assets/audio",
        }
    }

    /// Canonical manifest path relative to the output root.
    pub fn manifest_path(&self) -> &'static str {
        match self {
            Self::Image => "assets/manifest_images.json",
            Self::Audio => "assets/manifest_audio.json",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_extension() {
        assert_eq!(FileKind::classify("index.html"), FileKind::Html);
        assert_eq!(FileKind::classify("css/style.CSS"), FileKind::Css);
        assert_eq!(FileKind::classify("js/game.js"), FileKind::Js);
        assert_eq!(FileKind::classify("data/levels.json"), FileKind::Json);
        assert_eq!(FileKind::classify("assets/audio/jump.mp3"), FileKind::Audio);
        assert_eq!(FileKind::classify("assets/images/"), FileKind::Asset);
    }

    #[test]
    fn test_responsible_unit_labels() {
        assert_eq!(FileKind::Js.responsible_unit(), "Core JavaScript Crew");
        assert_eq!(FileKind::Asset.responsible_unit(), "Asset Crew");
    }

    #[test]
    fn test_file_spec_default_dependencies() {
        let spec: FileSpec = serde_json::from_str(
            r#"{"filename": "index.html", "purpose": "entry", "content_guidelines": "minimal"}"#,
        )
        .unwrap();
        assert!(spec.dependencies.is_empty());
    }

    #[test]
    fn test_run_id_unique() {
        assert_ne!(RunId::new().0, RunId::new().0);
    }

    #[test]
    fn test_asset_kind_paths() {
        assert_eq!(AssetKind::Image.subdir(), "assets/images");
        assert_eq!(AssetKind::Audio.manifest_path(), "assets/manifest_audio.json");
        assert!(AssetKind::Audio.extensions().contains(&"mp3"));
    }
}
