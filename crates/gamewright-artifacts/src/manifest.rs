use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gamewright_core::error::Result;
use gamewright_core::types::AssetKind;

use crate::store::ArtifactStore;

/// Metadata for one generated or recovered asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetRecord {
    /// Stored path, relative to the output root.
    pub path: String,
    /// The prompt (images) or search query (audio) that produced it.
    pub prompt_or_query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AssetRecord {
    pub fn new(path: impl Into<String>, prompt_or_query: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            prompt_or_query: prompt_or_query.into(),
            dimensions: None,
            source_url: None,
            preview_url: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_dimensions(mut self, dimensions: impl Into<String>) -> Self {
        self.dimensions = Some(dimensions.into());
        self
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    pub fn with_preview_url(mut self, url: impl Into<String>) -> Self {
        self.preview_url = Some(url.into());
        self
    }
}

/// Asset-name → metadata mapping for one asset kind, persisted at the
/// kind's canonical manifest path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetManifest {
    pub kind: AssetKind,
    pub entries: BTreeMap<String, AssetRecord>,
}

impl AssetManifest {
    pub fn new(kind: AssetKind) -> Self {
        Self {
            kind,
            entries: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, record: AssetRecord) {
        self.entries.insert(name.into(), record);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Persist to the kind's canonical path under the store root.
    pub async fn save(&self, store: &ArtifactStore) -> Result<PathBuf> {
        let json = serde_json::to_string_pretty(self)?;
        store.write_text(self.kind.manifest_path(), &json).await
    }

    /// Load the manifest for a kind, or an empty one when none was written.
    pub async fn load_or_empty(store: &ArtifactStore, kind: AssetKind) -> Self {
        match store.read_to_string(kind.manifest_path()).await {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|_| Self::new(kind)),
            Err(_) => Self::new(kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_manifest_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("Game"));

        let mut manifest = AssetManifest::new(AssetKind::Image);
        manifest.insert(
            "hero",
            AssetRecord::new("assets/images/hero.png", "A hero character with a sword")
                .with_dimensions("1024x1024")
                .with_source_url("https://example.com/hero.png"),
        );
        manifest.save(&store).await.unwrap();

        let loaded = AssetManifest::load_or_empty(&store, AssetKind::Image).await;
        assert_eq!(loaded.len(), 1);
        let record = loaded.entries.get("hero").unwrap();
        assert_eq!(record.path, "assets/images/hero.png");
        assert_eq!(record.dimensions.as_deref(), Some("1024x1024"));
        assert!(record.preview_url.is_none());
    }

    #[tokio::test]
    async fn test_load_missing_manifest_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("Game"));
        let manifest = AssetManifest::load_or_empty(&store, AssetKind::Audio).await;
        assert!(manifest.is_empty());
    }
}
