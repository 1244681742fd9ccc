use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use gamewright_core::error::{GamewrightError, Result};
use gamewright_core::types::AssetKind;

/// Manages the run's output directory tree.
///
/// Every write goes through [`ArtifactStore::sanitize`], so nothing the
/// pipeline produces can land outside the declared root.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a relative path against the root.
    ///
    /// Absolute paths and `..` traversal are rejected with `PathEscape`.
    pub fn sanitize(&self, relative: &str) -> Result<PathBuf> {
        let path = Path::new(relative);
        if path.is_absolute() {
            return Err(GamewrightError::PathEscape(relative.to_string()));
        }
        for component in path.components() {
            if matches!(component, Component::ParentDir) {
                return Err(GamewrightError::PathEscape(relative.to_string()));
            }
        }
        Ok(self.root.join(path))
    }

    /// Write text content, creating parent directories as needed.
    pub async fn write_text(&self, relative: &str, content: &str) -> Result<PathBuf> {
        self.write_bytes(relative, content.as_bytes()).await
    }

    /// Write raw bytes, creating parent directories as needed.
    pub async fn write_bytes(&self, relative: &str, content: &[u8]) -> Result<PathBuf> {
        let path = self.sanitize(relative)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, content).await?;
        debug!(path = %path.display(), bytes = content.len(), "Wrote artifact");
        Ok(path)
    }

    /// Realize a directory entry (no file is created).
    pub async fn ensure_dir(&self, relative: &str) -> Result<PathBuf> {
        let path = self.sanitize(relative)?;
        tokio::fs::create_dir_all(&path).await?;
        Ok(path)
    }

    pub async fn read_to_string(&self, relative: &str) -> Result<String> {
        let path = self.sanitize(relative)?;
        Ok(tokio::fs::read_to_string(&path).await?)
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.sanitize(relative)
            .map(|p| p.exists())
            .unwrap_or(false)
    }

    /// Number of plain files directly inside a subdirectory.
    ///
    /// A missing directory counts as zero — the shape the recovery policy
    /// checks against its threshold.
    pub fn file_count(&self, relative: &str) -> usize {
        let Ok(dir) = self.sanitize(relative) else {
            return 0;
        };
        let Ok(entries) = std::fs::read_dir(&dir) else {
            return 0;
        };
        entries
            .flatten()
            .filter(|e| e.path().is_file())
            .count()
    }

    /// Sweep candidate source roots for files of one asset kind and copy
    /// them into the canonical `assets/{images,audio}` subtree.
    ///
    /// Roots are visited in slice order; a later root's file overwrites an
    /// earlier copy with the same name (last write wins). Returns the copy
    /// manifest keyed by filename.
    pub fn copy_assets(
        &self,
        source_roots: &[PathBuf],
        kind: AssetKind,
    ) -> Result<BTreeMap<String, PathBuf>> {
        let dest_dir = self.root.join(kind.subdir());
        std::fs::create_dir_all(&dest_dir)?;

        let mut copied: BTreeMap<String, PathBuf> = BTreeMap::new();
        for root in source_roots {
            for entry in WalkDir::new(root).into_iter().flatten() {
                let path = entry.path();
                if !path.is_file() || path.starts_with(&dest_dir) {
                    continue;
                }
                let matches_kind = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| kind.extensions().contains(&e.to_lowercase().as_str()))
                    .unwrap_or(false);
                if !matches_kind {
                    continue;
                }
                let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };

                let dest = dest_dir.join(file_name);
                if copied.contains_key(file_name) {
                    debug!(file = file_name, from = %path.display(), "Overwriting earlier copy");
                }
                match std::fs::copy(path, &dest) {
                    Ok(_) => {
                        copied.insert(file_name.to_string(), dest);
                    }
                    Err(e) => {
                        warn!(file = file_name, error = %e, "Asset copy failed, skipping");
                    }
                }
            }
        }
        Ok(copied)
    }
}
