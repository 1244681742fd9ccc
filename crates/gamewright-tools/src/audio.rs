use std::path::{Path, PathBuf};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use gamewright_core::config::AudioApiConfig;
use gamewright_core::error::{GamewrightError, Result};

const FREESOUND_SEARCH_URL: &str = "https://freesound.org/apiv2/search/text/";

/// Result of one audio search + preview download.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioOutcome {
    pub saved_path: PathBuf,
    pub source_url: String,
    pub preview_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SoundResult>,
}

#[derive(Debug, Deserialize)]
struct SoundResult {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    previews: Option<serde_json::Value>,
}

/// Pick the best downloadable preview, HQ mp3 first.
fn best_preview(previews: &serde_json::Value) -> Option<String> {
    for key in ["preview-hq-mp3", "preview-lq-mp3", "preview-hq-ogg", "preview-lq-ogg"] {
        if let Some(url) = previews[key].as_str() {
            return Some(url.to_string());
        }
    }
    None
}

/// Searches a sound library by text query and downloads the top match's
/// preview to a destination.
pub struct AudioSearchTool {
    config: AudioApiConfig,
    http: Client,
}

impl AudioSearchTool {
    pub fn new(config: AudioApiConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    /// Search for `query` and save the first usable preview at `destination`.
    pub async fn search(&self, query: &str, destination: &Path) -> Result<AudioOutcome> {
        let api_key = self
            .config
            .api_key
            .clone()
            .ok_or_else(|| GamewrightError::MissingCredential("audio search".into()))?;

        let url = self
            .config
            .base_url
            .clone()
            .unwrap_or_else(|| FREESOUND_SEARCH_URL.to_string());

        debug!(query, max_results = self.config.max_results, "Audio search request");

        let page_size = self.config.max_results.to_string();
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("query", query),
                ("fields", "id,name,url,previews"),
                ("page_size", page_size.as_str()),
            ])
            .header("Authorization", format!("Token {}", api_key))
            .send()
            .await
            .map_err(|e| GamewrightError::Upstream {
                service: "audio".into(),
                message: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(GamewrightError::Upstream {
                service: "audio".into(),
                message: format!("HTTP {}: {}", status.as_u16(), detail),
            });
        }

        let parsed: SearchResponse = resp.json().await.map_err(|e| GamewrightError::Upstream {
            service: "audio".into(),
            message: e.to_string(),
        })?;

        let hit = parsed
            .results
            .iter()
            .find_map(|r| {
                let preview = r.previews.as_ref().and_then(best_preview)?;
                Some((r, preview))
            })
            .ok_or_else(|| GamewrightError::NoResults(query.to_string()))?;

        let (result, preview_url) = hit;
        debug!(name = result.name.as_deref().unwrap_or("?"), "Audio match");

        self.download(&preview_url, destination).await?;

        Ok(AudioOutcome {
            saved_path: destination.to_path_buf(),
            source_url: result.url.clone().unwrap_or_else(|| preview_url.clone()),
            preview_url,
        })
    }

    async fn download(&self, url: &str, destination: &Path) -> Result<()> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| GamewrightError::Upstream {
                service: "audio".into(),
                message: format!("download failed: {}", e),
            })?;

        if !resp.status().is_success() {
            return Err(GamewrightError::Upstream {
                service: "audio".into(),
                message: format!("download failed: HTTP {}", resp.status().as_u16()),
            });
        }

        let bytes = resp.bytes().await.map_err(|e| GamewrightError::Upstream {
            service: "audio".into(),
            message: format!("download failed: {}", e),
        })?;

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(destination, &bytes).await?;
        debug!(path = %destination.display(), bytes = bytes.len(), "Audio saved");
        Ok(())
    }
}
