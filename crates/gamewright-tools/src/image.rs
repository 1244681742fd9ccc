use std::path::{Path, PathBuf};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use gamewright_core::config::ImageApiConfig;
use gamewright_core::error::{GamewrightError, Result};

const IMAGES_API_URL: &str = "https://api.openai.com/v1/images/generations";

/// Result of one image generation + download.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageOutcome {
    pub saved_path: PathBuf,
    pub source_url: String,
    pub dimensions: String,
}

/// Generates one image from a prompt and downloads it to a destination.
pub struct ImageGenerationTool {
    config: ImageApiConfig,
    http: Client,
}

impl ImageGenerationTool {
    pub fn new(config: ImageApiConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    /// Generate an image and save it at `destination`.
    ///
    /// The destination must already be resolved against the output root;
    /// parent directories are created as needed.
    pub async fn generate(&self, prompt: &str, destination: &Path) -> Result<ImageOutcome> {
        let api_key = self
            .config
            .api_key
            .clone()
            .ok_or_else(|| GamewrightError::MissingCredential("image generation".into()))?;

        let url = self
            .config
            .base_url
            .clone()
            .unwrap_or_else(|| IMAGES_API_URL.to_string());

        debug!(prompt, size = %self.config.size, "Image generation request");

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&api_key)
            .json(&json!({
                "prompt": prompt,
                "n": 1,
                "size": self.config.size,
                "response_format": "url",
            }))
            .send()
            .await
            .map_err(|e| GamewrightError::Upstream {
                service: "images".into(),
                message: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(GamewrightError::Upstream {
                service: "images".into(),
                message: format!("HTTP {}: {}", status.as_u16(), detail),
            });
        }

        let body: serde_json::Value = resp.json().await.map_err(|e| GamewrightError::Upstream {
            service: "images".into(),
            message: e.to_string(),
        })?;

        let source_url = body["data"][0]["url"]
            .as_str()
            .ok_or_else(|| GamewrightError::Upstream {
                service: "images".into(),
                message: "response contained no image url".into(),
            })?
            .to_string();

        self.download(&source_url, destination).await?;

        Ok(ImageOutcome {
            saved_path: destination.to_path_buf(),
            source_url,
            dimensions: self.config.size.clone(),
        })
    }

    async fn download(&self, url: &str, destination: &Path) -> Result<()> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| GamewrightError::Upstream {
                service: "images".into(),
                message: format!("download failed: {}", e),
            })?;

        if !resp.status().is_success() {
            return Err(GamewrightError::Upstream {
                service: "images".into(),
                message: format!("download failed: HTTP {}", resp.status().as_u16()),
            });
        }

        let bytes = resp.bytes().await.map_err(|e| GamewrightError::Upstream {
            service: "images".into(),
            message: format!("download failed: {}", e),
        })?;

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(destination, &bytes).await?;
        debug!(path = %destination.display(), bytes = bytes.len(), "Image saved");
        Ok(())
    }
}
