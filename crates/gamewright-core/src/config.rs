use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{GamewrightError, Result};

/// Top-level Gamewright configuration.
///
/// Loaded once at process start and passed into the pipeline builder;
/// nothing re-reads the file mid-run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub images: ImageApiConfig,
    #[serde(default)]
    pub audio: AudioApiConfig,
}

/// Pipeline-level knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Output root for every generated artifact.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// Path to the concept JSON file with the run's constant inputs.
    #[serde(default = "default_concept_path")]
    pub concept_path: String,
    /// Asset-file count at or below which the recovery policy kicks in.
    #[serde(default = "default_recovery_threshold")]
    pub recovery_threshold: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            concept_path: default_concept_path(),
            recovery_threshold: default_recovery_threshold(),
        }
    }
}

fn default_output_dir() -> String { "./Game".to_string() }
fn default_concept_path() -> String { "concept.json".to_string() }
fn default_recovery_threshold() -> usize { 1 }

impl PipelineConfig {
    pub fn output_root(&self) -> PathBuf {
        PathBuf::from(&self.output_dir)
    }
}

/// Chat-model configuration for the agent executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model_id")]
    pub model_id: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model_id: default_model_id(),
            api_key: None,
            base_url: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

fn default_provider() -> String { "openai".to_string() }
fn default_model_id() -> String { "gpt-4o".to_string() }
fn default_max_tokens() -> u32 { 4096 }
fn default_temperature() -> f32 { 0.7 }

/// Image-generation API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageApiConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    /// Requested image dimensions, e.g. "1024x1024".
    #[serde(default = "default_image_size")]
    pub size: String,
    #[serde(default = "default_image_format")]
    pub format: String,
}

impl Default for ImageApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            size: default_image_size(),
            format: default_image_format(),
        }
    }
}

fn default_image_size() -> String { "1024x1024".to_string() }
fn default_image_format() -> String { "png".to_string() }

/// Audio-search API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioApiConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_audio_max_results")]
    pub max_results: usize,
}

impl Default for AudioApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            max_results: default_audio_max_results(),
        }
    }
}

fn default_audio_max_results() -> usize { 5 }

impl AppConfig {
    /// Load config from a TOML file, with env var expansion.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| GamewrightError::ConfigNotFound(path.display().to_string()))?;

        // Expand ${ENV_VAR} references
        let expanded = expand_env_vars(&content);

        toml::from_str(&expanded).map_err(|e| GamewrightError::Config(e.to_string()))
    }
}

/// Expand `${ENV_VAR}` patterns in a string.
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            let mut var_name = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                var_name.push(c);
            }
            match std::env::var(&var_name) {
                Ok(val) => result.push_str(&val),
                Err(_) => {
                    // Keep original if env var not set
                    result.push_str(&format!("${{{}}}", var_name));
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_env_vars() {
        std::env::set_var("TEST_GAMEWRIGHT_VAR", "hello");
        let result = expand_env_vars("key = \"${TEST_GAMEWRIGHT_VAR}\"");
        assert_eq!(result, "key = \"hello\"");
        std::env::remove_var("TEST_GAMEWRIGHT_VAR");
    }

    #[test]
    fn test_expand_env_vars_missing() {
        let result = expand_env_vars("key = \"${NONEXISTENT_GAMEWRIGHT_VAR}\"");
        assert_eq!(result, "key = \"${NONEXISTENT_GAMEWRIGHT_VAR}\"");
    }

    #[test]
    fn test_defaults_from_empty_toml() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.pipeline.output_dir, "./Game");
        assert_eq!(config.pipeline.recovery_threshold, 1);
        assert_eq!(config.model.provider, "openai");
        assert_eq!(config.model.model_id, "gpt-4o");
        assert_eq!(config.images.size, "1024x1024");
        assert_eq!(config.audio.max_results, 5);
    }

    #[test]
    fn test_partial_override() {
        let toml_str = r#"
[pipeline]
output_dir = "./out"
recovery_threshold = 3

[model]
model_id = "gpt-4o-mini"
api_key = "sk-test"
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.pipeline.output_dir, "./out");
        assert_eq!(config.pipeline.recovery_threshold, 3);
        assert_eq!(config.model.model_id, "gpt-4o-mini");
        assert_eq!(config.model.api_key.as_deref(), Some("sk-test"));
        // Untouched sections keep their defaults
        assert_eq!(config.pipeline.concept_path, "concept.json");
        assert!(config.images.api_key.is_none());
    }
}
