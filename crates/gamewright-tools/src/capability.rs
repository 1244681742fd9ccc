use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use gamewright_core::error::Result;

use crate::audio::AudioSearchTool;
use crate::image::ImageGenerationTool;

/// One generation request: a logical asset name, the prompt or query text,
/// and a destination already resolved against the output root.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub name: String,
    /// Image prompt or audio search query, depending on the tool kind.
    pub spec: String,
    pub destination: PathBuf,
}

impl GenerationRequest {
    pub fn new(
        name: impl Into<String>,
        spec: impl Into<String>,
        destination: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            spec: spec.into(),
            destination: destination.into(),
        }
    }
}

/// Uniform result shape across generation kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOutcome {
    pub name: String,
    pub saved_path: PathBuf,
    pub source_url: Option<String>,
    pub preview_url: Option<String>,
    pub dimensions: Option<String>,
}

/// The closed set of generation capabilities.
///
/// Dispatch happens by matching the variant; there is no string-keyed tool
/// lookup anywhere in the pipeline.
pub enum GenerationTool {
    Image(ImageGenerationTool),
    Audio(AudioSearchTool),
}

impl GenerationTool {
    pub async fn invoke(&self, request: &GenerationRequest) -> Result<GenerationOutcome> {
        match self {
            Self::Image(tool) => {
                let outcome = tool.generate(&request.spec, &request.destination).await?;
                Ok(GenerationOutcome {
                    name: request.name.clone(),
                    saved_path: outcome.saved_path,
                    source_url: Some(outcome.source_url),
                    preview_url: None,
                    dimensions: Some(outcome.dimensions),
                })
            }
            Self::Audio(tool) => {
                let outcome = tool.search(&request.spec, &request.destination).await?;
                Ok(GenerationOutcome {
                    name: request.name.clone(),
                    saved_path: outcome.saved_path,
                    source_url: Some(outcome.source_url),
                    preview_url: Some(outcome.preview_url),
                    dimensions: None,
                })
            }
        }
    }
}
