//! External generation capabilities.
//!
//! The chat executor, the image-generation client, and the audio-search
//! client all speak to network services with unspecified latency; the
//! pipeline treats them as black boxes and catches their failures per
//! task.

mod audio;
mod capability;
mod image;
mod llm;

pub use audio::{AudioOutcome, AudioSearchTool};
pub use capability::{GenerationOutcome, GenerationRequest, GenerationTool};
pub use image::{ImageGenerationTool, ImageOutcome};
pub use llm::LlmExecutor;
