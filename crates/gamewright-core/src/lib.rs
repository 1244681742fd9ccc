//! Core types, traits, and error hierarchy for Gamewright.

pub mod concept;
pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use concept::{Character, ConceptInput, Difficulty, GameConcept, LevelSpec};
pub use config::AppConfig;
pub use error::{GamewrightError, Result};
pub use traits::{AgentExecutor, AgentRequest};
pub use types::{
    AssetKind, FileDisposition, FileKind, FilePlan, FileSpec, GeneratedFile, RunId, StepStatus,
};
