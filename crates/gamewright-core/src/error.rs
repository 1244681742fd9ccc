use thiserror::Error;

#[derive(Debug, Error)]
pub enum GamewrightError {
    // Flow definition errors
    #[error("Step '{0}' is already registered")]
    DuplicateStep(String),

    #[error("Registering step '{0}' would create a dependency cycle")]
    CycleInFlow(String),

    #[error("Step '{step}' depends on unknown step '{upstream}'")]
    UnknownStep { step: String, upstream: String },

    // Stage errors
    #[error("Step '{step}' output failed schema validation: {message}")]
    SchemaValidation { step: String, message: String },

    #[error("Step '{step}' failed: {message}")]
    StepFailed { step: String, message: String },

    // External-service errors
    #[error("No API key configured for {0}")]
    MissingCredential(String),

    #[error("Upstream service error: {service}: {message}")]
    Upstream { service: String, message: String },

    #[error("No results for query: {0}")]
    NoResults(String),

    // Filesystem errors
    #[error("Path escapes the output root: {0}")]
    PathEscape(String),

    // Config errors
    #[error("Config error: {0}")]
    Config(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GamewrightError>;
