//! Error types for Coursemate.

use thiserror::Error;

/// Library-level error type for Coursemate operations.
#[derive(Error, Debug)]
pub enum CoursemateError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Model service error: {0}")]
    Model(String),

    #[error("{0}")]
    Index(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Tool '{0}' is already registered")]
    DuplicateTool(String),

    #[error("Tool '{0}' not found")]
    ToolNotFound(String),

    #[error("Tool execution failed: {0}")]
    ToolExecution(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Coursemate operations.
pub type Result<T> = std::result::Result<T, CoursemateError>;
