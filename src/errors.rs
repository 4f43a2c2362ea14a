// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunboxError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Failed to start '{program}': {source}")]
    SpawnFailure {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Execution id already registered: {0}")]
    DuplicateId(String),

    #[error("Authentication required: {0}")]
    Unauthorized(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RunboxError {
    /// Stable machine-readable name, returned to HTTP callers next to the
    /// human-readable message.
    pub fn kind(&self) -> &'static str {
        match self {
            RunboxError::InvalidInput(_) => "invalid_input",
            RunboxError::NotFound(_) => "not_found",
            RunboxError::Forbidden(_) => "forbidden",
            RunboxError::UnsupportedLanguage(_) => "unsupported_language",
            RunboxError::SpawnFailure { .. } => "spawn_failure",
            RunboxError::DuplicateId(_) => "duplicate_id",
            RunboxError::Unauthorized(_) => "unauthorized",
            RunboxError::ConfigError(_)
            | RunboxError::IoError(_)
            | RunboxError::TomlError(_)
            | RunboxError::Other(_) => "internal",
        }
    }

    /// True for faults the caller cannot fix by changing the request.
    pub fn is_internal(&self) -> bool {
        self.kind() == "internal"
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, RunboxError>;
