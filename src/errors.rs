// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResflowError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        source: globset::Error,
    },

    #[error("Unit not found: {0}")]
    UnitNotFound(String),

    /// Cooperative cancellation was requested. Not a failure; callers end
    /// the run early and persist nothing.
    #[error("Run cancelled")]
    Cancelled,

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ResflowError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ResflowError::Cancelled)
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ResflowError>;
