//! Error types for buzzy

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for buzzy operations
#[derive(Error, Debug)]
pub enum BuzzyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Walkdir error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    #[error("Invalid dependency: {0}")]
    InvalidDependency(String),

    #[error("Bad config: {0}")]
    BadConfig(String),

    #[error("Cannot satisfy dependency: {0}")]
    CannotSatisfy(String),

    #[error("Subprocess error: {program}: {message}")]
    SubprocessError { program: String, message: String },

    #[error("System error: {0}")]
    SystemError(String),

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for buzzy operations
pub type Result<T> = std::result::Result<T, BuzzyError>;

impl BuzzyError {
    /// Create a new invalid-version error
    pub fn invalid_version(msg: impl Into<String>) -> Self {
        Self::InvalidVersion(msg.into())
    }

    /// Create a new invalid-dependency error
    pub fn invalid_dependency(msg: impl Into<String>) -> Self {
        Self::InvalidDependency(msg.into())
    }

    /// Create a new bad-config error
    pub fn bad_config(msg: impl Into<String>) -> Self {
        Self::BadConfig(msg.into())
    }

    /// Create a new cannot-satisfy error
    pub fn cannot_satisfy(msg: impl Into<String>) -> Self {
        Self::CannotSatisfy(msg.into())
    }

    /// Create a new subprocess error
    pub fn subprocess(program: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SubprocessError {
            program: program.into(),
            message: message.into(),
        }
    }

    /// Create a file-not-found error
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }
}
