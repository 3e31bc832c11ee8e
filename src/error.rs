//! Error types for executable generation and signing.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GenerateError>;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("Toolchain error: {0}")]
    Toolchain(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Certificate error: {0}")]
    Crypto(String),

    #[error("{what} not found: {}", path.display())]
    FileNotFound { what: &'static str, path: PathBuf },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

impl GenerateError {
    pub(crate) fn missing(what: &'static str, path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound {
            what,
            path: path.into(),
        }
    }
}

impl From<rcgen::Error> for GenerateError {
    fn from(e: rcgen::Error) -> Self {
        Self::Crypto(e.to_string())
    }
}
