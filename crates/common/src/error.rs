//! Error types shared across Cliplab crates.

use std::path::PathBuf;

/// Top-level error type for Cliplab operations.
#[derive(Debug, thiserror::Error)]
pub enum CliplabError {
    #[error("Model error: {message}")]
    Model { message: String },

    #[error("Plan error: {message}")]
    Plan { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Remote job error: {message}")]
    Remote { message: String },

    /// Explicit user cancellation. Never surfaced as a failure;
    /// callers match on this variant and reset quietly.
    #[error("Export cancelled")]
    Cancelled,

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using CliplabError.
pub type CliplabResult<T> = Result<T, CliplabError>;

impl CliplabError {
    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model {
            message: msg.into(),
        }
    }

    pub fn plan(msg: impl Into<String>) -> Self {
        Self::Plan {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn remote(msg: impl Into<String>) -> Self {
        Self::Remote {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    /// Whether this error represents a user-initiated cancellation
    /// rather than a genuine failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
