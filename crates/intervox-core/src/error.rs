//! Error types for the intervox core layer.

use thiserror::Error;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors from the text-generation bridge and document analysis.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("text generation failed: {0}")]
    Generation(String),

    #[error("could not parse backend output: {0}")]
    Unparsable(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
