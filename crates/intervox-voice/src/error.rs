//! Error types for the speech adapter layer.

use thiserror::Error;

/// Result type alias for speech operations.
pub type VoiceResult<T> = Result<T, VoiceError>;

/// Errors from synthesis, transcription, and audio handling.
///
/// None of these are fatal to an interview: callers degrade to text-only
/// questions or placeholder answers.
#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("synthesis failed: {0}")]
    Synthesis(String),

    #[error("transcription failed: {0}")]
    Transcription(String),

    #[error("unsupported audio encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
