//! Error taxonomy for the interview engine.
//!
//! Generation and speech failures are recovered internally (fallback
//! questions, placeholder answers) and never surface here. What does
//! surface is rejected lifecycle operations and capture misuse.

use intervox_core::CoreError;
use intervox_voice::VoiceError;
use thiserror::Error;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("session already exists: {0}")]
    DuplicateSession(String),

    #[error("session is closed")]
    SessionClosed,

    #[error("no audio received for the current question")]
    NoAudioReceived,

    #[error("interview is complete; no more questions")]
    InterviewComplete,

    #[error("question generation failed: {0}")]
    Generation(String),

    #[error("transcription pool unavailable: {0}")]
    PoolClosed(String),

    #[error(transparent)]
    Voice(#[from] VoiceError),

    #[error(transparent)]
    Core(#[from] CoreError),
}
