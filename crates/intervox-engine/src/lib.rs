//! # intervox-engine — voice-interview orchestration
//!
//! Runs a multi-turn spoken interview as a pipeline of concurrent
//! producer/consumer stages:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Interview Session                         │
//! │  ┌──────────────┐   ┌───────────────┐   ┌───────────────┐  │
//! │  │ Question     │──►│ Staging Queue │──►│ deliver /      │  │
//! │  │ preparation  │   │ (FIFO)        │   │ capture loop   │  │
//! │  └──────────────┘   └───────────────┘   └───────┬───────┘  │
//! │                                                 ▼           │
//! │  ┌──────────────┐   ┌───────────────┐   ┌───────────────┐  │
//! │  │ results queue│◄──│ Transcription │◄──│ answer audio   │  │
//! │  │ (per session)│   │ worker pool   │   │ (chunks)       │  │
//! │  └──────────────┘   └───────────────┘   └───────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Question preparation is speculative: starters stage at creation, dynamic
//! questions after each capture, bounded by a look-ahead limit. The driver
//! never blocks unbounded — staged pops and the finish drain both time out
//! into defined fallbacks.

pub mod coverage;
pub mod error;
pub mod pool;
pub mod question;
pub mod registry;
pub mod report;
pub mod session;
pub mod staging;

pub use coverage::CoverageState;
pub use error::{EngineError, EngineResult};
pub use pool::{TranscriptionJob, TranscriptionPool};
pub use question::{
    eligible_band, fixed_starter, pick_category, PreparedQuestion, QuestionCategory,
    QuestionOrigin, QuestionSource, QuestionSpec, FIXED_STARTER_COUNT,
};
pub use registry::SessionRegistry;
pub use report::{generate_report, render_transcript, EvaluationReport};
pub use session::{
    Answer, InterviewOutcome, InterviewSession, Phase, SessionStatus, TranscriptEntry,
    TranscriptionPoll, NO_ANSWER_PLACEHOLDER,
};
pub use staging::StagingQueue;
