//! # intervox-voice — speech backend adapters
//!
//! Stateless seams between the interview engine and the speech services:
//!
//! ```text
//! question text ──► SpeechSynthesizer ──► audio bytes (or none)
//! answer bytes  ──► encoding normalize ──► SpeechTranscriber ──► text
//! ```
//!
//! Both adapters may fail or return empty; the engine treats that as
//! "no audio" / "no transcript", never as a session-ending fault.

pub mod encoding;
pub mod error;
pub mod synthesis;
pub mod transcribe;

pub use encoding::{normalize_for_upload, pcm16_to_wav, AudioEncoding};
pub use error::{VoiceError, VoiceResult};
pub use synthesis::{create_best_tts, OpenAiTts, PlaceholderTts, SpeechSynthesizer};
pub use transcribe::{create_best_stt, OpenAiStt, PlaceholderStt, SpeechTranscriber};
