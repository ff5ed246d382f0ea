//! Engine configuration loaded from `.env`.
//!
//! Every knob has a safe default, so the engine runs with an empty
//! environment. Change behavior without code edits.

use serde::{Deserialize, Serialize};

/// Tunables for the interview engine.
///
/// | Env | Default | Description |
/// |-----|---------|-------------|
/// | INTERVOX_MAX_QUESTIONS | 15 | Questions per interview (first 3 are fixed starters). |
/// | INTERVOX_PREPARE_LOOKAHEAD | 2 | Max dynamic question preparations in flight per session. |
/// | INTERVOX_TRANSCRIPTION_WORKERS | 2 | Process-wide transcription worker count. |
/// | INTERVOX_STAGING_POP_TIMEOUT_MS | 1500 | Bounded wait for a staged question before falling back. |
/// | INTERVOX_DRAIN_TIMEOUT_SECS | 60 | Bounded wait for outstanding transcriptions at finish. |
/// | INTERVOX_SESSION_IDLE_SECS | 1800 | Idle period after which a session may be swept. |
/// | INTERVOX_TRANSCRIPT_DIR | ./transcripts | Where the end-of-interview artifact is written. |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub max_questions: u32,
    pub prepare_lookahead: u32,
    pub transcription_workers: usize,
    pub staging_pop_timeout_ms: u64,
    pub drain_timeout_secs: u64,
    pub session_idle_secs: u64,
    pub transcript_dir: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_questions: 15,
            prepare_lookahead: 2,
            transcription_workers: 2,
            staging_pop_timeout_ms: 1500,
            drain_timeout_secs: 60,
            session_idle_secs: 1800,
            transcript_dir: "./transcripts".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load from environment. Unset or invalid values fall back to defaults.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            max_questions: env_u32("INTERVOX_MAX_QUESTIONS", d.max_questions).max(3),
            prepare_lookahead: env_u32("INTERVOX_PREPARE_LOOKAHEAD", d.prepare_lookahead).max(1),
            transcription_workers: env_u32(
                "INTERVOX_TRANSCRIPTION_WORKERS",
                d.transcription_workers as u32,
            )
            .max(1) as usize,
            staging_pop_timeout_ms: env_u64(
                "INTERVOX_STAGING_POP_TIMEOUT_MS",
                d.staging_pop_timeout_ms,
            ),
            drain_timeout_secs: env_u64("INTERVOX_DRAIN_TIMEOUT_SECS", d.drain_timeout_secs),
            session_idle_secs: env_u64("INTERVOX_SESSION_IDLE_SECS", d.session_idle_secs),
            transcript_dir: std::env::var("INTERVOX_TRANSCRIPT_DIR")
                .unwrap_or(d.transcript_dir),
        }
    }
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let c = EngineConfig::default();
        assert_eq!(c.max_questions, 15);
        assert_eq!(c.transcription_workers, 2);
        assert!(c.prepare_lookahead >= 1);
    }

    // one test owns the env var to keep parallel tests from racing on it
    #[test]
    fn env_overrides_and_guards() {
        std::env::set_var("INTERVOX_MAX_QUESTIONS", "not-a-number");
        assert_eq!(EngineConfig::from_env().max_questions, 15);

        std::env::set_var("INTERVOX_MAX_QUESTIONS", "1");
        assert_eq!(EngineConfig::from_env().max_questions, 3);

        std::env::set_var("INTERVOX_MAX_QUESTIONS", "20");
        assert_eq!(EngineConfig::from_env().max_questions, 20);
        std::env::remove_var("INTERVOX_MAX_QUESTIONS");
    }
}
