//! **Speech synthesis** — turn question text into audio bytes for playback.
//!
//! Implement [`SpeechSynthesizer`] for any OpenAI-compatible `/audio/speech`
//! endpoint via [`OpenAiTts`]. An empty byte vector means "no audio"; the
//! engine delivers the question text-only in that case.

use crate::error::{VoiceError, VoiceResult};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Backend that turns text into audio bytes (WAV/MP3). Return an empty vec
/// to skip audio for this question.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> VoiceResult<Vec<u8>>;
}

/// Placeholder TTS: returns empty audio so every question is text-only.
#[derive(Debug, Default)]
pub struct PlaceholderTts;

#[async_trait]
impl SpeechSynthesizer for PlaceholderTts {
    async fn synthesize(&self, _text: &str) -> VoiceResult<Vec<u8>> {
        Ok(Vec::new())
    }
}

/// Production TTS backend: OpenAI-compatible `/audio/speech` API.
///
/// | Env | Default | Description |
/// |-----|---------|-------------|
/// | TTS_API_URL | https://api.openai.com/v1 | Base URL without trailing slash. |
/// | TTS_API_KEY / LLM_API_KEY / OPENAI_API_KEY | — | Bearer key (required). |
/// | TTS_MODEL | tts-1 | tts-1 (fast) or tts-1-hd. |
/// | TTS_VOICE | nova | alloy, echo, fable, onyx, nova, shimmer. |
#[derive(Debug, Clone)]
pub struct OpenAiTts {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub voice: String,
    client: reqwest::Client,
}

impl OpenAiTts {
    /// Build from environment. Fails with `Config` when no key is set.
    pub fn from_env() -> VoiceResult<Self> {
        let base_url = std::env::var("TTS_API_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let api_key = std::env::var("TTS_API_KEY")
            .or_else(|_| std::env::var("LLM_API_KEY"))
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .map_err(|_| {
                VoiceError::Config(
                    "TTS requires TTS_API_KEY, LLM_API_KEY, or OPENAI_API_KEY".to_string(),
                )
            })?;
        let model = std::env::var("TTS_MODEL").unwrap_or_else(|_| "tts-1".to_string());
        let voice = std::env::var("TTS_VOICE").unwrap_or_else(|_| "nova".to_string());
        Self::new(base_url, api_key, model, voice)
    }

    /// Create with explicit config.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        voice: impl Into<String>,
    ) -> VoiceResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| VoiceError::Synthesis(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            voice: voice.into(),
            client,
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiTts {
    async fn synthesize(&self, text: &str) -> VoiceResult<Vec<u8>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}/audio/speech", self.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "model": self.model,
            "input": text,
            "voice": self.voice,
        });
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| VoiceError::Synthesis(e.to_string()))?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(VoiceError::Synthesis(format!(
                "TTS API error {}: {}",
                status, body
            )));
        }
        let bytes = res
            .bytes()
            .await
            .map_err(|e| VoiceError::Synthesis(e.to_string()))?;
        debug!(bytes = bytes.len(), "synthesized question audio");
        Ok(bytes.to_vec())
    }
}

/// Create the best available synthesizer from environment: [`OpenAiTts`]
/// when a key is configured, [`PlaceholderTts`] otherwise.
pub fn create_best_tts() -> Box<dyn SpeechSynthesizer> {
    match OpenAiTts::from_env() {
        Ok(t) => Box::new(t),
        Err(_) => Box::new(PlaceholderTts),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn placeholder_returns_empty() {
        let tts = PlaceholderTts;
        assert!(tts.synthesize("hello").await.unwrap().is_empty());
    }
}
