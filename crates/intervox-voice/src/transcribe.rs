//! **Speech-to-text** — convert a finished answer recording into text.
//!
//! Implement [`SpeechTranscriber`] for any OpenAI-compatible
//! `/audio/transcriptions` endpoint via [`OpenAiStt`]. An empty string means
//! "nothing detected"; errors are recovered upstream as placeholder answers.

use crate::encoding::{normalize_for_upload, AudioEncoding};
use crate::error::{VoiceError, VoiceResult};
use async_trait::async_trait;
use std::time::Duration;

/// Backend for converting a complete recording to text.
#[async_trait]
pub trait SpeechTranscriber: Send + Sync {
    /// Transcribe one recording. Return an empty string if nothing was said.
    async fn transcribe(&self, audio: &[u8], encoding: AudioEncoding) -> VoiceResult<String>;
}

/// Placeholder STT: returns a fixed string. Use for driving the pipeline
/// without an API key.
#[derive(Debug, Default)]
pub struct PlaceholderStt {
    /// If set, return this instead of the default message.
    pub response: Option<String>,
}

impl PlaceholderStt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(s: impl Into<String>) -> Self {
        Self {
            response: Some(s.into()),
        }
    }
}

#[async_trait]
impl SpeechTranscriber for PlaceholderStt {
    async fn transcribe(&self, audio: &[u8], _encoding: AudioEncoding) -> VoiceResult<String> {
        if let Some(ref r) = self.response {
            return Ok(r.clone());
        }
        Ok(format!(
            "[STT placeholder: {} bytes — set STT_API_KEY for real transcription]",
            audio.len()
        ))
    }
}

/// Production STT backend: OpenAI-compatible transcription API.
///
/// | Env | Default | Description |
/// |-----|---------|-------------|
/// | STT_API_URL | https://api.openai.com/v1 | Base URL without trailing slash. |
/// | STT_API_KEY / LLM_API_KEY / OPENAI_API_KEY | — | Bearer key (required). |
/// | STT_MODEL | whisper-1 | whisper-1 or gpt-4o-transcribe, etc. |
#[derive(Debug, Clone)]
pub struct OpenAiStt {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    client: reqwest::Client,
}

impl OpenAiStt {
    /// Build from environment. Fails with `Config` when no key is set.
    pub fn from_env() -> VoiceResult<Self> {
        let base_url = std::env::var("STT_API_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let api_key = std::env::var("STT_API_KEY")
            .or_else(|_| std::env::var("LLM_API_KEY"))
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .map_err(|_| {
                VoiceError::Config(
                    "STT requires STT_API_KEY, LLM_API_KEY, or OPENAI_API_KEY".to_string(),
                )
            })?;
        let model = std::env::var("STT_MODEL").unwrap_or_else(|_| "whisper-1".to_string());
        Self::new(base_url, api_key, model)
    }

    /// Create with explicit config.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> VoiceResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| VoiceError::Transcription(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            client,
        })
    }
}

#[async_trait]
impl SpeechTranscriber for OpenAiStt {
    async fn transcribe(&self, audio: &[u8], encoding: AudioEncoding) -> VoiceResult<String> {
        if audio.is_empty() {
            return Ok(String::new());
        }
        let (payload, upload_encoding) = normalize_for_upload(audio.to_vec(), encoding);
        let url = format!(
            "{}/audio/transcriptions",
            self.base_url.trim_end_matches('/')
        );
        let part = reqwest::multipart::Part::bytes(payload)
            .file_name(upload_encoding.file_name())
            .mime_str(upload_encoding.mime())
            .map_err(|e| VoiceError::Transcription(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.model.clone());
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| VoiceError::Transcription(e.to_string()))?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(VoiceError::Transcription(format!(
                "STT API error {}: {}",
                status, body
            )));
        }
        let json: serde_json::Value = res
            .json()
            .await
            .map_err(|e| VoiceError::Transcription(e.to_string()))?;
        let text = json
            .get("text")
            .and_then(|t| t.as_str())
            .unwrap_or("")
            .trim()
            .to_string();
        Ok(text)
    }
}

/// Create the best available transcriber from environment: [`OpenAiStt`]
/// when a key is configured, [`PlaceholderStt`] otherwise.
pub fn create_best_stt() -> Box<dyn SpeechTranscriber> {
    match OpenAiStt::from_env() {
        Ok(s) => Box::new(s),
        Err(_) => Box::new(PlaceholderStt::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn placeholder_reports_size() {
        let stt = PlaceholderStt::new();
        let text = stt
            .transcribe(&[0u8; 320], AudioEncoding::Wav)
            .await
            .unwrap();
        assert!(text.contains("320"));
    }

    #[tokio::test]
    async fn placeholder_with_response() {
        let stt = PlaceholderStt::with_response("hello world");
        assert_eq!(
            stt.transcribe(&[], AudioEncoding::Webm).await.unwrap(),
            "hello world"
        );
    }
}
