//! JSON event envelopes for the WebSocket transport. One client event in,
//! one server event out; audio travels base64-encoded.

use intervox_engine::{EvaluationReport, SessionStatus};
use serde::{Deserialize, Serialize};

/// Events consumed from the client.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    CreateSession {
        /// Client-chosen id; a UUID is assigned when absent.
        session_id: Option<String>,
        job_description: String,
        resume_text: String,
    },
    RequestQuestion {
        session_id: String,
    },
    AudioChunk {
        session_id: String,
        /// Base64-encoded recording chunk.
        data: String,
        /// MIME hint, e.g. "audio/webm". Sticky per session once sent.
        mime: Option<String>,
    },
    FinishRecording {
        session_id: String,
    },
    PollTranscription {
        session_id: String,
    },
    GetStatus {
        session_id: String,
    },
    EndSession {
        session_id: String,
    },
}

/// Events emitted to the client.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    SessionCreated {
        session_id: String,
        total_questions: u32,
        candidate: String,
    },
    QuestionReady {
        ordinal: u32,
        text: String,
        category: &'static str,
        has_audio: bool,
        /// Base64-encoded synthesized audio, when available.
        #[serde(skip_serializing_if = "Option::is_none")]
        audio: Option<String>,
    },
    ChunkAck {
        received: usize,
    },
    RecordingAck {
        ordinal: u32,
    },
    TranscriptionReady {
        ordinal: u32,
        text: String,
    },
    TranscriptionPending,
    Status {
        #[serde(flatten)]
        status: SessionStatus,
    },
    InterviewEnded {
        report: EvaluationReport,
        #[serde(skip_serializing_if = "Option::is_none")]
        transcript_path: Option<String>,
    },
    Error {
        message: String,
    },
}
