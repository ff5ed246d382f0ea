//! WebSocket interview transport: one JSON event per client message, each
//! performing exactly one session operation, each answered with one event
//! on the same socket.
//!
//! Session errors come back as `error` envelopes — they never tear the
//! socket down, and a disconnect never destroys the session (the client
//! may reconnect by id; the registry's idle sweeper collects abandoned
//! sessions).

use crate::events::{ClientEvent, ServerEvent};
use crate::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use intervox_engine::TranscriptionPoll;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    info!("interview client connected");
    while let Some(Ok(message)) = socket.recv().await {
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };
        let reply = match serde_json::from_str::<ClientEvent>(&text) {
            Ok(event) => handle_event(&state, event).await,
            Err(e) => ServerEvent::Error {
                message: format!("malformed event: {}", e),
            },
        };
        let payload = match serde_json::to_string(&reply) {
            Ok(p) => p,
            Err(e) => {
                warn!("could not serialize reply: {}", e);
                continue;
            }
        };
        if socket.send(Message::Text(payload)).await.is_err() {
            break;
        }
    }
    debug!("interview client disconnected");
}

async fn handle_event(state: &AppState, event: ClientEvent) -> ServerEvent {
    match event {
        ClientEvent::CreateSession {
            session_id,
            job_description,
            resume_text,
        } => {
            let id = session_id.unwrap_or_else(|| Uuid::new_v4().to_string());
            match state
                .registry
                .create_from_documents(id.clone(), &resume_text, &job_description)
                .await
            {
                Ok(session) => ServerEvent::SessionCreated {
                    session_id: id,
                    total_questions: session.max_questions(),
                    candidate: session.profile().display_name().to_string(),
                },
                Err(e) => error_event(e),
            }
        }

        ClientEvent::RequestQuestion { session_id } => {
            match state.registry.get(&session_id) {
                Ok(session) => match session.deliver_question().await {
                    Ok(prepared) => {
                        let audio = prepared
                            .audio
                            .as_deref()
                            .filter(|a| !a.is_empty())
                            .map(|a| BASE64.encode(a));
                        ServerEvent::QuestionReady {
                            ordinal: prepared.spec.ordinal,
                            text: prepared.spec.text,
                            category: prepared.spec.category.as_str(),
                            has_audio: audio.is_some(),
                            audio,
                        }
                    }
                    Err(e) => error_event(e),
                },
                Err(e) => error_event(e),
            }
        }

        ClientEvent::AudioChunk {
            session_id,
            data,
            mime,
        } => match state.registry.get(&session_id) {
            Ok(session) => match BASE64.decode(data.as_bytes()) {
                Ok(bytes) => {
                    match session.push_audio_chunk(&bytes, mime.as_deref()) {
                        Ok(received) => ServerEvent::ChunkAck { received },
                        Err(e) => error_event(e),
                    }
                }
                Err(e) => ServerEvent::Error {
                    message: format!("invalid base64 audio: {}", e),
                },
            },
            Err(e) => error_event(e),
        },

        ClientEvent::FinishRecording { session_id } => {
            match state.registry.get(&session_id) {
                Ok(session) => match session.capture_answer().await {
                    Ok(ordinal) => ServerEvent::RecordingAck { ordinal },
                    Err(e) => error_event(e),
                },
                Err(e) => error_event(e),
            }
        }

        ClientEvent::PollTranscription { session_id } => {
            match state.registry.get(&session_id) {
                Ok(session) => match session.poll_transcription().await {
                    Ok(TranscriptionPoll::Ready(answer)) => ServerEvent::TranscriptionReady {
                        ordinal: answer.ordinal,
                        text: answer.text,
                    },
                    Ok(TranscriptionPoll::Pending) => ServerEvent::TranscriptionPending,
                    Err(e) => error_event(e),
                },
                Err(e) => error_event(e),
            }
        }

        ClientEvent::GetStatus { session_id } => match state.registry.get(&session_id) {
            Ok(session) => match session.status() {
                Ok(status) => ServerEvent::Status { status },
                Err(e) => error_event(e),
            },
            Err(e) => error_event(e),
        },

        // The ended session stays registered (a repeated end_session gets a
        // clean "session is closed" rather than "not found"); the idle
        // sweeper removes it from the table.
        ClientEvent::EndSession { session_id } => match state.registry.get(&session_id) {
            Ok(session) => match session.finish().await {
                Ok(outcome) => ServerEvent::InterviewEnded {
                    report: outcome.report,
                    transcript_path: outcome.transcript_path,
                },
                Err(e) => error_event(e),
            },
            Err(e) => error_event(e),
        },
    }
}

fn error_event(e: intervox_engine::EngineError) -> ServerEvent {
    ServerEvent::Error {
        message: e.to_string(),
    }
}
