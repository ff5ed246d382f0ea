//! The interview session: a per-interview state machine that stays
//! responsive to its driver while question preparation and answer
//! transcription run in background tasks.
//!
//! ```text
//! Created → Preparing → AwaitingAnswer → Transcribing ─┬─► AwaitingAnswer
//!                                                      └─► Reporting → Ended
//! ```
//!
//! Preparation and transcription overlap with the visible phase — the
//! machine tracks the in-flight question, not the background tasks. Every
//! wait in here is bounded; a slow backend degrades the experience but can
//! never stall the interview.

use crate::coverage::CoverageState;
use crate::error::{EngineError, EngineResult};
use crate::pool::{TranscriptionJob, TranscriptionPool};
use crate::question::{
    fixed_starter, pick_category, PreparedQuestion, QuestionCategory, QuestionSource,
    QuestionSpec, FIXED_STARTER_COUNT,
};
use crate::report::{self, EvaluationReport};
use crate::staging::StagingQueue;
use chrono::{DateTime, Utc};
use intervox_core::{EngineConfig, JobContext, Profile, TextGenerator};
use intervox_voice::{AudioEncoding, SpeechSynthesizer};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Placeholder text recorded for any ordinal whose transcription never
/// arrived. Missing answers are never silently dropped.
pub const NO_ANSWER_PLACEHOLDER: &str = "[no answer / failed]";

/// Externally visible phase of the session driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Created,
    Preparing,
    AwaitingAnswer,
    Transcribing,
    Reporting,
    Ended,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Preparing => "preparing",
            Self::AwaitingAnswer => "awaiting_answer",
            Self::Transcribing => "transcribing",
            Self::Reporting => "reporting",
            Self::Ended => "ended",
        }
    }
}

/// A transcribed (or placeholder) answer for one ordinal.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub ordinal: u32,
    pub question: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// One question/answer pair of the final transcript.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptEntry {
    pub spec: QuestionSpec,
    pub answer: Answer,
}

/// Non-blocking transcription query result.
#[derive(Debug, Clone)]
pub enum TranscriptionPoll {
    Ready(Answer),
    Pending,
}

/// Snapshot for status queries.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub session_id: String,
    pub phase: &'static str,
    pub asked: u32,
    pub total: u32,
    pub progress_percent: f32,
    pub skills_discussed: Vec<String>,
    pub projects_discussed: Vec<String>,
    pub topics_covered: Vec<String>,
    pub is_complete: bool,
}

/// Everything `finish()` produces.
#[derive(Debug, Clone)]
pub struct InterviewOutcome {
    pub report: EvaluationReport,
    pub entries: Vec<TranscriptEntry>,
    pub transcript_text: String,
    pub transcript_path: Option<String>,
}

struct SessionState {
    phase: Phase,
    asked: u32,
    current_question: Option<QuestionSpec>,
    questions: BTreeMap<u32, QuestionSpec>,
    answers: BTreeMap<u32, Answer>,
    coverage: CoverageState,
    category_counts: HashMap<QuestionCategory, u32>,
    audio_buffer: Vec<u8>,
    audio_encoding: AudioEncoding,
    staging_in_flight: u32,
}

/// Stateful core of one interview. Owns its staging queue and results
/// queue; shared with background tasks via `Arc`.
pub struct InterviewSession {
    id: String,
    profile: Profile,
    job: JobContext,
    config: EngineConfig,
    source: QuestionSource,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    pool: Arc<TranscriptionPool>,
    staging: StagingQueue,
    results_tx: mpsc::UnboundedSender<Answer>,
    results_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<Answer>>,
    state: Mutex<SessionState>,
    closed: AtomicBool,
    last_activity: Mutex<Instant>,
}

impl std::fmt::Debug for InterviewSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterviewSession")
            .field("id", &self.id)
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl InterviewSession {
    /// Create the session and eagerly submit preparation of all three
    /// fixed starters in parallel.
    pub fn new(
        id: String,
        profile: Profile,
        job: JobContext,
        config: EngineConfig,
        generator: Arc<dyn TextGenerator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        pool: Arc<TranscriptionPool>,
    ) -> Arc<Self> {
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        let session = Arc::new(Self {
            id,
            profile,
            job,
            config,
            source: QuestionSource::new(generator),
            synthesizer,
            pool,
            staging: StagingQueue::new(),
            results_tx,
            results_rx: tokio::sync::Mutex::new(results_rx),
            state: Mutex::new(SessionState {
                phase: Phase::Created,
                asked: 0,
                current_question: None,
                questions: BTreeMap::new(),
                answers: BTreeMap::new(),
                coverage: CoverageState::default(),
                category_counts: HashMap::new(),
                audio_buffer: Vec::new(),
                audio_encoding: AudioEncoding::Webm,
                staging_in_flight: 0,
            }),
            closed: AtomicBool::new(false),
            last_activity: Mutex::new(Instant::now()),
        });

        for ordinal in 1..=FIXED_STARTER_COUNT {
            let s = Arc::clone(&session);
            tokio::spawn(async move { s.prepare_fixed(ordinal).await });
        }
        session.lock_state().phase = Phase::Preparing;
        info!(session = %session.id, "interview session created; fixed starters staging");
        session
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn job(&self) -> &JobContext {
        &self.job
    }

    pub fn max_questions(&self) -> u32 {
        self.config.max_questions
    }

    pub fn asked(&self) -> u32 {
        self.lock_state().asked
    }

    pub fn phase(&self) -> Phase {
        self.lock_state().phase
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// How long since the last driver operation (registry idle sweep).
    pub fn idle_for(&self) -> Duration {
        self.last_activity
            .lock()
            .expect("activity clock poisoned")
            .elapsed()
    }

    /// Mark closed without reporting. Pending background work for this
    /// session is dropped on arrival; other sessions are unaffected.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.lock_state().phase = Phase::Ended;
    }

    /// Pop the next prepared question, or fall back so the interview never
    /// stalls on a slow background call. Phase → `AwaitingAnswer`.
    pub async fn deliver_question(self: &Arc<Self>) -> EngineResult<PreparedQuestion> {
        self.ensure_active()?;
        self.touch();

        let next_ordinal = {
            let st = self.lock_state();
            if st.phase == Phase::Reporting {
                return Err(EngineError::SessionClosed);
            }
            if st.asked >= self.config.max_questions {
                return Err(EngineError::InterviewComplete);
            }
            st.asked + 1
        };
        let timeout = Duration::from_millis(self.config.staging_pop_timeout_ms);

        let mut prepared = if next_ordinal <= FIXED_STARTER_COUNT {
            // Fixed starters must come out in canonical order; an exact
            // ordinal match or the text-only fixed question, never another
            // staged item.
            match self
                .staging
                .pop_matching(Some(next_ordinal), false, timeout)
                .await
            {
                Some(p) => p,
                None => {
                    debug!(
                        session = %self.id,
                        ordinal = next_ordinal,
                        "starter audio not staged in time; delivering text-only"
                    );
                    PreparedQuestion {
                        spec: fixed_starter(next_ordinal)?,
                        audio: None,
                    }
                }
            }
        } else {
            match self
                .staging
                .pop_matching(Some(next_ordinal), true, timeout)
                .await
            {
                Some(p) => p,
                None => {
                    let st = self.lock_state();
                    let category = pick_category(next_ordinal, &st.category_counts);
                    let spec = QuestionSource::fallback(
                        &self.profile,
                        &st.coverage,
                        next_ordinal,
                        category,
                    );
                    warn!(
                        session = %self.id,
                        ordinal = next_ordinal,
                        "no staged question available; using fallback"
                    );
                    PreparedQuestion { spec, audio: None }
                }
            }
        };

        // Staged items serve the next pending slot regardless of the
        // ordinal they were generated for.
        prepared.spec.ordinal = next_ordinal;

        {
            let mut st = self.lock_state();
            if st
                .questions
                .insert(next_ordinal, prepared.spec.clone())
                .is_none()
            {
                *st.category_counts.entry(prepared.spec.category).or_insert(0) += 1;
            }
            st.coverage.observe(&prepared.spec.text, "", &self.profile);
            st.current_question = Some(prepared.spec.clone());
            st.phase = Phase::AwaitingAnswer;
        }
        debug!(
            session = %self.id,
            ordinal = next_ordinal,
            category = prepared.spec.category.as_str(),
            has_audio = prepared.has_audio(),
            "question delivered"
        );
        Ok(prepared)
    }

    /// Buffer one recording chunk. Chunks are concatenated in arrival
    /// order until `capture_answer`.
    pub fn push_audio_chunk(&self, bytes: &[u8], mime: Option<&str>) -> EngineResult<usize> {
        self.ensure_active()?;
        self.touch();
        let mut st = self.lock_state();
        if let Some(m) = mime {
            st.audio_encoding = AudioEncoding::from_mime(m)?;
        }
        st.audio_buffer.extend_from_slice(bytes);
        Ok(st.audio_buffer.len())
    }

    /// Finish the current recording: hand the buffered audio to the
    /// transcription pool, advance `asked`, and (for ordinals ≥ 3) submit
    /// the next dynamic question preparation. Phase → `Transcribing`.
    ///
    /// The session does not wait for the transcription — the next question
    /// may be delivered while this one is still converting to text.
    pub async fn capture_answer(self: &Arc<Self>) -> EngineResult<u32> {
        self.ensure_active()?;
        self.touch();

        let (ordinal, question, audio, encoding) = {
            let mut st = self.lock_state();
            if st.phase == Phase::Reporting {
                return Err(EngineError::SessionClosed);
            }
            if st.audio_buffer.is_empty() {
                return Err(EngineError::NoAudioReceived);
            }
            if st.asked >= self.config.max_questions {
                return Err(EngineError::InterviewComplete);
            }
            let ordinal = st.asked + 1;
            let question = st
                .current_question
                .take()
                .map(|q| q.text)
                .or_else(|| st.questions.get(&ordinal).map(|q| q.text.clone()))
                .unwrap_or_else(|| "(question unavailable)".to_string());
            let audio = std::mem::take(&mut st.audio_buffer);
            let encoding = st.audio_encoding;
            st.asked = ordinal;
            st.phase = Phase::Transcribing;
            (ordinal, question, audio, encoding)
        };

        self.pool
            .submit(TranscriptionJob {
                session: Arc::clone(self),
                ordinal,
                question,
                audio,
                encoding,
            })
            .await?;
        debug!(session = %self.id, ordinal, "answer captured; transcription submitted");

        self.maybe_stage_next();
        Ok(ordinal)
    }

    /// Convenience for drivers holding a complete recording.
    pub async fn capture_answer_bytes(
        self: &Arc<Self>,
        audio: &[u8],
        encoding: AudioEncoding,
    ) -> EngineResult<u32> {
        {
            self.ensure_active()?;
            let mut st = self.lock_state();
            st.audio_encoding = encoding;
            st.audio_buffer.extend_from_slice(audio);
        }
        self.capture_answer().await
    }

    /// Non-blocking query: the next completed transcription, if any.
    pub async fn poll_transcription(&self) -> EngineResult<TranscriptionPoll> {
        self.ensure_active()?;
        self.touch();
        let mut rx = self.results_rx.lock().await;
        match rx.try_recv() {
            Ok(answer) => Ok(TranscriptionPoll::Ready(answer)),
            Err(_) => Ok(TranscriptionPoll::Pending),
        }
    }

    /// Called by a transcription worker: absorb the answer (history +
    /// coverage) and publish it on the results queue for the driver.
    pub fn complete_transcription(&self, answer: Answer) {
        if self.is_closed() {
            debug!(session = %self.id, ordinal = answer.ordinal, "late transcription ignored");
            return;
        }
        {
            let mut st = self.lock_state();
            st.coverage
                .observe(&answer.question, &answer.text, &self.profile);
            st.answers.insert(answer.ordinal, answer.clone());
            if st.phase == Phase::Transcribing {
                st.phase = Phase::AwaitingAnswer;
            }
        }
        let _ = self.results_tx.send(answer);
    }

    /// Current progress and coverage snapshot.
    pub fn status(&self) -> EngineResult<SessionStatus> {
        self.ensure_active()?;
        let st = self.lock_state();
        Ok(SessionStatus {
            session_id: self.id.clone(),
            phase: st.phase.as_str(),
            asked: st.asked,
            total: self.config.max_questions,
            progress_percent: (st.asked as f32 / self.config.max_questions as f32) * 100.0,
            skills_discussed: st.coverage.skills_discussed.iter().cloned().collect(),
            projects_discussed: st.coverage.projects_discussed.iter().cloned().collect(),
            topics_covered: st.coverage.topics_covered.iter().cloned().collect(),
            is_complete: st.asked >= self.config.max_questions,
        })
    }

    /// End the interview: drain outstanding transcriptions (bounded),
    /// fill placeholders for any ordinal without an answer, build the
    /// report and the persisted transcript, then transition to `Ended`.
    ///
    /// A second call fails with `SessionClosed` and does not duplicate
    /// the persisted artifact.
    pub async fn finish(self: &Arc<Self>) -> EngineResult<InterviewOutcome> {
        self.ensure_active()?;
        self.touch();
        {
            let mut st = self.lock_state();
            if st.phase == Phase::Reporting {
                return Err(EngineError::SessionClosed);
            }
            st.phase = Phase::Reporting;
        }
        info!(session = %self.id, "finishing interview; draining transcriptions");

        // Bounded drain: transcription completion order across ordinals is
        // not guaranteed; absorption happens in complete_transcription, the
        // results queue is only the wake-up signal here.
        let deadline = Instant::now() + Duration::from_secs(self.config.drain_timeout_secs);
        loop {
            let outstanding = {
                let st = self.lock_state();
                st.asked as usize - st.answers.len().min(st.asked as usize)
            };
            if outstanding == 0 {
                break;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                warn!(
                    session = %self.id,
                    outstanding,
                    "drain timeout; recording placeholders for missing answers"
                );
                break;
            }
            let mut rx = self.results_rx.lock().await;
            if tokio::time::timeout(remaining, rx.recv()).await.is_err() {
                continue; // deadline check handles exit
            }
        }

        // Build the gap-free, ordinal-sorted transcript.
        let (entries, coverage) = {
            let mut st = self.lock_state();
            let asked = st.asked;
            for ordinal in 1..=asked {
                if !st.answers.contains_key(&ordinal) {
                    let question = st
                        .questions
                        .get(&ordinal)
                        .map(|q| q.text.clone())
                        .unwrap_or_default();
                    st.answers.insert(
                        ordinal,
                        Answer {
                            ordinal,
                            question,
                            text: NO_ANSWER_PLACEHOLDER.to_string(),
                            timestamp: Utc::now(),
                        },
                    );
                }
            }
            let entries: Vec<TranscriptEntry> = st
                .answers
                .values()
                .map(|answer| TranscriptEntry {
                    spec: st.questions.get(&answer.ordinal).cloned().unwrap_or_else(|| {
                        QuestionSpec {
                            text: answer.question.clone(),
                            category: QuestionCategory::Behavioral,
                            ordinal: answer.ordinal,
                            origin: crate::question::QuestionOrigin::Fallback,
                        }
                    }),
                    answer: answer.clone(),
                })
                .collect();
            (entries, st.coverage.clone())
        };

        let report = report::generate_report(
            self.source.generator(),
            &self.profile,
            &self.job,
            &entries,
            &coverage,
        )
        .await;
        let transcript_text =
            report::render_transcript(&self.id, &self.profile, &entries, &coverage);
        let transcript_path = match report::persist_transcript(
            &self.config.transcript_dir,
            &self.id,
            &transcript_text,
        ) {
            Ok(path) => Some(path.display().to_string()),
            Err(e) => {
                warn!(session = %self.id, "could not persist transcript: {}", e);
                None
            }
        };

        {
            let mut st = self.lock_state();
            st.phase = Phase::Ended;
        }
        self.closed.store(true, Ordering::SeqCst);
        info!(
            session = %self.id,
            answers = entries.len(),
            "interview ended"
        );

        Ok(InterviewOutcome {
            report,
            entries,
            transcript_text,
            transcript_path,
        })
    }

    // ── internals ────────────────────────────────────────────────────

    async fn prepare_fixed(self: Arc<Self>, ordinal: u32) {
        let Ok(spec) = fixed_starter(ordinal) else { return };
        let audio = self.synthesize_or_none(&spec.text).await;
        if self.is_closed() {
            return;
        }
        self.staging.push(PreparedQuestion { spec, audio });
        debug!(session = %self.id, ordinal, "fixed starter staged");
    }

    /// Submit the next dynamic question preparation, gated by the
    /// look-ahead limit so expensive generation+synthesis calls cannot
    /// fan out without bound.
    fn maybe_stage_next(self: &Arc<Self>) {
        let (target, category, history, coverage) = {
            let mut st = self.lock_state();
            if st.asked < FIXED_STARTER_COUNT || st.asked >= self.config.max_questions {
                return;
            }
            if st.staging_in_flight >= self.config.prepare_lookahead {
                return;
            }
            st.staging_in_flight += 1;
            // Best-effort ordinal estimate for band selection; the ordinal
            // is restamped at delivery.
            let target = st.asked + st.staging_in_flight;
            let category = pick_category(target, &st.category_counts);
            (target, category, render_history(&st), st.coverage.clone())
        };

        let session = Arc::clone(self);
        tokio::spawn(async move {
            let spec = match session
                .source
                .generate(
                    &session.profile,
                    &session.job,
                    &history,
                    &coverage,
                    target,
                    category,
                )
                .await
            {
                Ok(spec) => spec,
                Err(e) => {
                    warn!(
                        session = %session.id,
                        ordinal = target,
                        "generation failed ({}); staging fallback",
                        e
                    );
                    QuestionSource::fallback(&session.profile, &coverage, target, category)
                }
            };
            let audio = session.synthesize_or_none(&spec.text).await;
            if !session.is_closed() {
                session.staging.push(PreparedQuestion { spec, audio });
                debug!(session = %session.id, ordinal = target, "dynamic question staged");
            }
            let mut st = session.lock_state();
            st.staging_in_flight = st.staging_in_flight.saturating_sub(1);
        });
    }

    async fn synthesize_or_none(&self, text: &str) -> Option<Vec<u8>> {
        match self.synthesizer.synthesize(text).await {
            Ok(audio) if !audio.is_empty() => Some(audio),
            Ok(_) => None,
            Err(e) => {
                warn!(session = %self.id, "synthesis failed ({}); question will be text-only", e);
                None
            }
        }
    }

    fn ensure_active(&self) -> EngineResult<()> {
        if self.is_closed() {
            return Err(EngineError::SessionClosed);
        }
        Ok(())
    }

    fn touch(&self) {
        *self
            .last_activity
            .lock()
            .expect("activity clock poisoned") = Instant::now();
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().expect("session state poisoned")
    }
}

fn render_history(st: &SessionState) -> String {
    let mut out = String::new();
    for (ordinal, question) in &st.questions {
        let answer = st
            .answers
            .get(ordinal)
            .map(|a| a.text.as_str())
            .unwrap_or("(pending)");
        out.push_str(&format!("Q{}: {}\nA{}: {}\n", ordinal, question.text, ordinal, answer));
    }
    out
}
