//! Transcription worker pool: a small, process-wide set of workers that
//! turn finished answer recordings into text and hand the result back to
//! the owning session.
//!
//! The job channel is bounded — submission applies backpressure instead of
//! spawning unbounded work. Workers for ended sessions drop the job on
//! receipt; one worker stalling on a slow backend never blocks the others.

use crate::error::{EngineError, EngineResult};
use crate::session::{Answer, InterviewSession};
use chrono::Utc;
use intervox_voice::{AudioEncoding, SpeechTranscriber};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

/// Queued work beyond the worker count before submitters start waiting.
const JOB_QUEUE_DEPTH: usize = 16;

/// One answer recording to transcribe for one (session, ordinal).
pub struct TranscriptionJob {
    pub session: Arc<InterviewSession>,
    pub ordinal: u32,
    pub question: String,
    pub audio: Vec<u8>,
    pub encoding: AudioEncoding,
}

/// Bounded pool shared by all sessions, scheduled by simple availability.
pub struct TranscriptionPool {
    job_tx: mpsc::Sender<TranscriptionJob>,
}

impl TranscriptionPool {
    /// Spawn `workers` worker tasks draining a shared job channel.
    pub fn new(workers: usize, transcriber: Arc<dyn SpeechTranscriber>) -> Arc<Self> {
        let (job_tx, job_rx) = mpsc::channel::<TranscriptionJob>(JOB_QUEUE_DEPTH);
        let job_rx = Arc::new(Mutex::new(job_rx));

        for worker_id in 0..workers.max(1) {
            let job_rx = Arc::clone(&job_rx);
            let transcriber = Arc::clone(&transcriber);
            tokio::spawn(async move {
                loop {
                    // Lock only to receive; released before transcription so
                    // workers run jobs concurrently.
                    let job = { job_rx.lock().await.recv().await };
                    let Some(job) = job else { break };
                    run_job(worker_id, job, transcriber.as_ref()).await;
                }
                debug!(worker_id, "transcription worker stopped");
            });
        }

        info!(workers = workers.max(1), "transcription pool started");
        Arc::new(Self { job_tx })
    }

    /// Submit a job. Awaits when the queue is full (backpressure); fails
    /// only if the pool is gone entirely.
    pub async fn submit(&self, job: TranscriptionJob) -> EngineResult<()> {
        self.job_tx
            .send(job)
            .await
            .map_err(|e| EngineError::PoolClosed(e.to_string()))
    }
}

async fn run_job(worker_id: usize, job: TranscriptionJob, transcriber: &dyn SpeechTranscriber) {
    let session_id = job.session.id().to_string();
    if job.session.is_closed() {
        debug!(
            worker_id,
            session = %session_id,
            ordinal = job.ordinal,
            "session ended; dropping transcription job"
        );
        return;
    }

    let text = match transcriber.transcribe(&job.audio, job.encoding).await {
        Ok(t) => t,
        Err(e) => {
            warn!(
                worker_id,
                session = %session_id,
                ordinal = job.ordinal,
                "transcription failed: {}",
                e
            );
            format!("[transcription failed: {}]", e)
        }
    };

    let answer = Answer {
        ordinal: job.ordinal,
        question: job.question,
        text,
        timestamp: Utc::now(),
    };
    job.session.complete_transcription(answer);
    debug!(
        worker_id,
        session = %session_id,
        ordinal = job.ordinal,
        "transcription published"
    );
}
