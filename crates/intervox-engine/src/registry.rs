//! Process-wide session registry: the only structure mutated by multiple
//! unrelated callers concurrently. Owns existence and lifetime, nothing
//! else — all interview logic lives on the session.

use crate::error::{EngineError, EngineResult};
use crate::pool::TranscriptionPool;
use crate::session::InterviewSession;
use dashmap::DashMap;
use intervox_core::{EngineConfig, JobContext, Profile, ProfileAnalyzer, TextGenerator};
use intervox_voice::{SpeechSynthesizer, SpeechTranscriber};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Guarded map of live sessions plus the shared backends new sessions are
/// wired to. Create/destroy serialize against lookups via the map shards.
pub struct SessionRegistry {
    sessions: DashMap<String, Arc<InterviewSession>>,
    config: EngineConfig,
    generator: Arc<dyn TextGenerator>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    pool: Arc<TranscriptionPool>,
    analyzer: ProfileAnalyzer,
}

impl SessionRegistry {
    pub fn new(
        config: EngineConfig,
        generator: Arc<dyn TextGenerator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        transcriber: Arc<dyn SpeechTranscriber>,
    ) -> Self {
        let pool = TranscriptionPool::new(config.transcription_workers, transcriber);
        Self {
            sessions: DashMap::new(),
            analyzer: ProfileAnalyzer::new(Arc::clone(&generator)),
            config,
            generator,
            synthesizer,
            pool,
        }
    }

    /// Create a session from already-structured inputs.
    pub fn create(
        &self,
        id: String,
        profile: Profile,
        job: JobContext,
    ) -> EngineResult<Arc<InterviewSession>> {
        match self.sessions.entry(id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(EngineError::DuplicateSession(id))
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                let session = InterviewSession::new(
                    id,
                    profile,
                    job,
                    self.config.clone(),
                    Arc::clone(&self.generator),
                    Arc::clone(&self.synthesizer),
                    Arc::clone(&self.pool),
                );
                vacant.insert(Arc::clone(&session));
                Ok(session)
            }
        }
    }

    /// Create a session from raw documents: extract the profile and job
    /// context first, then register. Extraction failures surface to the
    /// caller; nothing is registered in that case.
    pub async fn create_from_documents(
        &self,
        id: String,
        resume_text: &str,
        job_description: &str,
    ) -> EngineResult<Arc<InterviewSession>> {
        if self.sessions.contains_key(&id) {
            return Err(EngineError::DuplicateSession(id));
        }
        let profile = self.analyzer.parse_resume(resume_text).await?;
        let job = self.analyzer.analyze_job(job_description).await?;
        self.create(id, profile, job)
    }

    pub fn get(&self, id: &str) -> EngineResult<Arc<InterviewSession>> {
        self.sessions
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| EngineError::SessionNotFound(id.to_string()))
    }

    /// Remove and close a session. Pending background work for it is
    /// dropped; other sessions are untouched.
    pub fn destroy(&self, id: &str) -> EngineResult<()> {
        let (_, session) = self
            .sessions
            .remove(id)
            .ok_or_else(|| EngineError::SessionNotFound(id.to_string()))?;
        session.close();
        info!(session = %id, "session destroyed");
        Ok(())
    }

    /// Remove ended sessions and sessions idle beyond the configured
    /// period. Returns how many were swept.
    pub fn sweep_idle(&self) -> usize {
        let ttl = Duration::from_secs(self.config.session_idle_secs);
        let stale: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().is_closed() || entry.value().idle_for() > ttl)
            .map(|entry| entry.key().clone())
            .collect();
        for id in &stale {
            if let Some((_, session)) = self.sessions.remove(id) {
                session.close();
                debug!(session = %id, "idle session swept");
            }
        }
        stale.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intervox_core::CannedText;
    use intervox_voice::{PlaceholderStt, PlaceholderTts};

    fn registry() -> SessionRegistry {
        SessionRegistry::new(
            EngineConfig::default(),
            Arc::new(CannedText::new()),
            Arc::new(PlaceholderTts),
            Arc::new(PlaceholderStt::new()),
        )
    }

    #[tokio::test]
    async fn duplicate_create_is_rejected() {
        let reg = registry();
        reg.create("a".into(), Profile::default(), JobContext::default())
            .unwrap();
        let err = reg
            .create("a".into(), Profile::default(), JobContext::default())
            .unwrap_err();
        assert!(matches!(err, EngineError::DuplicateSession(_)));
        assert_eq!(reg.len(), 1);
    }

    #[tokio::test]
    async fn get_unknown_is_not_found() {
        let reg = registry();
        assert!(matches!(
            reg.get("missing").unwrap_err(),
            EngineError::SessionNotFound(_)
        ));
    }

    #[tokio::test]
    async fn sweep_removes_ended_sessions() {
        let reg = registry();
        let session = reg
            .create("a".into(), Profile::default(), JobContext::default())
            .unwrap();
        assert_eq!(reg.sweep_idle(), 0);
        session.close();
        assert_eq!(reg.sweep_idle(), 1);
        assert!(reg.is_empty());
    }

    #[tokio::test]
    async fn destroy_closes_the_session() {
        let reg = registry();
        let session = reg
            .create("a".into(), Profile::default(), JobContext::default())
            .unwrap();
        reg.destroy("a").unwrap();
        assert!(session.is_closed());
        assert!(reg.is_empty());
        assert!(matches!(
            reg.destroy("a").unwrap_err(),
            EngineError::SessionNotFound(_)
        ));
    }
}
