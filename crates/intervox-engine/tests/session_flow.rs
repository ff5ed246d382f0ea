//! End-to-end session flows against scripted backends: fixed starters,
//! fallback generation, chunked capture, out-of-order transcription,
//! placeholder filling, and lifecycle errors.

use async_trait::async_trait;
use intervox_core::{
    CannedText, CoreError, CoreResult, EngineConfig, JobContext, Profile, TextGenerator,
};
use intervox_engine::{
    EngineError, InterviewSession, Phase, QuestionCategory, SessionRegistry, TranscriptionPoll,
    NO_ANSWER_PLACEHOLDER,
};
use intervox_voice::{
    AudioEncoding, PlaceholderStt, PlaceholderTts, SpeechSynthesizer, SpeechTranscriber,
    VoiceError, VoiceResult,
};
use std::sync::Arc;
use std::time::Duration;

/// Generator that always fails, forcing the canned fallback path.
struct FailingText;

#[async_trait]
impl TextGenerator for FailingText {
    async fn generate(&self, _prompt: &str) -> CoreResult<String> {
        Err(CoreError::Generation("backend down".to_string()))
    }
}

/// Synthesizer that always fails; questions must still flow text-only.
struct FailingTts;

#[async_trait]
impl SpeechSynthesizer for FailingTts {
    async fn synthesize(&self, _text: &str) -> VoiceResult<Vec<u8>> {
        Err(VoiceError::Synthesis("no voice today".to_string()))
    }
}

/// Transcriber that echoes the audio bytes back as text; a leading 0xFF
/// byte makes it hang forever (a backend that never returns).
struct EchoStt;

#[async_trait]
impl SpeechTranscriber for EchoStt {
    async fn transcribe(&self, audio: &[u8], _encoding: AudioEncoding) -> VoiceResult<String> {
        if audio.first() == Some(&0xFF) {
            std::future::pending::<()>().await;
        }
        Ok(String::from_utf8_lossy(audio).to_string())
    }
}

fn test_config(dir: &tempfile::TempDir, max_questions: u32) -> EngineConfig {
    EngineConfig {
        max_questions,
        prepare_lookahead: 2,
        transcription_workers: 2,
        staging_pop_timeout_ms: 100,
        drain_timeout_secs: 1,
        session_idle_secs: 1800,
        transcript_dir: dir.path().to_str().unwrap().to_string(),
    }
}

fn go_sql_profile() -> Profile {
    Profile {
        name: "Sam Rivera".to_string(),
        skills: vec!["Go".to_string(), "SQL".to_string()],
        ..Default::default()
    }
}

fn registry_with(
    config: EngineConfig,
    generator: Arc<dyn TextGenerator>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    transcriber: Arc<dyn SpeechTranscriber>,
) -> SessionRegistry {
    SessionRegistry::new(config, generator, synthesizer, transcriber)
}

/// Poll until the next transcription is ready (bounded).
async fn wait_ready(session: &Arc<InterviewSession>) -> intervox_engine::Answer {
    for _ in 0..200 {
        if let TranscriptionPoll::Ready(answer) = session.poll_transcription().await.unwrap() {
            return answer;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("transcription never became ready");
}

#[tokio::test]
async fn first_three_questions_are_the_canonical_starters() {
    let dir = tempfile::tempdir().unwrap();
    let reg = registry_with(
        test_config(&dir, 15),
        Arc::new(CannedText::new()),
        Arc::new(PlaceholderTts),
        Arc::new(EchoStt),
    );
    let session = reg
        .create("s1".into(), go_sql_profile(), JobContext::default())
        .unwrap();

    let expected = [
        "Introduce yourself.",
        "Why are you interested in this role and company?",
        "What's your biggest weakness and how are you improving it?",
    ];
    for (i, want) in expected.iter().enumerate() {
        let q = session.deliver_question().await.unwrap();
        assert_eq!(q.spec.ordinal, i as u32 + 1);
        assert_eq!(q.spec.text, *want);
        session
            .capture_answer_bytes(format!("answer {}", i + 1).as_bytes(), AudioEncoding::Wav)
            .await
            .unwrap();
    }
    assert_eq!(session.asked(), 3);
}

#[tokio::test]
async fn asked_is_monotonic_and_counts_captures() {
    let dir = tempfile::tempdir().unwrap();
    let reg = registry_with(
        test_config(&dir, 15),
        Arc::new(CannedText::new()),
        Arc::new(PlaceholderTts),
        Arc::new(EchoStt),
    );
    let session = reg
        .create("s2".into(), go_sql_profile(), JobContext::default())
        .unwrap();

    assert_eq!(session.asked(), 0);
    for expected in 1..=4u32 {
        session.deliver_question().await.unwrap();
        // delivery alone never advances the counter
        assert_eq!(session.asked(), expected - 1);
        let ordinal = session
            .capture_answer_bytes(b"something", AudioEncoding::Wav)
            .await
            .unwrap();
        assert_eq!(ordinal, expected);
        assert_eq!(session.asked(), expected);
    }
}

// Scenario A: after the three starters, question 4 must land in the
// technical band and avoid skills already discussed.
#[tokio::test]
async fn question_four_targets_an_unused_skill() {
    let dir = tempfile::tempdir().unwrap();
    let reg = registry_with(
        test_config(&dir, 15),
        Arc::new(FailingText),
        Arc::new(PlaceholderTts),
        Arc::new(EchoStt),
    );
    let session = reg
        .create("s3".into(), go_sql_profile(), JobContext::default())
        .unwrap();

    // Answers 1 and 2 mention Go; wait for each transcription so coverage
    // is updated before question 4 is staged.
    for answer in ["I mostly write Go services", "more Go again", "nothing new"] {
        session.deliver_question().await.unwrap();
        session
            .capture_answer_bytes(answer.as_bytes(), AudioEncoding::Wav)
            .await
            .unwrap();
        wait_ready(&session).await;
    }

    let q4 = session.deliver_question().await.unwrap();
    assert_eq!(q4.spec.ordinal, 4);
    assert!(
        q4.spec.category == QuestionCategory::TechnicalSkills
            || q4.spec.category == QuestionCategory::ProjectsDeepDive,
        "unexpected category {:?}",
        q4.spec.category
    );
    assert!(q4.spec.text.contains("SQL"), "question was: {}", q4.spec.text);
    assert!(!q4.spec.text.contains("Go"), "question was: {}", q4.spec.text);
}

// Scenario B: synthesis down → every question still has text, none has audio.
#[tokio::test]
async fn synthesis_failure_degrades_to_text_only() {
    let dir = tempfile::tempdir().unwrap();
    let reg = registry_with(
        test_config(&dir, 15),
        Arc::new(CannedText::new()),
        Arc::new(FailingTts),
        Arc::new(EchoStt),
    );
    let session = reg
        .create("s4".into(), go_sql_profile(), JobContext::default())
        .unwrap();

    for _ in 0..5 {
        let q = session.deliver_question().await.unwrap();
        assert!(!q.spec.text.trim().is_empty());
        assert!(!q.has_audio());
        session
            .capture_answer_bytes(b"ok", AudioEncoding::Wav)
            .await
            .unwrap();
    }
}

// Scenario C: one transcription never returns → finish() records a
// placeholder for that ordinal and real answers everywhere else, sorted
// by ordinal with no gaps.
#[tokio::test]
async fn hung_transcription_becomes_a_placeholder() {
    let dir = tempfile::tempdir().unwrap();
    let reg = registry_with(
        test_config(&dir, 6),
        Arc::new(CannedText::new()),
        Arc::new(PlaceholderTts),
        Arc::new(EchoStt),
    );
    let session = reg
        .create("s5".into(), go_sql_profile(), JobContext::default())
        .unwrap();

    for ordinal in 1..=6u32 {
        session.deliver_question().await.unwrap();
        let audio: Vec<u8> = if ordinal == 5 {
            vec![0xFF] // transcriber hangs on this payload
        } else {
            format!("spoken answer {}", ordinal).into_bytes()
        };
        session
            .capture_answer_bytes(&audio, AudioEncoding::Wav)
            .await
            .unwrap();
    }

    let outcome = session.finish().await.unwrap();
    let ordinals: Vec<u32> = outcome.entries.iter().map(|e| e.answer.ordinal).collect();
    assert_eq!(ordinals, vec![1, 2, 3, 4, 5, 6]);
    for entry in &outcome.entries {
        if entry.answer.ordinal == 5 {
            assert_eq!(entry.answer.text, NO_ANSWER_PLACEHOLDER);
        } else {
            assert_eq!(
                entry.answer.text,
                format!("spoken answer {}", entry.answer.ordinal)
            );
        }
    }
    assert_eq!(session.phase(), Phase::Ended);
}

// Scenario D: chunks are concatenated in arrival order before transcription.
#[tokio::test]
async fn audio_chunks_concatenate_in_arrival_order() {
    let dir = tempfile::tempdir().unwrap();
    let reg = registry_with(
        test_config(&dir, 15),
        Arc::new(CannedText::new()),
        Arc::new(PlaceholderTts),
        Arc::new(EchoStt),
    );
    let session = reg
        .create("s6".into(), go_sql_profile(), JobContext::default())
        .unwrap();

    session.deliver_question().await.unwrap();
    session
        .push_audio_chunk(b"hello ", Some("audio/wav"))
        .unwrap();
    session.push_audio_chunk(b"world", None).unwrap();
    session.capture_answer().await.unwrap();

    let answer = wait_ready(&session).await;
    assert_eq!(answer.text, "hello world");
    assert_eq!(answer.ordinal, 1);
}

#[tokio::test]
async fn empty_recording_is_rejected_and_retryable() {
    let dir = tempfile::tempdir().unwrap();
    let reg = registry_with(
        test_config(&dir, 15),
        Arc::new(CannedText::new()),
        Arc::new(PlaceholderTts),
        Arc::new(EchoStt),
    );
    let session = reg
        .create("s7".into(), go_sql_profile(), JobContext::default())
        .unwrap();

    session.deliver_question().await.unwrap();
    let err = session.capture_answer().await.unwrap_err();
    assert!(matches!(err, EngineError::NoAudioReceived));
    // same ordinal can be retried once audio arrives
    session.push_audio_chunk(b"take two", None).unwrap();
    let ordinal = session.capture_answer().await.unwrap();
    assert_eq!(ordinal, 1);
}

#[tokio::test]
async fn finishing_twice_is_rejected_and_writes_one_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let reg = registry_with(
        test_config(&dir, 3),
        Arc::new(CannedText::new()),
        Arc::new(PlaceholderTts),
        Arc::new(EchoStt),
    );
    let session = reg
        .create("s8".into(), go_sql_profile(), JobContext::default())
        .unwrap();

    for _ in 0..3 {
        session.deliver_question().await.unwrap();
        session
            .capture_answer_bytes(b"done", AudioEncoding::Wav)
            .await
            .unwrap();
    }
    let outcome = session.finish().await.unwrap();
    assert!(outcome.transcript_path.is_some());

    let err = session.finish().await.unwrap_err();
    assert!(matches!(err, EngineError::SessionClosed));
    // any further operation on the ended session is rejected too
    assert!(matches!(
        session.deliver_question().await.unwrap_err(),
        EngineError::SessionClosed
    ));

    let files = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(files, 1);
}

#[tokio::test]
async fn delivery_past_the_last_question_is_complete() {
    let dir = tempfile::tempdir().unwrap();
    let reg = registry_with(
        test_config(&dir, 3),
        Arc::new(CannedText::new()),
        Arc::new(PlaceholderTts),
        Arc::new(EchoStt),
    );
    let session = reg
        .create("s9".into(), go_sql_profile(), JobContext::default())
        .unwrap();

    for _ in 0..3 {
        session.deliver_question().await.unwrap();
        session
            .capture_answer_bytes(b"ok", AudioEncoding::Wav)
            .await
            .unwrap();
    }
    let err = session.deliver_question().await.unwrap_err();
    assert!(matches!(err, EngineError::InterviewComplete));
}

#[tokio::test]
async fn status_reports_progress_and_coverage() {
    let dir = tempfile::tempdir().unwrap();
    let reg = registry_with(
        test_config(&dir, 15),
        Arc::new(CannedText::new()),
        Arc::new(PlaceholderTts),
        Arc::new(EchoStt),
    );
    let session = reg
        .create("s10".into(), go_sql_profile(), JobContext::default())
        .unwrap();

    session.deliver_question().await.unwrap();
    session
        .capture_answer_bytes(b"I used SQL a lot", AudioEncoding::Wav)
        .await
        .unwrap();
    wait_ready(&session).await;

    let status = session.status().unwrap();
    assert_eq!(status.asked, 1);
    assert_eq!(status.total, 15);
    assert!(!status.is_complete);
    assert!(status.skills_discussed.contains(&"SQL".to_string()));
}

#[tokio::test]
async fn placeholder_backends_run_the_whole_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let reg = registry_with(
        test_config(&dir, 4),
        Arc::new(CannedText::new()),
        Arc::new(PlaceholderTts),
        Arc::new(PlaceholderStt::with_response("a fine answer")),
    );
    let session = reg
        .create("s11".into(), go_sql_profile(), JobContext::default())
        .unwrap();

    for _ in 0..4 {
        session.deliver_question().await.unwrap();
        session
            .capture_answer_bytes(b"bytes", AudioEncoding::Webm)
            .await
            .unwrap();
    }
    let outcome = session.finish().await.unwrap();
    assert_eq!(outcome.entries.len(), 4);
    for entry in &outcome.entries {
        assert_eq!(entry.answer.text, "a fine answer");
    }
    assert!(outcome.transcript_text.contains("QUESTION 4:"));
}
