//! Terminal interview loop: the synchronous transport variant. Drives the
//! same session operations as the WebSocket handler — prepare, deliver,
//! capture, finish — with the operator supplying each answer as the path
//! of a recorded audio file.

use anyhow::Context;
use intervox_engine::{EngineError, SessionRegistry, TranscriptionPoll};
use intervox_voice::AudioEncoding;
use std::io::{self, Write};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

pub async fn run(registry: Arc<SessionRegistry>) -> anyhow::Result<()> {
    println!("intervox — voice interview (terminal mode)");
    println!("==========================================");

    let resume_path = prompt_line("Path to resume text file: ")?;
    let resume_text = std::fs::read_to_string(resume_path.trim())
        .with_context(|| format!("could not read resume at {}", resume_path.trim()))?;

    println!("Paste the job description (finish with an empty line):");
    let job_description = read_until_blank()?;

    let session_id = Uuid::new_v4().to_string();
    print!("Preparing interview… ");
    io::stdout().flush().ok();
    let session = registry
        .create_from_documents(session_id.clone(), &resume_text, &job_description)
        .await?;
    println!(
        "ready. Candidate: {}, {} questions.",
        session.profile().display_name(),
        session.max_questions()
    );

    prompt_line("Press ENTER to start the interview…")?;

    loop {
        let prepared = match session.deliver_question().await {
            Ok(q) => q,
            Err(EngineError::InterviewComplete) => break,
            Err(e) => return Err(e.into()),
        };
        println!();
        println!(
            "QUESTION {}/{} [{}]",
            prepared.spec.ordinal,
            session.max_questions(),
            prepared.spec.category.as_str()
        );
        println!("{}", prepared.spec.text);
        if prepared.has_audio() {
            println!(
                "(synthesized audio available: {} bytes)",
                prepared.audio.as_ref().map(|a| a.len()).unwrap_or(0)
            );
        }

        // Recording-stop signal: the operator submits the recorded answer
        // file. Empty input retries the same ordinal.
        loop {
            let path = prompt_line("Recorded answer file (wav/webm/ogg/mp3): ")?;
            let path = path.trim();
            if path.is_empty() {
                println!("No recording given — the question stays open, try again.");
                continue;
            }
            let encoding = match AudioEncoding::from_extension(path) {
                Ok(e) => e,
                Err(e) => {
                    println!("{} — try another file.", e);
                    continue;
                }
            };
            let audio = match std::fs::read(path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    println!("could not read {}: {} — try again.", path, e);
                    continue;
                }
            };
            match session.capture_answer_bytes(&audio, encoding).await {
                Ok(ordinal) => {
                    println!("Answer {} captured; transcribing in the background.", ordinal);
                    break;
                }
                Err(EngineError::NoAudioReceived) => {
                    println!("The recording was empty — try again.");
                }
                Err(e) => return Err(e.into()),
            }
        }

        // Surface any transcription that is already done, without blocking.
        if let Ok(TranscriptionPoll::Ready(answer)) = session.poll_transcription().await {
            println!("  [transcript #{}] {}", answer.ordinal, answer.text);
        }
    }

    println!();
    println!("Interview complete — generating report…");
    let outcome = session.finish().await?;
    if let Err(e) = registry.destroy(&session_id) {
        warn!("session cleanup failed: {}", e);
    }

    let report = &outcome.report;
    println!();
    println!("================ EVALUATION ================");
    println!("Overall score:   {}/10", report.overall_score);
    println!(
        "Decision:        {}",
        if report.selected {
            "selected for next round"
        } else {
            "not selected"
        }
    );
    if !report.selection_reason.is_empty() {
        println!("Reason:          {}", report.selection_reason);
    }
    for (label, items) in [
        ("Strengths", &report.strengths),
        ("Improvement areas", &report.improvement_areas),
        ("Recommendations", &report.recommendations),
    ] {
        if !items.is_empty() {
            println!("{}:", label);
            for item in items {
                println!("  - {}", item);
            }
        }
    }
    if !report.summary.is_empty() {
        println!("Summary:         {}", report.summary);
    }
    if let Some(path) = &outcome.transcript_path {
        println!("Transcript saved to {}", path);
    }
    println!("============================================");

    Ok(())
}

fn prompt_line(prompt: &str) -> anyhow::Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line)
}

fn read_until_blank() -> anyhow::Result<String> {
    let mut out = String::new();
    loop {
        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 || line.trim().is_empty() {
            break;
        }
        out.push_str(&line);
    }
    Ok(out)
}
