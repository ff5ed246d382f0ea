//! End-of-interview artifacts: the evaluation report and the persisted
//! human-readable transcript.
//!
//! Report generation goes through the same text backend as questions and
//! is parsed defensively; a failed or malformed report never fails
//! `finish()` — the caller gets a degraded report instead.

use crate::coverage::CoverageState;
use crate::session::TranscriptEntry;
use chrono::Utc;
use intervox_core::{first_json_object, JobContext, Profile, TextGenerator};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::warn;

fn default_score() -> u8 {
    5
}

/// Structured interview evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    #[serde(default = "default_score")]
    pub overall_score: u8,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub selection_reason: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvement_areas: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub technical_competency: String,
    #[serde(default)]
    pub communication_skills: String,
    #[serde(default)]
    pub problem_solving: String,
    #[serde(default)]
    pub cultural_fit: String,
    #[serde(default)]
    pub answer_quality: String,
    #[serde(default)]
    pub summary: String,
}

impl EvaluationReport {
    /// Degraded report used when generation or parsing fails.
    fn fallback(summary: impl Into<String>) -> Self {
        Self {
            overall_score: default_score(),
            selected: false,
            selection_reason: String::new(),
            strengths: Vec::new(),
            improvement_areas: Vec::new(),
            recommendations: Vec::new(),
            technical_competency: String::new(),
            communication_skills: String::new(),
            problem_solving: String::new(),
            cultural_fit: String::new(),
            answer_quality: String::new(),
            summary: summary.into(),
        }
    }
}

/// Evaluate the full transcript. Never fails: generation errors and
/// unparsable output degrade to a fallback report.
pub async fn generate_report(
    generator: &dyn TextGenerator,
    profile: &Profile,
    job: &JobContext,
    entries: &[TranscriptEntry],
    coverage: &CoverageState,
) -> EvaluationReport {
    let transcript: Vec<serde_json::Value> = entries
        .iter()
        .map(|e| {
            serde_json::json!({
                "question_number": e.answer.ordinal,
                "question": e.answer.question,
                "answer": e.answer.text,
            })
        })
        .collect();
    let prompt = format!(
        "You are an expert interviewer evaluating a candidate's interview performance.\n\
         Analyze the complete interview conversation and provide a comprehensive assessment.\n\n\
         COMPLETE INTERVIEW TRANSCRIPT:\n{}\n\n\
         CANDIDATE PROFILE:\n{}\n\n\
         JOB REQUIREMENTS:\n{}\n\n\
         INTERVIEW ANALYTICS:\n\
         - Skills Discussed: {:?}\n\
         - Projects Covered: {:?}\n\
         - Topics Explored: {:?}\n\n\
         Base the evaluation ENTIRELY on what the candidate actually said.\n\n\
         Return ONLY JSON:\n\
         {{\n\
           \"overall_score\": <integer 1-10>,\n\
           \"selected\": <boolean>,\n\
           \"selection_reason\": \"\",\n\
           \"strengths\": [],\n\
           \"improvement_areas\": [],\n\
           \"recommendations\": [],\n\
           \"technical_competency\": \"poor/fair/good/excellent\",\n\
           \"communication_skills\": \"poor/fair/good/excellent\",\n\
           \"problem_solving\": \"poor/fair/good/excellent\",\n\
           \"cultural_fit\": \"poor/fair/good/excellent\",\n\
           \"answer_quality\": \"\",\n\
           \"summary\": \"\"\n\
         }}",
        serde_json::to_string_pretty(&transcript).unwrap_or_default(),
        serde_json::to_string_pretty(profile).unwrap_or_default(),
        serde_json::to_string_pretty(job).unwrap_or_default(),
        coverage.skills_discussed,
        coverage.projects_discussed,
        coverage.topics_covered,
    );

    let raw = match generator.generate(&prompt).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!("report generation failed: {}", e);
            return EvaluationReport::fallback("[report unavailable: generation failed]");
        }
    };
    match first_json_object(&raw).and_then(|o| serde_json::from_str(o).ok()) {
        Some(report) => report,
        None => EvaluationReport::fallback(raw),
    }
}

/// Render the persisted transcript record: header, coverage summary,
/// per-category breakdown, then the Q/A pairs in ordinal order.
pub fn render_transcript(
    session_id: &str,
    profile: &Profile,
    entries: &[TranscriptEntry],
    coverage: &CoverageState,
) -> String {
    let rule = "=".repeat(80);
    let mut out = String::new();
    out.push_str(&format!("{}\n", rule));
    out.push_str("AI VOICE INTERVIEW SESSION\n");
    out.push_str(&format!("{}\n", rule));
    out.push_str(&format!(
        "Date: {}\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str(&format!("Session: {}\n", session_id));
    out.push_str(&format!("Candidate: {}\n", profile.display_name()));
    out.push_str(&format!("Total Questions: {}\n", entries.len()));
    out.push_str(&format!(
        "Skills Discussed: {}\n",
        join_set(&coverage.skills_discussed)
    ));
    out.push_str(&format!(
        "Projects Discussed: {}\n",
        join_set(&coverage.projects_discussed)
    ));
    out.push_str(&format!(
        "Topics Covered: {}\n",
        join_set(&coverage.topics_covered)
    ));
    out.push_str(&format!("{}\n\n", rule));

    // Per-category breakdown
    let mut by_category: BTreeMap<&'static str, Vec<u32>> = BTreeMap::new();
    for entry in entries {
        by_category
            .entry(entry.spec.category.as_str())
            .or_default()
            .push(entry.answer.ordinal);
    }
    out.push_str("QUESTION CATEGORIES:\n");
    out.push_str(&format!("{}\n", "-".repeat(30)));
    for (category, ordinals) in &by_category {
        let list = ordinals
            .iter()
            .map(|o| o.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!("{}: questions {}\n", category, list));
    }
    out.push('\n');

    for entry in entries {
        out.push_str(&format!("QUESTION {}:\n", entry.answer.ordinal));
        out.push_str(&format!("{}\n\n", entry.answer.question));
        out.push_str(&format!("ANSWER:\n{}\n", entry.answer.text));
        out.push_str(&format!("{}\n\n", "-".repeat(60)));
    }

    out.push_str(&format!("{}\nEND OF INTERVIEW SESSION\n{}\n", rule, rule));
    out
}

/// Write the transcript artifact. One file per session.
pub fn persist_transcript(
    dir: &str,
    session_id: &str,
    contents: &str,
) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let path = PathBuf::from(dir).join(format!("interview_{}_{}.txt", session_id, timestamp));
    std::fs::write(&path, contents)?;
    Ok(path)
}

fn join_set(set: &std::collections::BTreeSet<String>) -> String {
    if set.is_empty() {
        "(none)".to_string()
    } else {
        set.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question::{QuestionCategory, QuestionOrigin, QuestionSpec};
    use crate::session::Answer;
    use intervox_core::CannedText;
    use std::sync::Arc;

    fn entry(ordinal: u32, question: &str, answer: &str) -> TranscriptEntry {
        TranscriptEntry {
            spec: QuestionSpec {
                text: question.to_string(),
                category: QuestionCategory::Behavioral,
                ordinal,
                origin: QuestionOrigin::Fixed,
            },
            answer: Answer {
                ordinal,
                question: question.to_string(),
                text: answer.to_string(),
                timestamp: Utc::now(),
            },
        }
    }

    #[tokio::test]
    async fn report_parses_json_with_prose_around_it() {
        let canned = Arc::new(CannedText::new());
        canned.push_response(
            "Here is my evaluation:\n{\"overall_score\": 8, \"selected\": true, \"summary\": \"solid\"}",
        );
        let report = generate_report(
            canned.as_ref(),
            &Profile::default(),
            &JobContext::default(),
            &[entry(1, "q", "a")],
            &CoverageState::default(),
        )
        .await;
        assert_eq!(report.overall_score, 8);
        assert!(report.selected);
        assert_eq!(report.summary, "solid");
    }

    #[tokio::test]
    async fn unparsable_report_degrades() {
        let canned = Arc::new(CannedText::new());
        canned.push_response("no json at all");
        let report = generate_report(
            canned.as_ref(),
            &Profile::default(),
            &JobContext::default(),
            &[],
            &CoverageState::default(),
        )
        .await;
        assert_eq!(report.overall_score, 5);
        assert!(!report.selected);
        assert_eq!(report.summary, "no json at all");
    }

    #[test]
    fn transcript_lists_pairs_in_order() {
        let entries = vec![entry(1, "first?", "one"), entry(2, "second?", "two")];
        let text = render_transcript(
            "s-1",
            &Profile::default(),
            &entries,
            &CoverageState::default(),
        );
        let q1 = text.find("QUESTION 1:").unwrap();
        let q2 = text.find("QUESTION 2:").unwrap();
        assert!(q1 < q2);
        assert!(text.contains("Candidate: Unknown"));
        assert!(text.contains("behavioral: questions 1, 2"));
    }

    #[test]
    fn persist_writes_one_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = persist_transcript(dir.path().to_str().unwrap(), "s-9", "hello").unwrap();
        assert!(path.exists());
        assert_eq!(std::fs::read_to_string(path).unwrap(), "hello");
    }
}
