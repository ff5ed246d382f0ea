//! Question source: fixed starters, banded category selection, personalized
//! generation, and the canned fallbacks that keep the interview moving when
//! the generation backend is slow or down.

use crate::coverage::CoverageState;
use crate::error::{EngineError, EngineResult};
use intervox_core::{JobContext, Profile, TextGenerator};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// The first three ordinals are always the same canonical starters.
pub const FIXED_STARTER_COUNT: u32 = 3;

/// Fixed enumeration of interview question categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionCategory {
    Introduction,
    TechnicalSkills,
    ProjectsDeepDive,
    Certifications,
    Behavioral,
    Situational,
    Leadership,
    ProblemSolving,
    Communication,
    CareerGoals,
}

impl QuestionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Introduction => "introduction",
            Self::TechnicalSkills => "technical_skills",
            Self::ProjectsDeepDive => "projects_deep_dive",
            Self::Certifications => "certifications",
            Self::Behavioral => "behavioral",
            Self::Situational => "situational",
            Self::Leadership => "leadership",
            Self::ProblemSolving => "problem_solving",
            Self::Communication => "communication",
            Self::CareerGoals => "career_goals",
        }
    }
}

/// Where a question came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionOrigin {
    Fixed,
    Generated,
    Fallback,
}

/// A question ready to be asked. Created once, consumed once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSpec {
    pub text: String,
    pub category: QuestionCategory,
    pub ordinal: u32,
    pub origin: QuestionOrigin,
}

/// A question plus its optional synthesized audio, staged ahead of delivery.
#[derive(Debug, Clone)]
pub struct PreparedQuestion {
    pub spec: QuestionSpec,
    pub audio: Option<Vec<u8>>,
}

impl PreparedQuestion {
    pub fn has_audio(&self) -> bool {
        self.audio.as_ref().map_or(false, |a| !a.is_empty())
    }
}

/// The canonical opening questions, identical across all interviews.
pub fn fixed_starter(ordinal: u32) -> EngineResult<QuestionSpec> {
    let (text, category) = match ordinal {
        1 => ("Introduce yourself.", QuestionCategory::Introduction),
        2 => (
            "Why are you interested in this role and company?",
            QuestionCategory::Behavioral,
        ),
        3 => (
            "What's your biggest weakness and how are you improving it?",
            QuestionCategory::Behavioral,
        ),
        n => {
            return Err(EngineError::Generation(format!(
                "no fixed starter for ordinal {}",
                n
            )))
        }
    };
    Ok(QuestionSpec {
        text: text.to_string(),
        category,
        ordinal,
        origin: QuestionOrigin::Fixed,
    })
}

/// Categories eligible at a given ordinal. Early questions probe technical
/// depth, the middle band problem-solving, the late band soft skills, the
/// final stretch career goals.
pub fn eligible_band(ordinal: u32) -> &'static [QuestionCategory] {
    match ordinal {
        0..=6 => &[
            QuestionCategory::TechnicalSkills,
            QuestionCategory::ProjectsDeepDive,
        ],
        7..=10 => &[
            QuestionCategory::ProblemSolving,
            QuestionCategory::Certifications,
            QuestionCategory::Situational,
        ],
        11..=13 => &[QuestionCategory::Leadership, QuestionCategory::Communication],
        _ => &[QuestionCategory::CareerGoals],
    }
}

/// Greedy round-robin: the least-used category in the eligible band, ties
/// broken by band order. Repeats are allowed once the band is exhausted.
pub fn pick_category(
    ordinal: u32,
    counts: &HashMap<QuestionCategory, u32>,
) -> QuestionCategory {
    let band = eligible_band(ordinal);
    *band
        .iter()
        .min_by_key(|c| counts.get(*c).copied().unwrap_or(0))
        .unwrap_or(&QuestionCategory::Behavioral)
}

/// Generic prompts used when the unused skill/project pool is empty.
const GENERIC_FALLBACKS: [&str; 12] = [
    "Describe a time when you had to work under pressure. How did you handle it?",
    "Tell me about a challenging technical problem you solved recently.",
    "How do you stay updated with new technologies in your field?",
    "Describe your approach to debugging complex issues.",
    "Tell me about a time you disagreed with a team member. How did you resolve it?",
    "What's your process for learning a new technology or framework?",
    "Describe a project where you had to work with unclear requirements.",
    "How do you ensure code quality in your projects?",
    "Tell me about a time you had to explain a technical concept to a non-technical person.",
    "What motivates you to work in this field?",
    "How do you approach testing your code?",
    "Describe a time when you had to optimize performance in an application.",
];

/// Supplies questions: the fixed starters deterministically, personalized
/// follow-ups via the text backend, and canned fallbacks when that fails.
pub struct QuestionSource {
    generator: Arc<dyn TextGenerator>,
}

impl QuestionSource {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// The underlying text backend (shared with report generation).
    pub fn generator(&self) -> &dyn TextGenerator {
        self.generator.as_ref()
    }

    /// Generate a personalized question for `ordinal` in `category`.
    /// Fails when the backend fails or returns empty output; the caller
    /// falls back to [`QuestionSource::fallback`].
    pub async fn generate(
        &self,
        profile: &Profile,
        job: &JobContext,
        history: &str,
        coverage: &CoverageState,
        ordinal: u32,
        category: QuestionCategory,
    ) -> EngineResult<QuestionSpec> {
        let unused_skills = coverage.unused_skills(profile);
        let unused_projects = coverage.unused_projects(profile);
        let prompt = format!(
            "Generate interview question #{} for a voice interview for the role \"{}\".\n\n\
             CANDIDATE PROFILE:\n{}\n\n\
             JOB REQUIREMENTS:\n{}\n\n\
             PREVIOUS QUESTIONS AND ANSWERS:\n{}\n\n\
             QUESTION CATEGORY TO FOCUS ON: {}\n\
             SKILLS ALREADY DISCUSSED: {:?}\n\
             PROJECTS ALREADY DISCUSSED: {:?}\n\
             TOPICS ALREADY COVERED: {:?}\n\
             UNUSED SKILLS TO EXPLORE: {:?}\n\
             UNUSED PROJECTS TO EXPLORE: {:?}\n\n\
             REQUIREMENTS:\n\
             1. Do NOT repeat any skill, project, or topic already discussed.\n\
             2. Focus specifically on the category: {}.\n\
             3. Reference UNUSED elements from the candidate's profile.\n\
             4. Make it conversational and professional for voice delivery.\n\n\
             Return ONE question as plain text, nothing else.",
            ordinal,
            job.job_title,
            serde_json::to_string_pretty(profile).unwrap_or_default(),
            serde_json::to_string_pretty(job).unwrap_or_default(),
            history,
            category.as_str(),
            coverage.skills_discussed,
            coverage.projects_discussed,
            coverage.topics_covered,
            &unused_skills[..unused_skills.len().min(3)],
            &unused_projects[..unused_projects.len().min(2)],
            category.as_str(),
        );

        let raw = self
            .generator
            .generate(&prompt)
            .await
            .map_err(|e| EngineError::Generation(e.to_string()))?;
        let text = clean_question_text(&raw);
        if text.is_empty() {
            return Err(EngineError::Generation("empty question text".to_string()));
        }
        debug!(ordinal, category = category.as_str(), "question generated");
        Ok(QuestionSpec {
            text,
            category,
            ordinal,
            origin: QuestionOrigin::Generated,
        })
    }

    /// Canned question so the interview never stalls on a slow or failed
    /// generation call: an unused skill or project prompt when available,
    /// otherwise a generic prompt rotated by ordinal.
    pub fn fallback(
        profile: &Profile,
        coverage: &CoverageState,
        ordinal: u32,
        category: QuestionCategory,
    ) -> QuestionSpec {
        let unused_skills = coverage.unused_skills(profile);
        let unused_projects = coverage.unused_projects(profile);

        let (text, category) = if let Some(skill) = unused_skills.first() {
            (
                format!(
                    "Tell me about your experience with {} and how you've applied it in your projects.",
                    skill
                ),
                QuestionCategory::TechnicalSkills,
            )
        } else if let Some(project) = unused_projects.first() {
            (
                format!(
                    "Can you walk me through your {} project and the challenges you faced?",
                    project
                ),
                QuestionCategory::ProjectsDeepDive,
            )
        } else {
            let index =
                (ordinal.saturating_sub(FIXED_STARTER_COUNT + 1)) as usize % GENERIC_FALLBACKS.len();
            (GENERIC_FALLBACKS[index].to_string(), category)
        };

        QuestionSpec {
            text,
            category,
            ordinal,
            origin: QuestionOrigin::Fallback,
        }
    }
}

/// Strip quotes, markdown, and leading labels the model tends to add.
fn clean_question_text(raw: &str) -> String {
    let mut text = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '`' || c == '*')
        .trim();
    // drop a leading "Question:" style label
    for label in ["Question:", "question:", "Q:"] {
        if let Some(rest) = text.strip_prefix(label) {
            text = rest.trim();
        }
    }
    text.trim_matches(|c| c == '"' || c == '`' || c == '*')
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_starters_are_canonical() {
        assert_eq!(fixed_starter(1).unwrap().text, "Introduce yourself.");
        assert_eq!(
            fixed_starter(2).unwrap().category,
            QuestionCategory::Behavioral
        );
        assert_eq!(fixed_starter(3).unwrap().origin, QuestionOrigin::Fixed);
        assert!(fixed_starter(4).is_err());
    }

    #[test]
    fn band_edges() {
        assert_eq!(
            eligible_band(4),
            &[
                QuestionCategory::TechnicalSkills,
                QuestionCategory::ProjectsDeepDive
            ]
        );
        assert_eq!(eligible_band(10).len(), 3);
        assert_eq!(eligible_band(14), &[QuestionCategory::CareerGoals]);
        assert_eq!(eligible_band(15), &[QuestionCategory::CareerGoals]);
    }

    #[test]
    fn least_used_wins_with_band_order_ties() {
        let mut counts = HashMap::new();
        // tie: band order prefers technical_skills
        assert_eq!(pick_category(4, &counts), QuestionCategory::TechnicalSkills);
        counts.insert(QuestionCategory::TechnicalSkills, 1);
        assert_eq!(pick_category(5, &counts), QuestionCategory::ProjectsDeepDive);
        counts.insert(QuestionCategory::ProjectsDeepDive, 2);
        assert_eq!(pick_category(6, &counts), QuestionCategory::TechnicalSkills);
    }

    #[test]
    fn fallback_prefers_unused_skill() {
        let profile = Profile {
            skills: vec!["Go".into(), "SQL".into()],
            ..Default::default()
        };
        let coverage = CoverageState::default();
        let q = QuestionSource::fallback(
            &profile,
            &coverage,
            4,
            QuestionCategory::TechnicalSkills,
        );
        assert!(q.text.contains("Go"));
        assert_eq!(q.origin, QuestionOrigin::Fallback);
        assert_eq!(q.category, QuestionCategory::TechnicalSkills);
    }

    #[test]
    fn fallback_rotates_generics_when_pool_empty() {
        let profile = Profile::default();
        let coverage = CoverageState::default();
        let q4 = QuestionSource::fallback(&profile, &coverage, 4, QuestionCategory::Situational);
        let q5 = QuestionSource::fallback(&profile, &coverage, 5, QuestionCategory::Situational);
        assert_ne!(q4.text, q5.text);
        assert_eq!(q4.category, QuestionCategory::Situational);
    }

    #[test]
    fn question_text_cleanup() {
        assert_eq!(
            clean_question_text("\"Question: What is Rust?\"  "),
            "What is Rust?"
        );
        assert_eq!(clean_question_text("`tell me`"), "tell me");
    }
}
