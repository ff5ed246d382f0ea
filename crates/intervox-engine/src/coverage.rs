//! Coverage tracking: which resume skills, projects, and general topics the
//! interview has already touched. Grows monotonically; never persisted
//! beyond the session. Used to steer generation away from repetition.

use intervox_core::Profile;
use serde::Serialize;
use std::collections::BTreeSet;

/// Keyword table mapping answer/question vocabulary to general topics.
const TOPIC_KEYWORDS: &[(&str, &[&str])] = &[
    ("leadership", &["lead", "manage", "team", "mentor"]),
    ("challenges", &["challenge", "problem", "difficult", "issue"]),
    ("learning", &["learn", "new", "study", "research"]),
    ("teamwork", &["team", "collaborate", "work together"]),
    (
        "communication",
        &["explain", "present", "communicate", "document"],
    ),
];

/// Running record of covered ground. Sets only grow.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CoverageState {
    pub skills_discussed: BTreeSet<String>,
    pub projects_discussed: BTreeSet<String>,
    pub topics_covered: BTreeSet<String>,
}

impl CoverageState {
    /// Scan one question/answer pair: exact profile skill and project name
    /// matches (case-insensitive substring) plus the topic keyword table.
    pub fn observe(&mut self, question: &str, answer: &str, profile: &Profile) {
        let text = format!("{} {}", question, answer).to_lowercase();

        for skill in &profile.skills {
            let needle = skill.to_lowercase();
            if !needle.is_empty() && text.contains(&needle) {
                self.skills_discussed.insert(skill.clone());
            }
        }

        for name in profile.project_names() {
            let needle = name.to_lowercase();
            if !needle.is_empty() && text.contains(&needle) {
                self.projects_discussed.insert(name.to_string());
            }
        }

        for (topic, keywords) in TOPIC_KEYWORDS {
            if keywords.iter().any(|k| text.contains(k)) {
                self.topics_covered.insert((*topic).to_string());
            }
        }
    }

    /// Profile skills not yet discussed, in profile order.
    pub fn unused_skills<'a>(&self, profile: &'a Profile) -> Vec<&'a str> {
        profile
            .skills
            .iter()
            .map(|s| s.as_str())
            .filter(|s| !self.skills_discussed.contains(*s))
            .collect()
    }

    /// Profile projects not yet discussed, in profile order.
    pub fn unused_projects<'a>(&self, profile: &'a Profile) -> Vec<&'a str> {
        profile
            .project_names()
            .into_iter()
            .filter(|n| !self.projects_discussed.contains(*n))
            .collect()
    }
}
