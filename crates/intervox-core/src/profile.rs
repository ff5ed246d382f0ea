//! Candidate and job records extracted from free-form documents.
//!
//! Both records are produced once by [`crate::extract::ProfileAnalyzer`]
//! and are immutable for the lifetime of an interview session. Every field
//! carries `#[serde(default)]` so partial LLM output still deserializes.

use serde::{Deserialize, Serialize};

/// A project from the candidate's resume.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub key_features: Vec<String>,
}

/// One employment entry from the resume.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExperienceEntry {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub achievements: Vec<String>,
}

/// One education entry from the resume.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EducationEntry {
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub institution: String,
    #[serde(default)]
    pub year: String,
}

/// Structured candidate profile. Immutable once loaded for a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub projects: Vec<ProjectEntry>,
    #[serde(default)]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    #[serde(default)]
    pub soft_skills: Vec<String>,
}

impl Profile {
    /// Candidate name, or "Unknown" when extraction produced none.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            "Unknown"
        } else {
            &self.name
        }
    }

    /// Names of all resume projects, skipping unnamed entries.
    pub fn project_names(&self) -> Vec<&str> {
        self.projects
            .iter()
            .map(|p| p.name.as_str())
            .filter(|n| !n.trim().is_empty())
            .collect()
    }
}

/// Structured job requirements. Immutable once loaded for a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobContext {
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub preferred_skills: Vec<String>,
    #[serde(default)]
    pub experience_level: String,
    #[serde(default)]
    pub key_responsibilities: Vec<String>,
    #[serde(default)]
    pub soft_skills_needed: Vec<String>,
    #[serde(default)]
    pub interview_focus_areas: Vec<String>,
}
