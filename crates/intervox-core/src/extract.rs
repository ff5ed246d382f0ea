//! Resume and job-description analysis: free text in, structured records out.
//!
//! The backing model is asked for a strict JSON shape, but its output is
//! treated as hostile: we scan for the first balanced JSON object and
//! deserialize with defaults, so markdown fences or prose around the object
//! never break extraction.

use crate::error::{CoreError, CoreResult};
use crate::llm::TextGenerator;
use crate::profile::{JobContext, Profile};
use std::sync::Arc;
use tracing::debug;

/// Locate the first balanced `{ ... }` object in free-form text.
/// String literals and escapes are honored, so braces inside values
/// don't unbalance the scan. Returns `None` when no object closes.
pub fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Turns raw resume text and job-description text into [`Profile`] and
/// [`JobContext`] records via the text-generation backend.
pub struct ProfileAnalyzer {
    generator: Arc<dyn TextGenerator>,
}

impl ProfileAnalyzer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Extract a structured [`Profile`] from resume text.
    pub async fn parse_resume(&self, resume_text: &str) -> CoreResult<Profile> {
        let prompt = format!(
            "Analyze this resume and extract structured information as JSON.\n\n\
             {}\n\n\
             Return ONLY a JSON object with this exact structure:\n\
             {{\n\
               \"name\": \"candidate name\",\n\
               \"skills\": [\"skill\"],\n\
               \"certifications\": [\"certification\"],\n\
               \"projects\": [{{\"name\": \"\", \"description\": \"\", \"technologies\": [], \"key_features\": []}}],\n\
               \"experience\": [{{\"company\": \"\", \"role\": \"\", \"duration\": \"\", \"achievements\": []}}],\n\
               \"education\": [{{\"degree\": \"\", \"institution\": \"\", \"year\": \"\"}}],\n\
               \"soft_skills\": [\"skill\"]\n\
             }}",
            resume_text
        );
        let raw = self.generator.generate(&prompt).await?;
        let profile: Profile = deserialize_first_object(&raw)?;
        debug!(
            skills = profile.skills.len(),
            projects = profile.projects.len(),
            "resume extracted"
        );
        Ok(profile)
    }

    /// Extract structured job requirements from a job-description text.
    pub async fn analyze_job(&self, job_description: &str) -> CoreResult<JobContext> {
        let prompt = format!(
            "Analyze this job description and extract key requirements as JSON.\n\n\
             {}\n\n\
             Return ONLY a JSON object:\n\
             {{\n\
               \"job_title\": \"\",\n\
               \"required_skills\": [],\n\
               \"preferred_skills\": [],\n\
               \"experience_level\": \"junior/mid/senior\",\n\
               \"key_responsibilities\": [],\n\
               \"soft_skills_needed\": [],\n\
               \"interview_focus_areas\": []\n\
             }}",
            job_description
        );
        let raw = self.generator.generate(&prompt).await?;
        deserialize_first_object(&raw)
    }
}

fn deserialize_first_object<T: serde::de::DeserializeOwned>(raw: &str) -> CoreResult<T> {
    let object = first_json_object(raw)
        .ok_or_else(|| CoreError::Unparsable("no JSON object in output".to_string()))?;
    serde_json::from_str(object).map_err(|e| CoreError::Unparsable(e.to_string()))
}
