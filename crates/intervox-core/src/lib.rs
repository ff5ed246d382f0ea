//! # intervox-core — shared data model and backend bridges
//!
//! Candidate/job records, the text-generation seam, document analysis, and
//! engine configuration. Everything upstream of the interview state machine
//! that is not speech-specific lives here.

pub mod config;
pub mod error;
pub mod extract;
pub mod llm;
pub mod profile;

pub use config::EngineConfig;
pub use error::{CoreError, CoreResult};
pub use extract::{first_json_object, ProfileAnalyzer};
pub use llm::{CannedText, OpenAiText, TextGenerator};
pub use profile::{EducationEntry, ExperienceEntry, JobContext, Profile, ProjectEntry};
