//! Big-Five personality inference from questionnaire answers.

pub mod engine;
pub mod model;
pub mod prompts;

pub use engine::PersonalityInferenceEngine;
pub use model::{Big5Scores, InferredPersonality, PersonalityProfile, ProfileText, TRAITS};
