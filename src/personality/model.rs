//! Big-Five personality data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{FieldKind, FieldSpec, ObjectShape};

/// Names of the five traits, in prompt and schema order.
pub const TRAITS: [&str; 5] = [
    "openness",
    "conscientiousness",
    "extraversion",
    "agreeableness",
    "neuroticism",
];

/// Trait scores as emitted by the model. Nominally 0–100, never clamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Big5Scores {
    pub openness: f64,
    pub conscientiousness: f64,
    pub extraversion: f64,
    pub agreeableness: f64,
    pub neuroticism: f64,
}

/// Free-text descriptions of the inferred persona.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileText {
    /// Japanese description, roughly 200 characters.
    pub description: String,
    /// English description, roughly 200 characters.
    pub description_en: String,
}

/// The validated structured output of one inference call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferredPersonality {
    pub big5_scores: Big5Scores,
    pub profile: ProfileText,
}

impl InferredPersonality {
    /// Name of the structured-output contract sent to the provider.
    pub const SCHEMA_NAME: &'static str = "big5_scores";

    /// Declared shape of the model's JSON output.
    pub fn shape() -> ObjectShape {
        let scores = TRAITS.iter().fold(ObjectShape::strict(), |shape, name| {
            shape.field(FieldSpec::required(*name, FieldKind::Number))
        });
        let profile = ObjectShape::strict()
            .field(FieldSpec::required("description", FieldKind::String))
            .field(FieldSpec::required("description_en", FieldKind::String));

        ObjectShape::strict()
            .field(FieldSpec::required("big5_scores", FieldKind::Object(scores)))
            .field(FieldSpec::required("profile", FieldKind::Object(profile)))
    }
}

/// A persisted personality profile for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalityProfile {
    pub id: String,
    pub user_id: String,
    pub openness: i64,
    pub conscientiousness: i64,
    pub extraversion: i64,
    pub agreeableness: i64,
    pub neuroticism: i64,
    pub description: String,
    pub description_en: String,
    pub created_at: DateTime<Utc>,
}

impl PersonalityProfile {
    /// Build a profile from validated model output. Scores are rounded to
    /// the nearest integer; out-of-range values are kept.
    pub fn from_inference(user_id: impl Into<String>, inferred: &InferredPersonality) -> Self {
        let scores = &inferred.big5_scores;
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            openness: scores.openness.round() as i64,
            conscientiousness: scores.conscientiousness.round() as i64,
            extraversion: scores.extraversion.round() as i64,
            agreeableness: scores.agreeableness.round() as i64,
            neuroticism: scores.neuroticism.round() as i64,
            description: inferred.profile.description.clone(),
            description_en: inferred.profile.description_en.clone(),
            created_at: Utc::now(),
        }
    }
}
