//! JSON envelope shared by every endpoint, and the error → status mapping.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

use crate::error::{DatabaseError, DialogueError, PersonalityError};

/// `{ "success": bool, "data"?: T, "error": [..] }`
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub error: Vec<String>,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: Vec::new(),
        }
    }
}

impl Envelope<()> {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: vec![message.into()],
        }
    }
}

/// Errors surfaced to HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Missing user identity")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(Envelope::failure(self.to_string()))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(e: DatabaseError) -> Self {
        error!(error = %e, "Store failure");
        Self::Internal("Database error".to_string())
    }
}

impl From<PersonalityError> for ApiError {
    fn from(e: PersonalityError) -> Self {
        match e {
            PersonalityError::RetryExhausted { .. } => {
                error!(error = %e, "Personality inference failed");
                Self::Internal("Failed to fetch personality".to_string())
            }
            PersonalityError::UpstreamDependencyMissing { entity, .. } => {
                Self::NotFound(format!("{} not found", capitalize(&entity)))
            }
            PersonalityError::Database(e) => e.into(),
        }
    }
}

impl From<DialogueError> for ApiError {
    fn from(e: DialogueError) -> Self {
        match e {
            DialogueError::UpstreamDependencyMissing { entity, .. } => {
                Self::NotFound(format!("{} not found", capitalize(&entity)))
            }
            DialogueError::Turn { .. } => {
                error!(error = %e, "Auto-dialogue failed");
                Self::Internal("Failed to generate dialogue".to_string())
            }
            DialogueError::Database(e) => e.into(),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_omits_missing_data() {
        let json = serde_json::to_value(Envelope::failure("nope")).unwrap();
        assert_eq!(json, serde_json::json!({"success": false, "error": ["nope"]}));

        let json = serde_json::to_value(Envelope::ok(42)).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "data": 42, "error": []}));
    }

    #[test]
    fn retry_exhaustion_maps_to_500_with_fixed_message() {
        let err: ApiError = PersonalityError::RetryExhausted { attempts: 3 }.into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Failed to fetch personality");
    }

    #[test]
    fn missing_answers_map_to_404() {
        let err: ApiError = PersonalityError::UpstreamDependencyMissing {
            entity: "answers".into(),
            id: "alice".into(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Answers not found");
    }

    #[test]
    fn missing_room_maps_to_404() {
        let err: ApiError = DialogueError::UpstreamDependencyMissing {
            entity: "room".into(),
            id: "r1".into(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Room not found");
    }
}
