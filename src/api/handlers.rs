//! Route handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::AppState;
use super::auth::AuthUser;
use super::response::{ApiError, Envelope};
use crate::store::Answer;

// ── Health ──────────────────────────────────────────────────────────────

pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "doppel"
    }))
}

// ── Questionnaire ───────────────────────────────────────────────────────

pub async fn list_questions(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let questions = state.db.get_questions().await?;
    Ok(Json(Envelope::ok(json!({ "questions": questions }))))
}

/// One submitted answer. `uuid` is accepted as an alias for `question_id`.
#[derive(Debug, Deserialize)]
pub struct AnswerInput {
    #[serde(alias = "uuid")]
    pub question_id: String,
    pub answer: String,
}

/// Persist the caller's answers, then infer and store their personality.
pub async fn submit_answers(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    body: Result<Json<Vec<AnswerInput>>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body?;
    if body.is_empty() {
        return Err(ApiError::BadRequest("No answers submitted".to_string()));
    }
    for input in &body {
        let answer = Answer::new(&user_id, &input.question_id, &input.answer);
        state.db.create_answer(&answer).await?;
    }
    info!(user_id = %user_id, count = body.len(), "Answers stored");

    let profile = state.personality.enrich_user(&user_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok(json!({ "personality": profile }))),
    ))
}

pub async fn get_personality(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state
        .db
        .get_latest_personality(&user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Personality not found".to_string()))?;
    Ok(Json(Envelope::ok(json!({ "personality": profile }))))
}

// ── Rooms ───────────────────────────────────────────────────────────────

/// Open (or reuse) the caller's room with `member_id` and redirect to it.
pub async fn redirect_room(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(member_id): Path<String>,
) -> Result<Redirect, ApiError> {
    let opened = state.rooms.open_room(&user_id, &member_id).await?;
    Ok(Redirect::to(&format!("/rooms/{}", opened.room.id)))
}

pub async fn get_room(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(room_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state.rooms.room_with_messages(&room_id).await?;
    Ok(Json(Envelope::ok(view)))
}

#[derive(Debug, Deserialize)]
pub struct MessageInput {
    pub message: String,
}

pub async fn post_message(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(room_id): Path<String>,
    body: Result<Json<MessageInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body?;
    if body.message.trim().is_empty() {
        return Err(ApiError::BadRequest("Message is empty".to_string()));
    }
    let message = state
        .rooms
        .post_message(&room_id, &user_id, &body.message)
        .await?;
    Ok(Json(Envelope::ok(json!({ "message": message }))))
}
