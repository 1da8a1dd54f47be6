//! HTTP surface: questionnaire, personality, and room endpoints.

pub mod auth;
pub mod handlers;
pub mod response;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::dialogue::{AutoDialogueEngine, DialogueSettings, RoomCoordinator};
use crate::error::Error;
use crate::llm::{LlmProvider, RetryPolicy, create_provider};
use crate::personality::PersonalityInferenceEngine;
use crate::store::{Database, LibSqlBackend};

pub use auth::{AuthUser, USER_ID_HEADER};
pub use response::{ApiError, Envelope};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Database>,
    pub personality: Arc<PersonalityInferenceEngine>,
    pub rooms: Arc<RoomCoordinator>,
}

impl AppState {
    /// Wire both engines over one store and one provider.
    pub fn new(
        db: Arc<dyn Database>,
        llm: Arc<dyn LlmProvider>,
        retry: RetryPolicy,
        dialogue: DialogueSettings,
    ) -> Self {
        let personality = Arc::new(PersonalityInferenceEngine::new(
            Arc::clone(&db),
            Arc::clone(&llm),
            retry,
        ));
        let dialogue = AutoDialogueEngine::new(llm, Arc::clone(&db), dialogue);
        let rooms = Arc::new(RoomCoordinator::new(Arc::clone(&db), dialogue));
        Self {
            db,
            personality,
            rooms,
        }
    }

    /// Build the provider, open the database file, and wire both engines.
    pub async fn from_config(config: &Config) -> Result<Self, Error> {
        let llm = create_provider(&config.llm)?;
        let db: Arc<dyn Database> =
            Arc::new(LibSqlBackend::new_local(&config.server.db_path).await?);
        Ok(Self::new(
            db,
            llm,
            config.inference.retry_policy(),
            config.dialogue.clone(),
        ))
    }
}

/// Build the Axum router with every REST route.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/questions", get(handlers::list_questions))
        .route("/api/answers", post(handlers::submit_answers))
        .route("/api/users/{id}/personality", get(handlers::get_personality))
        .route(
            "/api/rooms/redirect-room/{member_id}",
            get(handlers::redirect_room),
        )
        .route("/api/rooms/{id}", get(handlers::get_room))
        .route("/api/rooms/{id}/messages", post(handlers::post_message))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
