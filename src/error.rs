//! Error types for doppel.

use std::time::Duration;

use crate::schema::SchemaViolation;

/// Top-level error type for service startup.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),
}

/// LLM provider errors. Every variant is a transport-level failure of a
/// single call.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },
}

/// Failure of one fetch-and-validate attempt. Both kinds consume a retry.
#[derive(Debug, thiserror::Error)]
pub enum AttemptError {
    #[error("transport failure: {0}")]
    Transport(#[from] LlmError),

    #[error("schema violation: {0}")]
    Schema(#[from] SchemaViolation),
}

/// Personality inference workflow errors.
#[derive(Debug, thiserror::Error)]
pub enum PersonalityError {
    #[error("Personality inference gave up after {attempts} attempts")]
    RetryExhausted { attempts: u32 },

    #[error("Missing {entity} {id}")]
    UpstreamDependencyMissing { entity: String, id: String },

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Auto-dialogue and room errors.
#[derive(Debug, thiserror::Error)]
pub enum DialogueError {
    #[error("Dialogue turn {turn} failed: {source}")]
    Turn {
        turn: usize,
        #[source]
        source: LlmError,
    },

    #[error("Missing {entity} {id}")]
    UpstreamDependencyMissing { entity: String, id: String },

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}
