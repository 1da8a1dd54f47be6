//! Configuration types.
//!
//! Every section is read from the environment. `from_env()` wraps
//! `from_lookup()`, which takes any key → value function so tests can
//! supply values without touching the process environment.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use secrecy::SecretString;

use crate::dialogue::DialogueSettings;
use crate::dialogue::prompts::{DEFAULT_GREETING, DEFAULT_ROUNDS};
use crate::error::ConfigError;
use crate::llm::retry::DEFAULT_MAX_ATTEMPTS;
use crate::llm::{LlmConfig, OPENAI_API_URL, RetryPolicy};

/// Default chat model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8080;
/// Default database location.
pub const DEFAULT_DB_PATH: &str = "./data/doppel.db";

/// Full service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LlmConfig,
    pub server: ServerConfig,
    pub inference: InferenceConfig,
    pub dialogue: DialogueSettings,
}

/// HTTP server and storage settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub db_path: PathBuf,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}

/// Personality inference settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferenceConfig {
    /// Attempts per inference run (provider call + validation each).
    pub max_attempts: u32,
}

impl InferenceConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts)
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup("OPENAI_API_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()))?;

        let llm = LlmConfig {
            api_key: SecretString::from(api_key),
            model: lookup("DOPPEL_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: lookup("DOPPEL_LLM_BASE_URL").unwrap_or_else(|| OPENAI_API_URL.to_string()),
        };

        let server = ServerConfig {
            port: parse_or(&lookup, "DOPPEL_PORT", DEFAULT_PORT)?,
            db_path: lookup("DOPPEL_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
        };

        let inference = InferenceConfig {
            max_attempts: parse_or(&lookup, "DOPPEL_INFERENCE_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?,
        };

        let dialogue = DialogueSettings {
            rounds: parse_or(&lookup, "DOPPEL_DIALOGUE_ROUNDS", DEFAULT_ROUNDS)?,
            greeting: lookup("DOPPEL_DIALOGUE_GREETING")
                .unwrap_or_else(|| DEFAULT_GREETING.to_string()),
            ..DialogueSettings::default()
        };

        Ok(Self {
            llm,
            server,
            inference,
            dialogue,
        })
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{raw:?}: {e}"),
        }),
    }
}
