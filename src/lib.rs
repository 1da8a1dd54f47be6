//! Doppel: Big-Five personality inference and scripted auto-dialogue over
//! an OpenAI-compatible chat-completions endpoint.

pub mod api;
pub mod config;
pub mod dialogue;
pub mod error;
pub mod llm;
pub mod personality;
pub mod schema;
pub mod store;
