//! Persistence layer: libSQL-backed storage for questionnaire answers,
//! personality profiles, rooms, and messages.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use traits::{Answer, Database, MessageType, Question, Room, StoredMessage, User};
