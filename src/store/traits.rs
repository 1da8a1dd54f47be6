//! `Database` trait: the async persistence interface the engines consume.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::personality::model::PersonalityProfile;

/// A questionnaire question. Seeded by migration, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
}

/// A user's free-text answer to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub id: String,
    pub user_id: String,
    pub question_id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Answer {
    pub fn new(
        user_id: impl Into<String>,
        question_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            question_id: question_id.into(),
            text: text.into(),
            created_at: Utc::now(),
        }
    }
}

/// A registered user, as far as this service needs to know.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// A two-party chat room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub member_id: String,
    pub created_at: DateTime<Utc>,
}

impl Room {
    pub fn new(
        name: impl Into<String>,
        owner_id: impl Into<String>,
        member_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            owner_id: owner_id.into(),
            member_id: member_id.into(),
            created_at: Utc::now(),
        }
    }
}

/// Distinguishes automated dialogue turns from user-submitted ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    #[serde(rename = "general")]
    General,
    #[serde(rename = "autoAi")]
    AutoAi,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::AutoAi => "autoAi",
        }
    }

    pub fn from_db(s: &str) -> Self {
        match s {
            "autoAi" => Self::AutoAi,
            _ => Self::General,
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One persisted utterance in a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: String,
    pub room_id: String,
    pub user_id: String,
    pub message: String,
    pub message_type: MessageType,
    pub created_at: DateTime<Utc>,
}

impl StoredMessage {
    pub fn new(
        room_id: impl Into<String>,
        user_id: impl Into<String>,
        message: impl Into<String>,
        message_type: MessageType,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            room_id: room_id.into(),
            user_id: user_id.into(),
            message: message.into(),
            message_type,
            created_at: Utc::now(),
        }
    }
}

/// Backend-agnostic database trait covering questions, answers, profiles,
/// users, rooms, and messages. All writes are inserts.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run all pending schema migrations.
    async fn init_schema(&self) -> Result<(), DatabaseError>;

    // ── Questionnaire ───────────────────────────────────────────────

    async fn get_questions(&self) -> Result<Vec<Question>, DatabaseError>;

    async fn create_question(&self, question: &Question) -> Result<(), DatabaseError>;

    /// All answers a user has submitted, oldest first.
    async fn get_answers_by_user_id(&self, user_id: &str) -> Result<Vec<Answer>, DatabaseError>;

    async fn create_answer(&self, answer: &Answer) -> Result<(), DatabaseError>;

    // ── Personalities ───────────────────────────────────────────────

    async fn create_personality(&self, profile: &PersonalityProfile)
    -> Result<(), DatabaseError>;

    /// Most recently created profile for a user.
    async fn get_latest_personality(
        &self,
        user_id: &str,
    ) -> Result<Option<PersonalityProfile>, DatabaseError>;

    // ── Users ───────────────────────────────────────────────────────

    async fn get_user_by_id(&self, id: &str) -> Result<Option<User>, DatabaseError>;

    async fn create_user(&self, user: &User) -> Result<(), DatabaseError>;

    // ── Rooms ───────────────────────────────────────────────────────

    async fn get_room_by_owner_and_member(
        &self,
        owner_id: &str,
        member_id: &str,
    ) -> Result<Option<Room>, DatabaseError>;

    async fn create_room(&self, room: &Room) -> Result<(), DatabaseError>;

    async fn get_room_by_id(&self, id: &str) -> Result<Option<Room>, DatabaseError>;

    // ── Messages ────────────────────────────────────────────────────

    async fn create_message(&self, message: &StoredMessage) -> Result<(), DatabaseError>;

    /// Messages in a room in insertion order.
    async fn get_messages_by_room_id(
        &self,
        room_id: &str,
    ) -> Result<Vec<StoredMessage>, DatabaseError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_type_db_strings() {
        assert_eq!(MessageType::AutoAi.as_str(), "autoAi");
        assert_eq!(MessageType::from_db("autoAi"), MessageType::AutoAi);
        assert_eq!(MessageType::from_db("general"), MessageType::General);
        assert_eq!(MessageType::from_db("something-else"), MessageType::General);
    }

    #[test]
    fn message_type_serde_matches_db_strings() {
        let json = serde_json::to_string(&MessageType::AutoAi).unwrap();
        assert_eq!(json, "\"autoAi\"");
        let parsed: MessageType = serde_json::from_str("\"general\"").unwrap();
        assert_eq!(parsed, MessageType::General);
    }

    #[test]
    fn constructors_generate_distinct_ids() {
        let a = Answer::new("u1", "q1", "yes");
        let b = Answer::new("u1", "q1", "yes");
        assert_ne!(a.id, b.id);

        let room = Room::new("Chat Room", "owner", "member");
        let msg = StoredMessage::new(&room.id, "owner", "hi", MessageType::General);
        assert_eq!(msg.room_id, room.id);
    }
}
