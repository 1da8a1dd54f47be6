//! libSQL backend: async `Database` trait implementation.
//!
//! Supports local file and in-memory databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};

use crate::error::DatabaseError;
use crate::personality::model::PersonalityProfile;
use crate::store::migrations;
use crate::store::traits::{Answer, Database, MessageType, Question, Room, StoredMessage, User};

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.init_schema().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.init_schema().await?;
        Ok(backend)
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

/// Convert `Option<&str>` to libsql Value.
fn opt_text(s: Option<&str>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s.to_string()),
        None => libsql::Value::Null,
    }
}

fn row_to_question(row: &libsql::Row) -> Result<Question, libsql::Error> {
    Ok(Question {
        id: row.get(0)?,
        text: row.get(1)?,
    })
}

/// Column order matches ANSWER_COLUMNS.
fn row_to_answer(row: &libsql::Row) -> Result<Answer, libsql::Error> {
    let created_str: String = row.get(4)?;
    Ok(Answer {
        id: row.get(0)?,
        user_id: row.get(1)?,
        question_id: row.get(2)?,
        text: row.get(3)?,
        created_at: parse_datetime(&created_str),
    })
}

/// Column order matches PERSONALITY_COLUMNS.
fn row_to_personality(row: &libsql::Row) -> Result<PersonalityProfile, libsql::Error> {
    let created_str: String = row.get(9)?;
    Ok(PersonalityProfile {
        id: row.get(0)?,
        user_id: row.get(1)?,
        openness: row.get(2)?,
        conscientiousness: row.get(3)?,
        extraversion: row.get(4)?,
        agreeableness: row.get(5)?,
        neuroticism: row.get(6)?,
        description: row.get(7)?,
        description_en: row.get(8)?,
        created_at: parse_datetime(&created_str),
    })
}

/// Column order matches ROOM_COLUMNS.
fn row_to_room(row: &libsql::Row) -> Result<Room, libsql::Error> {
    let created_str: String = row.get(4)?;
    Ok(Room {
        id: row.get(0)?,
        name: row.get(1)?,
        owner_id: row.get(2)?,
        member_id: row.get(3)?,
        created_at: parse_datetime(&created_str),
    })
}

/// Column order matches MESSAGE_COLUMNS.
fn row_to_message(row: &libsql::Row) -> Result<StoredMessage, libsql::Error> {
    let type_str: String = row.get(4)?;
    let created_str: String = row.get(5)?;
    Ok(StoredMessage {
        id: row.get(0)?,
        room_id: row.get(1)?,
        user_id: row.get(2)?,
        message: row.get(3)?,
        message_type: MessageType::from_db(&type_str),
        created_at: parse_datetime(&created_str),
    })
}

// ── Trait implementation ────────────────────────────────────────────

const ANSWER_COLUMNS: &str = "id, user_id, question_id, answer, created_at";

const PERSONALITY_COLUMNS: &str = "id, user_id, openness, conscientiousness, extraversion, agreeableness, neuroticism, description, description_en, created_at";

const ROOM_COLUMNS: &str = "id, name, owner_id, member_id, created_at";

const MESSAGE_COLUMNS: &str = "id, room_id, user_id, message, message_type, created_at";

#[async_trait]
impl Database for LibSqlBackend {
    async fn init_schema(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    // ── Questionnaire ───────────────────────────────────────────────

    async fn get_questions(&self) -> Result<Vec<Question>, DatabaseError> {
        let mut rows = self
            .conn()
            .query("SELECT id, question FROM questions ORDER BY rowid ASC", ())
            .await
            .map_err(|e| DatabaseError::Query(format!("get_questions: {e}")))?;

        let mut questions = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("get_questions: {e}")))?
        {
            questions.push(
                row_to_question(&row)
                    .map_err(|e| DatabaseError::Query(format!("get_questions row parse: {e}")))?,
            );
        }
        Ok(questions)
    }

    async fn create_question(&self, question: &Question) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO questions (id, question) VALUES (?1, ?2)",
                params![question.id.clone(), question.text.clone()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("create_question: {e}")))?;
        Ok(())
    }

    async fn get_answers_by_user_id(&self, user_id: &str) -> Result<Vec<Answer>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {ANSWER_COLUMNS} FROM answers WHERE user_id = ?1 ORDER BY rowid ASC"
                ),
                params![user_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_answers_by_user_id: {e}")))?;

        let mut answers = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("get_answers_by_user_id: {e}")))?
        {
            answers.push(row_to_answer(&row).map_err(|e| {
                DatabaseError::Query(format!("get_answers_by_user_id row parse: {e}"))
            })?);
        }
        Ok(answers)
    }

    async fn create_answer(&self, answer: &Answer) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO answers (id, user_id, question_id, answer, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    answer.id.clone(),
                    answer.user_id.clone(),
                    answer.question_id.clone(),
                    answer.text.clone(),
                    answer.created_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("create_answer: {e}")))?;

        debug!(answer_id = %answer.id, user_id = %answer.user_id, "Answer inserted into DB");
        Ok(())
    }

    // ── Personalities ───────────────────────────────────────────────

    async fn create_personality(
        &self,
        profile: &PersonalityProfile,
    ) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                &format!(
                    "INSERT INTO personalities ({PERSONALITY_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
                ),
                params![
                    profile.id.clone(),
                    profile.user_id.clone(),
                    profile.openness,
                    profile.conscientiousness,
                    profile.extraversion,
                    profile.agreeableness,
                    profile.neuroticism,
                    profile.description.clone(),
                    profile.description_en.clone(),
                    profile.created_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("create_personality: {e}")))?;

        debug!(profile_id = %profile.id, user_id = %profile.user_id, "Personality inserted into DB");
        Ok(())
    }

    async fn get_latest_personality(
        &self,
        user_id: &str,
    ) -> Result<Option<PersonalityProfile>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {PERSONALITY_COLUMNS} FROM personalities WHERE user_id = ?1
                     ORDER BY rowid DESC LIMIT 1"
                ),
                params![user_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_latest_personality: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => row_to_personality(&row)
                .map(Some)
                .map_err(|e| DatabaseError::Query(format!("get_latest_personality row parse: {e}"))),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_latest_personality: {e}"))),
        }
    }

    // ── Users ───────────────────────────────────────────────────────

    async fn get_user_by_id(&self, id: &str) -> Result<Option<User>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT id, name, image_url FROM users WHERE id = ?1",
                params![id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_user_by_id: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let user = User {
                    id: row
                        .get(0)
                        .map_err(|e| DatabaseError::Query(format!("get_user_by_id row parse: {e}")))?,
                    name: row.get(1).unwrap_or_default(),
                    image_url: row.get::<String>(2).ok(),
                };
                Ok(Some(user))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_user_by_id: {e}"))),
        }
    }

    async fn create_user(&self, user: &User) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO users (id, name, image_url) VALUES (?1, ?2, ?3)",
                params![
                    user.id.clone(),
                    user.name.clone(),
                    opt_text(user.image_url.as_deref()),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("create_user: {e}")))?;
        Ok(())
    }

    // ── Rooms ───────────────────────────────────────────────────────

    async fn get_room_by_owner_and_member(
        &self,
        owner_id: &str,
        member_id: &str,
    ) -> Result<Option<Room>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {ROOM_COLUMNS} FROM rooms WHERE owner_id = ?1 AND member_id = ?2
                     ORDER BY rowid ASC LIMIT 1"
                ),
                params![owner_id, member_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_room_by_owner_and_member: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => row_to_room(&row).map(Some).map_err(|e| {
                DatabaseError::Query(format!("get_room_by_owner_and_member row parse: {e}"))
            }),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!(
                "get_room_by_owner_and_member: {e}"
            ))),
        }
    }

    async fn create_room(&self, room: &Room) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                &format!("INSERT INTO rooms ({ROOM_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)"),
                params![
                    room.id.clone(),
                    room.name.clone(),
                    room.owner_id.clone(),
                    room.member_id.clone(),
                    room.created_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("create_room: {e}")))?;

        debug!(room_id = %room.id, owner_id = %room.owner_id, member_id = %room.member_id, "Room inserted into DB");
        Ok(())
    }

    async fn get_room_by_id(&self, id: &str) -> Result<Option<Room>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE id = ?1"),
                params![id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_room_by_id: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => row_to_room(&row)
                .map(Some)
                .map_err(|e| DatabaseError::Query(format!("get_room_by_id row parse: {e}"))),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_room_by_id: {e}"))),
        }
    }

    // ── Messages ────────────────────────────────────────────────────

    async fn create_message(&self, message: &StoredMessage) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                &format!(
                    "INSERT INTO messages ({MESSAGE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
                ),
                params![
                    message.id.clone(),
                    message.room_id.clone(),
                    message.user_id.clone(),
                    message.message.clone(),
                    message.message_type.as_str(),
                    message.created_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("create_message: {e}")))?;

        debug!(
            message_id = %message.id,
            room_id = %message.room_id,
            message_type = %message.message_type,
            "Message inserted into DB"
        );
        Ok(())
    }

    async fn get_messages_by_room_id(
        &self,
        room_id: &str,
    ) -> Result<Vec<StoredMessage>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {MESSAGE_COLUMNS} FROM messages WHERE room_id = ?1 ORDER BY rowid ASC"
                ),
                params![room_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_messages_by_room_id: {e}")))?;

        let mut messages = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("get_messages_by_room_id: {e}")))?
        {
            messages.push(row_to_message(&row).map_err(|e| {
                DatabaseError::Query(format!("get_messages_by_room_id row parse: {e}"))
            })?);
        }
        Ok(messages)
    }
}

// ── Tests ───────────────────────────────────────────────────────────
