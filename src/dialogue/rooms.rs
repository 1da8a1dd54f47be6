//! Room coordination: open a two-party room, seed it with an auto-dialogue,
//! accept user messages, and read the room back with speaker details.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::error::DialogueError;
use crate::store::{Database, MessageType, Room, StoredMessage, User};

use super::engine::AutoDialogueEngine;
use super::prompts::DEFAULT_ROOM_NAME;

/// Result of [`RoomCoordinator::open_room`].
#[derive(Debug, Clone)]
pub struct OpenedRoom {
    pub room: Room,
    /// True when the room did not exist and a dialogue was seeded.
    pub created: bool,
}

/// A stored message decorated with its speaker, when known.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageWithUser {
    #[serde(flatten)]
    pub message: StoredMessage,
    pub user: Option<User>,
}

/// A room and its messages in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomView {
    pub room: Room,
    pub messages: Vec<MessageWithUser>,
}

pub struct RoomCoordinator {
    db: Arc<dyn Database>,
    dialogue: AutoDialogueEngine,
}

impl RoomCoordinator {
    pub fn new(db: Arc<dyn Database>, dialogue: AutoDialogueEngine) -> Self {
        Self { db, dialogue }
    }

    /// Find the room `owner_id` holds with `member_id`, creating it if needed.
    ///
    /// A new room is seeded with an auto-dialogue where the member speaks as
    /// the counselor and the owner as the partner.
    pub async fn open_room(
        &self,
        owner_id: &str,
        member_id: &str,
    ) -> Result<OpenedRoom, DialogueError> {
        if let Some(room) = self
            .db
            .get_room_by_owner_and_member(owner_id, member_id)
            .await?
        {
            return Ok(OpenedRoom {
                room,
                created: false,
            });
        }

        let new_room = Room::new(DEFAULT_ROOM_NAME, owner_id, member_id);
        self.db.create_room(&new_room).await?;

        let room = self.db.get_room_by_id(&new_room.id).await?.ok_or_else(|| {
            DialogueError::UpstreamDependencyMissing {
                entity: "room".to_string(),
                id: new_room.id.clone(),
            }
        })?;
        info!(room_id = %room.id, owner_id, member_id, "Room created");

        self.dialogue.run(&room.id, member_id, owner_id).await?;

        Ok(OpenedRoom {
            room,
            created: true,
        })
    }

    /// Append a user-submitted message to an existing room.
    pub async fn post_message(
        &self,
        room_id: &str,
        user_id: &str,
        text: &str,
    ) -> Result<StoredMessage, DialogueError> {
        let room = self.require_room(room_id).await?;
        let message = StoredMessage::new(&room.id, user_id, text, MessageType::General);
        self.db.create_message(&message).await?;
        Ok(message)
    }

    /// A room with every message decorated by its speaker.
    pub async fn room_with_messages(&self, room_id: &str) -> Result<RoomView, DialogueError> {
        let room = self.require_room(room_id).await?;
        let stored = self.db.get_messages_by_room_id(&room.id).await?;

        let mut messages = Vec::with_capacity(stored.len());
        for message in stored {
            let user = self.db.get_user_by_id(&message.user_id).await?;
            messages.push(MessageWithUser { message, user });
        }

        Ok(RoomView { room, messages })
    }

    async fn require_room(&self, room_id: &str) -> Result<Room, DialogueError> {
        self.db
            .get_room_by_id(room_id)
            .await?
            .ok_or_else(|| DialogueError::UpstreamDependencyMissing {
                entity: "room".to_string(),
                id: room_id.to_string(),
            })
    }
}
