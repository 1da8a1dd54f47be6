//! Auto-dialogue between two personas and the rooms that host it.

pub mod context;
pub mod engine;
pub mod prompts;
pub mod rooms;

pub use context::ConversationContext;
pub use engine::{AutoDialogueEngine, DialogueSettings};
pub use rooms::{MessageWithUser, OpenedRoom, RoomCoordinator, RoomView};
