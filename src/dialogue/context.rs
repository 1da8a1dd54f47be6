//! Immutable conversation context threaded through dialogue iterations.

use crate::llm::{ChatMessage, Role};

/// An ordered, role-tagged message sequence. Updating it yields a new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationContext {
    messages: Vec<ChatMessage>,
}

impl ConversationContext {
    /// `[system(persona), user(opening)]`.
    pub fn new(system: impl Into<String>, opening: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::system(system), ChatMessage::user(opening)],
        }
    }

    /// A copy of this context whose trailing user message carries `content`.
    ///
    /// If the context does not end with a user message, one is appended.
    pub fn with_trailing_user(&self, content: impl Into<String>) -> Self {
        let mut messages = self.messages.clone();
        match messages.last_mut() {
            Some(last) if last.role == Role::User => last.content = content.into(),
            _ => messages.push(ChatMessage::user(content)),
        }
        Self { messages }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Content of the trailing user message, if any.
    pub fn trailing_user(&self) -> Option<&str> {
        self.messages
            .last()
            .filter(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}
