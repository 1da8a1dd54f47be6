//! AutoDialogueEngine: scripted two-speaker conversation seeded into a room.
//!
//! Each round makes two completion calls. The counselor's reply becomes the
//! partner's input, and the partner's reply becomes the next round's input.
//! Every reply is persisted as an `autoAi` message before the next call.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::DialogueError;
use crate::llm::{CompletionRequest, LlmProvider, estimate_cost};
use crate::store::{Database, MessageType, StoredMessage};

use super::context::ConversationContext;
use super::prompts::{COUNSELOR_PERSONA, DEFAULT_GREETING, DEFAULT_ROUNDS};

/// Tunables for one dialogue run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogueSettings {
    pub rounds: usize,
    pub greeting: String,
    pub persona: String,
}

impl Default for DialogueSettings {
    fn default() -> Self {
        Self {
            rounds: DEFAULT_ROUNDS,
            greeting: DEFAULT_GREETING.to_string(),
            persona: COUNSELOR_PERSONA.to_string(),
        }
    }
}

pub struct AutoDialogueEngine {
    llm: Arc<dyn LlmProvider>,
    db: Arc<dyn Database>,
    settings: DialogueSettings,
}

impl AutoDialogueEngine {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        db: Arc<dyn Database>,
        settings: DialogueSettings,
    ) -> Self {
        Self { llm, db, settings }
    }

    /// Run the dialogue and return the persisted turns in order.
    ///
    /// No retries: the first failing call aborts the run. Turns persisted
    /// before the failure stay in the store.
    pub async fn run(
        &self,
        room_id: &str,
        counselor_id: &str,
        partner_id: &str,
    ) -> Result<Vec<StoredMessage>, DialogueError> {
        let mut context =
            ConversationContext::new(self.settings.persona.as_str(), self.settings.greeting.as_str());
        let mut turns = Vec::with_capacity(self.settings.rounds * 2);

        info!(room_id, rounds = self.settings.rounds, "Starting auto-dialogue");

        for _ in 0..self.settings.rounds {
            let counselor_reply = self.complete(&context, turns.len() + 1).await?;
            turns.push(self.persist(room_id, counselor_id, &counselor_reply).await?);

            let partner_context = context.with_trailing_user(counselor_reply);
            let partner_reply = self.complete(&partner_context, turns.len() + 1).await?;
            turns.push(self.persist(room_id, partner_id, &partner_reply).await?);

            context = context.with_trailing_user(partner_reply);
        }

        info!(room_id, turns = turns.len(), "Auto-dialogue complete");
        Ok(turns)
    }

    async fn complete(
        &self,
        context: &ConversationContext,
        turn: usize,
    ) -> Result<String, DialogueError> {
        let request = CompletionRequest::new(context.messages().to_vec());
        let response = self
            .llm
            .complete(request)
            .await
            .map_err(|source| DialogueError::Turn { turn, source })?;

        debug!(
            turn,
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            cost_usd = %estimate_cost(self.llm.as_ref(), &response),
            "Dialogue turn generated"
        );
        Ok(response.content)
    }

    async fn persist(
        &self,
        room_id: &str,
        speaker_id: &str,
        text: &str,
    ) -> Result<StoredMessage, DialogueError> {
        let message = StoredMessage::new(room_id, speaker_id, text, MessageType::AutoAi);
        self.db.create_message(&message).await?;
        Ok(message)
    }
}
