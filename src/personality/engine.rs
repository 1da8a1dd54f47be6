//! PersonalityInferenceEngine: turns questionnaire answers into a
//! validated Big-Five profile.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{AttemptError, PersonalityError};
use crate::llm::{
    CompletionRequest, LlmProvider, ResponseFormat, RetryOutcome, RetryPolicy, estimate_cost,
    retry,
};
use crate::schema::ObjectShape;
use crate::store::{Answer, Database, Question};

use super::model::{InferredPersonality, PersonalityProfile};
use super::prompts::build_messages;

/// Runs structured-output inference against the configured provider and
/// persists the resulting profile.
pub struct PersonalityInferenceEngine {
    db: Arc<dyn Database>,
    llm: Arc<dyn LlmProvider>,
    policy: RetryPolicy,
}

impl PersonalityInferenceEngine {
    pub fn new(db: Arc<dyn Database>, llm: Arc<dyn LlmProvider>, policy: RetryPolicy) -> Self {
        Self { db, llm, policy }
    }

    /// Infer a personality from the given questions and answers.
    ///
    /// Each attempt is one provider call plus validation of its output.
    /// Transport failures and schema violations both consume an attempt.
    pub async fn infer(
        &self,
        questions: &[Question],
        answers: &[Answer],
    ) -> Result<InferredPersonality, PersonalityError> {
        let shape = InferredPersonality::shape();
        let request = CompletionRequest::new(build_messages(questions, answers))
            .with_response_format(ResponseFormat::JsonSchema {
                name: InferredPersonality::SCHEMA_NAME.to_string(),
                strict: true,
                schema: shape.to_json_schema(),
            });

        let outcome = retry::attempt(&self.policy, "personality_inference", |_| {
            self.attempt_once(request.clone(), &shape)
        })
        .await;

        match outcome {
            RetryOutcome::Success { value, attempts } => {
                debug!(attempts, "Personality inferred");
                Ok(value)
            }
            RetryOutcome::Exhausted {
                attempts,
                last_error,
            } => {
                let last_error = last_error.map(|e| e.to_string()).unwrap_or_default();
                warn!(
                    attempts,
                    last_error = %last_error,
                    "Personality inference exhausted its attempts"
                );
                Err(PersonalityError::RetryExhausted { attempts })
            }
        }
    }

    /// One provider call followed by validation of the returned text.
    async fn attempt_once(
        &self,
        request: CompletionRequest,
        shape: &ObjectShape,
    ) -> Result<InferredPersonality, AttemptError> {
        let response = self.llm.complete(request).await?;
        debug!(
            model = self.llm.model_name(),
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            cost_usd = %estimate_cost(self.llm.as_ref(), &response),
            "Inference call completed"
        );
        Ok(shape.parse::<InferredPersonality>(&response.content)?)
    }

    /// Fetch the questionnaire and a user's answers, then infer.
    ///
    /// A user with no stored answers is rejected before any provider call.
    pub async fn infer_for_user(
        &self,
        user_id: &str,
    ) -> Result<InferredPersonality, PersonalityError> {
        let questions = self.db.get_questions().await?;
        let answers = self.db.get_answers_by_user_id(user_id).await?;
        if answers.is_empty() {
            return Err(PersonalityError::UpstreamDependencyMissing {
                entity: "answers".to_string(),
                id: user_id.to_string(),
            });
        }
        debug!(
            user_id,
            questions = questions.len(),
            answers = answers.len(),
            "Inferring personality"
        );
        self.infer(&questions, &answers).await
    }

    /// Infer and persist exactly one profile. Nothing is written on failure.
    pub async fn enrich_user(&self, user_id: &str) -> Result<PersonalityProfile, PersonalityError> {
        let inferred = self.infer_for_user(user_id).await?;
        let profile = PersonalityProfile::from_inference(user_id, &inferred);
        self.db.create_personality(&profile).await?;
        info!(user_id, profile_id = %profile.id, "Personality profile stored");
        Ok(profile)
    }
}
