//! Prompt construction for Big-Five inference.

use crate::llm::ChatMessage;
use crate::store::{Answer, Question};

/// Instruction that opens every inference conversation.
pub const INFERENCE_INSTRUCTION: &str = "\
Based on the user's answers to the free-form questions that follow, estimate their \
Big Five personality traits (openness, conscientiousness, extraversion, agreeableness, \
neuroticism), each as an integer from 0 to 100. Also write a profile of a doppelganger \
who resembles the user, and output everything as JSON following this sample format: \
{\"big5_scores\":{\"openness\":\"integer value (0-100)\",\"conscientiousness\":\"integer value (0-100)\",\
\"extraversion\":\"integer value (0-100)\",\"agreeableness\":\"integer value (0-100)\",\
\"neuroticism\":\"integer value (0-100)\"},\"profile\":{\"description\":\"string (approximately \
200 characters describing the person in Japanese)\",\"description_en\":\"string (approximately \
200 characters describing the person in English)\"}}";

/// Build the inference conversation: the instruction, then one user message
/// per answer formatted as `"{question}\n{answer}"`.
///
/// An answer whose question is unknown gets an empty question segment.
pub fn build_messages(questions: &[Question], answers: &[Answer]) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(answers.len() + 1);
    messages.push(ChatMessage::system(INFERENCE_INSTRUCTION));

    for answer in answers {
        let question = questions
            .iter()
            .find(|q| q.id == answer.question_id)
            .map(|q| q.text.as_str())
            .unwrap_or("");
        messages.push(ChatMessage::user(format!("{question}\n{}", answer.text)));
    }

    messages
}
