//! Persona prompt and opening line for the auto-dialogue.

/// Counselor persona shared by both speakers. Replies must be in Japanese.
pub const COUNSELOR_PERSONA: &str = "\
必ず日本語で答えてください。

あなたは、相談に乗るプロです。
相手の質問に対して、適切なアドバイスをしてください。
また、時には疑問を投げかけて、相手に寄り添ってください。";

/// Opening user message of every dialogue.
pub const DEFAULT_GREETING: &str = "こんにちは";

/// Number of counselor/partner exchanges per dialogue.
pub const DEFAULT_ROUNDS: usize = 3;

/// Name given to rooms opened through the redirect flow.
pub const DEFAULT_ROOM_NAME: &str = "Chat Room";
