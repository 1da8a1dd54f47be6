//! OpenAI-compatible chat-completions provider over reqwest.

use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::costs::model_cost;
use super::provider::{
    CompletionRequest, CompletionResponse, FinishReason, LlmProvider, ResponseFormat,
};
use crate::error::LlmError;

/// Default OpenAI chat-completions endpoint.
pub const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

const PROVIDER: &str = "openai";

/// Chat-completions client for OpenAI and API-compatible servers.
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: SecretString, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model: model.into(),
            base_url: OPENAI_API_URL.to_string(),
        }
    }

    /// Point at a different chat-completions URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        let mut body = json!({
            "model": self.model,
            "messages": request.messages,
        });

        if let Some(ResponseFormat::JsonSchema {
            name,
            strict,
            schema,
        }) = &request.response_format
        {
            body["response_format"] = json!({
                "type": "json_schema",
                "json_schema": {
                    "strict": strict,
                    "name": name,
                    "schema": schema,
                }
            });
        }

        body
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    id: Option<String>,
    #[serde(default)]
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    content: Option<String>,
    refusal: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

fn parse_http_error(status: u16, body: &str) -> LlmError {
    match status {
        401 | 403 => LlmError::AuthFailed {
            provider: PROVIDER.to_string(),
        },
        429 => LlmError::RateLimited {
            provider: PROVIDER.to_string(),
            retry_after: None,
        },
        _ => LlmError::RequestFailed {
            provider: PROVIDER.to_string(),
            reason: format!("HTTP {status}: {body}"),
        },
    }
}

fn parse_response(body: &str) -> Result<CompletionResponse, LlmError> {
    let parsed: ApiResponse =
        serde_json::from_str(body).map_err(|e| LlmError::InvalidResponse {
            provider: PROVIDER.to_string(),
            reason: format!("Failed to parse response: {e}"),
        })?;

    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse {
            provider: PROVIDER.to_string(),
            reason: "response contained no choices".to_string(),
        })?;

    let content = match (choice.message.content, choice.message.refusal) {
        (Some(content), _) => content,
        (None, Some(refusal)) => {
            return Err(LlmError::InvalidResponse {
                provider: PROVIDER.to_string(),
                reason: format!("model refused: {refusal}"),
            });
        }
        (None, None) => {
            return Err(LlmError::InvalidResponse {
                provider: PROVIDER.to_string(),
                reason: "first choice has no content".to_string(),
            });
        }
    };

    let usage = parsed.usage.unwrap_or_default();

    Ok(CompletionResponse {
        content,
        input_tokens: usage.prompt_tokens,
        output_tokens: usage.completion_tokens,
        finish_reason: FinishReason::from_api(choice.finish_reason.as_deref()),
        response_id: parsed.id,
    })
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn cost_per_token(&self) -> (Decimal, Decimal) {
        model_cost(&self.model)
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = self.build_request_body(&request);

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let body_text = response.text().await.map_err(|e| LlmError::RequestFailed {
            provider: PROVIDER.to_string(),
            reason: e.to_string(),
        })?;

        if !(200..300).contains(&status) {
            return Err(parse_http_error(status, &body_text));
        }

        let completion = parse_response(&body_text)?;
        debug!(
            model = %self.model,
            input_tokens = completion.input_tokens,
            output_tokens = completion.output_tokens,
            "Chat completion received"
        );
        Ok(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::ChatMessage;

    fn provider() -> OpenAiProvider {
        OpenAiProvider::new(SecretString::from("sk-test"), "gpt-4o-mini")
    }

    #[test]
    fn body_without_response_format() {
        let request = CompletionRequest::new(vec![
            ChatMessage::system("be brief"),
            ChatMessage::user("hi"),
        ]);
        let body = provider().build_request_body(&request);
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hi");
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn body_with_json_schema() {
        let request = CompletionRequest::new(vec![ChatMessage::user("hi")])
            .with_response_format(ResponseFormat::JsonSchema {
                name: "answer".into(),
                strict: true,
                schema: json!({"type": "object"}),
            });
        let body = provider().build_request_body(&request);
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["name"], "answer");
        assert_eq!(body["response_format"]["json_schema"]["strict"], true);
        assert_eq!(
            body["response_format"]["json_schema"]["schema"]["type"],
            "object"
        );
    }

    #[test]
    fn parses_first_choice() {
        let body = r#"{
            "id": "chatcmpl-1",
            "choices": [
                {"message": {"role": "assistant", "content": "first"}, "finish_reason": "stop"},
                {"message": {"role": "assistant", "content": "second"}, "finish_reason": "stop"}
            ],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3}
        }"#;
        let response = parse_response(body).unwrap();
        assert_eq!(response.content, "first");
        assert_eq!(response.input_tokens, 12);
        assert_eq!(response.output_tokens, 3);
        assert_eq!(response.finish_reason, FinishReason::Stop);
        assert_eq!(response.response_id.as_deref(), Some("chatcmpl-1"));
    }

    #[test]
    fn empty_choices_is_invalid_response() {
        let err = parse_response(r#"{"choices": []}"#).unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse { .. }));
    }

    #[test]
    fn null_content_is_invalid_response() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": null}, "finish_reason": "tool_calls"}]}"#;
        let err = parse_response(body).unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse { .. }));

        let body = r#"{"choices": [{"message": {"role": "assistant", "content": null, "refusal": "I can't help with that."}}]}"#;
        match parse_response(body).unwrap_err() {
            LlmError::InvalidResponse { reason, .. } => assert!(reason.contains("can't help")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn http_errors_map_to_variants() {
        assert!(matches!(parse_http_error(401, ""), LlmError::AuthFailed { .. }));
        assert!(matches!(parse_http_error(429, ""), LlmError::RateLimited { .. }));
        assert!(matches!(
            parse_http_error(500, "oops"),
            LlmError::RequestFailed { .. }
        ));
    }
}
