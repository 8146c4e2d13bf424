//! Wire types for the chat-completions endpoint.

use crosscheck_application::{Completion, CompletionRequest, TransportError};
use crosscheck_domain::TokenUsage;
use serde::{Deserialize, Serialize};

/// Request body: `{model, messages:[{role:"user", content}], max_tokens, temperature}`
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

impl<'a> From<&'a CompletionRequest> for ChatRequest<'a> {
    fn from(request: &'a CompletionRequest) -> Self {
        Self {
            model: &request.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }
}

/// Response body. Only `choices[0].message.content` and `usage` are read.
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl ChatResponse {
    pub fn into_completion(self) -> Result<Completion, TransportError> {
        let content = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| TransportError::InvalidResponse("response has no choices".to_string()))?
            .message
            .content
            .ok_or_else(|| {
                TransportError::InvalidResponse("choice has no message content".to_string())
            })?;

        let usage = self
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: if u.total_tokens > 0 {
                    u.total_tokens
                } else {
                    u.prompt_tokens + u.completion_tokens
                },
            })
            .unwrap_or_default();

        Ok(Completion { content, usage })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = CompletionRequest {
            backend: "alpha".to_string(),
            model: "alpha-large".to_string(),
            prompt: "Hello".to_string(),
            max_tokens: 256,
            temperature: 0.5,
        };
        let body = serde_json::to_value(ChatRequest::from(&request)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "model": "alpha-large",
                "messages": [{"role": "user", "content": "Hello"}],
                "max_tokens": 256,
                "temperature": 0.5
            })
        );
    }

    #[test]
    fn test_parse_response() {
        let json = r#"{
            "id": "cmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "hello"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 4, "completion_tokens": 6, "total_tokens": 10}
        }"#;
        let completion = serde_json::from_str::<ChatResponse>(json)
            .unwrap()
            .into_completion()
            .unwrap();
        assert_eq!(completion.content, "hello");
        assert_eq!(completion.usage.total_tokens, 10);
    }

    #[test]
    fn test_missing_usage_counts_zero() {
        let json = r#"{"choices": [{"message": {"content": "hi"}}]}"#;
        let completion = serde_json::from_str::<ChatResponse>(json)
            .unwrap()
            .into_completion()
            .unwrap();
        assert_eq!(completion.usage.total_tokens, 0);
    }

    #[test]
    fn test_total_derived_when_absent() {
        let json = r#"{"choices": [{"message": {"content": "hi"}}], "usage": {"prompt_tokens": 3, "completion_tokens": 2}}"#;
        let completion = serde_json::from_str::<ChatResponse>(json)
            .unwrap()
            .into_completion()
            .unwrap();
        assert_eq!(completion.usage.total_tokens, 5);
    }

    #[test]
    fn test_empty_choices_is_invalid() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(
            response.into_completion(),
            Err(TransportError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_null_content_is_invalid() {
        let response: ChatResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap();
        assert!(response.into_completion().is_err());
    }
}
