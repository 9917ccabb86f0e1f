//! Chat-completion client for the generation service.
//!
//! Sends one system and one user message, then reads a JSON object out of
//! `choices[0].message.content`. The content may be wrapped in a markdown
//! code fence.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use super::retry::Retryable;

pub const DEFAULT_API_URL: &str = "https://api.deepseek.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "deepseek-chat";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 2000;
pub const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from a generation request.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("generation service API key is missing")]
    MissingCredential,
    #[error("generation service rejected the API key (HTTP {status})")]
    Unauthorized { status: u16 },
    #[error("generation service returned HTTP {status}")]
    Http { status: u16 },
    #[error("generation service request timed out")]
    Timeout,
    #[error("cannot connect to generation service: {0}")]
    Network(#[source] reqwest::Error),
    /// The body or the message content is not valid JSON.
    #[error("{0}")]
    MalformedResponse(String),
    /// Valid JSON that does not have the expected fields.
    #[error("unexpected response shape: {0}")]
    InvalidPayload(String),
}

impl GenerationError {
    /// Timeouts, connection failures, 5xx and 429 are worth another try.
    pub fn is_retryable(&self) -> bool {
        match self {
            GenerationError::Timeout | GenerationError::Network(_) => true,
            GenerationError::Http { status } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GenerationError::Timeout
        } else {
            GenerationError::Network(e)
        }
    }
}

impl Retryable for GenerationError {
    fn is_retryable(&self) -> bool {
        GenerationError::is_retryable(self)
    }
}

/// The object the service is asked to produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewritePayload {
    #[serde(rename = "rewritten_prompt", alias = "prompt_migliorato")]
    pub rewritten: String,
    #[serde(alias = "suggerimenti")]
    pub suggestions: Vec<String>,
    #[serde(alias = "spiegazione")]
    pub explanation: String,
}

/// Connection and sampling settings.
#[derive(Clone)]
pub struct GenerationConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: DEFAULT_API_TIMEOUT,
        }
    }
}

impl std::fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f64,
    max_tokens: u32,
}

/// Client for an OpenAI-compatible chat completion endpoint.
pub struct GenerationClient {
    http: reqwest::Client,
    config: GenerationConfig,
}

impl GenerationClient {
    pub fn new(config: GenerationConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("promptpolish/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self { http, config }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn has_credential(&self) -> bool {
        self.config
            .api_key
            .as_deref()
            .map(|k| !k.trim().is_empty())
            .unwrap_or(false)
    }

    /// One request, no retries.
    pub async fn complete(
        &self,
        system: &str,
        user: &str,
    ) -> Result<RewritePayload, GenerationError> {
        let api_key = match self.config.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => key,
            _ => return Err(GenerationError::MissingCredential),
        };

        let request = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        info!(
            model = %self.config.model,
            input_len = user.len(),
            "sending generation request"
        );

        let response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(api_key)
            .timeout(self.config.timeout)
            .json(&request)
            .send()
            .await
            .map_err(GenerationError::from_reqwest)?;

        let status = response.status().as_u16();
        match status {
            200..=299 => {}
            401 | 403 => {
                error!(status, "generation service authentication failed");
                return Err(GenerationError::Unauthorized { status });
            }
            _ => return Err(GenerationError::Http { status }),
        }

        let body = response.text().await.map_err(GenerationError::from_reqwest)?;
        info!(response_len = body.len(), "generation response received");
        parse_completion(&body)
    }
}

/// Remove a surrounding markdown code fence, with or without a `json` tag.
pub fn strip_code_fence(content: &str) -> &str {
    let mut text = content.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Extract the rewrite payload from a chat completion body.
pub fn parse_completion(body: &str) -> Result<RewritePayload, GenerationError> {
    let envelope: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

    let content = envelope["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| {
            GenerationError::InvalidPayload("missing choices[0].message.content".to_string())
        })?;

    let value: serde_json::Value = serde_json::from_str(strip_code_fence(content))
        .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

    serde_json::from_value(value).map_err(|e| GenerationError::InvalidPayload(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completion(content: &str) -> String {
        serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        })
        .to_string()
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("  {}  "), "{}");
    }

    #[test]
    fn test_parse_english_keys() {
        let body = completion(
            r#"{"rewritten_prompt": "Scrivi una poesia.", "suggestions": ["a", "b", "c"], "explanation": "x"}"#,
        );
        let payload = parse_completion(&body).unwrap();
        assert_eq!(payload.rewritten, "Scrivi una poesia.");
        assert_eq!(payload.suggestions, vec!["a", "b", "c"]);
        assert_eq!(payload.explanation, "x");
    }

    #[test]
    fn test_parse_italian_keys_in_fence() {
        let body = completion(
            "```json\n{\"prompt_migliorato\": \"P\", \"suggerimenti\": [\"s\"], \"spiegazione\": \"e\"}\n```",
        );
        let payload = parse_completion(&body).unwrap();
        assert_eq!(payload.rewritten, "P");
        assert_eq!(payload.suggestions, vec!["s"]);
        assert_eq!(payload.explanation, "e");
    }

    #[test]
    fn test_malformed_content() {
        let err = parse_completion(&completion("not json at all")).unwrap_err();
        assert!(matches!(err, GenerationError::MalformedResponse(_)));

        let err = parse_completion("<html>").unwrap_err();
        assert!(matches!(err, GenerationError::MalformedResponse(_)));
    }

    #[test]
    fn test_wrong_shape() {
        let err = parse_completion(r#"{"error": "x"}"#).unwrap_err();
        assert!(matches!(err, GenerationError::InvalidPayload(_)));

        let err = parse_completion(&completion(r#"{"suggestions": []}"#)).unwrap_err();
        assert!(matches!(err, GenerationError::InvalidPayload(_)));
    }

    #[test]
    fn test_retry_classification() {
        assert!(GenerationError::Timeout.is_retryable());
        assert!(GenerationError::Http { status: 500 }.is_retryable());
        assert!(GenerationError::Http { status: 503 }.is_retryable());
        assert!(GenerationError::Http { status: 429 }.is_retryable());
        assert!(!GenerationError::Http { status: 400 }.is_retryable());
        assert!(!GenerationError::Unauthorized { status: 401 }.is_retryable());
        assert!(!GenerationError::MissingCredential.is_retryable());
        assert!(!GenerationError::MalformedResponse("x".into()).is_retryable());
        assert!(!GenerationError::InvalidPayload("x".into()).is_retryable());
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = GenerationConfig {
            api_key: Some("sk-secret".to_string()),
            ..GenerationConfig::default()
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_has_credential() {
        assert!(!GenerationClient::new(GenerationConfig::default()).has_credential());
        let config = GenerationConfig {
            api_key: Some("  ".to_string()),
            ..GenerationConfig::default()
        };
        assert!(!GenerationClient::new(config).has_credential());
    }
}
