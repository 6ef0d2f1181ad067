//! Relay pipeline: validate → enrich → call.
//!
//! Each stage is a plain function so it can be tested without a server or
//! network. The HTTP handler in `advisor-relay` composes them.

use serde_json::Value;
use thiserror::Error;

use crate::ai::GenerativeModel;

pub const MISSING_API_KEY: &str = "API key not configured";
pub const INVALID_PROMPT: &str = "Invalid prompt";
pub const PROCESSING_FAILED: &str = "Error processing your request. Please try again.";

/// Instruction appended to every prompt before it reaches the model. The
/// line breaks and indentation are part of the text sent.
pub const MARKET_CONTEXT_SUFFIX: &str = concat!(
    "Answer this in context of current real estate market trends and news. \n",
    "      Include relevant statistics and market insights where applicable. \n",
    "      If mentioning specific locations, focus on major global markets unless specified otherwise."
);

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("API key not configured")]
    MissingApiKey,

    #[error("invalid prompt")]
    InvalidPrompt,

    /// Model call, transport, or response extraction failed. The detail is
    /// for the operator log only.
    #[error("downstream failure: {0}")]
    Downstream(String),
}

impl RelayError {
    pub fn status_code(&self) -> u16 {
        match self {
            RelayError::MissingApiKey => 500,
            RelayError::InvalidPrompt => 400,
            RelayError::Downstream(_) => 500,
        }
    }

    /// Text returned to the caller. Never includes downstream detail.
    pub fn user_message(&self) -> &'static str {
        match self {
            RelayError::MissingApiKey => MISSING_API_KEY,
            RelayError::InvalidPrompt => INVALID_PROMPT,
            RelayError::Downstream(_) => PROCESSING_FAILED,
        }
    }
}

/// A prompt that passed validation: a non-empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidPrompt(String);

impl ValidPrompt {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The prompt as sent to the model, suffix included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedPrompt(String);

impl EnrichedPrompt {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Parse a raw request body. Bodies that are not JSON count as a processing
/// failure rather than a validation failure.
pub fn parse_body(body: &[u8]) -> Result<Value, RelayError> {
    serde_json::from_slice(body).map_err(|e| RelayError::Downstream(format!("malformed request body: {}", e)))
}

/// `prompt` must be present, a string, and non-empty.
pub fn validate(body: &Value) -> Result<ValidPrompt, RelayError> {
    match body.get("prompt") {
        Some(Value::String(prompt)) if !prompt.is_empty() => Ok(ValidPrompt(prompt.clone())),
        _ => Err(RelayError::InvalidPrompt),
    }
}

pub fn enrich(prompt: ValidPrompt) -> EnrichedPrompt {
    EnrichedPrompt(format!("{} {}", prompt.0, MARKET_CONTEXT_SUFFIX))
}

/// Single attempt against the model; no retries.
pub async fn call(model: &dyn GenerativeModel, prompt: &EnrichedPrompt) -> Result<String, RelayError> {
    model
        .generate(prompt.as_str())
        .await
        .map_err(|e| RelayError::Downstream(format!("{:#}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use serde_json::json;

    struct EchoModel;

    #[async_trait]
    impl GenerativeModel for EchoModel {
        fn model_name(&self) -> &str {
            "echo"
        }

        async fn generate(&self, prompt: &str) -> Result<String> {
            Ok(prompt.to_uppercase())
        }
    }

    struct BrokenModel;

    #[async_trait]
    impl GenerativeModel for BrokenModel {
        fn model_name(&self) -> &str {
            "broken"
        }

        async fn generate(&self, _prompt: &str) -> Result<String> {
            Err(anyhow!("quota exceeded for project 1234"))
        }
    }

    #[test]
    fn validate_accepts_string_prompt() {
        let prompt = validate(&json!({ "prompt": "What are rental trends in Austin?" })).unwrap();
        assert_eq!(prompt.as_str(), "What are rental trends in Austin?");
    }

    #[test]
    fn validate_rejects_missing_wrong_type_and_empty() {
        for body in [
            json!({}),
            json!({ "prompt": null }),
            json!({ "prompt": 42 }),
            json!({ "prompt": ["a"] }),
            json!({ "prompt": "" }),
            json!("just a string"),
        ] {
            assert!(matches!(validate(&body), Err(RelayError::InvalidPrompt)), "{}", body);
        }
    }

    #[test]
    fn enrich_appends_market_suffix_verbatim() {
        let prompt = validate(&json!({ "prompt": "What are rental trends in Austin?" })).unwrap();
        let enriched = enrich(prompt);

        assert!(enriched.as_str().starts_with("What are rental trends in Austin? "));
        assert!(enriched.as_str().ends_with(MARKET_CONTEXT_SUFFIX));
        assert!(enriched
            .as_str()
            .contains("in context of current real estate market trends"));
    }

    #[test]
    fn suffix_keeps_line_layout() {
        let lines: Vec<&str> = MARKET_CONTEXT_SUFFIX.split('\n').collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Answer this in context of current real estate market trends and news. ");
        assert_eq!(lines[1], "      Include relevant statistics and market insights where applicable. ");
        assert!(lines[2].starts_with("      If mentioning specific locations"));
    }

    #[test]
    fn malformed_body_is_downstream_failure() {
        let err = parse_body(b"{not json").unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.user_message(), PROCESSING_FAILED);
    }

    #[test]
    fn error_mapping() {
        assert_eq!(RelayError::MissingApiKey.status_code(), 500);
        assert_eq!(RelayError::MissingApiKey.user_message(), "API key not configured");
        assert_eq!(RelayError::InvalidPrompt.status_code(), 400);
        assert_eq!(RelayError::InvalidPrompt.user_message(), "Invalid prompt");
    }

    #[tokio::test]
    async fn call_returns_model_text() {
        let prompt = enrich(validate(&json!({ "prompt": "hi" })).unwrap());
        let text = call(&EchoModel, &prompt).await.unwrap();
        assert!(text.starts_with("HI ANSWER THIS"));
    }

    #[tokio::test]
    async fn call_hides_downstream_detail_from_user_message() {
        let prompt = enrich(validate(&json!({ "prompt": "hi" })).unwrap());
        let err = call(&BrokenModel, &prompt).await.unwrap_err();

        assert_eq!(err.status_code(), 500);
        assert!(err.to_string().contains("quota exceeded"));
        assert!(!err.user_message().contains("quota"));
    }
}
