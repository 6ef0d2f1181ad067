use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Path of the relay endpoint, shared by the server router and the client.
pub const RELAY_PATH: &str = "/api/gemini";

pub const FETCH_FAILED: &str = "Failed to fetch response";
pub const GENERIC_CLIENT_ERROR: &str = "Sorry, I encountered an error. Please try again.";

/// Body of a relay request.
#[derive(Debug, Serialize, Deserialize)]
pub struct RelayRequest {
    pub prompt: String,
}

/// Body of every relay response, success or failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayResponse {
    pub text: String,
}

#[derive(Debug, Error)]
pub enum ClientError {
    /// The relay answered with a non-2xx status.
    #[error("relay returned {status}")]
    Status { status: u16, text: Option<String> },

    #[error("relay request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("could not decode relay response: {0}")]
    Decode(String),

    /// The background task running the request ended without a result.
    #[error("request task ended unexpectedly: {0}")]
    Aborted(String),
}

impl ClientError {
    /// Text shown to the user as an assistant message.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Status { text: Some(text), .. } if !text.trim().is_empty() => text.clone(),
            ClientError::Status { .. } => FETCH_FAILED.to_string(),
            ClientError::Transport(_) | ClientError::Decode(_) | ClientError::Aborted(_) => {
                GENERIC_CLIENT_ERROR.to_string()
            }
        }
    }
}

/// Anything that can answer a prompt on behalf of the chat view.
#[async_trait]
pub trait RelayApi: Send + Sync {
    async fn ask(&self, prompt: &str) -> Result<String, ClientError>;
}

/// HTTP client for the relay's `POST /api/gemini` endpoint.
#[derive(Clone)]
pub struct RelayClient {
    client: Client,
    base_url: String,
}

impl RelayClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, RELAY_PATH)
    }
}

#[async_trait]
impl RelayApi for RelayClient {
    async fn ask(&self, prompt: &str) -> Result<String, ClientError> {
        let request = RelayRequest {
            prompt: prompt.to_string(),
        };

        let response = self
            .client
            .post(self.endpoint())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let parsed = serde_json::from_str::<RelayResponse>(&body);

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "relay returned an error status");
            return Err(ClientError::Status {
                status: status.as_u16(),
                text: parsed.ok().map(|r| r.text),
            });
        }

        parsed
            .map(|r| r.text)
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}
