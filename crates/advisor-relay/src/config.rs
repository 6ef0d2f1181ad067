//! Relay server configuration.

use advisor_core::ai::gemini::{DEFAULT_API_BASE, DEFAULT_MODEL};

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Configuration for the relay server.
#[derive(Clone, Debug)]
pub struct RelayConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3000").
    pub bind_addr: String,
    /// Generative Language API key. Empty counts as unset.
    pub api_key: Option<String>,
    /// Model identifier passed to `generateContent`.
    pub model: String,
    /// Base URL of the Generative Language API.
    pub api_base: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

impl RelayConfig {
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }
}
