//! # advisor-relay
//!
//! Stateless HTTP relay: `POST /api/gemini` takes `{ "prompt": ... }`, adds
//! the real estate framing, asks the model once, and answers `{ "text": ... }`.

pub mod config;
pub mod error;
pub mod handlers;

use std::sync::Arc;

use advisor_core::relay_client::RELAY_PATH;
use advisor_core::{GeminiClient, GenerativeModel};
use axum::routing::post;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::RelayConfig;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Model client, absent when no API key is configured.
    pub model: Option<Arc<dyn GenerativeModel>>,
}

impl AppState {
    pub fn new(model: Option<Arc<dyn GenerativeModel>>) -> Self {
        Self { model }
    }

    /// Build the Gemini client from configuration. A missing key is not an
    /// error here: requests are answered with the configuration error.
    pub fn from_config(config: &RelayConfig) -> Self {
        let model = config.api_key().map(|key| {
            let client = GeminiClient::new(key, &config.model).with_api_base(&config.api_base);
            Arc::new(client) as Arc<dyn GenerativeModel>
        });
        Self { model }
    }
}

/// Builds the Axum router with the relay route and shared state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(RELAY_PATH, post(handlers::gemini::generate_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
