//! `POST /api/gemini`, the relay endpoint.

use advisor_core::relay::{self, RelayError};
use advisor_core::relay_client::RelayResponse;
use axum::body::Body;
use axum::extract::State;
use axum::Json;
use tracing::{debug, error};

use crate::error::ApiResult;
use crate::AppState;

/// Request bodies are small JSON objects; anything larger is rejected.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Checks the credential, validates and enriches the prompt, then makes a
/// single model call.
pub async fn generate_handler(
    State(state): State<AppState>,
    body: Body,
) -> ApiResult<Json<RelayResponse>> {
    // Credential check comes before the body is even read
    let model = state.model.as_deref().ok_or(RelayError::MissingApiKey)?;

    let bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| log_downstream(RelayError::Downstream(format!("failed to read request body: {e}"))))?;

    let value = relay::parse_body(&bytes).map_err(log_downstream)?;
    let prompt = relay::validate(&value)?;
    let enriched = relay::enrich(prompt);

    debug!(model = model.model_name(), prompt_len = enriched.as_str().len(), "calling model");

    let text = relay::call(model, &enriched).await.map_err(log_downstream)?;

    Ok(Json(RelayResponse { text }))
}

fn log_downstream(e: RelayError) -> RelayError {
    error!(error = %e, "Gemini API Error");
    e
}
