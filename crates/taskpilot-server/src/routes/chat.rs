//! Chat endpoint: one agent run per request

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;
use crate::ServerState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

pub async fn chat(
    State(state): State<Arc<ServerState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if req.message.trim().is_empty() {
        return Err(ApiError::bad_request("Message must not be empty"));
    }

    let outcome = state.agent.run(&req.message).await?;
    info!(
        iterations = outcome.iterations,
        tool_calls = outcome.tool_calls,
        "Chat request answered"
    );
    Ok(Json(ChatResponse {
        response: outcome.response,
    }))
}
