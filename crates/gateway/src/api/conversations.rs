//! Conversation endpoints.
//!
//! - `POST /v1/conversations/:id/invoke` — send a user message
//! - `POST /v1/conversations/:id/resume` — answer the pending approval
//! - `GET  /v1/conversations/:id`        — display history + pending approval
//! - `GET  /v1/conversations`            — list conversations

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::Deserialize;

use crate::runtime::Session;
use crate::state::AppState;

use super::{api_error, error_response};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /v1/conversations/:id/invoke
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
pub struct InvokeBody {
    pub message: String,
}

pub async fn invoke(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<InvokeBody>,
) -> impl IntoResponse {
    if body.message.trim().is_empty() {
        return api_error(StatusCode::BAD_REQUEST, "message must not be empty");
    }

    match Session::new(state).invoke(&id, &body.message).await {
        Ok(reply) => Json(reply).into_response(),
        Err(e) => error_response(e),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /v1/conversations/:id/resume
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
pub struct ResumeBody {
    /// `"accept"` or `"deny"`.
    pub decision: String,
}

pub async fn resume(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ResumeBody>,
) -> impl IntoResponse {
    match Session::new(state).resume(&id, &body.decision).await {
        Ok(reply) => Json(reply).into_response(),
        Err(e) => error_response(e),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /v1/conversations/:id
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match Session::new(state).conversation(&id) {
        Some(view) => Json(view).into_response(),
        None => api_error(StatusCode::NOT_FOUND, format!("conversation not found: {id}")),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /v1/conversations
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn list_conversations(State(state): State<AppState>) -> impl IntoResponse {
    let conversations = state.conversations.list();
    Json(serde_json::json!({
        "count": conversations.len(),
        "conversations": conversations,
    }))
}
