pub mod conversations;
pub mod health;
pub mod tools;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;

use wh_domain::error::Error;

use crate::state::AppState;

/// Build the full API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        // Conversations (invoke / resume / inspect)
        .route("/v1/conversations", get(conversations::list_conversations))
        .route("/v1/conversations/:id", get(conversations::get_conversation))
        .route("/v1/conversations/:id/invoke", post(conversations::invoke))
        .route("/v1/conversations/:id/resume", post(conversations::resume))
        // Capabilities
        .route("/v1/tools", get(tools::list_tools))
}

pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

/// HTTP status for a runtime error.
pub(crate) fn error_status(e: &Error) -> StatusCode {
    match e {
        Error::ProtocolViolation(_) => StatusCode::CONFLICT,
        Error::InvalidArguments { .. }
        | Error::UnknownCapability(_)
        | Error::UnrecognizedDecision { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        Error::GenerationUnavailable(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Render a runtime error as `{ "error", "kind" }` with its mapped status.
pub(crate) fn error_response(e: Error) -> Response {
    let status = error_status(&e);
    if status.is_server_error() {
        tracing::error!(error = %e, "request failed");
    } else {
        tracing::debug!(error = %e, "request rejected");
    }
    (
        status,
        Json(serde_json::json!({
            "error": e.to_string(),
            "kind": error_kind(&e),
        })),
    )
        .into_response()
}

fn error_kind(e: &Error) -> &'static str {
    match e {
        Error::ProtocolViolation(_) => "protocol_violation",
        Error::InvalidArguments { .. } => "invalid_arguments",
        Error::UnknownCapability(_) => "unknown_capability",
        Error::UnrecognizedDecision { .. } => "unrecognized_decision",
        Error::GenerationUnavailable(_) => "generation_unavailable",
        Error::StepLimitExceeded(_) => "step_limit_exceeded",
        _ => "internal",
    }
}
