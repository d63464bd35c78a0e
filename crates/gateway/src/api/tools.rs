//! `GET /v1/tools` — capabilities advertised to the model.

use axum::extract::State;
use axum::response::{IntoResponse, Json};

use crate::state::AppState;

pub async fn list_tools(State(state): State<AppState>) -> impl IntoResponse {
    let tools = state.tools.list();
    Json(serde_json::json!({
        "count": tools.len(),
        "tools": tools,
    }))
}
