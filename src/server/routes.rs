use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{ApiError, AppState};
use crate::adapter::{from_wire_all, to_wire_all, WireMessage};
use crate::error::ParleyError;

#[derive(Debug, Deserialize)]
pub struct TurnRequest {
    #[serde(default)]
    pub messages: Vec<WireMessage>,
    #[serde(default)]
    pub show_intermediate_steps: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TurnResponse {
    pub messages: Vec<WireMessage>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DidQuery {
    pub did: Option<String>,
}

pub fn configure(state: AppState) -> Router {
    Router::new()
        .route("/api/chat/agents", post(chat_agents))
        .route("/api/did", get(echo_did))
        .with_state(state)
}

async fn chat_agents(
    State(state): State<AppState>,
    payload: Result<Json<TurnRequest>, JsonRejection>,
) -> Result<Json<TurnResponse>, ApiError> {
    let Json(request) =
        payload.map_err(|rejection| ParleyError::InvalidArgument(rejection.body_text()))?;

    // Display-only roles never enter the history.
    let wire = request
        .messages
        .into_iter()
        .filter(|m| m.role == "user" || m.role == "assistant")
        .collect();
    let history = from_wire_all(wire)?;

    let outcome = state.router.run_turn(history).await?;
    info!(route = %outcome.route, passes = outcome.passes, "turn served");

    let visible = outcome.visible_messages(request.show_intermediate_steps);
    Ok(Json(TurnResponse {
        messages: to_wire_all(&visible),
    }))
}

async fn echo_did(Query(query): Query<DidQuery>) -> Json<DidQuery> {
    Json(query)
}
