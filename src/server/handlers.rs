use super::error::AppError;
use super::events::sse_event;
use super::AppState;
use crate::feedback::FeedbackRequest;
use crate::registry::ReviewerSummary;
use crate::runner::{BatchReport, Run};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::sse::{KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::Json;
use futures::StreamExt;
use serde_json::{json, Value};

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "auth_required": state.api_key.is_some(),
    }))
}

pub async fn list_personas(State(state): State<AppState>) -> Json<Vec<ReviewerSummary>> {
    Json(state.orchestrator.registry().summaries())
}

/// Wait for every persona and answer with the aggregate.
pub async fn feedback(
    State(state): State<AppState>,
    body: Result<Json<FeedbackRequest>, JsonRejection>,
) -> Result<Json<BatchReport>, AppError> {
    let run = prepare(&state, body)?;
    Ok(Json(state.orchestrator.collect(run).await))
}

/// Stream each persona's result as it lands, then `done`.
pub async fn feedback_stream(
    State(state): State<AppState>,
    body: Result<Json<FeedbackRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let run = prepare(&state, body)?;
    // Dropping the body on disconnect drops the run stream and its workers
    let events = state.orchestrator.start(run).map(sse_event);
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn prepare(
    state: &AppState,
    body: Result<Json<FeedbackRequest>, JsonRejection>,
) -> Result<Run, AppError> {
    let Json(request) = body?;
    // Persona ids are cheap to check; frames are not cheap to decode
    state.orchestrator.registry().resolve(&request.personas)?;
    let (personas, input) = request.into_parts()?;
    Ok(state.orchestrator.prepare(&personas, input)?)
}
