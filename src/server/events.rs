//! Wire form of run events, shared by the SSE route and `panelrev review`.

use crate::feedback::ReviewFeedback;
use crate::runner::{CompletionEvent, RunEvent};
use axum::response::sse::Event;
use serde::Serialize;

pub const PERSONA_ERROR_EVENT: &str = "persona-error";
pub const DONE_EVENT: &str = "done";

#[derive(Debug, Clone, Serialize)]
pub struct PersonaError {
    pub error: bool,
    pub persona: String,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum EventPayload {
    Feedback(ReviewFeedback),
    Error(PersonaError),
    Done {},
}

impl EventPayload {
    /// SSE event name; `None` for feedback, which goes out unlabeled
    pub fn name(&self) -> Option<&'static str> {
        match self {
            EventPayload::Feedback(_) => None,
            EventPayload::Error(_) => Some(PERSONA_ERROR_EVENT),
            EventPayload::Done {} => Some(DONE_EVENT),
        }
    }
}

impl From<RunEvent> for EventPayload {
    fn from(event: RunEvent) -> Self {
        match event {
            RunEvent::Completed(CompletionEvent::Success { feedback, .. }) => {
                EventPayload::Feedback(feedback)
            }
            RunEvent::Completed(CompletionEvent::Failure {
                task_id,
                error_detail,
            }) => EventPayload::Error(PersonaError {
                error: true,
                persona: task_id,
                detail: error_detail,
            }),
            RunEvent::Done => EventPayload::Done {},
        }
    }
}

pub fn sse_event(event: RunEvent) -> Result<Event, axum::Error> {
    let payload = EventPayload::from(event);
    let sse = match payload.name() {
        Some(name) => Event::default().event(name),
        None => Event::default(),
    };
    sse.json_data(&payload)
}

#[derive(Serialize)]
struct JsonLine<'a> {
    event: &'a str,
    data: &'a EventPayload,
}

/// One NDJSON line: `{"event": name, "data": payload}`
pub fn json_line(event: RunEvent) -> serde_json::Result<String> {
    let payload = EventPayload::from(event);
    serde_json::to_string(&JsonLine {
        event: payload.name().unwrap_or("feedback"),
        data: &payload,
    })
}
