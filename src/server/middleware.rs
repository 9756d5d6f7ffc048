use super::error::AppError;
use super::AppState;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::time::Instant;
use tracing::{debug, info, info_span, Instrument};

pub const API_KEY_HEADER: &str = "x-api-key";

/// Reject requests without the configured key. A server without a key
/// accepts everything.
pub async fn require_api_key(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let Some(expected) = state.api_key.as_deref() else {
        return next.run(req).await;
    };

    let provided = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    if provided == Some(expected) {
        next.run(req).await
    } else {
        debug!("Rejected {} {}: bad API key", req.method(), req.uri().path());
        AppError::unauthorized().into_response()
    }
}

/// Log each request in a span carrying a short request id.
pub async fn log_requests(req: Request, next: Next) -> Response {
    let mut request_id = uuid::Uuid::new_v4().simple().to_string();
    request_id.truncate(8);

    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let span = info_span!("request", id = %request_id);

    async move {
        let start = Instant::now();
        info!("{} {}", method, path);
        let response = next.run(req).await;
        info!(
            "{} {} -> {} ({}ms)",
            method,
            path,
            response.status().as_u16(),
            start.elapsed().as_millis()
        );
        response
    }
    .instrument(span)
    .await
}
