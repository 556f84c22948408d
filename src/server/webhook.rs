//! Webhook endpoint handler.
//!
//! Runs the whole delivery inline and answers once every handler has
//! finished.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::error;

use super::AppState;
use crate::delivery::serve;
use crate::github::GitHubApi;
use crate::webhooks::HEADER_DELIVERY;

/// Body returned for every failed delivery. Details stay in the logs.
const FAILURE_BODY: &str = "internal server error";

/// A delivery that could not be handled. Logged before it is returned.
#[derive(Debug)]
pub struct WebhookFailure;

impl IntoResponse for WebhookFailure {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, FAILURE_BODY).into_response()
    }
}

/// Webhook handler.
///
/// # Response
///
/// - 200 OK: the delivery was verified and every matching handler succeeded
/// - 500 Internal Server Error: anything else
///
/// # Example
///
/// ```ignore
/// POST /webhook HTTP/1.1
/// X-GitHub-Event: issues
/// X-GitHub-Delivery: 72d3162e-cc78-11e3-81ab-4c9367dc0958
/// X-Hub-Signature-256: sha256=...
/// Content-Type: application/json
///
/// {"action": "opened", "issue": {...}, "repository": {...}}
///
/// HTTP/1.1 200 OK
/// ```
pub async fn webhook_handler<G: GitHubApi + 'static>(
    State(app_state): State<AppState<G>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, &'static str), WebhookFailure> {
    let result = serve(
        app_state.client(),
        app_state.router(),
        &headers,
        &body,
        app_state.webhook_secret(),
        app_state.consistency_delay(),
    )
    .await;

    match result {
        Ok(()) => Ok((StatusCode::OK, "OK")),
        Err(e) => {
            let delivery_id = headers
                .get(HEADER_DELIVERY)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("<missing>");
            error!(delivery_id, error = ?e, "Webhook delivery failed");
            Err(WebhookFailure)
        }
    }
}
