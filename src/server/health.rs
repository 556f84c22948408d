//! Liveness probe.

use axum::http::StatusCode;

/// Always answers `200 OK`; the process being able to respond is the check.
pub async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
