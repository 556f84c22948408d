//! End-to-end handling of one webhook delivery.
//!
//! [`serve`] is transport-agnostic: the HTTP layer hands it the raw headers
//! and body and maps its result onto a response.

use std::time::Duration;

use http::HeaderMap;
use thiserror::Error;
use tracing::{debug, info};

use crate::github::GitHubApi;
use crate::routing::{DispatchError, Router};
use crate::webhooks::{Event, ParseError};

/// Default pause between accepting a delivery and dispatching it.
pub const DEFAULT_CONSISTENCY_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("rejected webhook: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Parses, verifies, and dispatches one delivery.
///
/// `consistency_delay` is slept after verification and before dispatch so
/// that GitHub's own caches can settle; the handlers still re-read anything
/// they write against.
pub async fn serve<G: GitHubApi>(
    gh: &G,
    router: &Router<G>,
    headers: &HeaderMap,
    body: &[u8],
    secret: Option<&[u8]>,
    consistency_delay: Duration,
) -> Result<(), ServeError> {
    let event = Event::from_http(headers, body, secret)?;
    info!(
        delivery_id = %event.delivery_id(),
        event = %event.kind(),
        action = ?event.action().map(|a| a.as_str()),
        "Webhook received"
    );

    if !consistency_delay.is_zero() {
        tokio::time::sleep(consistency_delay).await;
    }
    router.dispatch(&event, gh).await?;

    log_rate_limit(gh).await;
    Ok(())
}

pub(crate) async fn log_rate_limit<G: GitHubApi>(gh: &G) {
    match gh.rate_limit_remaining().await {
        Some(remaining) => info!(remaining, "GitHub rate limit"),
        None => debug!("No rate limit data provided"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers;
    use crate::test_utils::{Call, FakeGitHub, issue_event, labels_url};
    use crate::webhooks::{compute_signature, format_signature_header};

    const SECRET: &[u8] = b"It's a Secret to Everybody";

    fn headers(event: &str, signature: Option<String>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", "application/json".parse().unwrap());
        headers.insert("x-github-event", event.parse().unwrap());
        headers.insert("x-github-delivery", "d-1".parse().unwrap());
        if let Some(signature) = signature {
            headers.insert("x-hub-signature-256", signature.parse().unwrap());
        }
        headers
    }

    fn signed(body: &[u8]) -> Option<String> {
        Some(format_signature_header(&compute_signature(body, SECRET)))
    }

    #[tokio::test]
    async fn valid_delivery_is_dispatched() {
        let gh = FakeGitHub::new();
        let router = handlers::router();
        let body = serde_json::to_vec(issue_event("opened", 5, "open", &[], None).payload()).unwrap();

        serve(
            &gh,
            &router,
            &headers("issues", signed(&body)),
            &body,
            Some(SECRET),
            Duration::ZERO,
        )
        .await
        .unwrap();

        let labels = labels_url(5).replace("{/name}", "");
        assert!(gh.calls().contains(&Call::Get(labels.clone())));
        assert_eq!(gh.posts_to(&labels).len(), 1);
    }

    #[tokio::test]
    async fn bad_signature_prevents_dispatch() {
        let gh = FakeGitHub::new();
        let router = handlers::router();
        let body = serde_json::to_vec(issue_event("opened", 5, "open", &[], None).payload()).unwrap();

        let err = serve(
            &gh,
            &router,
            &headers("issues", signed(b"something else")),
            &body,
            Some(SECRET),
            Duration::ZERO,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ServeError::Parse(ParseError::InvalidSignature)));
        assert!(gh.calls().is_empty());
    }

    #[tokio::test]
    async fn ping_succeeds_without_github_calls() {
        let gh = FakeGitHub::new();
        let router = handlers::router();
        let body = br#"{"zen": "Design for failure.", "hook_id": 1}"#;

        serve(&gh, &router, &headers("ping", None), body, None, Duration::ZERO)
            .await
            .unwrap();
        assert!(gh.calls().is_empty());
    }

    #[tokio::test]
    async fn handler_failure_is_propagated() {
        let gh = FakeGitHub::new();
        let router = handlers::router();
        let body = br#"{"action": "opened"}"#;

        let err = serve(&gh, &router, &headers("issues", None), body, None, Duration::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, ServeError::Dispatch(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn dispatch_waits_for_consistency_delay() {
        let gh = FakeGitHub::new();
        let router = handlers::router();
        let body = br#"{"zen": "x"}"#;
        let started = tokio::time::Instant::now();

        serve(
            &gh,
            &router,
            &headers("ping", None),
            body,
            None,
            DEFAULT_CONSISTENCY_DELAY,
        )
        .await
        .unwrap();
        assert!(started.elapsed() >= DEFAULT_CONSISTENCY_DELAY);
    }
}
