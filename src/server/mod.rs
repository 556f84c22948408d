//! HTTP server for the triage bot.
//!
//! A thin adapter: it hands each delivery's headers and body to
//! [`crate::delivery::serve`] and maps the outcome onto a status code.
//!
//! # Endpoints
//!
//! - `POST /webhook` - Handles a GitHub webhook delivery (200, or 500 on any failure)
//! - `GET /health` - Returns 200 if the server is running

use std::sync::Arc;
use std::time::Duration;

use crate::github::GitHubApi;
use crate::routing::Router;

pub mod health;
pub mod webhook;

pub use health::health_handler;
pub use webhook::webhook_handler;

/// Shared application state, passed to handlers via axum's `State` extractor.
pub struct AppState<G> {
    inner: Arc<AppStateInner<G>>,
}

struct AppStateInner<G> {
    client: G,
    router: Router<G>,
    /// Webhook secret for HMAC-SHA256 verification. `None` accepts only
    /// unsigned deliveries.
    webhook_secret: Option<Vec<u8>>,
    consistency_delay: Duration,
}

impl<G> Clone for AppState<G> {
    fn clone(&self) -> Self {
        AppState {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<G> AppState<G> {
    pub fn new(
        client: G,
        router: Router<G>,
        webhook_secret: Option<Vec<u8>>,
        consistency_delay: Duration,
    ) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                client,
                router,
                webhook_secret,
                consistency_delay,
            }),
        }
    }

    pub fn client(&self) -> &G {
        &self.inner.client
    }

    pub fn router(&self) -> &Router<G> {
        &self.inner.router
    }

    pub fn webhook_secret(&self) -> Option<&[u8]> {
        self.inner.webhook_secret.as_deref()
    }

    pub fn consistency_delay(&self) -> Duration {
        self.inner.consistency_delay
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router<G: GitHubApi + 'static>(app_state: AppState<G>) -> axum::Router {
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/webhook", post(webhook_handler::<G>))
        .route("/health", get(health_handler))
        .with_state(app_state)
}
