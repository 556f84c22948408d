//! Acknowledges the `ping` GitHub sends when a webhook is created.

use futures::future::BoxFuture;
use serde_json::Value;
use tracing::info;

use crate::github::GitHubApi;
use crate::routing::{Handler, HandlerError, Router};
use crate::webhooks::{Event, EventKind};

pub fn router<G: GitHubApi>() -> Router<G> {
    let mut router = Router::new();
    router.register(EventKind::Ping, None, Ping);
    router
}

#[derive(Debug, Clone, Copy)]
pub struct Ping;

impl<G: GitHubApi> Handler<G> for Ping {
    fn name(&self) -> &'static str {
        "ping"
    }

    fn handle<'a>(&'a self, event: &'a Event, _gh: &'a G) -> BoxFuture<'a, Result<(), HandlerError>> {
        Box::pin(async move {
            let hook_id = event.payload().get("hook_id").and_then(Value::as_u64);
            info!(delivery_id = %event.delivery_id(), hook_id, "ping event received");
            Ok(())
        })
    }
}
