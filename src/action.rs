//! One-shot mode for running inside a GitHub Actions workflow.
//!
//! The runner exposes the triggering event through `GITHUB_EVENT_NAME` and a
//! JSON file at `GITHUB_EVENT_PATH`. The event is dispatched once, with no
//! signature to check and no consistency delay.

use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::delivery::log_rate_limit;
use crate::github::GitHubApi;
use crate::routing::{DispatchError, Router};
use crate::webhooks::{DeliveryId, Event, EventKind};

/// Delivery id used for events that did not arrive over HTTP.
pub const UNKNOWN_DELIVERY: &str = "<unknown>";

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("failed to read event payload from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("event payload in {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Loads the payload at `event_path` and builds the event for `event_name`.
pub fn load_event(event_name: &str, event_path: &Path) -> Result<Event, ActionError> {
    let raw = std::fs::read(event_path).map_err(|source| ActionError::Read {
        path: event_path.to_path_buf(),
        source,
    })?;
    let payload: Value = serde_json::from_slice(&raw).map_err(|source| ActionError::Json {
        path: event_path.to_path_buf(),
        source,
    })?;
    Ok(Event::new(
        EventKind::parse(event_name),
        payload,
        DeliveryId::new(UNKNOWN_DELIVERY),
    ))
}

/// Dispatches the workflow's event once.
pub async fn run<G: GitHubApi>(
    gh: &G,
    router: &Router<G>,
    event_name: &str,
    event_path: &Path,
) -> Result<(), ActionError> {
    let event = load_event(event_name, event_path)?;
    info!(
        event = %event.kind(),
        action = ?event.action().map(|a| a.as_str()),
        path = %event_path.display(),
        "Handling workflow event"
    );
    router.dispatch(&event, gh).await?;
    log_rate_limit(gh).await;
    Ok(())
}
