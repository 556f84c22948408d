//! Event handlers and the top-level router.
//!
//! # Event Types
//!
//! | Event | Actions | Handler |
//! |-------|---------|---------|
//! | `ping` | any | [`ping`] - log and acknowledge |
//! | `issues` | opened, reopened | [`classify`] - add `classify` if untriaged |
//! | `issues` | labeled | [`classify`] - drop `classify` once triaged |
//! | `issues` | unlabeled | [`classify`] - restore `classify` if no status left |
//! | `issues` | closed | [`closed`] - remove status labels |
//! | `pull_request` | opened, reopened, synchronize, labeled, unlabeled | [`news`] - changelog gate |
//!
//! Each handler issues its GitHub calls independently; none relies on another
//! handler's side effects for the same delivery.

pub mod classify;
pub mod closed;
pub mod news;
pub mod ping;


use serde_json::json;
use tracing::debug;

use crate::github::{GitHubApi, GitHubApiError, expand_uri_template};
use crate::routing::Router;

/// Builds the router serving every feature.
pub fn router<G: GitHubApi>() -> Router<G> {
    Router::compose([
        ping::router(),
        classify::router(),
        closed::router(),
        news::router(),
    ])
}

/// Adds `names` to an issue. `labels_url` is the payload's URI template.
pub(crate) async fn add_labels<G: GitHubApi>(
    gh: &G,
    labels_url: &str,
    names: &[&str],
) -> Result<(), GitHubApiError> {
    let url = expand_uri_template(labels_url, &[]);
    gh.post(&url, &json!({ "labels": names })).await?;
    Ok(())
}

/// Removes one label from an issue.
///
/// A label that is already gone counts as removed: two deliveries racing to
/// remove the same label both succeed.
pub(crate) async fn remove_label<G: GitHubApi>(
    gh: &G,
    labels_url: &str,
    name: &str,
) -> Result<(), GitHubApiError> {
    let url = expand_uri_template(labels_url, &[("name", name)]);
    match gh.delete(&url).await {
        Err(e) if e.is_missing_label() => {
            debug!(label = name, "Label already removed");
            Ok(())
        }
        other => other,
    }
}
