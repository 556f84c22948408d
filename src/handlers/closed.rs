//! Strips workflow-stage labels from closed issues.

use futures::future::{BoxFuture, join_all};
use tracing::{info, warn};

use super::remove_label;
use crate::github::GitHubApi;
use crate::labels;
use crate::routing::{Handler, HandlerError, Router};
use crate::webhooks::{Action, Event, EventKind};

pub fn router<G: GitHubApi>() -> Router<G> {
    let mut router = Router::new();
    router.register(EventKind::Issues, Some(Action::Closed), RemoveStatusLabels);
    router
}

#[derive(Debug, Clone, Copy)]
pub struct RemoveStatusLabels;

impl<G: GitHubApi> Handler<G> for RemoveStatusLabels {
    fn name(&self) -> &'static str {
        "remove_status_labels"
    }

    fn handle<'a>(&'a self, event: &'a Event, gh: &'a G) -> BoxFuture<'a, Result<(), HandlerError>> {
        Box::pin(remove_status_labels(event, gh))
    }
}

/// Removes every status label on the closed issue's snapshot.
///
/// Each removal is its own call. All are attempted even if some fail; the
/// first failure is returned afterwards.
pub async fn remove_status_labels<G: GitHubApi>(
    event: &Event,
    gh: &G,
) -> Result<(), HandlerError> {
    let issue = event.issue()?;
    let status_labels: Vec<&str> = issue
        .label_names()
        .filter(|name| labels::is_status_label(name))
        .collect();
    if status_labels.is_empty() {
        return Ok(());
    }

    info!(issue = issue.number, labels = ?status_labels, "Removing status labels from closed issue");
    let results = join_all(
        status_labels
            .iter()
            .map(|name| remove_label(gh, &issue.labels_url, name)),
    )
    .await;

    let mut first_error = None;
    for (name, result) in status_labels.iter().zip(results) {
        if let Err(error) = result {
            warn!(issue = issue.number, label = name, error = %error, "Failed to remove status label");
            first_error.get_or_insert(error);
        }
    }
    match first_error {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}
