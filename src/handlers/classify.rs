//! Keeps the `classify` label in step with an issue's triage state.
//!
//! | Action | Behavior |
//! |--------|----------|
//! | `opened` / `reopened` | Add `classify` unless a status, classification, or team label is present. Checked against the snapshot, then against a live listing. |
//! | `labeled` | If `classify` is present and the new label is a status or team label, remove `classify`. |
//! | `unlabeled` | If no team label and no status label remain, add `classify` back. |
//!
//! Closed issues are left alone here; [`super::closed`] strips their status
//! labels. Every invocation makes at most one mutating call.

use std::pin::pin;

use futures::TryStreamExt;
use futures::future::BoxFuture;
use serde_json::Value;
use tracing::{debug, info};

use super::{add_labels, remove_label};
use crate::github::{GitHubApi, expand_uri_template};
use crate::labels::{self, Status};
use crate::routing::{Handler, HandlerError, Router};
use crate::webhooks::{Action, Event, EventKind, IssueView};

const CLASSIFY: &str = Status::Classify.as_str();

pub fn router<G: GitHubApi>() -> Router<G> {
    let mut router = Router::new();
    router
        .register(EventKind::Issues, Some(Action::Opened), ClassifyNewIssue)
        .register(EventKind::Issues, Some(Action::Reopened), ClassifyNewIssue)
        .register(EventKind::Issues, Some(Action::Labeled), LabelAdded)
        .register(EventKind::Issues, Some(Action::Unlabeled), LabelRemoved);
    router
}

#[derive(Debug, Clone, Copy)]
pub struct ClassifyNewIssue;

impl<G: GitHubApi> Handler<G> for ClassifyNewIssue {
    fn name(&self) -> &'static str {
        "classify_new_issue"
    }

    fn handle<'a>(&'a self, event: &'a Event, gh: &'a G) -> BoxFuture<'a, Result<(), HandlerError>> {
        Box::pin(classify_new_issue(event, gh))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LabelAdded;

impl<G: GitHubApi> Handler<G> for LabelAdded {
    fn name(&self) -> &'static str {
        "classify_label_added"
    }

    fn handle<'a>(&'a self, event: &'a Event, gh: &'a G) -> BoxFuture<'a, Result<(), HandlerError>> {
        Box::pin(label_added(event, gh))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LabelRemoved;

impl<G: GitHubApi> Handler<G> for LabelRemoved {
    fn name(&self) -> &'static str {
        "classify_label_removed"
    }

    fn handle<'a>(&'a self, event: &'a Event, gh: &'a G) -> BoxFuture<'a, Result<(), HandlerError>> {
        Box::pin(label_removed(event, gh))
    }
}

/// Adds `classify` to a newly opened or reopened issue that nobody triaged.
///
/// The webhook snapshot can lag a label a teammate applied right after
/// opening the issue, so an untriaged snapshot is confirmed against the
/// issue's current labels before writing.
pub async fn classify_new_issue<G: GitHubApi>(event: &Event, gh: &G) -> Result<(), HandlerError> {
    let issue = event.issue()?;
    if issue.label_names().any(labels::implies_triaged) {
        debug!(issue = issue.number, "Issue pre-classified by its author");
        return Ok(());
    }

    let labels_url = expand_uri_template(&issue.labels_url, &[]);
    let mut current = pin!(gh.get_paginated(&labels_url));
    while let Some(label) = current.try_next().await? {
        let name = label.get("name").and_then(Value::as_str);
        if name.is_some_and(labels::implies_triaged) {
            debug!(
                issue = issue.number,
                label = name,
                "Issue triaged since the webhook fired"
            );
            return Ok(());
        }
    }

    add_classify_label(gh, &issue).await
}

/// Drops `classify` once a real status or team label lands on an open issue.
pub async fn label_added<G: GitHubApi>(event: &Event, gh: &G) -> Result<(), HandlerError> {
    let issue = event.issue()?;
    let added = event.changed_label()?;

    if !issue.is_open() || added.name == CLASSIFY || !issue.has_label(CLASSIFY) {
        return Ok(());
    }
    if !removes_classify(&added.name) {
        return Ok(());
    }

    info!(issue = issue.number, label = %added.name, "Removing 'classify'");
    remove_label(gh, &issue.labels_url, CLASSIFY).await?;
    Ok(())
}

/// Puts `classify` back when the last status label is removed from an open
/// issue that no team owns.
pub async fn label_removed<G: GitHubApi>(event: &Event, gh: &G) -> Result<(), HandlerError> {
    let issue = event.issue()?;
    if !issue.is_open() || issue.label_names().any(labels::is_team_label) {
        return Ok(());
    }
    if issue.label_names().any(labels::is_status_label) {
        return Ok(());
    }

    add_classify_label(gh, &issue).await
}

async fn add_classify_label<G: GitHubApi>(gh: &G, issue: &IssueView) -> Result<(), HandlerError> {
    info!(issue = issue.number, "Adding 'classify'");
    add_labels(gh, &issue.labels_url, &[CLASSIFY]).await?;
    Ok(())
}

/// Whether a newly added label means triage is done.
fn removes_classify(name: &str) -> bool {
    labels::is_status_label(name) || labels::is_team_label(name)
}
