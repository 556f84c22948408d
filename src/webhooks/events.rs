//! The parsed representation of one webhook delivery.
//!
//! An [`Event`] holds the event type (from the `X-GitHub-Event` header), the
//! action (from the payload's `action` field), the delivery ID, and the raw
//! payload tree. Handlers read the fields they need through typed views such as
//! [`IssueView`] and [`PullRequestView`] rather than indexing JSON by hand.
//!
//! The payload is a snapshot taken when GitHub sent the webhook. It may already
//! be stale by the time a handler runs.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// The `X-GitHub-Event` value of a delivery.
///
/// Only the event types the bot routes on get their own variant. Anything else
/// is kept verbatim in `Other` so it can be logged; nothing registers for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    Issues,
    PullRequest,
    Ping,
    Other(String),
}

impl EventKind {
    pub fn parse(name: &str) -> Self {
        match name {
            "issues" => EventKind::Issues,
            "pull_request" => EventKind::PullRequest,
            "ping" => EventKind::Ping,
            other => EventKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Issues => "issues",
            EventKind::PullRequest => "pull_request",
            EventKind::Ping => "ping",
            EventKind::Other(name) => name,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The payload's `action` field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    Opened,
    Reopened,
    Closed,
    Labeled,
    Unlabeled,
    Synchronize,
    Other(String),
}

impl Action {
    pub fn parse(name: &str) -> Self {
        match name {
            "opened" => Action::Opened,
            "reopened" => Action::Reopened,
            "closed" => Action::Closed,
            "labeled" => Action::Labeled,
            "unlabeled" => Action::Unlabeled,
            "synchronize" => Action::Synchronize,
            other => Action::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Action::Opened => "opened",
            Action::Reopened => "reopened",
            Action::Closed => "closed",
            Action::Labeled => "labeled",
            Action::Unlabeled => "unlabeled",
            Action::Synchronize => "synchronize",
            Action::Other(name) => name,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A GitHub webhook delivery ID (`X-GitHub-Delivery`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeliveryId(pub String);

impl DeliveryId {
    pub fn new(s: impl Into<String>) -> Self {
        DeliveryId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeliveryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for DeliveryId {
    fn from(s: String) -> Self {
        DeliveryId(s)
    }
}

/// A known field path is missing from the payload or has the wrong shape.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("payload has no `{0}` field")]
    Missing(&'static str),

    #[error("payload field `{field}` is malformed: {source}")]
    Malformed {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// One webhook delivery. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct Event {
    kind: EventKind,
    action: Option<Action>,
    delivery_id: DeliveryId,
    payload: Value,
}

impl Event {
    /// Builds an event from an already-decoded payload.
    ///
    /// The action is taken from the payload's top-level `action` string, if
    /// there is one.
    pub fn new(kind: EventKind, payload: Value, delivery_id: DeliveryId) -> Self {
        let action = payload
            .get("action")
            .and_then(Value::as_str)
            .map(Action::parse);
        Event {
            kind,
            action,
            delivery_id,
            payload,
        }
    }

    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    pub fn action(&self) -> Option<&Action> {
        self.action.as_ref()
    }

    pub fn delivery_id(&self) -> &DeliveryId {
        &self.delivery_id
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// The `issue` object of an `issues` event.
    pub fn issue(&self) -> Result<IssueView, PayloadError> {
        self.field("issue")
    }

    /// The `pull_request` object of a `pull_request` event.
    pub fn pull_request(&self) -> Result<PullRequestView, PayloadError> {
        self.field("pull_request")
    }

    /// The single label added or removed by a `labeled`/`unlabeled` action.
    pub fn changed_label(&self) -> Result<LabelRef, PayloadError> {
        self.field("label")
    }

    fn field<'a, T: Deserialize<'a>>(&'a self, field: &'static str) -> Result<T, PayloadError> {
        let value = self
            .payload
            .get(field)
            .ok_or(PayloadError::Missing(field))?;
        T::deserialize(value).map_err(|source| PayloadError::Malformed { field, source })
    }
}

/// Open/closed state of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueState {
    Open,
    Closed,
}

/// A label as it appears inside webhook payloads and label listings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LabelRef {
    pub name: String,
}

/// The fields of an issue snapshot the handlers care about.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueView {
    pub number: u64,
    pub state: IssueState,
    #[serde(default)]
    pub labels: Vec<LabelRef>,
    /// URI template of the form `.../issues/{number}/labels{/name}`.
    pub labels_url: String,
}

impl IssueView {
    pub fn is_open(&self) -> bool {
        self.state == IssueState::Open
    }

    pub fn label_names(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(|l| l.name.as_str())
    }

    pub fn has_label(&self, name: &str) -> bool {
        self.label_names().any(|l| l == name)
    }
}

/// The fields of a pull request snapshot the handlers care about.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestView {
    pub number: u64,
    /// API URL of the pull request; `{url}/files` lists changed files.
    pub url: String,
    /// Commit-status URL for the head commit.
    pub statuses_url: String,
    #[serde(default)]
    pub labels: Vec<LabelRef>,
}

impl PullRequestView {
    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|l| l.name == name)
    }

    pub fn files_url(&self) -> String {
        format!("{}/files", self.url)
    }
}
