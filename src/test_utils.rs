//! Shared test utilities: a recording GitHub fake and payload builders.

use std::collections::HashMap;
use std::sync::Mutex;

use futures::{Stream, StreamExt, stream};
use serde_json::{Value, json};

use crate::github::{GitHubApi, GitHubApiError};
use crate::webhooks::{DeliveryId, Event, EventKind};

pub const REPO_API: &str = "https://api.github.com/repos/octo/widgets";
pub const REPO_HTML: &str = "https://github.com/octo/widgets";

/// One request the fake received.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Get(String),
    Post(String, Value),
    Delete(String),
}

impl Call {
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Call::Get(_))
    }
}

#[derive(Default)]
struct Inner {
    calls: Vec<Call>,
    pages: HashMap<String, Vec<Vec<Value>>>,
    pages_served: HashMap<String, usize>,
    delete_failures: HashMap<String, (u16, String)>,
    post_failures: HashMap<String, (u16, String)>,
}

/// In-memory [`GitHubApi`] that records every call.
///
/// Paginated GETs answer from pages registered with [`FakeGitHub::with_pages`];
/// an unregistered URL lists nothing. Pages are handed out lazily so tests can
/// check how far a consumer read.
#[derive(Default)]
pub struct FakeGitHub {
    inner: Mutex<Inner>,
}

impl FakeGitHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pages(self, url: &str, pages: Vec<Vec<Value>>) -> Self {
        self.inner.lock().unwrap().pages.insert(url.to_string(), pages);
        self
    }

    /// Serves a single page of labels with the given names.
    pub fn with_labels(self, url: &str, names: &[&str]) -> Self {
        let page = names.iter().map(|name| json!({ "name": name })).collect();
        self.with_pages(url, vec![page])
    }

    pub fn failing_delete(self, url: &str, status: u16, message: &str) -> Self {
        self.inner
            .lock()
            .unwrap()
            .delete_failures
            .insert(url.to_string(), (status, message.to_string()));
        self
    }

    pub fn failing_post(self, url: &str, status: u16, message: &str) -> Self {
        self.inner
            .lock()
            .unwrap()
            .post_failures
            .insert(url.to_string(), (status, message.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    pub fn posts_to(&self, url: &str) -> Vec<Value> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Post(u, body) if u == url => Some(body),
                _ => None,
            })
            .collect()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Delete(url) => Some(url),
                _ => None,
            })
            .collect()
    }

    /// How many pages of `url` a consumer has pulled.
    pub fn pages_served(&self, url: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .pages_served
            .get(url)
            .copied()
            .unwrap_or(0)
    }

    fn record(&self, call: Call) {
        self.inner.lock().unwrap().calls.push(call);
    }
}

impl GitHubApi for FakeGitHub {
    fn get_paginated(
        &self,
        url: &str,
    ) -> impl Stream<Item = Result<Value, GitHubApiError>> + Send {
        self.record(Call::Get(url.to_string()));
        let url = url.to_string();
        let pages = self
            .inner
            .lock()
            .unwrap()
            .pages
            .get(&url)
            .cloned()
            .unwrap_or_default();

        stream::iter(pages)
            .map(move |page| {
                *self
                    .inner
                    .lock()
                    .unwrap()
                    .pages_served
                    .entry(url.clone())
                    .or_default() += 1;
                stream::iter(page.into_iter().map(Ok))
            })
            .flatten()
    }

    async fn post(&self, url: &str, body: &Value) -> Result<Value, GitHubApiError> {
        self.record(Call::Post(url.to_string(), body.clone()));
        let failure = self.inner.lock().unwrap().post_failures.get(url).cloned();
        match failure {
            Some((status, message)) => Err(GitHubApiError::status(status, message)),
            None => Ok(json!({})),
        }
    }

    async fn delete(&self, url: &str) -> Result<(), GitHubApiError> {
        self.record(Call::Delete(url.to_string()));
        let failure = self.inner.lock().unwrap().delete_failures.get(url).cloned();
        match failure {
            Some((status, message)) => Err(GitHubApiError::status(status, message)),
            None => Ok(()),
        }
    }

    async fn rate_limit_remaining(&self) -> Option<u64> {
        Some(4999)
    }
}

/// Label-list URI template for issue `number`.
pub fn labels_url(number: u64) -> String {
    format!("{REPO_API}/issues/{number}/labels{{/name}}")
}

fn label_objects(names: &[&str]) -> Value {
    Value::Array(names.iter().map(|name| json!({ "name": name })).collect())
}

/// Builds an `issues` event for issue `number`.
pub fn issue_event(
    action: &str,
    number: u64,
    state: &str,
    labels: &[&str],
    changed_label: Option<&str>,
) -> Event {
    let mut payload = json!({
        "action": action,
        "issue": {
            "number": number,
            "state": state,
            "labels": label_objects(labels),
            "labels_url": labels_url(number),
        },
        "repository": { "html_url": REPO_HTML },
    });
    if let Some(name) = changed_label {
        payload["label"] = json!({ "name": name });
    }
    Event::new(EventKind::Issues, payload, DeliveryId::new("test-delivery"))
}

pub fn pr_url(number: u64) -> String {
    format!("{REPO_API}/pulls/{number}")
}

pub fn pr_files_url(number: u64) -> String {
    format!("{}/files", pr_url(number))
}

pub fn pr_statuses_url(number: u64) -> String {
    format!("{REPO_API}/statuses/deadbeef{number}")
}

/// Builds a `pull_request` event for PR `number`.
pub fn pr_event(action: &str, number: u64, labels: &[&str], changed_label: Option<&str>) -> Event {
    let mut payload = json!({
        "action": action,
        "pull_request": {
            "number": number,
            "url": pr_url(number),
            "statuses_url": pr_statuses_url(number),
            "labels": label_objects(labels),
        },
        "repository": { "html_url": REPO_HTML },
    });
    if let Some(name) = changed_label {
        payload["label"] = json!({ "name": name });
    }
    Event::new(EventKind::PullRequest, payload, DeliveryId::new("test-delivery"))
}

/// A page of changed-file entries.
pub fn files(names: &[&str]) -> Vec<Value> {
    names.iter().map(|name| json!({ "filename": name })).collect()
}
