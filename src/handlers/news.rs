//! Changelog gate for pull requests.
//!
//! A PR passes when it adds a news entry at
//! `news/<section number> <section name>/<issue number>[-<nonce>].md`, or
//! when it carries the `skip news` label. The verdict is posted as a commit
//! status under a fixed context, so each post supersedes the previous one.
//!
//! | Action | Behavior |
//! |--------|----------|
//! | `opened` / `reopened` / `synchronize` | pending, then success (skip label or entry found) or failure |
//! | `labeled` with `skip news` | success, no file scan |
//! | `unlabeled` with `skip news` | re-scan files, success or failure |

use std::pin::pin;
use std::sync::LazyLock;

use futures::TryStreamExt;
use futures::future::BoxFuture;
use regex::Regex;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::github::GitHubApi;
use crate::labels::Skip;
use crate::routing::{Handler, HandlerError, Router};
use crate::webhooks::{Action, Event, EventKind, PullRequestView};

/// Commit status context. Reposting under the same context replaces the
/// previous state on GitHub.
pub const STATUS_CONTEXT: &str = "triage-bot/news";

pub const PENDING_DESCRIPTION: &str = "Looking for a news entry file";
pub const FOUND_DESCRIPTION: &str = "news entry file found";
pub const MISSING_DESCRIPTION: &str = "no news entry file found";
pub const SKIPPED_DESCRIPTION: &str = "'skip news' label found";

const SKIP_NEWS: &str = Skip::News.as_str();

static NEWS_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^news/\d+ [^/]+/\d+(-[^/\s]+)?\.md$").expect("news path pattern is valid")
});

/// Returns true if `path` is a correctly placed news entry.
pub fn is_news_entry(path: &str) -> bool {
    NEWS_PATH.is_match(path)
}

/// State of a commit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusState {
    Pending,
    Success,
    Failure,
    Error,
}

/// Body of `POST /repos/{owner}/{repo}/statuses/{sha}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitStatus {
    pub state: StatusState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,
    pub description: String,
    pub context: String,
}

pub fn router<G: GitHubApi>() -> Router<G> {
    let mut router = Router::new();
    for action in [Action::Opened, Action::Reopened, Action::Synchronize] {
        router.register(EventKind::PullRequest, Some(action), CheckForNews);
    }
    router
        .register(EventKind::PullRequest, Some(Action::Labeled), SkipLabelAdded)
        .register(EventKind::PullRequest, Some(Action::Unlabeled), SkipLabelRemoved);
    router
}

#[derive(Debug, Clone, Copy)]
pub struct CheckForNews;

impl<G: GitHubApi> Handler<G> for CheckForNews {
    fn name(&self) -> &'static str {
        "check_for_news"
    }

    fn handle<'a>(&'a self, event: &'a Event, gh: &'a G) -> BoxFuture<'a, Result<(), HandlerError>> {
        Box::pin(check_for_news(event, gh))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SkipLabelAdded;

impl<G: GitHubApi> Handler<G> for SkipLabelAdded {
    fn name(&self) -> &'static str {
        "skip_news_label_added"
    }

    fn handle<'a>(&'a self, event: &'a Event, gh: &'a G) -> BoxFuture<'a, Result<(), HandlerError>> {
        Box::pin(skip_label_added(event, gh))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SkipLabelRemoved;

impl<G: GitHubApi> Handler<G> for SkipLabelRemoved {
    fn name(&self) -> &'static str {
        "skip_news_label_removed"
    }

    fn handle<'a>(&'a self, event: &'a Event, gh: &'a G) -> BoxFuture<'a, Result<(), HandlerError>> {
        Box::pin(skip_label_removed(event, gh))
    }
}

/// Full check for a new or updated PR.
pub async fn check_for_news<G: GitHubApi>(event: &Event, gh: &G) -> Result<(), HandlerError> {
    let pr = event.pull_request()?;
    let target_url = news_docs_url(event);

    post_status(gh, &pr, target_url.clone(), StatusState::Pending, PENDING_DESCRIPTION).await?;
    if pr.has_label(SKIP_NEWS) {
        post_status(gh, &pr, target_url, StatusState::Success, SKIPPED_DESCRIPTION).await?;
        return Ok(());
    }
    check_for_news_file(gh, &pr, target_url).await
}

/// Passes the PR straight away when `skip news` is added.
pub async fn skip_label_added<G: GitHubApi>(event: &Event, gh: &G) -> Result<(), HandlerError> {
    if event.changed_label()?.name != SKIP_NEWS {
        return Ok(());
    }
    let pr = event.pull_request()?;
    info!(pr = pr.number, "'skip news' added");
    post_status(gh, &pr, news_docs_url(event), StatusState::Success, SKIPPED_DESCRIPTION).await?;
    Ok(())
}

/// Re-checks the files when `skip news` is taken off.
pub async fn skip_label_removed<G: GitHubApi>(event: &Event, gh: &G) -> Result<(), HandlerError> {
    if event.changed_label()?.name != SKIP_NEWS {
        return Ok(());
    }
    let pr = event.pull_request()?;
    info!(pr = pr.number, "'skip news' removed, re-checking files");
    check_for_news_file(gh, &pr, news_docs_url(event)).await
}

/// Scans the PR's files and posts success on the first news entry, or
/// failure once every page has been read.
async fn check_for_news_file<G: GitHubApi>(
    gh: &G,
    pr: &PullRequestView,
    target_url: Option<String>,
) -> Result<(), HandlerError> {
    let files_url = pr.files_url();
    let mut files = pin!(gh.get_paginated(&files_url));
    while let Some(file) = files.try_next().await? {
        let Some(path) = file.get("filename").and_then(Value::as_str) else {
            continue;
        };
        if is_news_entry(path) {
            debug!(pr = pr.number, path, "News entry found");
            post_status(gh, pr, target_url, StatusState::Success, FOUND_DESCRIPTION).await?;
            return Ok(());
        }
    }

    debug!(pr = pr.number, "No news entry found");
    post_status(gh, pr, target_url, StatusState::Failure, MISSING_DESCRIPTION).await?;
    Ok(())
}

async fn post_status<G: GitHubApi>(
    gh: &G,
    pr: &PullRequestView,
    target_url: Option<String>,
    state: StatusState,
    description: &str,
) -> Result<(), HandlerError> {
    let status = CommitStatus {
        state,
        target_url,
        description: description.to_string(),
        context: STATUS_CONTEXT.to_string(),
    };
    debug!(pr = pr.number, state = ?status.state, "Posting news status");
    gh.post(&pr.statuses_url, &json!(status)).await?;
    Ok(())
}

/// Link shown next to the status: the repository's `news/` directory.
fn news_docs_url(event: &Event) -> Option<String> {
    event
        .payload()
        .pointer("/repository/html_url")
        .and_then(Value::as_str)
        .map(|url| format!("{url}/tree/HEAD/news"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn accepts_news_entries() {
        assert!(is_news_entry("news/42 Bug Fixes/42.md"));
        assert!(is_news_entry("news/1 Enhancements/1234.md"));
        assert!(is_news_entry("news/3 Code Health/987-a1b2c3.md"));
    }

    #[test]
    fn rejects_other_paths() {
        assert!(!is_news_entry("README"));
        assert!(!is_news_entry("news/42.md"));
        assert!(!is_news_entry("news/Bug Fixes/42.md"));
        assert!(!is_news_entry("news/42 Bug Fixes/notes.md"));
        assert!(!is_news_entry("news/42 Bug Fixes/42.txt"));
        assert!(!is_news_entry("news/42 Bug Fixes/nested/42.md"));
        assert!(!is_news_entry("src/news/42 Bug Fixes/42.md"));
        assert!(!is_news_entry("news/42 Bug Fixes/42-a/b.md"));
    }

    #[test]
    fn status_body_matches_github_schema() {
        let status = CommitStatus {
            state: StatusState::Error,
            target_url: Some("https://github.com/o/r/tree/HEAD/news".to_string()),
            description: "some description".to_string(),
            context: STATUS_CONTEXT.to_string(),
        };
        assert_eq!(
            serde_json::to_value(&status).unwrap(),
            serde_json::json!({
                "state": "error",
                "target_url": "https://github.com/o/r/tree/HEAD/news",
                "description": "some description",
                "context": "triage-bot/news",
            })
        );
    }

    #[test]
    fn status_body_omits_missing_target_url() {
        let status = CommitStatus {
            state: StatusState::Pending,
            target_url: None,
            description: PENDING_DESCRIPTION.to_string(),
            context: STATUS_CONTEXT.to_string(),
        };
        let body = serde_json::to_value(&status).unwrap();
        assert!(body.get("target_url").is_none());
        assert_eq!(body["state"], "pending");
    }

    proptest! {
        #[test]
        fn prop_well_formed_entries_match(
            section in 0u32..100,
            name in "[A-Za-z][A-Za-z ]{0,15}",
            issue in 1u32..100_000,
            nonce in proptest::option::of("[a-z0-9]{1,8}"),
        ) {
            let suffix = nonce.map(|n| format!("-{n}")).unwrap_or_default();
            let path = format!("news/{section} {name}/{issue}{suffix}.md");
            prop_assert!(is_news_entry(&path));
        }

        #[test]
        fn prop_extra_directories_never_match(
            section in 0u32..100,
            dir in "[a-z]{1,8}",
            issue in 1u32..100_000,
        ) {
            let path = format!("news/{section} Fixes/{dir}/{issue}.md");
            prop_assert!(!is_news_entry(&path));
        }
    }
}
