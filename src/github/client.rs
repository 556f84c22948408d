//! Octocrab-backed implementation of [`GitHubApi`].

use futures::{Stream, StreamExt, TryStreamExt, stream};
use octocrab::{Octocrab, Page};
use serde_json::Value;

use super::api::GitHubApi;
use super::error::GitHubApiError;

/// A GitHub API client.
///
/// Unlike a repo-scoped client, this one follows whatever absolute URLs the
/// webhook payload supplies, so one instance serves every delivery.
#[derive(Clone)]
pub struct OctocrabClient {
    client: Octocrab,
}

impl OctocrabClient {
    pub fn new(client: Octocrab) -> Self {
        Self { client }
    }

    /// Creates a client authenticated with an OAuth or personal access token.
    pub fn from_token(token: impl Into<String>) -> Result<Self, octocrab::Error> {
        let client = Octocrab::builder().personal_token(token.into()).build()?;
        Ok(Self::new(client))
    }

    /// Returns a reference to the underlying octocrab client.
    pub fn inner(&self) -> &Octocrab {
        &self.client
    }
}

impl std::fmt::Debug for OctocrabClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OctocrabClient").finish_non_exhaustive()
    }
}

/// Position in a `Link: rel="next"` pagination chain.
enum PageCursor {
    First(String),
    Next(http::Uri),
    Done,
}

impl GitHubApi for OctocrabClient {
    fn get_paginated(
        &self,
        url: &str,
    ) -> impl Stream<Item = Result<Value, GitHubApiError>> + Send {
        stream::try_unfold(PageCursor::First(url.to_string()), move |cursor| async move {
            let page: Page<Value> = match cursor {
                PageCursor::First(url) => self
                    .client
                    .get(url, None::<&()>)
                    .await
                    .map_err(GitHubApiError::from_octocrab)?,
                PageCursor::Next(uri) => {
                    match self
                        .client
                        .get_page(&Some(uri))
                        .await
                        .map_err(GitHubApiError::from_octocrab)?
                    {
                        Some(page) => page,
                        None => return Ok(None),
                    }
                }
                PageCursor::Done => return Ok(None),
            };
            let next = page.next.clone().map_or(PageCursor::Done, PageCursor::Next);
            Ok(Some((page.items, next)))
        })
        .map_ok(|items| stream::iter(items.into_iter().map(Ok)))
        .try_flatten()
        .boxed()
    }

    async fn post(&self, url: &str, body: &Value) -> Result<Value, GitHubApiError> {
        self.client
            .post(url, Some(body))
            .await
            .map_err(GitHubApiError::from_octocrab)
    }

    async fn delete(&self, url: &str) -> Result<(), GitHubApiError> {
        self.client
            .delete::<Value, _, ()>(url, None)
            .await
            .map(|_| ())
            .map_err(GitHubApiError::from_octocrab)
    }

    async fn rate_limit_remaining(&self) -> Option<u64> {
        match self.client.ratelimit().get().await {
            Ok(limits) => Some(limits.resources.core.remaining as u64),
            Err(e) => {
                tracing::debug!(error = %e, "Could not read rate limit");
                None
            }
        }
    }
}
