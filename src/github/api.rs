//! The GitHub REST capability handlers are written against.
//!
//! Handlers never talk to octocrab directly. They receive something
//! implementing [`GitHubApi`], which makes them testable with a recording fake
//! and keeps the URLs they hit exactly the ones GitHub put in the payload.

use std::future::Future;

use futures::Stream;
use serde_json::Value;

use super::error::GitHubApiError;

/// Raw REST access used by the event handlers.
///
/// All URLs are absolute API URLs taken from webhook payloads (after any
/// URI-template expansion, see [`expand_uri_template`]).
pub trait GitHubApi: Send + Sync {
    /// Lists every item behind a paginated endpoint.
    ///
    /// The stream is lazy: a page is only requested once the consumer has
    /// drained the previous one, so dropping the stream early stops fetching.
    fn get_paginated(
        &self,
        url: &str,
    ) -> impl Stream<Item = Result<Value, GitHubApiError>> + Send;

    /// `POST`s a JSON body and returns the decoded response.
    fn post(
        &self,
        url: &str,
        body: &Value,
    ) -> impl Future<Output = Result<Value, GitHubApiError>> + Send;

    /// `DELETE`s a resource.
    fn delete(&self, url: &str) -> impl Future<Output = Result<(), GitHubApiError>> + Send;

    /// Remaining REST quota, if the client can tell.
    fn rate_limit_remaining(&self) -> impl Future<Output = Option<u64>> + Send;
}

/// Expands a GitHub URI template such as `.../labels{/name}`.
///
/// Supports the two forms GitHub puts in payloads:
///
/// - `{/var}` becomes `/value`, or disappears when `var` is not given
/// - `{var}` becomes `value`, or disappears when `var` is not given
///
/// Query forms (`{?a,b}`) are dropped. Values are percent-encoded, so label
/// names containing spaces are safe to pass.
///
/// # Examples
///
/// ```
/// use triage_bot::github::expand_uri_template;
///
/// let template = "https://api.github.com/repos/o/r/issues/1/labels{/name}";
/// assert_eq!(
///     expand_uri_template(template, &[]),
///     "https://api.github.com/repos/o/r/issues/1/labels"
/// );
/// assert_eq!(
///     expand_uri_template(template, &[("name", "needs spec")]),
///     "https://api.github.com/repos/o/r/issues/1/labels/needs%20spec"
/// );
/// ```
pub fn expand_uri_template(template: &str, vars: &[(&str, &str)]) -> String {
    let lookup = |name: &str| {
        vars.iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| urlencoding::encode(value).into_owned())
    };

    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let Some(close) = rest[open..].find('}') else {
            // Unterminated expression; keep it literally.
            out.push_str(&rest[open..]);
            return out;
        };
        let expr = &rest[open + 1..open + close];
        match expr.strip_prefix('/') {
            Some(name) => {
                if let Some(value) = lookup(name) {
                    out.push('/');
                    out.push_str(&value);
                }
            }
            None if expr.starts_with('?') || expr.starts_with('&') => {}
            None => {
                if let Some(value) = lookup(expr) {
                    out.push_str(&value);
                }
            }
        }
        rest = &rest[open + close + 1..];
    }
    out.push_str(rest);
    out
}
