//! GitHub REST access.
//!
//! - [`GitHubApi`]: the capability handlers use (paginated GET, POST, DELETE)
//! - [`OctocrabClient`]: the production implementation over octocrab
//! - [`GitHubApiError`]: failed calls, with status and message preserved
//! - [`expand_uri_template`]: expansion of `{/name}`-style payload URLs

mod api;
mod client;
mod error;

pub use api::{GitHubApi, expand_uri_template};
pub use client::OctocrabClient;
pub use error::GitHubApiError;
