//! Triage Bot - a GitHub bot that keeps issue triage labels tidy and gates
//! pull requests on changelog (news) entries.
//!
//! Deliveries arrive over HTTP ([`server`]) or from a GitHub Actions run
//! ([`action`]), are parsed and verified into an [`webhooks::Event`], and are
//! dispatched through a [`routing::Router`] to the feature handlers in
//! [`handlers`]. All GitHub access goes through [`github::GitHubApi`].

pub mod action;
pub mod config;
pub mod delivery;
pub mod github;
pub mod handlers;
pub mod labels;
pub mod routing;
pub mod server;
pub mod webhooks;

#[cfg(test)]
pub(crate) mod test_utils;
