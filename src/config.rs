//! Command-line and environment configuration.
//!
//! # Environment Variables
//!
//! - `GH_AUTH` - OAuth token the bot acts as (required)
//! - `GH_SECRET` - webhook secret; when unset, deliveries must be unsigned
//! - `BIND_ADDR` - listen address for `serve` (default `0.0.0.0:3000`)
//! - `CONSISTENCY_DELAY_MS` - pause before dispatching a delivery (default 1000)
//! - `GITHUB_EVENT_NAME`, `GITHUB_EVENT_PATH`, `INPUT_REPO-TOKEN` - set by
//!   the Actions runner for `action`

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no GitHub token given (set GH_AUTH or INPUT_REPO-TOKEN, or pass it as an argument)")]
    MissingToken,

    #[error("GitHub token is empty")]
    EmptyToken,

    #[error("webhook secret is set but empty")]
    EmptySecret,
}

/// GitHub bot that keeps issue triage labels tidy and gates PRs on news entries.
#[derive(Debug, Parser)]
#[command(name = "triage-bot")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the webhook server
    Serve(ServeArgs),

    /// Handle the single event of a GitHub Actions run
    Action(ActionArgs),
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// GitHub OAuth token (or set `GH_AUTH`)
    #[arg(long, env = "GH_AUTH", hide_env_values = true)]
    pub token: String,

    /// Webhook secret (or set `GH_SECRET`)
    #[arg(long, env = "GH_SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    /// Address to listen on
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Milliseconds to wait before dispatching each delivery
    #[arg(long, env = "CONSISTENCY_DELAY_MS", default_value_t = 1000)]
    pub consistency_delay_ms: u64,
}

#[derive(Debug, Args)]
pub struct ActionArgs {
    /// GitHub token (or set `INPUT_REPO-TOKEN`)
    #[arg(env = "INPUT_REPO-TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Fallback token source
    #[arg(long = "gh-auth", env = "GH_AUTH", hide_env_values = true, hide = true)]
    pub gh_auth: Option<String>,

    /// Event type being handled
    #[arg(long, env = "GITHUB_EVENT_NAME")]
    pub event_name: String,

    /// Path of the JSON file holding the event payload
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    pub event_path: PathBuf,
}

/// Settings for the webhook server.
#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub secret: Option<String>,
    pub bind_addr: SocketAddr,
    pub consistency_delay: Duration,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token.trim().is_empty() {
            return Err(ConfigError::EmptyToken);
        }
        if self.secret.as_deref().is_some_and(str::is_empty) {
            return Err(ConfigError::EmptySecret);
        }
        Ok(())
    }

    pub fn secret_bytes(&self) -> Option<&[u8]> {
        self.secret.as_deref().map(str::as_bytes)
    }
}

impl TryFrom<ServeArgs> for Config {
    type Error = ConfigError;

    fn try_from(args: ServeArgs) -> Result<Self, Self::Error> {
        let config = Config {
            token: args.token,
            secret: args.secret,
            bind_addr: args.bind,
            consistency_delay: Duration::from_millis(args.consistency_delay_ms),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Settings for a one-shot Actions run.
#[derive(Debug, Clone)]
pub struct ActionConfig {
    pub token: String,
    pub event_name: String,
    pub event_path: PathBuf,
}

impl TryFrom<ActionArgs> for ActionConfig {
    type Error = ConfigError;

    fn try_from(args: ActionArgs) -> Result<Self, Self::Error> {
        let token = args
            .token
            .filter(|t| !t.is_empty())
            .or(args.gh_auth)
            .ok_or(ConfigError::MissingToken)?;
        if token.trim().is_empty() {
            return Err(ConfigError::EmptyToken);
        }
        Ok(ActionConfig {
            token,
            event_name: args.event_name,
            event_path: args.event_path,
        })
    }
}
