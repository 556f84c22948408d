//! GitHub API error type.
//!
//! Every failed call carries the HTTP status (when there was a response) and
//! GitHub's error message. Handlers inspect both to tell a benign race apart
//! from a real failure: deleting a label that another delivery already
//! removed answers `404 Label does not exist`, which callers treat as done.

use std::fmt;
use thiserror::Error;

/// The message GitHub returns when deleting a label the issue doesn't carry.
const MISSING_LABEL_MESSAGE: &str = "Label does not exist";

/// A failed GitHub API call.
#[derive(Debug, Error)]
pub struct GitHubApiError {
    /// The HTTP status code, if a response was received.
    pub status_code: Option<u16>,

    /// GitHub's error message, or a description of the transport failure.
    pub message: String,

    /// The underlying octocrab error, if available.
    #[source]
    pub source: Option<octocrab::Error>,
}

impl fmt::Display for GitHubApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "GitHub API error (HTTP {}): {}", code, self.message),
            None => write!(f, "GitHub API error: {}", self.message),
        }
    }
}

impl GitHubApiError {
    /// Creates an error for a non-2xx response.
    pub fn status(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code: Some(status_code),
            message: message.into(),
            source: None,
        }
    }

    /// Converts an octocrab error, keeping GitHub's status and message when
    /// the failure came from an API response.
    pub fn from_octocrab(err: octocrab::Error) -> Self {
        let (status_code, message) = match &err {
            octocrab::Error::GitHub { source, .. } => {
                (Some(source.status_code.as_u16()), source.message.clone())
            }
            other => (None, other.to_string()),
        };
        Self {
            status_code,
            message,
            source: Some(err),
        }
    }

    /// True for 4xx responses.
    pub fn is_client_error(&self) -> bool {
        matches!(self.status_code, Some(code) if (400..500).contains(&code))
    }

    /// True when a label delete failed only because the label is already gone.
    pub fn is_missing_label(&self) -> bool {
        self.is_client_error() && self.message.contains(MISSING_LABEL_MESSAGE)
    }
}
