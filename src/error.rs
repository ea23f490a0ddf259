//! Error types for the pass-request service.
//!
//! One taxonomy for the whole crate: upstream store failures, request
//! validation, missing records, the render-engine failure modes, and
//! cancellation of superseded work. Nothing in here retries; retry is a
//! caller action.

use std::time::Duration;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    /// The external store rejected or failed a query. Never carries a
    /// partial result.
    #[error("upstream store error: {message}")]
    Upstream {
        message: String,
        details: Option<String>,
    },

    /// Input rejected before any write.
    #[error("{0}")]
    Validation(String),

    /// The requested record(s) do not exist.
    #[error("{0}")]
    NotFound(String),

    /// The headless browser could not be launched.
    #[error("render engine launch failed: {0}")]
    RenderLaunch(String),

    /// Content did not settle within the allowed window.
    #[error("content load timed out after {0:?}")]
    RenderTimeout(Duration),

    /// The browser was up but printing failed.
    #[error("pdf render failed: {0}")]
    Render(String),

    /// The operation was superseded. Not a user-facing failure; callers
    /// discard it silently.
    #[error("operation cancelled")]
    Cancelled,

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn upstream(message: impl Into<String>) -> Self {
        Error::Upstream {
            message: message.into(),
            details: None,
        }
    }

    pub fn upstream_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Error::Upstream {
            message: message.into(),
            details: Some(details.into()),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Upstream {
            message: "request store transport error".to_string(),
            details: Some(err.to_string()),
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::Upstream {
            message: "roster store error".to_string(),
            details: Some(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Upstream {
            message: "malformed store response".to_string(),
            details: Some(err.to_string()),
        }
    }
}
