use reqwest::{Method, StatusCode};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure kinds of a provisioning run.
///
/// Rejected credentials are not an error: verification calls report them as
/// `false` so the caller can rotate and retry.
#[derive(Debug, Error)]
pub enum Error {
    /// Network or connection failure, including request timeouts.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// CouchDB answered a write with a non-success status.
    #[error("{method} {url} - {status}, {reason}")]
    Status {
        method: Method,
        url: String,
        status: StatusCode,
        reason: String,
    },

    #[error("no CouchDB credentials stored in {0}")]
    MissingCredentials(String),

    #[error("invalid input: {0}")]
    Input(String),

    #[error("prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("CouchDB credentials still rejected after {0} attempts")]
    RetriesExhausted(u32),

    #[error("credential store error: {0}")]
    Store(String),

    #[error("invalid CouchDB URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("unsupported CouchDB URL {0}: expected an absolute http(s) URL")]
    UnsupportedUrl(String),

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Status code of a rejected write, if that is what failed.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Store(e.to_string())
    }
}
