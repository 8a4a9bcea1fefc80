//! Error types for the event reporter

use thiserror::Error;

/// Errors surfaced by the callback transport.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("invalid callback url: {0}")]
    InvalidUrl(String),

    #[error("http request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("callback rejected with status {status}: {body}")]
    Rejected { status: reqwest::StatusCode, body: String },
}

impl SendError {
    pub fn invalid_url(msg: impl Into<String>) -> Self {
        Self::InvalidUrl(msg.into())
    }

    pub fn rejected(status: reqwest::StatusCode, body: impl Into<String>) -> Self {
        Self::Rejected { status, body: body.into() }
    }
}
