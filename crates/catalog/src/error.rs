use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog request timed out after {0:?}")]
    Timeout(Duration),

    #[error("catalog transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("catalog returned {status} for {path}: {body}")]
    Status {
        status: u16,
        path: String,
        body: String,
    },

    #[error("failed to decode catalog response: {0}")]
    Decode(String),

    #[error("invalid catalog url: {0}")]
    InvalidUrl(String),
}

impl CatalogError {
    /// Whether a retry has a reasonable chance of succeeding.  Only network
    /// level failures qualify; HTTP error statuses are final.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Transport(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            Self::Status { .. } | Self::Decode(_) | Self::InvalidUrl(_) => false,
        }
    }
}

impl From<url::ParseError> for CatalogError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}
