//! Arrival feed error types.

use std::fmt;

/// Errors from the arrival feed client.
#[derive(Debug)]
pub enum FeedError {
    /// HTTP request failed (network error, timeout, etc.)
    Http(reqwest::Error),

    /// JSON deserialization failed
    Json {
        message: String,
        body: Option<String>,
    },

    /// HTTP status was not a success
    Status { status: u16, message: String },

    /// The feed answered with a non-zero result code
    Api { code: String, message: String },

    /// Invalid or missing service key
    Unauthorized,

    /// Request could not be built from the given parameters
    InvalidRequest(String),
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedError::Http(e) => write!(f, "HTTP error: {e}"),
            FeedError::Json { message, body } => {
                write!(f, "JSON parse error: {message}")?;
                if let Some(body) = body {
                    write!(f, " (body: {body})")?;
                }
                Ok(())
            }
            FeedError::Status { status, message } => write!(f, "HTTP status {status}: {message}"),
            FeedError::Api { code, message } => write!(f, "feed error {code}: {message}"),
            FeedError::Unauthorized => write!(f, "unauthorized (invalid service key)"),
            FeedError::InvalidRequest(msg) => write!(f, "invalid request: {msg}"),
        }
    }
}

impl std::error::Error for FeedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FeedError::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        FeedError::Http(err)
    }
}
