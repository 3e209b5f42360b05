use thiserror::Error;

use crate::gatekeeper::WorkerState;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Connection refused, DNS failure or timeout.
    #[error("Network unreachable: {0}")]
    Unreachable(String),

    /// The network was unreachable and nothing was cached for the request.
    #[error("Offline and no cached copy of {0}")]
    NotCached(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Cache storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache entry is corrupt: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to precache {url}: {reason}")]
    Precache { url: String, reason: String },

    #[error("Cannot {action} while {from:?}")]
    InvalidTransition {
        from: WorkerState,
        action: &'static str,
    },
}

/// A specialized `Result` type for homelab-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl Error {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: u16, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status {
            404 | 410 => Error::NotFound(truncated),
            500..=599 => Error::ServerError(truncated),
            _ => Error::UnexpectedStatus {
                status,
                body: truncated,
            },
        }
    }

    /// True when the failure came from the transport rather than the server.
    pub fn is_offline(&self) -> bool {
        matches!(
            self,
            Error::Network(_) | Error::Unreachable(_) | Error::NotCached(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_maps_codes() {
        assert!(matches!(Error::from_status(404, "gone"), Error::NotFound(_)));
        assert!(matches!(Error::from_status(503, "busy"), Error::ServerError(_)));
        assert!(matches!(
            Error::from_status(418, "teapot"),
            Error::UnexpectedStatus { status: 418, .. }
        ));
    }

    #[test]
    fn test_truncate_body() {
        let body = "x".repeat(MAX_ERROR_BODY_LENGTH + 20);
        let truncated = Error::truncate_body(&body);
        assert!(truncated.starts_with(&"x".repeat(MAX_ERROR_BODY_LENGTH)));
        assert!(truncated.ends_with("(truncated, 520 total bytes)"));

        assert_eq!(Error::truncate_body("short"), "short");
    }

    #[test]
    fn test_is_offline() {
        assert!(Error::NotCached("http://hub/services.json".into()).is_offline());
        assert!(Error::Unreachable("connection refused".into()).is_offline());
        assert!(!Error::NotFound("nope".into()).is_offline());
    }
}
