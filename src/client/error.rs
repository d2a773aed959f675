use thiserror::Error;

/// Statuses the transport layer retries before giving up.
pub const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

const MAX_BODY_CHARS: usize = 2_000;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP {status} from {path}: {body}")]
    Http {
        status: u16,
        path: String,
        body: String,
    },

    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid JSON from {path}: {reason}")]
    Decode { path: String, reason: String },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("credential cannot be sent as a header: {0}")]
    InvalidCredential(String),

    #[error("HTTP client setup failed: {0}")]
    Setup(#[from] reqwest::Error),
}

impl ClientError {
    pub(crate) fn http(status: u16, path: &str, body: &[u8]) -> Self {
        let text = String::from_utf8_lossy(body);
        let body = if text.chars().count() > MAX_BODY_CHARS {
            let head: String = text.chars().take(MAX_BODY_CHARS).collect();
            format!("{head}... (truncated)")
        } else {
            text.into_owned()
        };
        Self::Http {
            status,
            path: path.to_string(),
            body,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Transient failures: rate limiting, gateway errors and dropped connections.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status, .. } => RETRYABLE_STATUSES.contains(status),
            Self::Transport { source, .. } => source.is_connect() || source.is_timeout(),
            _ => false,
        }
    }

    /// The session cookie or CSRF token was rejected.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_statuses_are_transient() {
        for status in RETRYABLE_STATUSES {
            assert!(ClientError::http(status, "/x", b"").is_retryable());
        }
        assert!(!ClientError::http(400, "/x", b"").is_retryable());
        assert!(!ClientError::http(404, "/x", b"").is_retryable());
    }

    #[test]
    fn auth_failures_detected_from_status() {
        assert!(ClientError::http(401, "/x", b"").is_auth_failure());
        assert!(ClientError::http(403, "/x", b"").is_auth_failure());
        assert!(!ClientError::http(500, "/x", b"").is_auth_failure());
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(5_000);
        let err = ClientError::http(500, "/x", body.as_bytes());
        let ClientError::Http { body, .. } = err else {
            panic!("expected Http variant");
        };
        assert!(body.ends_with("... (truncated)"));
        assert!(body.len() < 2_100);
    }

    #[test]
    fn display_includes_status_and_path() {
        let err = ClientError::http(503, "/api/v1/logs-analytics/list", b"busy");
        assert_eq!(
            err.to_string(),
            "HTTP 503 from /api/v1/logs-analytics/list: busy"
        );
    }
}
