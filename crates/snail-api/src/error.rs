use thiserror::Error;

/// Top-level error type for the `snail-api` crate.
///
/// Covers every failure mode across the HTTP API and the live media
/// transport. `snail-core` maps these into domain-facing errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The server rejected the session (no cookie, expired, or revoked).
    #[error("Not authenticated: {message}")]
    Unauthenticated { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── API ─────────────────────────────────────────────────────────
    /// Non-success HTTP status from an API endpoint.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── WebSocket ───────────────────────────────────────────────────
    /// WebSocket connection failed.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    /// WebSocket closed unexpectedly.
    #[error("WebSocket closed (code {code}): {reason}")]
    WebSocketClosed { code: u16, reason: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// A response parsed but violates the documented schema.
    #[error("Invalid {entity}: {reason}")]
    Validation { entity: &'static str, reason: String },
}

impl Error {
    /// Returns `true` if the server refused the current session.
    pub fn is_auth_expired(&self) -> bool {
        match self {
            Self::Unauthenticated { .. } => true,
            Self::Api { status, .. } => *status == 401 || *status == 403,
            _ => false,
        }
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } | Self::WebSocketConnect(_) | Self::WebSocketClosed { .. } => {
                true
            }
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthenticated_statuses_count_as_expired() {
        let err = Error::Api {
            status: 403,
            message: "forbidden".into(),
        };
        assert!(err.is_auth_expired());
        assert!(!err.is_transient());
        assert!(
            Error::Unauthenticated {
                message: "no cookie".into()
            }
            .is_auth_expired()
        );
    }

    #[test]
    fn server_errors_are_transient() {
        let err = Error::Api {
            status: 502,
            message: "bad gateway".into(),
        };
        assert!(err.is_transient());
        assert!(Error::WebSocketConnect("refused".into()).is_transient());
        assert!(
            !Error::Validation {
                entity: "stream entry",
                reason: "empty name".into()
            }
            .is_transient()
        );
    }

    #[test]
    fn not_found_detection() {
        let err = Error::Api {
            status: 404,
            message: String::new(),
        };
        assert!(err.is_not_found());
        assert!(!Error::Tls("bad cert".into()).is_not_found());
    }
}
