// ── Core error types ──
//
// User-facing errors from snail-core. These are NOT API-specific --
// consumers never see HTTP status codes or JSON parse failures directly.
// The `From<snail_api::Error>` impl translates transport-layer errors
// into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Not logged in: {message}")]
    NotLoggedIn { message: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Stream not found: {name}")]
    StreamNotFound { name: String },

    #[error("Invalid stream target: {reason}")]
    InvalidTarget { reason: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<snail_api::Error> for CoreError {
    fn from(err: snail_api::Error) -> Self {
        match err {
            snail_api::Error::Unauthenticated { message } => CoreError::NotLoggedIn { message },
            snail_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e.url().map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            snail_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            snail_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            snail_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            snail_api::Error::Api { status, message } if status == 401 || status == 403 => {
                CoreError::NotLoggedIn { message }
            }
            snail_api::Error::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            snail_api::Error::WebSocketConnect(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason,
            },
            snail_api::Error::WebSocketClosed { code, reason } => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("closed with code {code}: {reason}"),
            },
            snail_api::Error::Deserialization { message, body: _ } => CoreError::Api {
                message: format!("unexpected response: {message}"),
                status: None,
            },
            snail_api::Error::Validation { entity, reason } => CoreError::ValidationFailed {
                message: format!("{entity}: {reason}"),
            },
        }
    }
}
