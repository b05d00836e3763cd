// Wire schemas for the streaming API.
//
// Every response is deserialized into one of these types and validated
// before it leaves the crate, so callers never see an ambient JSON shape.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::Error;

// ── Streams ──────────────────────────────────────────────────────────

/// One entry of `GET /api/stream/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEntry {
    pub name: String,
    /// Epoch seconds when the stream went live.
    pub started: i64,
    /// Epoch seconds when the stream ended; `None` while live.
    #[serde(default)]
    pub stopped: Option<i64>,
}

impl StreamEntry {
    pub fn validate(&self) -> Result<(), Error> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation {
                entity: "stream entry",
                reason: "empty stream name".into(),
            });
        }
        if self.started < 0 {
            return Err(Error::Validation {
                entity: "stream entry",
                reason: format!("negative start time {} for '{}'", self.started, self.name),
            });
        }
        if let Some(stopped) = self.stopped {
            if stopped < self.started {
                return Err(Error::Validation {
                    entity: "stream entry",
                    reason: format!(
                        "'{}' stopped ({stopped}) before it started ({})",
                        self.name, self.started
                    ),
                });
            }
        }
        Ok(())
    }

    pub fn is_live(&self) -> bool {
        self.stopped.is_none()
    }

    /// The timestamp a listing shows: stop time when offline, start time when live.
    pub fn last_change(&self) -> i64 {
        self.stopped.unwrap_or(self.started)
    }
}

/// Order streams newest-started first, the order listings display them in.
pub fn sort_newest_first(entries: &mut [StreamEntry]) {
    entries.sort_by(|a, b| b.started.cmp(&a.started));
}

// ── Account ──────────────────────────────────────────────────────────

/// Response of `GET /api/account/`.
#[derive(Debug, Deserialize)]
pub struct AccountInfo {
    pub name: String,
    #[serde(rename = "streamKey")]
    pub stream_key: SecretString,
}

impl AccountInfo {
    pub fn validate(&self) -> Result<(), Error> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation {
                entity: "account",
                reason: "empty account name".into(),
            });
        }
        Ok(())
    }
}

// ── Notifications ────────────────────────────────────────────────────

/// Body of a push message announcing that a stream went live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushPayload {
    pub name: String,
    pub started: i64,
}

impl PushPayload {
    pub const BODY: &'static str = "started streaming";

    pub fn from_json(raw: &str) -> Result<Self, Error> {
        let payload: Self = serde_json::from_str(raw).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: raw.to_owned(),
        })?;
        if payload.name.trim().is_empty() {
            return Err(Error::Validation {
                entity: "push payload",
                reason: "empty stream name".into(),
            });
        }
        Ok(payload)
    }

    /// Notification timestamp in epoch milliseconds.
    pub fn timestamp_ms(&self) -> i64 {
        self.started.saturating_mul(1000)
    }
}

/// Keys of a Web Push subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

/// Subscription registered through `POST /api/notification/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushSubscription {
    pub endpoint: String,
    #[serde(rename = "expirationTime", default)]
    pub expiration_time: Option<i64>,
    pub keys: SubscriptionKeys,
}

impl PushSubscription {
    pub fn validate(&self) -> Result<(), Error> {
        let endpoint = url::Url::parse(&self.endpoint)?;
        if endpoint.scheme() != "https" {
            return Err(Error::Validation {
                entity: "push subscription",
                reason: format!("endpoint must be https, got {}", endpoint.scheme()),
            });
        }
        if self.keys.p256dh.is_empty() || self.keys.auth.is_empty() {
            return Err(Error::Validation {
                entity: "push subscription",
                reason: "missing subscription keys".into(),
            });
        }
        Ok(())
    }
}
