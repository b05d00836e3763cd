// ── Runtime configuration ──
//
// These types describe how a viewing session behaves: which server to
// talk to, how reconnects are paced, and how large thumbnails are.
// They never touch disk; the CLI builds a `SessionConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use snail_api::RouteLayout;
use url::Url;

/// Default reconnect countdown, in ticks.
pub const DEFAULT_RECONNECT_SECS: u32 = 3;
/// Default autoplay probe deadline.
pub const DEFAULT_AUTOPLAY_DEADLINE: Duration = Duration::from_millis(500);
/// Default thumbnail bounds used by listings.
pub const DEFAULT_SNAPSHOT_BOUNDS: SnapshotBounds = SnapshotBounds {
    max_width: 180.0,
    max_height: 120.0,
};

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

/// Pacing of the connection controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Countdown length after a failure, in ticks. Retries are unbounded.
    pub reconnect_secs: u32,
    /// Duration of one countdown tick.
    pub tick_interval: Duration,
    /// How long the autoplay probe may stay unresolved before it counts as `Unknown`.
    pub autoplay_deadline: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            reconnect_secs: DEFAULT_RECONNECT_SECS,
            tick_interval: Duration::from_secs(1),
            autoplay_deadline: DEFAULT_AUTOPLAY_DEADLINE,
        }
    }
}

/// Bounding box a snapshot is scaled into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapshotBounds {
    pub max_width: f64,
    pub max_height: f64,
}

impl Default for SnapshotBounds {
    fn default() -> Self {
        DEFAULT_SNAPSHOT_BOUNDS
    }
}

/// Everything a [`Session`](crate::Session) needs.
///
/// Built by the CLI, passed to `Session::new` -- core never reads config files.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Server base URL (e.g., `https://snail.video`).
    pub url: Url,
    /// Route table generation the server speaks.
    pub layout: RouteLayout,
    /// Session cookie for account endpoints and the media WebSocket.
    pub session_cookie: Option<SecretString>,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
    pub connection: ConnectionConfig,
    pub snapshot: SnapshotBounds,
}

impl SessionConfig {
    /// A config with defaults for everything but the server URL.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            layout: RouteLayout::default(),
            session_cookie: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            connection: ConnectionConfig::default(),
            snapshot: SnapshotBounds::default(),
        }
    }
}
