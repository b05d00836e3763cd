//! Shared configuration for the snail CLI.
//!
//! TOML profiles, session cookie resolution (env + keyring + plaintext),
//! and translation to `snail_core::SessionConfig`. The CLI adds
//! `GlobalOpts`-aware overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use snail_core::{ConnectionConfig, RouteLayout, SessionConfig, SnapshotBounds, TlsVerification};

/// Keyring service name for stored session cookies.
pub const KEYRING_SERVICE: &str = "snail";
/// Environment variable consulted for a session cookie when a profile names none.
pub const SESSION_COOKIE_ENV: &str = "SNAIL_SESSION_COOKIE";
/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "SNAIL_CONFIG";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("keyring error: {0}")]
    Keyring(String),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named server profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// The profile a command runs against: explicit name, then `default_profile`.
    pub fn profile(&self, name: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get_key_value(name)
            .map(|(k, p)| (k.as_str(), p))
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_reconnect_secs")]
    pub reconnect_secs: u32,

    #[serde(default = "default_autoplay_deadline_ms")]
    pub autoplay_deadline_ms: u64,

    #[serde(default = "default_snapshot_width")]
    pub snapshot_width: f64,

    #[serde(default = "default_snapshot_height")]
    pub snapshot_height: f64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
            reconnect_secs: default_reconnect_secs(),
            autoplay_deadline_ms: default_autoplay_deadline_ms(),
            snapshot_width: default_snapshot_width(),
            snapshot_height: default_snapshot_height(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_reconnect_secs() -> u32 {
    snail_core::config::DEFAULT_RECONNECT_SECS
}
fn default_autoplay_deadline_ms() -> u64 {
    500
}
fn default_snapshot_width() -> f64 {
    snail_core::config::DEFAULT_SNAPSHOT_BOUNDS.max_width
}
fn default_snapshot_height() -> f64 {
    snail_core::config::DEFAULT_SNAPSHOT_BOUNDS.max_height
}

/// A named server profile. Unset fields fall back to [`Defaults`].
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Server base URL (e.g., "https://snail.video").
    pub server: String,

    /// Route table generation: "stream" or "streams".
    #[serde(default)]
    pub layout: RouteLayout,

    /// Session cookie (plaintext -- prefer keyring or env var).
    pub session_cookie: Option<String>,

    /// Environment variable name containing the session cookie.
    pub session_cookie_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    pub insecure: Option<bool>,
    pub timeout: Option<u64>,
    pub reconnect_secs: Option<u32>,
    pub autoplay_deadline_ms: Option<u64>,
    pub snapshot_width: Option<f64>,
    pub snapshot_height: Option<f64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `SNAIL_CONFIG`, then platform conventions.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("video", "snail", "snail").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("snail");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the full Config from `path` + environment.
///
/// Environment keys nest with a double underscore:
/// `SNAIL_DEFAULTS__TIMEOUT=5`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("SNAIL_").ignore(&["config", "session_cookie"]).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file is missing or unreadable.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(&path, cfg)?;
    Ok(path)
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Session cookie ──────────────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/session-cookie"))
        .map_err(|e| ConfigError::Keyring(e.to_string()))
}

/// Resolve the session cookie from the credential chain (no CLI flag step).
///
/// Order: the profile's env var, `SNAIL_SESSION_COOKIE`, the system
/// keyring, plaintext in the profile. `None` means anonymous access.
pub fn resolve_session_cookie(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    // 1. Profile's session_cookie_env → env var lookup
    let env_names = profile.session_cookie_env.as_deref().into_iter().chain([SESSION_COOKIE_ENV]);
    for env_name in env_names {
        if let Ok(val) = std::env::var(env_name) {
            if !val.is_empty() {
                return Some(SecretString::from(val));
            }
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(secret) = entry.get_password() {
            return Some(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    profile
        .session_cookie
        .as_ref()
        .filter(|c| !c.is_empty())
        .map(|c| SecretString::from(c.clone()))
}

/// Store a session cookie in the system keyring for `profile_name`.
pub fn store_session_cookie(profile_name: &str, cookie: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?
        .set_password(cookie)
        .map_err(|e| ConfigError::Keyring(e.to_string()))
}

// ── Translation to core config ──────────────────────────────────────

/// Build a `SessionConfig` from a profile -- no CLI flag overrides.
pub fn profile_to_session_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<SessionConfig, ConfigError> {
    let url: url::Url = profile.server.parse().map_err(|_| ConfigError::Validation {
        field: "server".into(),
        reason: format!("invalid URL: {}", profile.server),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "server".into(),
            reason: format!("expected an http(s) URL, got {url}"),
        });
    }

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let snapshot = SnapshotBounds {
        max_width: profile.snapshot_width.unwrap_or(defaults.snapshot_width),
        max_height: profile.snapshot_height.unwrap_or(defaults.snapshot_height),
    };
    let valid = |v: f64| v.is_finite() && v > 0.0;
    if !valid(snapshot.max_width) || !valid(snapshot.max_height) {
        return Err(ConfigError::Validation {
            field: "snapshot_width/snapshot_height".into(),
            reason: "must be positive".into(),
        });
    }

    let connection = ConnectionConfig {
        reconnect_secs: profile.reconnect_secs.unwrap_or(defaults.reconnect_secs),
        autoplay_deadline: Duration::from_millis(
            profile.autoplay_deadline_ms.unwrap_or(defaults.autoplay_deadline_ms),
        ),
        ..ConnectionConfig::default()
    };

    Ok(SessionConfig {
        url,
        layout: profile.layout,
        session_cookie: resolve_session_cookie(profile, profile_name),
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        connection,
        snapshot,
    })
}
