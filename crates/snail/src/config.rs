//! CLI configuration -- thin wrapper around `snail_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--server, --session-cookie, etc.).

use std::time::Duration;

use secrecy::SecretString;

use snail_core::{RouteLayout, SessionConfig, TlsVerification};

use crate::cli::{GlobalOpts, Layout};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use snail_config::{
    Config, Defaults, Profile, config_path, load_config_or_default, save_config,
    store_session_cookie,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

impl From<Layout> for RouteLayout {
    fn from(layout: Layout) -> Self {
        match layout {
            Layout::Stream => Self::Stream,
            Layout::Streams => Self::Streams,
        }
    }
}

/// Build a `SessionConfig` from the config file, profile, and CLI overrides.
pub fn build_session_config(global: &GlobalOpts) -> Result<SessionConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    // If a profile exists, use it with CLI flag overrides
    if let Some(profile) = cfg.profiles.get(&profile_name) {
        return resolve_profile(profile, &profile_name, &cfg.defaults, global);
    }
    if global.profile.is_some() {
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: available_profiles(&cfg),
        });
    }

    // No profile found -- build from CLI flags / env vars alone
    let server = global.server.as_deref().ok_or_else(|| CliError::NoConfig {
        path: config_path().display().to_string(),
    })?;
    let profile = Profile {
        server: server.to_owned(),
        ..Profile::default()
    };
    resolve_profile(&profile, &profile_name, &cfg.defaults, global)
}

/// Translate a `Profile` + global flags into a `SessionConfig`.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    global: &GlobalOpts,
) -> Result<SessionConfig, CliError> {
    let mut config = if let Some(ref server) = global.server {
        let overridden = Profile {
            server: server.clone(),
            ..profile.clone()
        };
        snail_config::profile_to_session_config(&overridden, profile_name, defaults)?
    } else {
        snail_config::profile_to_session_config(profile, profile_name, defaults)?
    };

    if let Some(layout) = global.layout {
        config.layout = layout.into();
    }
    if let Some(ref cookie) = global.session_cookie {
        config.session_cookie = Some(SecretString::from(cookie.clone()));
    }
    if global.insecure {
        config.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(timeout) = global.timeout {
        config.timeout = Duration::from_secs(timeout);
    }
    Ok(config)
}

/// Comma-separated profile names for help text.
pub fn available_profiles(cfg: &Config) -> String {
    let mut names: Vec<_> = cfg.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}
