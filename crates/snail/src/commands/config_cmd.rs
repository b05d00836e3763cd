//! Config subcommand handlers.

use std::collections::HashMap;
use std::str::FromStr;

use clap::ValueEnum;
use dialoguer::{Input, Select};

use snail_core::{MAX_SNAPSHOT_EDGE, RouteLayout};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, Layout};
use crate::config::{self, Config, Defaults, Profile};
use crate::error::CliError;
use crate::output;

const VALID_KEYS: &str = "server, layout, session_cookie_env, ca_cert, insecure, timeout, \
                          reconnect_secs, autoplay_deadline_ms, snapshot_width, snapshot_height";

// ── Helpers ─────────────────────────────────────────────────────────

fn layout_name(layout: RouteLayout) -> &'static str {
    match layout {
        RouteLayout::Stream => "stream",
        RouteLayout::Streams => "streams",
    }
}

/// Format config for display, masking sensitive fields.
fn format_config_redacted(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let d = &cfg.defaults;
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", d.output);
    let _ = writeln!(out, "color = \"{}\"", d.color);
    let _ = writeln!(out, "insecure = {}", d.insecure);
    let _ = writeln!(out, "timeout = {}", d.timeout);
    let _ = writeln!(out, "reconnect_secs = {}", d.reconnect_secs);
    let _ = writeln!(out, "autoplay_deadline_ms = {}", d.autoplay_deadline_ms);
    let _ = writeln!(out, "snapshot_width = {}", d.snapshot_width);
    let _ = writeln!(out, "snapshot_height = {}", d.snapshot_height);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "server = \"{}\"", p.server);
        let _ = writeln!(out, "layout = \"{}\"", layout_name(p.layout));
        if p.session_cookie.is_some() {
            let _ = writeln!(out, "session_cookie = \"****\"");
        }
        if let Some(ref env) = p.session_cookie_env {
            let _ = writeln!(out, "session_cookie_env = \"{env}\"");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(secs) = p.reconnect_secs {
            let _ = writeln!(out, "reconnect_secs = {secs}");
        }
        if let Some(ms) = p.autoplay_deadline_ms {
            let _ = writeln!(out, "autoplay_deadline_ms = {ms}");
        }
        if let Some(w) = p.snapshot_width {
            let _ = writeln!(out, "snapshot_width = {w}");
        }
        if let Some(h) = p.snapshot_height {
            let _ = writeln!(out, "snapshot_height = {h}");
        }
    }

    out
}

/// Mask stored cookies before the config is serialized for display.
fn redact(cfg: &mut Config) {
    for profile in cfg.profiles.values_mut() {
        if profile.session_cookie.is_some() {
            profile.session_cookie = Some("****".into());
        }
    }
}

fn save_config(cfg: &Config) -> Result<(), CliError> {
    config::save_config(cfg)?;
    Ok(())
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str, expected: &str) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: key.into(),
        reason: format!("must be {expected}"),
    })
}

fn parse_dimension(key: &str, value: &str) -> Result<f64, CliError> {
    let v: f64 = parse_value(key, value, "a positive number")?;
    if !v.is_finite() || v <= 0.0 {
        return Err(CliError::Validation {
            field: key.into(),
            reason: "must be a positive number".into(),
        });
    }
    if v > MAX_SNAPSHOT_EDGE {
        return Err(CliError::Validation {
            field: key.into(),
            reason: format!("must be at most {MAX_SNAPSHOT_EDGE}"),
        });
    }
    Ok(v)
}

/// Apply `key = value` to a profile.
fn apply_setting(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    match key {
        "server" => {
            url::Url::parse(&value).map_err(|e| CliError::Validation {
                field: "server".into(),
                reason: format!("invalid URL: {e}"),
            })?;
            profile.server = value;
        }
        "layout" => {
            let layout = <Layout as ValueEnum>::from_str(&value, true).map_err(|_| CliError::Validation {
                field: "layout".into(),
                reason: "must be 'stream' or 'streams'".into(),
            })?;
            profile.layout = layout.into();
        }
        "session_cookie_env" | "session-cookie-env" => profile.session_cookie_env = Some(value),
        "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
        "insecure" => profile.insecure = Some(parse_value(key, &value, "'true' or 'false'")?),
        "timeout" => profile.timeout = Some(parse_value(key, &value, "a number (seconds)")?),
        "reconnect_secs" | "reconnect-secs" => {
            let secs: u32 = parse_value(key, &value, "a number (seconds)")?;
            if secs == 0 {
                return Err(CliError::Validation {
                    field: key.into(),
                    reason: "must be at least 1".into(),
                });
            }
            profile.reconnect_secs = Some(secs);
        }
        "autoplay_deadline_ms" | "autoplay-deadline-ms" => {
            profile.autoplay_deadline_ms = Some(parse_value(key, &value, "a number (milliseconds)")?);
        }
        "snapshot_width" | "snapshot-width" => profile.snapshot_width = Some(parse_dimension(key, &value)?),
        "snapshot_height" | "snapshot-height" => profile.snapshot_height = Some(parse_dimension(key, &value)?),
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!("unknown config key '{other}'. Valid keys: {VALID_KEYS}"),
            });
        }
    }
    Ok(())
}

/// Offer to store the cookie in the system keyring or return it for plaintext config.
///
/// Returns `Some(cookie)` if the user chose plaintext, `None` if stored in keyring.
fn prompt_cookie_storage(cookie: &str, profile_name: &str) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt("Where to store the session cookie?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        config::store_session_cookie(profile_name, cookie)?;
        eprintln!("   ✓ Session cookie stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(cookie.to_owned()))
    }
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("✨ snail -- configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let server: String = Input::new()
                .with_prompt("Server URL")
                .default("https://snail.video".into())
                .interact_text()
                .map_err(prompt_err)?;

            let layout_choices = &[
                "/api/stream/{name}/preview",
                "/api/streams/{name}/snapshot",
            ];
            let layout = match Select::new()
                .with_prompt("Route layout")
                .items(layout_choices)
                .default(0)
                .interact()
                .map_err(prompt_err)?
            {
                0 => RouteLayout::Stream,
                _ => RouteLayout::Streams,
            };

            eprintln!("\n   A session cookie is only needed for account and key commands.");
            let cookie = rpassword::prompt_password("Session cookie (name=value, empty to skip): ")
                .map_err(prompt_err)?;
            let session_cookie = if cookie.is_empty() {
                None
            } else {
                prompt_cookie_storage(&cookie, &profile_name)?
            };

            let mut profile = Profile {
                layout,
                session_cookie,
                ..Profile::default()
            };
            apply_setting(&mut profile, "server", server)?;

            let mut profiles = HashMap::new();
            profiles.insert(profile_name.clone(), profile);

            let cfg = Config {
                default_profile: Some(profile_name.clone()),
                defaults: Defaults::default(),
                profiles,
            };
            save_config(&cfg)?;

            eprintln!("\n✓ Configuration written to {}", config_path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Test it: snail streams list");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let mut cfg = config::load_config_or_default();
            redact(&mut cfg);
            let out = output::render_single(&global.output, &cfg, format_config_redacted, |_| {
                "config".into()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();
            apply_setting(profile, &key, value)?;

            save_config(&cfg)?;
            if !global.quiet {
                eprintln!("✓ Set {key} on profile '{profile_name}'");
            }
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: snail config init");
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }

            cfg.default_profile = Some(name.clone());
            save_config(&cfg)?;
            if !global.quiet {
                eprintln!("✓ Default profile set to '{name}'");
            }
            Ok(())
        }

        // ── SetCookie ───────────────────────────────────────────────
        ConfigCommand::SetCookie => {
            let cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            if !cfg.profiles.contains_key(&profile_name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name: profile_name,
                });
            }

            let cookie = rpassword::prompt_password("Session cookie (name=value): ").map_err(prompt_err)?;
            if cookie.is_empty() {
                return Err(CliError::Validation {
                    field: "session_cookie".into(),
                    reason: "value cannot be empty".into(),
                });
            }
            config::store_session_cookie(&profile_name, &cookie)?;
            eprintln!("✓ Session cookie stored in system keyring for profile '{profile_name}'");
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }
    }
}
