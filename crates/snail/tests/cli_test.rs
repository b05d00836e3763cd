//! Integration tests for the `snail` CLI binary.
//!
//! Argument parsing, help output, completions, config handling, and the
//! server-backed commands against a mock server.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `snail` binary with env isolation.
///
/// Clears all `SNAIL_*` env vars and points the config file at a
/// nonexistent path so tests never touch the user's real configuration.
fn snail_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("snail");
    cmd.env("HOME", "/tmp/snail-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/snail-cli-test-nonexistent")
        .env("SNAIL_CONFIG", "/tmp/snail-cli-test-nonexistent/config.toml")
        .env("NO_COLOR", "1")
        .env_remove("SNAIL_PROFILE")
        .env_remove("SNAIL_SERVER")
        .env_remove("SNAIL_LAYOUT")
        .env_remove("SNAIL_SESSION_COOKIE")
        .env_remove("SNAIL_OUTPUT")
        .env_remove("SNAIL_INSECURE")
        .env_remove("SNAIL_TIMEOUT")
        .env_remove("SNAIL_FFMPEG");
    cmd
}

/// [`snail_cmd`] reading its config from `config`.
fn snail_with_config(config: &Path) -> assert_cmd::Command {
    let mut cmd = snail_cmd();
    cmd.env("SNAIL_CONFIG", config);
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Run a blocking command off the async test runtime.
async fn run(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

async fn mock_streams(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/stream/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "name": "old", "started": 1_600_000_000, "stopped": 1_600_000_600 },
            { "name": "live-one", "started": 1_700_000_000, "stopped": null },
        ])))
        .mount(server)
        .await;
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = snail_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    snail_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("snail.video")
            .and(predicate::str::contains("streams"))
            .and(predicate::str::contains("watch"))
            .and(predicate::str::contains("snapshot")),
    );
}

#[test]
fn test_version_flag() {
    snail_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("snail"));
}

#[test]
fn test_completions_bash() {
    snail_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    snail_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = snail_cmd().arg("foobar").output().unwrap();
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("foobar"));
}

#[test]
fn test_streams_list_without_server() {
    snail_cmd()
        .args(["streams", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No server configured"));
}

#[test]
fn test_unknown_profile() {
    snail_cmd()
        .args(["--profile", "nope", "streams", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Profile 'nope' not found"));
}

#[test]
fn test_snapshot_requires_destination() {
    let output = snail_cmd()
        .args(["--server", "http://127.0.0.1:9", "snapshot", "foo"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_subscribe_from_file_conflicts_with_flags() {
    let output = snail_cmd()
        .args([
            "--server",
            "http://127.0.0.1:9",
            "notify",
            "subscribe",
            "--from-file",
            "sub.json",
            "--endpoint",
            "https://push.example/x",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honors_env() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("snail.toml");
    snail_with_config(&file)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("snail.toml"));
}

#[test]
fn test_config_set_then_show() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("config.toml");

    snail_with_config(&file)
        .args(["config", "set", "server", "https://snail.example"])
        .assert()
        .success();
    snail_with_config(&file)
        .args(["config", "set", "layout", "streams"])
        .assert()
        .success();

    snail_with_config(&file)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("[profiles.default]")
                .and(predicate::str::contains("server = \"https://snail.example\""))
                .and(predicate::str::contains("layout = \"streams\"")),
        );
}

#[test]
fn test_config_show_masks_cookie() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("config.toml");
    std::fs::write(
        &file,
        "default_profile = \"home\"\n\n[profiles.home]\nserver = \"https://snail.example\"\nsession_cookie = \"sid=hunter2\"\n",
    )
    .unwrap();

    snail_with_config(&file)
        .args(["config", "show", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("****").and(predicate::str::contains("hunter2").not()));
}

#[test]
fn test_config_set_rejects_unknown_key() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("config.toml");
    let output = snail_with_config(&file)
        .args(["config", "set", "colour", "blue"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("unknown config key"));
}

#[test]
fn test_config_use_unknown_profile() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("config.toml");
    snail_with_config(&file)
        .args(["config", "use", "lab"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Profile 'lab' not found"));
}

// ── Server-backed commands ──────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_streams_list_plain_is_newest_first() {
    let server = MockServer::start().await;
    mock_streams(&server).await;

    let mut cmd = snail_cmd();
    cmd.args(["--server", &server.uri(), "streams", "list", "-o", "plain"]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "live-one\nold");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_streams_list_live_filter() {
    let server = MockServer::start().await;
    mock_streams(&server).await;

    let mut cmd = snail_cmd();
    cmd.args(["--server", &server.uri(), "streams", "list", "--live", "-o", "json-compact"]);
    let output = run(cmd).await;
    assert!(output.status.success());
    let listed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["name"], "live-one");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_streams_list_failure_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/stream/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut cmd = snail_cmd();
    cmd.args(["--server", &server.uri(), "streams", "list", "-o", "json-compact"]);
    let output = run(cmd).await;
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "[]");
}

#[test]
fn test_preview_url_follows_layout() {
    snail_cmd()
        .args([
            "--server",
            "https://snail.example",
            "--layout",
            "streams",
            "streams",
            "preview-url",
            "foo",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "https://snail.example/api/streams/foo/snapshot",
        ));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_account_show_not_logged_in() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/account/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let mut cmd = snail_cmd();
    cmd.args(["--server", &server.uri(), "account", "show"]);
    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(3));
    assert!(combined_output(&output).contains("Not logged in"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_account_show_masks_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/account/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "name": "snail", "streamKey": "abcdef123456" })),
        )
        .mount(&server)
        .await;

    let mut cmd = snail_cmd();
    cmd.args(["--server", &server.uri(), "--session-cookie", "sid=1", "account", "show"]);
    let output = run(cmd).await;
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("****3456"));
    assert!(!stdout.contains("abcdef"));
}

#[test]
fn test_regenerate_key_requires_yes_when_not_interactive() {
    let output = snail_cmd()
        .args(["--server", "http://127.0.0.1:9", "account", "regenerate-key"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("--yes"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_regenerate_key_with_yes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/account/key"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/account/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "name": "snail", "streamKey": "new-key-9876" })),
        )
        .mount(&server)
        .await;

    let mut cmd = snail_cmd();
    cmd.args(["--server", &server.uri(), "-y", "account", "regenerate-key"]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(String::from_utf8_lossy(&output.stdout).contains("****9876"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_notify_key_is_base64url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/notification/key"))
        .respond_with(ResponseTemplate::new(200).set_body_string("AQID"))
        .mount(&server)
        .await;

    let mut cmd = snail_cmd();
    cmd.args(["--server", &server.uri(), "notify", "key", "-o", "plain"]);
    let output = run(cmd).await;
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "AQID");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_notify_subscribe_posts_subscription() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/notification/"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = snail_cmd();
    cmd.args([
        "--server",
        &server.uri(),
        "notify",
        "subscribe",
        "--endpoint",
        "https://push.example/abc",
        "--p256dh",
        "BNcR",
        "--auth",
        "tBHI",
    ]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
}

#[test]
fn test_notify_render() {
    snail_cmd()
        .args([
            "--server",
            "http://127.0.0.1:9",
            "notify",
            "render",
            r#"{"name":"foo","started":1700000000}"#,
        ])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("foo")
                .and(predicate::str::contains("started streaming"))
                .and(predicate::str::contains("2023-11-14T22:13:20")),
        );
}

#[test]
fn test_notify_render_rejects_bad_payload() {
    snail_cmd()
        .args(["--server", "http://127.0.0.1:9", "notify", "render", "{}"])
        .assert()
        .failure();
}

#[test]
fn test_snapshot_without_decoder_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let output = snail_cmd()
        .args([
            "--server",
            "http://127.0.0.1:9",
            "snapshot",
            "foo",
            "--ffmpeg",
            "/nonexistent/ffmpeg",
            "--out",
        ])
        .arg(dir.path().join("thumb.png"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("No frame could be decoded"));
    assert!(!dir.path().join("thumb.png").exists());
}
