//! Clap derive structures for the `snail` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// snail -- watch and manage snail.video live streams
#[derive(Debug, Parser)]
#[command(
    name = "snail",
    version,
    about = "Watch and manage snail.video live streams from the command line",
    long_about = "A command-line client for snail.video servers.\n\n\
        Lists streams, records live media with automatic reconnects,\n\
        renders preview thumbnails, and manages your stream key.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Server profile to use
    #[arg(long, short = 'p', env = "SNAIL_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Server URL (overrides profile)
    #[arg(long, short = 's', env = "SNAIL_SERVER", global = true)]
    pub server: Option<String>,

    /// Route layout the server speaks (overrides profile)
    #[arg(long, env = "SNAIL_LAYOUT", global = true)]
    pub layout: Option<Layout>,

    /// Session cookie (`name=value`) for account endpoints
    #[arg(long, env = "SNAIL_SESSION_COOKIE", global = true, hide_env = true)]
    pub session_cookie: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "SNAIL_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "SNAIL_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "SNAIL_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Layout {
    /// `/api/stream/{name}/preview`
    Stream,
    /// `/api/streams/{name}/snapshot`
    Streams,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List streams and their preview resources
    #[command(alias = "ls")]
    Streams(StreamsArgs),

    /// Attach to a live stream and record its media, reconnecting on failure
    Watch(WatchArgs),

    /// Render a thumbnail from a stream's preview
    #[command(alias = "snap")]
    Snapshot(SnapshotArgs),

    /// Show the logged-in account and manage the stream key
    Account(AccountArgs),

    /// Push notification setup
    Notify(NotifyArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  STREAMS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct StreamsArgs {
    #[command(subcommand)]
    pub command: StreamsCommand,
}

#[derive(Debug, Subcommand)]
pub enum StreamsCommand {
    /// List streams, most recently started first
    #[command(alias = "ls")]
    List {
        /// Only show streams that are live
        #[arg(long)]
        live: bool,
    },

    /// Print the preview resource URL of a stream
    PreviewUrl {
        /// Stream name
        name: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Stream name
    pub name: String,

    /// Write media to this file ("-" for stdout)
    #[arg(long, default_value = "-")]
    pub out: PathBuf,

    /// Stop after this many seconds (default: until Ctrl-C)
    #[arg(long)]
    pub duration: Option<u64>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SNAPSHOT
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SnapshotArgs {
    /// Stream name
    pub name: String,

    /// Bounding box width (overrides profile)
    #[arg(long)]
    pub width: Option<f64>,

    /// Bounding box height (overrides profile)
    #[arg(long)]
    pub height: Option<f64>,

    /// Write the PNG to this file
    #[arg(long, required_unless_present = "data_url")]
    pub out: Option<PathBuf>,

    /// Print a `data:image/png;base64,...` URL instead of writing a file
    #[arg(long)]
    pub data_url: bool,

    /// ffmpeg binary used to decode the preview
    #[arg(long, env = "SNAIL_FFMPEG", default_value = "ffmpeg")]
    pub ffmpeg: PathBuf,

    /// Seconds to wait for the decoder
    #[arg(long, default_value = "15")]
    pub decode_timeout: u64,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ACCOUNT
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct AccountArgs {
    #[command(subcommand)]
    pub command: AccountCommand,
}

#[derive(Debug, Subcommand)]
pub enum AccountCommand {
    /// Show the logged-in account
    Show {
        /// Print the stream key instead of masking it
        #[arg(long)]
        reveal_key: bool,
    },

    /// Issue a new stream key, invalidating the current one
    RegenerateKey,

    /// Follow the login flow with the configured session
    Login,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  NOTIFY
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct NotifyArgs {
    #[command(subcommand)]
    pub command: NotifyCommand,
}

#[derive(Debug, Subcommand)]
pub enum NotifyCommand {
    /// Print the server's push public key (base64url)
    Key,

    /// Register a push subscription
    Subscribe {
        /// Push service endpoint URL
        #[arg(long, required_unless_present = "from_file")]
        endpoint: Option<String>,

        /// Client public key (base64url)
        #[arg(long, required_unless_present = "from_file")]
        p256dh: Option<String>,

        /// Client auth secret (base64url)
        #[arg(long, required_unless_present = "from_file")]
        auth: Option<String>,

        /// Read the subscription JSON from a file
        #[arg(long, conflicts_with_all = ["endpoint", "p256dh", "auth"])]
        from_file: Option<PathBuf>,
    },

    /// Show how a push payload is displayed
    Render {
        /// Payload JSON, e.g. '{"name":"foo","started":1700000000}'
        payload: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG / COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current configuration
    Show,

    /// Set a profile value
    Set {
        /// Profile key (e.g., "server", "layout", "timeout")
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store a session cookie for the active profile in the system keyring
    SetCookie,

    /// Print the config file path
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
