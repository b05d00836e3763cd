//! Command handlers, one module per top-level subcommand.

pub mod account;
pub mod config_cmd;
pub mod notify;
pub mod snapshot;
pub mod streams;
pub mod util;
pub mod watch;

use snail_core::Session;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Route a server-backed command to its handler.
pub async fn dispatch(cmd: Command, session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Streams(args) => streams::handle(session, args, global).await,
        Command::Watch(args) => watch::handle(session, args, global).await,
        Command::Snapshot(args) => snapshot::handle(session, args, global).await,
        Command::Account(args) => account::handle(session, args, global).await,
        Command::Notify(args) => notify::handle(session, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
