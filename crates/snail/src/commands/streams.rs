//! Stream listing handlers.

use chrono::{DateTime, Utc};
use tabled::Tabled;

use snail_core::duration_fmt::duration_since;
use snail_core::{Session, StreamEntry};

use crate::cli::{GlobalOpts, StreamsArgs, StreamsCommand};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct StreamRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Started")]
    started: String,
    #[tabled(rename = "Ended")]
    ended: String,
}

impl StreamRow {
    fn new(s: &StreamEntry, now: DateTime<Utc>) -> Self {
        Self {
            name: s.name.clone(),
            status: output::live_badge(s.is_live(), false),
            started: duration_since(Some(s.started), now, true, true),
            ended: if s.is_live() {
                "-".into()
            } else {
                duration_since(s.stopped, now, true, true)
            },
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(session: &Session, args: StreamsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        StreamsCommand::List { live } => {
            let mut streams = session.streams().await;
            if live {
                streams.retain(StreamEntry::is_live);
            }
            let now = Utc::now();
            let out = output::render_list(
                &global.output,
                &streams,
                |s| StreamRow::new(s, now),
                |s| s.name.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        StreamsCommand::PreviewUrl { name } => {
            let url = session.preview_url(&name)?;
            output::print_output(url.as_str(), global.quiet);
            Ok(())
        }
    }
}
