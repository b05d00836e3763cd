//! Live viewing: attach to a stream and record its media until stopped.

use std::io::IsTerminal;
use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use snail_core::{ConnectionEvent, MediaHandle, PlaybackRefused, Session};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::error::CliError;
use crate::output;

const MEDIA_BUFFER: usize = 64;
const WRITER_DRAIN: Duration = Duration::from_secs(5);

// ── Media sink ──────────────────────────────────────────────────────

/// Stand-in for a player element. Writing media into a terminal counts as
/// refused autoplay, so the view carries on without output.
struct SinkPlayer {
    refuse: bool,
}

impl MediaHandle for SinkPlayer {
    async fn play_muted(&self) -> Result<(), PlaybackRefused> {
        if self.refuse {
            Err(PlaybackRefused("stdout is a terminal".into()))
        } else {
            Ok(())
        }
    }

    fn pause(&self) {}
}

type Sink = Option<Box<dyn AsyncWrite + Unpin + Send>>;

async fn open_sink(out: &Path, to_terminal: bool) -> Result<Sink, CliError> {
    if out == Path::new("-") {
        if to_terminal {
            return Ok(None);
        }
        return Ok(Some(Box::new(tokio::io::stdout())));
    }
    let file = tokio::fs::File::create(out).await?;
    Ok(Some(Box::new(file)))
}

/// Drain media chunks into `sink` until every sender is gone.
fn spawn_writer(mut rx: mpsc::Receiver<Bytes>, mut sink: Sink) -> JoinHandle<std::io::Result<u64>> {
    tokio::spawn(async move {
        let mut written = 0u64;
        while let Some(chunk) = rx.recv().await {
            if let Some(ref mut w) = sink {
                w.write_all(&chunk).await?;
            }
            written += u64::try_from(chunk.len()).unwrap_or(u64::MAX);
        }
        if let Some(ref mut w) = sink {
            w.flush().await?;
        }
        Ok(written)
    })
}

// ── Progress ────────────────────────────────────────────────────────

fn spinner(global: &GlobalOpts) -> ProgressBar {
    if global.quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {prefix} {msg}") {
        bar.set_style(style);
    }
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

fn describe(event: &ConnectionEvent, color: bool) -> String {
    match event {
        ConnectionEvent::ConnectStart { .. } => "Connecting...".into(),
        ConnectionEvent::ConnectionSuccess { .. } => output::live_badge(true, color),
        ConnectionEvent::ConnectionFail { reason, .. } => {
            format!("{} ({reason})", output::live_badge(false, color))
        }
        ConnectionEvent::Countdown { remaining, .. } => format!("Reconnecting in {remaining}s"),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(session: &Session, args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let to_terminal = args.out == Path::new("-") && std::io::stdout().is_terminal();
    let sink = open_sink(&args.out, to_terminal).await?;

    let (tx, rx) = mpsc::channel(MEDIA_BUFFER);
    let writer = spawn_writer(rx, sink);

    let transport = session.media_transport(tx)?;
    let player = SinkPlayer { refuse: to_terminal };
    let (controller, mut events) = session.watch(&args.name, transport, player)?;

    let color = output::should_color(&global.color);
    let bar = spinner(global);
    bar.set_prefix(args.name.clone());

    let stop = async {
        match args.duration {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    };
    tokio::pin!(stop);

    loop {
        tokio::select! {
            biased;
            () = &mut stop => break,
            event = events.recv() => match event {
                Ok(event) => {
                    tracing::debug!(?event, "connection event");
                    bar.set_message(describe(&event, color));
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "event receiver lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    if let Some(verdict) = controller.autoplay() {
        tracing::info!(%verdict, "autoplay");
    }
    controller.detach();
    drop(controller);
    bar.finish_and_clear();

    let written = match tokio::time::timeout(WRITER_DRAIN, writer).await {
        Ok(Ok(result)) => result?,
        Ok(Err(e)) => return Err(CliError::Io(std::io::Error::other(e))),
        Err(_) => {
            tracing::warn!("media writer did not drain in time");
            0
        }
    };

    if !global.quiet {
        if to_terminal {
            eprintln!("Watched '{}' (media discarded: stdout is a terminal, use --out)", args.name);
        } else {
            eprintln!("Watched '{}': {written} bytes written", args.name);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use snail_core::{CloseReason, FailReason};

    use super::*;

    #[test]
    fn events_describe_progress() {
        assert_eq!(describe(&ConnectionEvent::ConnectStart { cycle: 1 }, false), "Connecting...");
        assert_eq!(describe(&ConnectionEvent::ConnectionSuccess { cycle: 1 }, false), "LIVE");
        assert_eq!(
            describe(&ConnectionEvent::Countdown { cycle: 1, remaining: 2 }, false),
            "Reconnecting in 2s"
        );
        let fail = ConnectionEvent::ConnectionFail {
            cycle: 1,
            reason: FailReason::Closed(CloseReason::Ended),
        };
        assert_eq!(describe(&fail, false), "OFFLINE (connection lost: stream ended)");
    }

    #[tokio::test]
    async fn writer_counts_and_writes_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.webm");
        let sink = open_sink(&path, false).await.unwrap();

        let (tx, rx) = mpsc::channel(4);
        let writer = spawn_writer(rx, sink);
        tx.send(Bytes::from_static(b"abc")).await.unwrap();
        tx.send(Bytes::from_static(b"de")).await.unwrap();
        drop(tx);

        assert_eq!(writer.await.unwrap().unwrap(), 5);
        assert_eq!(std::fs::read(&path).unwrap(), b"abcde");
    }

    #[tokio::test]
    async fn terminal_player_refuses_autoplay() {
        assert!(SinkPlayer { refuse: true }.play_muted().await.is_err());
        assert!(SinkPlayer { refuse: false }.play_muted().await.is_ok());
    }
}
