//! Best-effort check of whether media may start without a user gesture.

use std::future::Future;
use std::time::Duration;

use strum::Display;
use thiserror::Error;
use tracing::{debug, info, warn};

/// The playback environment refused to start media.
#[derive(Debug, Clone, Error)]
#[error("playback refused: {0}")]
pub struct PlaybackRefused(pub String);

/// A media element the probe can start and stop.
pub trait MediaHandle: Send + Sync + 'static {
    /// Start muted playback. `Err` means unattended playback is not allowed.
    fn play_muted(&self) -> impl Future<Output = Result<(), PlaybackRefused>> + Send;

    fn pause(&self);
}

/// Result of an autoplay probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum AutoplayVerdict {
    Allowed,
    Denied,
    /// The probe did not settle before its deadline.
    Unknown,
}

impl AutoplayVerdict {
    /// Unsettled probes are treated as allowed.
    pub fn permits_attach(self) -> bool {
        !matches!(self, Self::Denied)
    }
}

/// Probes a [`MediaHandle`] with a bounded deadline.
#[derive(Debug, Clone, Copy)]
pub struct AutoplayProbe {
    deadline: Duration,
}

impl AutoplayProbe {
    pub fn new(deadline: Duration) -> Self {
        Self { deadline }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// [`probe_with_deadline`] using this probe's deadline.
    pub async fn probe<M: MediaHandle>(&self, media: &M) -> AutoplayVerdict {
        probe_with_deadline(media, self.deadline).await
    }
}

/// Try muted playback, pausing straight away when it starts.
pub async fn probe<M: MediaHandle>(media: &M) -> AutoplayVerdict {
    match media.play_muted().await {
        Ok(()) => {
            media.pause();
            AutoplayVerdict::Allowed
        }
        Err(e) => {
            debug!(error = %e, "muted playback rejected");
            AutoplayVerdict::Denied
        }
    }
}

/// [`probe`], resolving `Unknown` when the media neither starts nor
/// refuses within `deadline`.
pub async fn probe_with_deadline<M: MediaHandle>(media: &M, deadline: Duration) -> AutoplayVerdict {
    let verdict = tokio::time::timeout(deadline, probe(media))
        .await
        .unwrap_or(AutoplayVerdict::Unknown);
    match verdict {
        AutoplayVerdict::Allowed => info!("Can autoplay"),
        AutoplayVerdict::Denied => warn!("Cannot autoplay"),
        AutoplayVerdict::Unknown => {
            info!(deadline_ms = deadline.as_millis(), "Autoplay probe unresolved, assuming allowed");
        }
    }
    verdict
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    /// How a [`FakeMedia`] reacts to `play_muted`.
    #[derive(Debug, Clone, Copy)]
    pub enum PlayBehavior {
        Start,
        Refuse,
        Hang,
    }

    pub struct FakeMedia {
        behavior: PlayBehavior,
        paused: AtomicBool,
    }

    impl FakeMedia {
        pub fn new(behavior: PlayBehavior) -> Self {
            Self {
                behavior,
                paused: AtomicBool::new(false),
            }
        }

        pub fn was_paused(&self) -> bool {
            self.paused.load(Ordering::SeqCst)
        }
    }

    impl MediaHandle for FakeMedia {
        async fn play_muted(&self) -> Result<(), PlaybackRefused> {
            match self.behavior {
                PlayBehavior::Start => Ok(()),
                PlayBehavior::Refuse => Err(PlaybackRefused("NotAllowedError".into())),
                PlayBehavior::Hang => std::future::pending().await,
            }
        }

        fn pause(&self) {
            self.paused.store(true, Ordering::SeqCst);
        }
    }
}
