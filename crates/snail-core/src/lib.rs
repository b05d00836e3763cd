//! Viewing logic between `snail-api` and the `snail` CLI.
//!
//! - **[`StreamConnectionController`]** -- Reconnect state machine for one
//!   live view. [`attach()`](StreamConnectionController::attach) opens the
//!   media transport; failures and closed links start a fixed countdown
//!   ([`ReconnectTimer`]) after which the same target is re-attached, until
//!   [`detach()`](StreamConnectionController::detach). State is observable
//!   through a `watch` channel, lifecycle events through `broadcast`.
//!
//! - **[`AutoplayProbe`]** -- Bounded check of whether a [`MediaHandle`] may
//!   start without a user gesture. Run once per user attach.
//!
//! - **[`FrameSnapshotExtractor`]** -- Decodes the first frame of a video
//!   resource through a [`FrameSource`] and scales it into a thumbnail.
//!   Failures yield [`Snapshot::Empty`].
//!
//! - **[`duration_fmt`]** -- "45s" / "2 minute(s) ago" labels.
//!
//! - **[`Session`]** -- Per-view API client and cached account; converts API
//!   failures into empty states.

pub mod autoplay;
pub mod config;
pub mod controller;
pub mod duration_fmt;
pub mod error;
pub mod session;
pub mod snapshot;
pub mod timer;

// ── Primary re-exports ──────────────────────────────────────────────
pub use autoplay::{AutoplayProbe, AutoplayVerdict, MediaHandle, PlaybackRefused};
pub use config::{ConnectionConfig, SessionConfig, SnapshotBounds, TlsVerification};
pub use controller::{
    ConnectionEvent, ConnectionState, FailReason, StreamConnectionController, StreamTarget,
};
pub use error::CoreError;
pub use session::Session;
pub use snapshot::{
    FfmpegFrameSource, FrameSnapshotExtractor, FrameSource, MAX_SNAPSHOT_EDGE, Snapshot, SnapshotError,
    SnapshotResult,
};
pub use timer::{ReconnectTimer, TimerOutcome};

// API types consumers handle directly.
pub use snail_api::{
    AccountInfo, CloseReason, MediaTransport, PushPayload, PushSubscription, RouteLayout, StreamEntry,
    SubscriptionKeys, TransportLink, WsTransport,
};
