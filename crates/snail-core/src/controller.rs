// ── Stream connection controller ──
//
// Owns the lifecycle of one live-stream view: opening the media transport,
// counting down after failures, and re-attaching until the view detaches.
// Every attach starts a new cycle; a cycle that has been superseded or
// detached can no longer change state or emit events.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use strum::Display;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use snail_api::{CloseReason, MediaTransport, TransportLink};

use crate::autoplay::{AutoplayProbe, AutoplayVerdict, MediaHandle};
use crate::config::ConnectionConfig;
use crate::error::CoreError;
use crate::timer::{ReconnectTimer, TimerOutcome};

const EVENT_CHANNEL_SIZE: usize = 64;

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ConnectionState {
    Idle,
    Connecting,
    Connected,
    Failed,
    Reconnecting,
}

impl ConnectionState {
    /// Whether the lifecycle allows moving from `self` to `next`.
    ///
    /// Detach is allowed from anywhere. Re-attaching an active view passes
    /// through `Idle` first.
    pub fn can_transition_to(self, next: Self) -> bool {
        use ConnectionState as S;
        matches!(
            (self, next),
            (_, S::Idle)
                | (S::Idle | S::Reconnecting, S::Connecting)
                | (S::Connecting, S::Connected | S::Failed)
                | (S::Failed | S::Connected, S::Reconnecting)
        )
    }
}

// ── Events ───────────────────────────────────────────────────────

/// Why a cycle reported a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailReason {
    /// The transport could not be opened.
    Open(String),
    /// An established link closed.
    Closed(CloseReason),
}

impl fmt::Display for FailReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open(e) => write!(f, "connect failed: {e}"),
            Self::Closed(reason) => write!(f, "connection lost: {reason}"),
        }
    }
}

/// Lifecycle notifications, stamped with the attach cycle that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    ConnectStart { cycle: u64 },
    ConnectionSuccess { cycle: u64 },
    ConnectionFail { cycle: u64, reason: FailReason },
    /// Seconds left before the next attempt; the last tick is `0`.
    Countdown { cycle: u64, remaining: u32 },
}

impl ConnectionEvent {
    pub fn cycle(&self) -> u64 {
        match self {
            Self::ConnectStart { cycle }
            | Self::ConnectionSuccess { cycle }
            | Self::ConnectionFail { cycle, .. }
            | Self::Countdown { cycle, .. } => *cycle,
        }
    }
}

// ── StreamTarget ─────────────────────────────────────────────────

/// The stream a controller attaches to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamTarget {
    name: String,
    transport_url: Url,
}

impl StreamTarget {
    pub fn new(name: impl Into<String>, transport_url: &str) -> Result<Self, CoreError> {
        let name = name.into();
        if transport_url.trim().is_empty() {
            return Err(CoreError::InvalidTarget {
                reason: format!("empty transport URL for stream {name:?}"),
            });
        }
        let url = Url::parse(transport_url).map_err(|e| CoreError::InvalidTarget {
            reason: format!("{transport_url}: {e}"),
        })?;
        Ok(Self::from_url(name, url))
    }

    pub fn from_url(name: impl Into<String>, transport_url: Url) -> Self {
        Self {
            name: name.into(),
            transport_url,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn transport_url(&self) -> &Url {
        &self.transport_url
    }
}

// ── Controller ───────────────────────────────────────────────────

/// Drives a media transport through connect, countdown and re-attach.
///
/// Detaches on drop. [`attach`](Self::attach) spawns onto the current
/// tokio runtime.
pub struct StreamConnectionController<T: MediaTransport, M: MediaHandle> {
    inner: Arc<ControllerInner<T, M>>,
}

struct ControllerInner<T, M> {
    transport: T,
    media: M,
    config: ConnectionConfig,
    probe: AutoplayProbe,
    cycles: Mutex<CycleSlot>,
    state_tx: watch::Sender<ConnectionState>,
    event_tx: broadcast::Sender<ConnectionEvent>,
    autoplay_tx: watch::Sender<Option<AutoplayVerdict>>,
}

#[derive(Default)]
struct CycleSlot {
    /// Bumped on every attach and detach; stale cycles compare unequal.
    generation: u64,
    active: Option<ActiveCycle>,
}

impl CycleSlot {
    fn is_current(&self, cycle: u64) -> bool {
        self.generation == cycle && self.active.as_ref().is_some_and(|a| !a.cancel.is_cancelled())
    }
}

struct ActiveCycle {
    target: StreamTarget,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ActiveCycle {
    fn stop(self) {
        self.cancel.cancel();
        self.task.abort();
    }
}

impl<T: MediaTransport, M: MediaHandle> StreamConnectionController<T, M> {
    pub fn new(transport: T, media: M, config: ConnectionConfig) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Idle);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        let (autoplay_tx, _) = watch::channel(None);
        Self {
            inner: Arc::new(ControllerInner {
                transport,
                media,
                probe: AutoplayProbe::new(config.autoplay_deadline),
                config,
                cycles: Mutex::new(CycleSlot::default()),
                state_tx,
                event_tx,
                autoplay_tx,
            }),
        }
    }

    /// Begin a connection cycle for `target`.
    ///
    /// Any active cycle is cancelled first. `ConnectStart` is emitted
    /// before this returns; the autoplay probe and transport open run in
    /// the background.
    pub fn attach(&self, target: StreamTarget) -> u64 {
        let mut slot = self.inner.lock_cycles();
        if let Some(previous) = slot.active.take() {
            debug!(stream = previous.target.name(), "superseding active cycle");
            previous.stop();
            self.inner.state_tx.send_replace(ConnectionState::Idle);
        }
        slot.generation += 1;
        let cycle = slot.generation;

        info!(stream = target.name(), url = %target.transport_url(), cycle, "attaching");
        self.inner.state_tx.send_replace(ConnectionState::Connecting);
        let _ = self.inner.event_tx.send(ConnectionEvent::ConnectStart { cycle });

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_cycle(
            Arc::clone(&self.inner),
            cycle,
            target.clone(),
            cancel.clone(),
        ));
        slot.active = Some(ActiveCycle { target, cancel, task });
        cycle
    }

    /// Stop the active cycle, if any, and return to `Idle`. Idempotent.
    pub fn detach(&self) {
        let mut slot = self.inner.lock_cycles();
        if let Some(active) = slot.active.take() {
            info!(stream = active.target.name(), "detaching");
            active.stop();
            slot.generation += 1;
        }
        self.inner.state_tx.send_if_modified(|state| {
            let changed = *state != ConnectionState::Idle;
            *state = ConnectionState::Idle;
            changed
        });
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state_tx.borrow()
    }

    /// Watch state changes.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state_tx.subscribe()
    }

    /// Receive lifecycle events emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.inner.event_tx.subscribe()
    }

    /// The most recent autoplay verdict, once a probe has settled.
    pub fn autoplay(&self) -> Option<AutoplayVerdict> {
        *self.inner.autoplay_tx.borrow()
    }

    pub fn watch_autoplay(&self) -> watch::Receiver<Option<AutoplayVerdict>> {
        self.inner.autoplay_tx.subscribe()
    }

    /// The target of the active cycle.
    pub fn target(&self) -> Option<StreamTarget> {
        self.inner.lock_cycles().active.as_ref().map(|a| a.target.clone())
    }

    pub fn is_attached(&self) -> bool {
        self.inner.lock_cycles().active.is_some()
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.inner.config
    }
}

impl<T: MediaTransport, M: MediaHandle> Drop for StreamConnectionController<T, M> {
    fn drop(&mut self) {
        if let Some(active) = self.inner.lock_cycles().active.take() {
            active.stop();
        }
    }
}

impl<T, M> ControllerInner<T, M> {
    fn lock_cycles(&self) -> MutexGuard<'_, CycleSlot> {
        self.cycles.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a state change and/or emit an event on behalf of `cycle`.
    ///
    /// Returns `false`, doing nothing, once the cycle is no longer current.
    fn publish(&self, cycle: u64, next: Option<ConnectionState>, event: Option<ConnectionEvent>) -> bool {
        let slot = self.lock_cycles();
        if !slot.is_current(cycle) {
            return false;
        }
        if let Some(next) = next {
            let from = *self.state_tx.borrow();
            if !from.can_transition_to(next) {
                warn!(%from, to = %next, cycle, "rejected state transition");
                return false;
            }
            self.state_tx.send_replace(next);
        }
        if let Some(event) = event {
            let _ = self.event_tx.send(event);
        }
        true
    }

    /// Store the probe verdict of `cycle` unless it has been superseded.
    fn record_autoplay(&self, cycle: u64, verdict: AutoplayVerdict) -> bool {
        let slot = self.lock_cycles();
        if !slot.is_current(cycle) {
            return false;
        }
        self.autoplay_tx.send_replace(Some(verdict));
        true
    }
}

/// One attach cycle: probe once, then open / countdown / re-open until cancelled.
async fn run_cycle<T: MediaTransport, M: MediaHandle>(
    inner: Arc<ControllerInner<T, M>>,
    cycle: u64,
    target: StreamTarget,
    cancel: CancellationToken,
) {
    let verdict = tokio::select! {
        biased;
        () = cancel.cancelled() => return,
        verdict = inner.probe.probe(&inner.media) => verdict,
    };
    inner.record_autoplay(cycle, verdict);

    loop {
        let opened = tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            opened = inner.transport.open(target.transport_url()) => opened,
        };

        match opened {
            Ok(mut link) => {
                if !inner.publish(cycle, Some(ConnectionState::Connected), Some(ConnectionEvent::ConnectionSuccess { cycle })) {
                    return;
                }
                info!(stream = target.name(), cycle, "Connection success");

                let reason = tokio::select! {
                    biased;
                    () = cancel.cancelled() => return,
                    reason = link.closed() => reason,
                };
                drop(link);
                warn!(stream = target.name(), %reason, "media link closed");
                let fail = ConnectionEvent::ConnectionFail {
                    cycle,
                    reason: FailReason::Closed(reason),
                };
                if !inner.publish(cycle, Some(ConnectionState::Reconnecting), Some(fail)) {
                    return;
                }
            }
            Err(e) => {
                warn!(stream = target.name(), error = %e, "Connection fail");
                let fail = ConnectionEvent::ConnectionFail {
                    cycle,
                    reason: FailReason::Open(e.to_string()),
                };
                if !inner.publish(cycle, Some(ConnectionState::Failed), Some(fail))
                    || !inner.publish(cycle, Some(ConnectionState::Reconnecting), None)
                {
                    return;
                }
            }
        }

        let timer = ReconnectTimer::new(inner.config.reconnect_secs, inner.config.tick_interval);
        let outcome = timer
            .run(
                &cancel,
                |remaining| {
                    inner.publish(cycle, None, Some(ConnectionEvent::Countdown { cycle, remaining }));
                },
                || debug!(stream = target.name(), cycle, "countdown expired, re-attaching"),
            )
            .await;
        if outcome == TimerOutcome::Cancelled {
            return;
        }
        if !inner.publish(cycle, Some(ConnectionState::Connecting), Some(ConnectionEvent::ConnectStart { cycle })) {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use tokio::sync::broadcast::error::TryRecvError;

    use super::*;
    use crate::autoplay::testing::{FakeMedia, PlayBehavior};

    /// What a scripted open does.
    #[derive(Debug, Clone, Copy)]
    enum Open {
        Refuse,
        /// Succeed; close after the given delay, or never.
        Accept(Option<Duration>),
        Hang,
    }

    /// Per-URL scripts. The last step of a script repeats forever.
    #[derive(Default)]
    struct ScriptedTransport {
        scripts: Mutex<HashMap<String, VecDeque<Open>>>,
        opens: Arc<AtomicUsize>,
    }

    impl ScriptedTransport {
        fn script(self, url: &str, steps: &[Open]) -> Self {
            self.scripts
                .lock()
                .unwrap()
                .insert(url.to_owned(), steps.iter().copied().collect());
            self
        }

        fn next_step(&self, url: &Url) -> Open {
            let mut scripts = self.scripts.lock().unwrap();
            let Some(steps) = scripts.get_mut(url.as_str()) else {
                return Open::Refuse;
            };
            if steps.len() > 1 {
                steps.pop_front().unwrap()
            } else {
                steps.front().copied().unwrap_or(Open::Refuse)
            }
        }
    }

    struct ScriptedLink(Option<Duration>);

    impl TransportLink for ScriptedLink {
        async fn closed(&mut self) -> CloseReason {
            match self.0 {
                Some(after) => {
                    tokio::time::sleep(after).await;
                    CloseReason::Ended
                }
                None => std::future::pending().await,
            }
        }
    }

    impl MediaTransport for ScriptedTransport {
        type Link = ScriptedLink;

        async fn open(&self, url: &Url) -> Result<ScriptedLink, snail_api::Error> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            match self.next_step(url) {
                Open::Refuse => Err(snail_api::Error::WebSocketConnect("connection refused".into())),
                Open::Accept(close_after) => Ok(ScriptedLink(close_after)),
                Open::Hang => std::future::pending().await,
            }
        }
    }

    const A: &str = "wss://snail.video/api/stream/a";
    const B: &str = "wss://snail.video/api/stream/b";

    fn target(url: &str) -> StreamTarget {
        let name = url.rsplit('/').next().unwrap();
        StreamTarget::new(name, url).unwrap()
    }

    fn controller(transport: ScriptedTransport, play: PlayBehavior) -> StreamConnectionController<ScriptedTransport, FakeMedia> {
        StreamConnectionController::new(transport, FakeMedia::new(play), ConnectionConfig::default())
    }

    async fn next(rx: &mut broadcast::Receiver<ConnectionEvent>) -> ConnectionEvent {
        tokio::time::timeout(Duration::from_secs(60), rx.recv())
            .await
            .expect("event before timeout")
            .expect("channel open")
    }

    fn countdown(cycle: u64) -> Vec<ConnectionEvent> {
        [3, 2, 1, 0]
            .into_iter()
            .map(|remaining| ConnectionEvent::Countdown { cycle, remaining })
            .collect()
    }

    #[test]
    fn transition_table() {
        use ConnectionState as S;
        assert!(S::Idle.can_transition_to(S::Connecting));
        assert!(S::Connecting.can_transition_to(S::Connected));
        assert!(S::Connecting.can_transition_to(S::Failed));
        assert!(S::Failed.can_transition_to(S::Reconnecting));
        assert!(S::Connected.can_transition_to(S::Reconnecting));
        assert!(S::Reconnecting.can_transition_to(S::Connecting));
        assert!(S::Connected.can_transition_to(S::Idle));

        assert!(!S::Idle.can_transition_to(S::Connected));
        assert!(!S::Failed.can_transition_to(S::Connecting));
        assert!(!S::Connected.can_transition_to(S::Failed));
        assert!(!S::Reconnecting.can_transition_to(S::Connected));
    }

    #[test]
    fn target_requires_transport_url() {
        assert!(matches!(
            StreamTarget::new("foo", ""),
            Err(CoreError::InvalidTarget { .. })
        ));
        assert!(StreamTarget::new("foo", "not a url").is_err());
        assert_eq!(target(A).name(), "a");
    }

    #[tokio::test(start_paused = true)]
    async fn connect_start_is_emitted_synchronously() {
        let ctl = controller(ScriptedTransport::default().script(A, &[Open::Hang]), PlayBehavior::Start);
        let mut rx = ctl.subscribe();

        let cycle = ctl.attach(target(A));

        assert_eq!(rx.try_recv().unwrap(), ConnectionEvent::ConnectStart { cycle });
        assert_eq!(ctl.state(), ConnectionState::Connecting);
        assert_eq!(ctl.target(), Some(target(A)));
    }

    #[tokio::test(start_paused = true)]
    async fn successful_open_connects() {
        let ctl = controller(ScriptedTransport::default().script(A, &[Open::Accept(None)]), PlayBehavior::Start);
        let mut rx = ctl.subscribe();

        let cycle = ctl.attach(target(A));

        assert_eq!(next(&mut rx).await, ConnectionEvent::ConnectStart { cycle });
        assert_eq!(next(&mut rx).await, ConnectionEvent::ConnectionSuccess { cycle });
        assert_eq!(ctl.state(), ConnectionState::Connected);
        assert_eq!(ctl.autoplay(), Some(AutoplayVerdict::Allowed));
    }

    #[tokio::test(start_paused = true)]
    async fn failure_counts_down_then_reattaches() {
        let transport = ScriptedTransport::default().script(A, &[Open::Refuse, Open::Accept(None)]);
        let ctl = controller(transport, PlayBehavior::Start);
        let mut rx = ctl.subscribe();
        let start = tokio::time::Instant::now();

        let cycle = ctl.attach(target(A));

        assert_eq!(next(&mut rx).await, ConnectionEvent::ConnectStart { cycle });
        assert!(matches!(
            next(&mut rx).await,
            ConnectionEvent::ConnectionFail { reason: FailReason::Open(_), .. }
        ));
        assert_eq!(ctl.state(), ConnectionState::Reconnecting);
        for expected in countdown(cycle) {
            assert_eq!(next(&mut rx).await, expected);
        }
        assert_eq!(next(&mut rx).await, ConnectionEvent::ConnectStart { cycle });
        assert_eq!(next(&mut rx).await, ConnectionEvent::ConnectionSuccess { cycle });
        assert_eq!(start.elapsed(), Duration::from_secs(3));
        assert_eq!(ctl.state(), ConnectionState::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_link_reconnects() {
        let transport = ScriptedTransport::default().script(
            A,
            &[Open::Accept(Some(Duration::from_secs(5))), Open::Accept(None)],
        );
        let ctl = controller(transport, PlayBehavior::Start);
        let mut rx = ctl.subscribe();

        let cycle = ctl.attach(target(A));

        assert_eq!(next(&mut rx).await, ConnectionEvent::ConnectStart { cycle });
        assert_eq!(next(&mut rx).await, ConnectionEvent::ConnectionSuccess { cycle });
        assert_eq!(
            next(&mut rx).await,
            ConnectionEvent::ConnectionFail {
                cycle,
                reason: FailReason::Closed(CloseReason::Ended)
            }
        );
        for expected in countdown(cycle) {
            assert_eq!(next(&mut rx).await, expected);
        }
        assert_eq!(next(&mut rx).await, ConnectionEvent::ConnectStart { cycle });
        assert_eq!(next(&mut rx).await, ConnectionEvent::ConnectionSuccess { cycle });
    }

    #[tokio::test(start_paused = true)]
    async fn detach_stops_retries() {
        let transport = ScriptedTransport::default().script(A, &[Open::Refuse]);
        let opens = Arc::clone(&transport.opens);
        let ctl = controller(transport, PlayBehavior::Start);
        let mut rx = ctl.subscribe();

        ctl.attach(target(A));
        next(&mut rx).await;
        assert!(matches!(next(&mut rx).await, ConnectionEvent::ConnectionFail { .. }));
        assert!(matches!(next(&mut rx).await, ConnectionEvent::Countdown { remaining: 3, .. }));

        ctl.detach();
        tokio::time::sleep(Duration::from_secs(30)).await;

        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
        assert_eq!(ctl.state(), ConnectionState::Idle);
        assert_eq!(opens.load(Ordering::SeqCst), 1);
        assert!(!ctl.is_attached());

        ctl.detach();
        assert_eq!(ctl.state(), ConnectionState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn second_attach_supersedes_first() {
        let transport = ScriptedTransport::default()
            .script(A, &[Open::Refuse])
            .script(B, &[Open::Accept(None)]);
        let ctl = controller(transport, PlayBehavior::Start);
        let mut rx = ctl.subscribe();

        let first = ctl.attach(target(A));
        next(&mut rx).await;
        assert!(matches!(next(&mut rx).await, ConnectionEvent::ConnectionFail { .. }));
        assert!(matches!(next(&mut rx).await, ConnectionEvent::Countdown { remaining: 3, .. }));

        let second = ctl.attach(target(B));
        assert_ne!(first, second);
        assert_eq!(next(&mut rx).await, ConnectionEvent::ConnectStart { cycle: second });
        assert_eq!(next(&mut rx).await, ConnectionEvent::ConnectionSuccess { cycle: second });

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
        assert_eq!(ctl.state(), ConnectionState::Connected);
        assert_eq!(ctl.target().map(|t| t.name().to_owned()), Some("b".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn back_to_back_attach_only_runs_latest() {
        let transport = ScriptedTransport::default()
            .script(A, &[Open::Accept(None)])
            .script(B, &[Open::Accept(None)]);
        let opens = Arc::clone(&transport.opens);
        let ctl = controller(transport, PlayBehavior::Start);
        let mut rx = ctl.subscribe();

        let first = ctl.attach(target(A));
        let second = ctl.attach(target(B));

        assert_eq!(next(&mut rx).await, ConnectionEvent::ConnectStart { cycle: first });
        assert_eq!(next(&mut rx).await, ConnectionEvent::ConnectStart { cycle: second });
        assert_eq!(next(&mut rx).await, ConnectionEvent::ConnectionSuccess { cycle: second });
        assert_eq!(opens.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unresolved_autoplay_probe_does_not_block_attach() {
        let ctl = controller(ScriptedTransport::default().script(A, &[Open::Accept(None)]), PlayBehavior::Hang);
        let mut rx = ctl.subscribe();
        let start = tokio::time::Instant::now();

        let cycle = ctl.attach(target(A));
        next(&mut rx).await;

        assert_eq!(next(&mut rx).await, ConnectionEvent::ConnectionSuccess { cycle });
        assert_eq!(start.elapsed(), Duration::from_millis(500));
        assert_eq!(ctl.autoplay(), Some(AutoplayVerdict::Unknown));
    }

    #[tokio::test(start_paused = true)]
    async fn denied_autoplay_still_connects() {
        let ctl = controller(ScriptedTransport::default().script(A, &[Open::Accept(None)]), PlayBehavior::Refuse);
        let mut rx = ctl.subscribe();

        let cycle = ctl.attach(target(A));
        next(&mut rx).await;

        assert_eq!(next(&mut rx).await, ConnectionEvent::ConnectionSuccess { cycle });
        assert_eq!(ctl.autoplay(), Some(AutoplayVerdict::Denied));
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_cycle_cannot_record_autoplay() {
        let ctl = controller(ScriptedTransport::default(), PlayBehavior::Hang);

        let first = ctl.attach(target(A));
        ctl.detach();
        assert!(!ctl.inner.record_autoplay(first, AutoplayVerdict::Denied));
        assert_eq!(ctl.autoplay(), None);

        let first = ctl.attach(target(A));
        let second = ctl.attach(target(B));
        assert!(!ctl.inner.record_autoplay(first, AutoplayVerdict::Denied));
        assert_eq!(ctl.autoplay(), None);

        assert!(ctl.inner.record_autoplay(second, AutoplayVerdict::Allowed));
        assert_eq!(ctl.autoplay(), Some(AutoplayVerdict::Allowed));
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels_active_cycle() {
        let transport = ScriptedTransport::default().script(A, &[Open::Refuse]);
        let opens = Arc::clone(&transport.opens);
        let ctl = controller(transport, PlayBehavior::Start);
        let mut rx = ctl.subscribe();

        ctl.attach(target(A));
        next(&mut rx).await;
        next(&mut rx).await;
        drop(ctl);
        tokio::time::sleep(Duration::from_secs(30)).await;

        assert_eq!(opens.load(Ordering::SeqCst), 1);
    }
}
