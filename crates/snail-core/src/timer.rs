//! Countdown between a connection failure and the next attempt.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// How a countdown finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerOutcome {
    Expired,
    Cancelled,
}

/// A one-shot countdown that reports every tick.
///
/// Started at `N`, it reports `N` immediately, then `N-1 .. 0` once per
/// tick interval, and fires its expiry callback exactly once when it
/// reaches zero. Cancellation is checked before every callback, so a
/// cancelled timer never reports again.
#[derive(Debug)]
pub struct ReconnectTimer {
    remaining: u32,
    tick_interval: Duration,
}

impl ReconnectTimer {
    pub fn new(seconds: u32, tick_interval: Duration) -> Self {
        Self {
            remaining: seconds,
            tick_interval,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Drive the countdown to completion or cancellation.
    pub async fn run(
        mut self,
        cancel: &CancellationToken,
        mut on_tick: impl FnMut(u32),
        on_expire: impl FnOnce(),
    ) -> TimerOutcome {
        if cancel.is_cancelled() {
            return TimerOutcome::Cancelled;
        }
        on_tick(self.remaining);

        while self.remaining > 0 {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return TimerOutcome::Cancelled,
                () = tokio::time::sleep(self.tick_interval) => {}
            }
            if cancel.is_cancelled() {
                return TimerOutcome::Cancelled;
            }
            self.remaining -= 1;
            on_tick(self.remaining);
        }

        on_expire();
        TimerOutcome::Expired
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use tokio::time::Instant;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn counts_down_then_expires_once() {
        let ticks = RefCell::new(Vec::new());
        let expired = Cell::new(0);
        let start = Instant::now();

        let outcome = ReconnectTimer::new(3, Duration::from_secs(1))
            .run(
                &CancellationToken::new(),
                |remaining| ticks.borrow_mut().push(remaining),
                || expired.set(expired.get() + 1),
            )
            .await;

        assert_eq!(outcome, TimerOutcome::Expired);
        assert_eq!(*ticks.borrow(), vec![3, 2, 1, 0]);
        assert_eq!(expired.get(), 1);
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_countdown_expires_immediately() {
        let ticks = RefCell::new(Vec::new());
        let expired = Cell::new(false);

        let outcome = ReconnectTimer::new(0, Duration::from_secs(1))
            .run(
                &CancellationToken::new(),
                |remaining| ticks.borrow_mut().push(remaining),
                || expired.set(true),
            )
            .await;

        assert_eq!(outcome, TimerOutcome::Expired);
        assert_eq!(*ticks.borrow(), vec![0]);
        assert!(expired.get());
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_ticks_and_expiry() {
        let cancel = CancellationToken::new();
        let ticks = RefCell::new(Vec::new());
        let expired = Cell::new(false);

        let canceller = {
            let cancel = cancel.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(1_500)).await;
                cancel.cancel();
            }
        };
        let timer = ReconnectTimer::new(3, Duration::from_secs(1)).run(
            &cancel,
            |remaining| ticks.borrow_mut().push(remaining),
            || expired.set(true),
        );

        let (outcome, ()) = tokio::join!(timer, canceller);

        assert_eq!(outcome, TimerOutcome::Cancelled);
        assert_eq!(*ticks.borrow(), vec![3, 2]);
        assert!(!expired.get());
    }

    #[tokio::test]
    async fn already_cancelled_timer_never_ticks() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut ticked = false;

        let outcome = ReconnectTimer::new(3, Duration::from_secs(1))
            .run(&cancel, |_| ticked = true, || {})
            .await;

        assert_eq!(outcome, TimerOutcome::Cancelled);
        assert!(!ticked);
    }
}
