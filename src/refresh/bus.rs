//! Rate-limited "data changed" counter.
//!
//! The first trigger of a burst fires immediately; later triggers inside the
//! throttle window collapse into one trailing fire at the window boundary.
//! Time is passed in by the caller so the owning event loop decides when to
//! sleep (see [`ThrottledRefreshBus::next_deadline`]).

use std::time::{Duration, Instant};

use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TriggerOutcome {
    /// Counter incremented right away
    Fired(u64),
    /// A trailing fire is scheduled for this instant
    Deferred(Instant),
}

#[derive(Debug)]
pub(crate) struct ThrottledRefreshBus {
    threshold: Duration,
    /// Start of the current throttle window. A trailing fire delivered by
    /// `poll` alone does not move it.
    last_fire: Option<Instant>,
    pending: Option<Instant>,
    counter: u64,
}

impl ThrottledRefreshBus {
    pub(crate) fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            last_fire: None,
            pending: None,
            counter: 0,
        }
    }

    pub(crate) fn counter(&self) -> u64 {
        self.counter
    }

    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.pending
    }

    pub(crate) fn subscribe(&self) -> RefreshCursor {
        RefreshCursor {
            seen: self.counter,
        }
    }

    pub(crate) fn trigger(&mut self, now: Instant) -> TriggerOutcome {
        // An overdue trailing fire absorbs this trigger and opens the next window.
        if let Some(counter) = self.poll(now) {
            self.last_fire = Some(now);
            return TriggerOutcome::Fired(counter);
        }

        let elapsed = self.last_fire.map(|last| now.saturating_duration_since(last));
        match elapsed {
            Some(elapsed) if elapsed < self.threshold => {
                let at = now + (self.threshold - elapsed);
                if self.pending.replace(at).is_some() {
                    trace!(event = "dashboard.refresh.rescheduled");
                }
                TriggerOutcome::Deferred(at)
            }
            _ => {
                self.pending = None;
                self.last_fire = Some(now);
                TriggerOutcome::Fired(self.fire())
            }
        }
    }

    /// Deliver the trailing fire if its deadline has passed.
    pub(crate) fn poll(&mut self, now: Instant) -> Option<u64> {
        match self.pending {
            Some(at) if at <= now => {
                self.pending = None;
                Some(self.fire())
            }
            _ => None,
        }
    }

    /// Drop any scheduled fire. Called when the owner is torn down.
    pub(crate) fn shutdown(&mut self) {
        if self.pending.take().is_some() {
            trace!(event = "dashboard.refresh.pending_cancelled");
        }
    }

    fn fire(&mut self) -> u64 {
        self.counter += 1;
        trace!(event = "dashboard.refresh.fired", counter = self.counter);
        self.counter
    }
}

/// A consumer's view of the counter: re-fetch whenever it moved.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RefreshCursor {
    seen: u64,
}

impl RefreshCursor {
    /// True if the bus fired since the last call; records the new value.
    pub(crate) fn observe(&mut self, bus: &ThrottledRefreshBus) -> bool {
        let current = bus.counter();
        if current == self.seen {
            return false;
        }
        self.seen = current;
        true
    }
}
