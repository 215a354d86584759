//! Single-deadline debouncer for input-driven searches
//!
//! Each `schedule` replaces the pending value and resets the deadline, so
//! only the value scheduled last is ever fired. Time is passed in by the
//! caller, which keeps the event loop and tests in control of the clock.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct Pending<T> {
    value: T,
    deadline: Instant,
}

/// Debouncer holding at most one pending value
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    pending: Option<Pending<T>>,
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<T> Debouncer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any pending value and restart the idle timer
    pub fn schedule(&mut self, value: T, delay: Duration, now: Instant) {
        self.pending = Some(Pending {
            value,
            deadline: now + delay,
        });
    }

    /// Drop the pending value, if any
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|p| p.value)
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Check if the idle window has elapsed for the pending value
    pub fn is_ready(&self, now: Instant) -> bool {
        self.pending.as_ref().is_some_and(|p| now >= p.deadline)
    }

    /// Time until the pending value fires (None if nothing is pending)
    pub fn time_until_ready(&self, now: Instant) -> Option<Duration> {
        self.pending
            .as_ref()
            .map(|p| p.deadline.saturating_duration_since(now))
    }

    /// Take the pending value once its deadline has passed
    pub fn fire(&mut self, now: Instant) -> Option<T> {
        if self.is_ready(now) {
            self.cancel()
        } else {
            None
        }
    }
}
