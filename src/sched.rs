//! Deterministic timer tokens. Nothing here touches the wall clock: a
//! [`Deadline`] is armed at an explicit `Instant` and fires when a caller
//! polls it with a later one, so tests drive time themselves and
//! cancellation is synchronous.

use std::time::Instant;

/// A single cancellable scheduled task slot. Re-arming overwrites the
/// previous deadline, which makes "schedule if not already pending"
/// idempotent for free.
#[derive(Clone, Copy, Debug, Default)]
pub struct Deadline {
    due: Option<Instant>,
}

impl Deadline {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, at: Instant) {
        self.due = Some(at);
    }

    /// Arm only when no deadline is pending.
    pub fn arm_if_idle(&mut self, at: Instant) {
        if self.due.is_none() {
            self.due = Some(at);
        }
    }

    pub fn cancel(&mut self) {
        self.due = None;
    }

    pub fn is_armed(&self) -> bool {
        self.due.is_some()
    }

    /// Consume the deadline if it has elapsed. Returns `true` at most once
    /// per arm; a cancelled deadline never fires.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.due {
            Some(at) if now >= at => {
                self.due = None;
                true
            }
            _ => false,
        }
    }
}
