//! Debounce gate for the classification pass.
//!
//! Scroll events fire on every pixel of movement; running a classification
//! pass for each would be wasted work. The gate is trailing: every recorded
//! event pushes the deadline out, and at most one pass fires per quiet
//! window. It only schedules the pass — metrics are re-read fresh from the
//! viewport when the pass runs. The immediate manual-scroll check never
//! waits on this gate.

use std::time::{Duration, Instant};

use tracing::trace;

/// Trailing debounce deadline for classification passes.
#[derive(Debug, Default)]
pub struct DebounceGate {
    deadline: Option<Instant>,
    coalesced: u32,
}

impl DebounceGate {
    /// Creates an idle gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a scroll event, pushing the deadline to `now + delay`.
    pub fn record(&mut self, now: Instant, delay: Duration) {
        self.deadline = Some(now + delay);
        self.coalesced += 1;
    }

    /// Takes the pending pass if its deadline has elapsed.
    ///
    /// Returns true exactly once per quiet window.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                trace!(events = self.coalesced, "debounce window closed");
                self.deadline = None;
                self.coalesced = 0;
                true
            }
            _ => false,
        }
    }

    /// Returns true if a pass is scheduled.
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// The pending deadline, for scheduler pacing.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Drops any pending pass without firing it.
    pub fn cancel(&mut self) {
        self.deadline = None;
        self.coalesced = 0;
    }
}
