//! Continuous scroll driver.
//!
//! While a stream is appending tokens and the machine is following, the
//! driver re-pins the viewport to the bottom once per frame. It is a
//! cooperative, self-terminating loop, not a fixed-period timer: every
//! iteration re-checks that following is still wanted, so a manual-scroll
//! detection mid-stream stops it within one frame. The frame pacing itself
//! is injected — the runtime ticks it, tests tick it by hand.

use tracing::{trace, warn};

use crate::viewport::{ScrollBehavior, Viewport};

/// What a driver iteration did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverTick {
    /// Driver is not running.
    Idle,
    /// Driver stopped itself (following ended or the viewport went away).
    Stopped,
    /// A jump-to-bottom instruction was issued.
    Pinned,
}

/// Frame-paced jump-to-bottom loop.
///
/// One driver per controller instance; starting while already running is a
/// no-op so at most one loop is ever active.
#[derive(Debug, Default)]
pub struct ScrollDriver {
    active: bool,
}

impl ScrollDriver {
    /// Creates a stopped driver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the loop is running.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Starts the loop. Returns false if it was already running.
    pub fn start(&mut self) -> bool {
        if self.active {
            return false;
        }
        trace!("continuous scroll driver started");
        self.active = true;
        true
    }

    /// Stops the loop. Idempotent.
    pub fn stop(&mut self) {
        if self.active {
            trace!("continuous scroll driver stopped");
        }
        self.active = false;
    }

    /// Runs one frame iteration.
    ///
    /// Stops if following ended or no viewport is attached; otherwise issues
    /// an instant jump to the bottom and stays scheduled for the next frame.
    /// A failed instruction is absorbed: the driver keeps running and retries
    /// on the next frame.
    pub fn tick(&mut self, following: bool, viewport: Option<&dyn Viewport>) -> DriverTick {
        if !self.active {
            return DriverTick::Idle;
        }

        if !following {
            self.stop();
            return DriverTick::Stopped;
        }

        let Some(viewport) = viewport else {
            self.stop();
            return DriverTick::Stopped;
        };

        match viewport.metrics() {
            Ok(metrics) => {
                if let Err(error) = viewport.scroll_to(metrics.bottom_offset(), ScrollBehavior::Auto)
                {
                    warn!(%error, "driver scroll-to-bottom failed; retrying next frame");
                }
            }
            Err(error) => {
                warn!(%error, "driver metrics read failed; retrying next frame");
            }
        }

        DriverTick::Pinned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::ScrollMetrics;
    use crate::viewport::RecordingViewport;

    #[test]
    fn start_is_single_shot() {
        let mut driver = ScrollDriver::new();
        assert!(driver.start());
        assert!(!driver.start());
        assert!(driver.is_active());
    }

    #[test]
    fn tick_pins_to_bottom_while_following() {
        let viewport = RecordingViewport::new(ScrollMetrics::new(0.0, 1000.0, 150.0));
        let mut driver = ScrollDriver::new();
        driver.start();

        assert_eq!(driver.tick(true, Some(&viewport)), DriverTick::Pinned);
        assert_eq!(viewport.instructions(), vec![(850.0, ScrollBehavior::Auto)]);
        assert!(driver.is_active());
    }

    #[test]
    fn tick_stops_when_following_ends() {
        let viewport = RecordingViewport::default();
        let mut driver = ScrollDriver::new();
        driver.start();

        assert_eq!(driver.tick(false, Some(&viewport)), DriverTick::Stopped);
        assert!(!driver.is_active());
        assert_eq!(viewport.instruction_count(), 0);
    }

    #[test]
    fn tick_stops_without_viewport() {
        let mut driver = ScrollDriver::new();
        driver.start();
        assert_eq!(driver.tick(true, None), DriverTick::Stopped);
        assert!(!driver.is_active());
    }

    #[test]
    fn tick_is_idle_when_stopped() {
        let viewport = RecordingViewport::default();
        let mut driver = ScrollDriver::new();
        assert_eq!(driver.tick(true, Some(&viewport)), DriverTick::Idle);
        assert_eq!(viewport.instruction_count(), 0);
    }

    #[test]
    fn scroll_failure_keeps_driver_running() {
        let viewport = RecordingViewport::new(ScrollMetrics::new(0.0, 1000.0, 150.0));
        viewport.fail_scrolls(true);
        let mut driver = ScrollDriver::new();
        driver.start();

        assert_eq!(driver.tick(true, Some(&viewport)), DriverTick::Pinned);
        assert!(driver.is_active());

        // Host recovers; the next frame succeeds
        viewport.fail_scrolls(false);
        assert_eq!(driver.tick(true, Some(&viewport)), DriverTick::Pinned);
        assert_eq!(viewport.instruction_count(), 1);
    }

    #[test]
    fn metrics_failure_keeps_driver_running() {
        let viewport = RecordingViewport::new(ScrollMetrics::new(0.0, 1000.0, 150.0));
        viewport.fail_metrics(true);
        let mut driver = ScrollDriver::new();
        driver.start();

        // No instruction can be issued without a target, but the loop stays up
        assert_eq!(driver.tick(true, Some(&viewport)), DriverTick::Pinned);
        assert!(driver.is_active());
        assert_eq!(viewport.instruction_count(), 0);

        viewport.fail_metrics(false);
        assert_eq!(driver.tick(true, Some(&viewport)), DriverTick::Pinned);
        assert_eq!(viewport.instructions(), vec![(850.0, ScrollBehavior::Auto)]);
    }
}
