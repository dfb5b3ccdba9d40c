//! Viewport handle abstraction.
//!
//! The controller never talks to a display surface directly; it consumes a
//! narrow handle that can read metrics and issue scroll instructions. Hosts
//! adapt their real scroll container behind this trait. Failures from the
//! handle are absorbed by the controller (losing one follow tick is
//! recoverable on the next content update), so adapters are free to `?`.

use std::sync::{Arc, Mutex};

use anyhow::Result;

use crate::metrics::ScrollMetrics;

/// How a scroll instruction should move the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    /// Jump instantly. Used by the continuous driver and one-shot follows.
    Auto,
    /// Animate. Used by the explicit resume affordance.
    Smooth,
}

/// A scrollable viewport as seen by the controller.
pub trait Viewport: Send + Sync {
    /// Reads the current scroll metrics.
    fn metrics(&self) -> Result<ScrollMetrics>;

    /// Scrolls to the given offset.
    fn scroll_to(&self, offset: f64, behavior: ScrollBehavior) -> Result<()>;
}

/// Shared viewport handle, owned by exactly one controller per view.
pub type ViewportHandle = Arc<dyn Viewport>;

/// In-memory viewport that records every instruction it receives.
///
/// Used by this crate's tests and useful for headless hosts. `scroll_to`
/// updates the stored offset immediately, as an instant jump would.
#[derive(Debug, Default)]
pub struct RecordingViewport {
    inner: Mutex<RecordingInner>,
}

#[derive(Debug, Default)]
struct RecordingInner {
    metrics: ScrollMetrics,
    instructions: Vec<(f64, ScrollBehavior)>,
    fail_scrolls: bool,
    fail_metrics: bool,
}

impl RecordingViewport {
    /// Creates a viewport with the given initial metrics.
    pub fn new(metrics: ScrollMetrics) -> Self {
        Self {
            inner: Mutex::new(RecordingInner {
                metrics,
                instructions: Vec::new(),
                fail_scrolls: false,
                fail_metrics: false,
            }),
        }
    }

    /// Replaces the metrics the next read will return.
    pub fn set_metrics(&self, metrics: ScrollMetrics) {
        self.lock().metrics = metrics;
    }

    /// Grows the content extent, simulating appended tokens.
    pub fn append_content(&self, extent: f64) {
        self.lock().metrics.content_extent += extent;
    }

    /// All scroll instructions issued so far.
    pub fn instructions(&self) -> Vec<(f64, ScrollBehavior)> {
        self.lock().instructions.clone()
    }

    /// Number of scroll instructions issued so far.
    pub fn instruction_count(&self) -> usize {
        self.lock().instructions.len()
    }

    /// Makes subsequent `scroll_to` calls fail, simulating a torn-down host.
    pub fn fail_scrolls(&self, fail: bool) {
        self.lock().fail_scrolls = fail;
    }

    /// Makes subsequent `metrics` reads fail, simulating a detached surface.
    pub fn fail_metrics(&self, fail: bool) {
        self.lock().fail_metrics = fail;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RecordingInner> {
        // Mutex poisoning only happens if a test panicked mid-call
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Viewport for RecordingViewport {
    fn metrics(&self) -> Result<ScrollMetrics> {
        let inner = self.lock();
        if inner.fail_metrics {
            anyhow::bail!("viewport surface detached");
        }
        Ok(inner.metrics)
    }

    fn scroll_to(&self, offset: f64, behavior: ScrollBehavior) -> Result<()> {
        let mut inner = self.lock();
        if inner.fail_scrolls {
            anyhow::bail!("viewport torn down");
        }
        inner.instructions.push((offset, behavior));
        inner.metrics.offset = offset;
        Ok(())
    }
}
