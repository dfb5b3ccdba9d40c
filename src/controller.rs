//! The auto-follow controller (integration shell).
//!
//! Owns every moving part: the state machine, the debounce gate, the
//! continuous driver, the viewport handle, the settle timer, and the
//! subscriber list. All outstanding deadlines live here and nowhere else,
//! so `cancel_all()` atomically leaves no callback able to mutate state for
//! a conversation that has since changed.
//!
//! ## Two detection pipelines
//!
//! A scroll event is handled in two independently paced steps that share
//! only the machine:
//!
//! 1. **Immediate** — inside `handle_scroll_event`, before anything is
//!    queued: a large upward delta pauses following and cancels the driver
//!    in the same tick.
//! 2. **Debounced** — the gate schedules a classification pass; when it
//!    fires, metrics are re-read fresh and the looser threshold re-checks
//!    for deliberate navigation before the position is recorded.
//!
//! The controller is time-explicit: entry points take `Instant`s and timers
//! are plain deadlines, so the whole thing runs under a test-controlled
//! clock with no display surface.

use std::time::Instant;

use tracing::{debug, warn};

use crate::config::FollowConfig;
use crate::debounce::DebounceGate;
use crate::detector::is_deliberate_upward;
use crate::driver::ScrollDriver;
use crate::machine::{AutoScrollMachine, FollowSnapshot, PositionOutcome};
use crate::metrics::{classify, ScrollMetrics, ScrollPosition};
use crate::viewport::{ScrollBehavior, ViewportHandle};

/// Subscriber callback invoked with a snapshot after each transition.
type Subscriber = Box<dyn FnMut(FollowSnapshot) + Send>;

/// Auto-follow controller for one conversation view.
pub struct FollowController {
    config: FollowConfig,
    machine: AutoScrollMachine,
    gate: DebounceGate,
    driver: ScrollDriver,
    viewport: Option<ViewportHandle>,
    subscribers: Vec<Subscriber>,
    /// Deadline of the scroll-to-bottom settle window, if an animation is
    /// in flight. Scroll events before it are the animation's own.
    settle_deadline: Option<Instant>,
    stream_active: bool,
    conversation_id: Option<String>,
    last_published: Option<FollowSnapshot>,
}

impl FollowController {
    /// Creates a controller with no viewport attached.
    pub fn new(config: FollowConfig) -> Self {
        let machine = AutoScrollMachine::new();
        let last_published = Some(machine.snapshot(None));
        Self {
            config,
            machine,
            gate: DebounceGate::new(),
            driver: ScrollDriver::new(),
            viewport: None,
            subscribers: Vec::new(),
            settle_deadline: None,
            stream_active: false,
            conversation_id: None,
            last_published,
        }
    }

    /// Creates a controller bound to a viewport.
    pub fn with_viewport(config: FollowConfig, viewport: ViewportHandle) -> Self {
        let mut controller = Self::new(config);
        controller.viewport = Some(viewport);
        controller
    }

    /// Attaches (or replaces) the viewport handle.
    pub fn attach_viewport(&mut self, viewport: ViewportHandle) {
        self.viewport = Some(viewport);
    }

    /// Detaches the viewport. A running driver self-terminates next frame.
    pub fn detach_viewport(&mut self) {
        self.viewport = None;
    }

    /// Registers a subscriber and delivers the current snapshot to it.
    pub fn subscribe<F>(&mut self, mut callback: F)
    where
        F: FnMut(FollowSnapshot) + Send + 'static,
    {
        let snapshot = self.snapshot();
        callback(snapshot.clone());
        self.last_published = Some(snapshot);
        self.subscribers.push(Box::new(callback));
    }

    /// Current state snapshot.
    pub fn snapshot(&self) -> FollowSnapshot {
        self.machine.snapshot(self.conversation_id.clone())
    }

    // ========================================================================
    // Event Entry Points
    // ========================================================================

    /// Handles a raw scroll notification from the host viewport.
    ///
    /// The immediate manual-scroll check runs synchronously here, before the
    /// event is admitted to the debounce gate, so a flick is never delayed
    /// by coalescing.
    pub fn handle_scroll_event(&mut self, metrics: ScrollMetrics, now: Instant) {
        if !metrics.is_valid() {
            debug!(?metrics, "ignoring inconsistent scroll metrics");
            return;
        }

        // Scroll events inside the settle window belong to our own
        // scroll-to-bottom animation, not the user.
        if self.settle_pending(now) {
            return;
        }

        let last_offset = self.machine.last_offset();
        let at_bottom = classify(&metrics, last_offset, self.config.bottom_threshold_px)
            == ScrollPosition::AtBottom;

        if !at_bottom
            && is_deliberate_upward(
                metrics.offset,
                last_offset,
                self.config.immediate_scroll_threshold_px,
            )
        {
            self.pause_from_user(metrics.offset);
        }

        self.gate.record(now, self.config.debounce_delay());
    }

    /// Advances timers and the frame loop to `now`.
    ///
    /// The runtime calls this once per frame while work is pending; tests
    /// call it with hand-built instants.
    pub fn on_tick(&mut self, now: Instant) {
        if self.settle_deadline.is_some_and(|deadline| now >= deadline) {
            self.settle_deadline = None;
            self.classification_pass();
        }

        if self.gate.take_due(now) {
            self.classification_pass();
        }

        let following = self.machine.is_following() && self.stream_active;
        self.driver.tick(following, self.viewport.as_deref());
    }

    /// A token stream started appending content.
    ///
    /// Forces a resume unless the user already navigated away; while paused
    /// by the user, streaming must not yank the viewport down.
    pub fn on_stream_started(&mut self, now: Instant) {
        self.stream_active = true;
        if self.machine.user_navigated_away() {
            return;
        }
        self.enable(now);
    }

    /// The token stream stopped.
    ///
    /// Ends the frame loop and drops any pending debounce or settle
    /// deadline; nothing armed during the stream may fire after it ends.
    pub fn on_stream_stopped(&mut self) {
        self.stream_active = false;
        self.cancel_all();
    }

    /// New content arrived outside of continuous-drive mode.
    ///
    /// Issues a one-shot follow when appropriate; while the driver runs it
    /// already re-pins every frame, and while paused nothing moves.
    pub fn on_content_appended(&mut self) {
        if self.machine.is_following() && !self.driver.is_active() {
            self.scroll_to_bottom(ScrollBehavior::Auto);
        }
    }

    /// The active conversation changed; state returns to defaults.
    ///
    /// Cancels every outstanding deadline and loop before the new id is
    /// recorded, so nothing scoped to the old conversation can still fire.
    pub fn on_conversation_changed(&mut self, id: String) {
        self.cancel_all();
        self.stream_active = false;
        self.machine.reset();
        self.conversation_id = Some(id);
        self.publish();
    }

    /// Explicit resume: jump to the bottom and follow again.
    ///
    /// Issues one smooth scroll instruction and opens the settle window so
    /// the animation's own scroll events are not mistaken for the user.
    pub fn enable(&mut self, now: Instant) {
        self.machine.enable();
        self.scroll_to_bottom(ScrollBehavior::Smooth);
        self.settle_deadline = Some(now + self.config.animation_duration());
        if self.stream_active {
            self.driver.start();
        }
        self.publish();
    }

    /// Explicit pause requested by the host.
    pub fn disable(&mut self) {
        self.machine.disable();
        self.driver.stop();
        self.publish();
    }

    /// Cancels the debounce gate, the settle timer, and the frame loop.
    ///
    /// Invoked atomically on reset and teardown; afterwards no stale
    /// deadline can mutate this controller.
    pub fn cancel_all(&mut self) {
        self.gate.cancel();
        self.driver.stop();
        self.settle_deadline = None;
    }

    /// Tears the controller down: cancels everything and drops the viewport
    /// handle and subscribers.
    pub fn teardown(&mut self) {
        self.cancel_all();
        self.stream_active = false;
        self.viewport = None;
        self.subscribers.clear();
    }

    // ========================================================================
    // Scheduler Pacing
    // ========================================================================

    /// Returns true if the frame loop needs per-frame ticks.
    pub fn needs_frame_pacing(&self) -> bool {
        self.driver.is_active()
    }

    /// Earliest pending deadline (debounce or settle), for the runtime's
    /// sleep calculation.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.gate.deadline(), self.settle_deadline) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (deadline, None) | (None, deadline) => deadline,
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// One debounced classification pass over fresh metrics.
    fn classification_pass(&mut self) {
        let Some(metrics) = self.read_metrics() else {
            return;
        };
        if !metrics.is_valid() {
            debug!(?metrics, "skipping pass: inconsistent metrics");
            return;
        }

        let last_offset = self.machine.last_offset();
        let position = classify(&metrics, last_offset, self.config.bottom_threshold_px);

        let deliberate = position != ScrollPosition::AtBottom
            && self.machine.is_following()
            && is_deliberate_upward(
                metrics.offset,
                last_offset,
                self.config.manual_scroll_threshold_px,
            );

        if deliberate {
            self.pause_from_user(metrics.offset);
            return;
        }

        let outcome = self.machine.observe_position(position, metrics.offset);
        if outcome == PositionOutcome::ImplicitResume && self.stream_active {
            self.driver.start();
        }
        self.publish();
    }

    /// Deliberate upward navigation: pause and stop the driver in this tick.
    fn pause_from_user(&mut self, offset: f64) {
        self.machine.disable();
        self.driver.stop();
        self.machine.set_last_offset(offset);
        self.publish();
    }

    /// Reads metrics from the viewport.
    ///
    /// Absent handle reads as zeroed metrics (never an error); a failing
    /// handle is logged and skips the pass, keeping prior state.
    fn read_metrics(&self) -> Option<ScrollMetrics> {
        let Some(viewport) = &self.viewport else {
            return Some(ScrollMetrics::ZERO);
        };
        match viewport.metrics() {
            Ok(metrics) => Some(metrics),
            Err(error) => {
                warn!(%error, "viewport metrics read failed; keeping prior state");
                None
            }
        }
    }

    /// Issues a scroll-to-bottom instruction, absorbing failures.
    fn scroll_to_bottom(&mut self, behavior: ScrollBehavior) {
        let Some(viewport) = &self.viewport else {
            return;
        };
        let target = match viewport.metrics() {
            Ok(metrics) => metrics.bottom_offset(),
            Err(error) => {
                warn!(%error, "viewport metrics read failed; skipping follow");
                return;
            }
        };
        if let Err(error) = viewport.scroll_to(target, behavior) {
            warn!(%error, "scroll-to-bottom failed; next content update retries");
        }
    }

    fn settle_pending(&self, now: Instant) -> bool {
        self.settle_deadline.is_some_and(|deadline| now < deadline)
    }

    /// Publishes a snapshot to subscribers if it differs from the last one.
    fn publish(&mut self) {
        let snapshot = self.snapshot();
        if self.last_published.as_ref() == Some(&snapshot) {
            return;
        }
        for subscriber in &mut self.subscribers {
            subscriber(snapshot.clone());
        }
        self.last_published = Some(snapshot);
    }
}

impl Drop for FollowController {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
