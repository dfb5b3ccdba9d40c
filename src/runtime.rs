//! Runtime - owns the controller, drains the inbox, paces the frame loop.
//!
//! All scheduling lives here so the controller stays deterministic. Events
//! from collaborators arrive through an inbox channel and are dispatched in
//! arrival order; between events the loop sleeps either a frame (while the
//! continuous driver runs) or until the next pending deadline, falling back
//! to a long idle poll when nothing is outstanding.
//!
//! Shutdown goes through a `CancellationToken`: cancelling it tears the
//! controller down (timers, loop, viewport handle) before the task exits,
//! so no callback can outlive the conversation view that owned it.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::FollowConfig;
use crate::controller::FollowController;
use crate::events::PaneEvent;
use crate::metrics::ScrollMetrics;
use crate::viewport::ViewportHandle;

/// Frame cadence while the continuous driver is active (~60fps).
pub const FRAME_DURATION: Duration = Duration::from_millis(16);

/// Poll cadence when no driver, debounce, or settle work is pending.
pub const IDLE_POLL_DURATION: Duration = Duration::from_millis(100);

/// Cloneable handle for feeding events to a running [`FollowRuntime`].
#[derive(Debug, Clone)]
pub struct FollowHandle {
    tx: mpsc::UnboundedSender<PaneEvent>,
    cancel: CancellationToken,
}

impl FollowHandle {
    /// Sends an event to the runtime inbox.
    ///
    /// Events sent after shutdown are dropped silently; the controller they
    /// were meant for no longer exists.
    pub fn send(&self, event: PaneEvent) {
        let _ = self.tx.send(event);
    }

    /// Forwards a raw scroll notification.
    pub fn scroll(&self, metrics: ScrollMetrics) {
        self.send(PaneEvent::Scroll(metrics));
    }

    /// Notifies that a token stream started.
    pub fn stream_started(&self) {
        self.send(PaneEvent::StreamStarted);
    }

    /// Notifies that the token stream stopped.
    pub fn stream_stopped(&self) {
        self.send(PaneEvent::StreamStopped);
    }

    /// Notifies that content was appended to the viewport.
    pub fn content_appended(&self) {
        self.send(PaneEvent::ContentAppended);
    }

    /// Notifies that the active conversation changed.
    pub fn conversation_changed(&self, id: impl Into<String>) {
        self.send(PaneEvent::ConversationChanged(id.into()));
    }

    /// Requests an explicit resume (the "jump to latest" affordance).
    pub fn enable(&self) {
        self.send(PaneEvent::Enable);
    }

    /// Requests an explicit pause.
    pub fn disable(&self) {
        self.send(PaneEvent::Disable);
    }

    /// Stops the runtime and tears the controller down.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

/// Event loop wrapper around a [`FollowController`].
pub struct FollowRuntime {
    controller: FollowController,
    inbox_rx: mpsc::UnboundedReceiver<PaneEvent>,
    inbox_tx: mpsc::UnboundedSender<PaneEvent>,
    cancel: CancellationToken,
}

impl FollowRuntime {
    /// Creates a runtime with no viewport attached.
    pub fn new(config: FollowConfig) -> Self {
        Self::from_controller(FollowController::new(config))
    }

    /// Creates a runtime bound to a viewport.
    pub fn with_viewport(config: FollowConfig, viewport: ViewportHandle) -> Self {
        Self::from_controller(FollowController::with_viewport(config, viewport))
    }

    fn from_controller(controller: FollowController) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        Self {
            controller,
            inbox_rx,
            inbox_tx,
            cancel: CancellationToken::new(),
        }
    }

    /// Access to the controller, e.g. to subscribe before `run`.
    pub fn controller_mut(&mut self) -> &mut FollowController {
        &mut self.controller
    }

    /// Returns a handle for feeding events and shutting down.
    pub fn handle(&self) -> FollowHandle {
        FollowHandle {
            tx: self.inbox_tx.clone(),
            cancel: self.cancel.clone(),
        }
    }

    /// Runs the event loop until shutdown or all handles are dropped.
    pub async fn run(mut self) {
        debug!("auto-follow runtime started");
        let cancel = self.cancel.clone();

        loop {
            let wait = self.poll_duration();

            tokio::select! {
                () = cancel.cancelled() => break,
                event = self.inbox_rx.recv() => {
                    let Some(event) = event else { break };
                    self.dispatch(event);
                    // Drain whatever else arrived; ordering is preserved and
                    // the tick below runs once for the whole batch.
                    while let Ok(event) = self.inbox_rx.try_recv() {
                        self.dispatch(event);
                    }
                }
                () = tokio::time::sleep(wait) => {}
            }

            self.controller.on_tick(tokio::time::Instant::now().into_std());
        }

        self.controller.teardown();
        debug!("auto-follow runtime stopped");
    }

    /// How long to sleep when the inbox is quiet.
    fn poll_duration(&self) -> Duration {
        if self.controller.needs_frame_pacing() {
            return FRAME_DURATION;
        }
        if let Some(deadline) = self.controller.next_deadline() {
            let now = tokio::time::Instant::now().into_std();
            return deadline.saturating_duration_since(now).min(IDLE_POLL_DURATION);
        }
        IDLE_POLL_DURATION
    }

    /// Routes one inbox event to the matching controller entry point.
    fn dispatch(&mut self, event: PaneEvent) {
        let now = tokio::time::Instant::now().into_std();
        match event {
            PaneEvent::Scroll(metrics) => self.controller.handle_scroll_event(metrics, now),
            PaneEvent::StreamStarted => self.controller.on_stream_started(now),
            PaneEvent::StreamStopped => self.controller.on_stream_stopped(),
            PaneEvent::ContentAppended => self.controller.on_content_appended(),
            PaneEvent::ConversationChanged(id) => self.controller.on_conversation_changed(id),
            PaneEvent::Enable => self.controller.enable(now),
            PaneEvent::Disable => self.controller.disable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::viewport::RecordingViewport;

    fn test_config() -> FollowConfig {
        FollowConfig::default()
    }

    #[tokio::test(start_paused = true)]
    async fn runtime_pins_viewport_while_streaming() {
        let viewport = Arc::new(RecordingViewport::new(ScrollMetrics::new(
            850.0, 1000.0, 150.0,
        )));
        let runtime = FollowRuntime::with_viewport(test_config(), viewport.clone());
        let handle = runtime.handle();
        let join = tokio::spawn(runtime.run());

        handle.stream_started();
        tokio::time::sleep(Duration::from_millis(800)).await;

        // One resume jump plus a frame-paced stream of pins
        assert!(viewport.instruction_count() > 5);

        handle.shutdown();
        join.await.expect("runtime task");
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_instructions() {
        let viewport = Arc::new(RecordingViewport::new(ScrollMetrics::new(
            850.0, 1000.0, 150.0,
        )));
        let runtime = FollowRuntime::with_viewport(test_config(), viewport.clone());
        let handle = runtime.handle();
        let join = tokio::spawn(runtime.run());

        handle.stream_started();
        tokio::time::sleep(Duration::from_millis(400)).await;
        handle.shutdown();
        join.await.expect("runtime task");

        let after = viewport.instruction_count();
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(viewport.instruction_count(), after);
    }

    #[tokio::test(start_paused = true)]
    async fn events_keep_arrival_order() {
        let viewport = Arc::new(RecordingViewport::new(ScrollMetrics::new(
            850.0, 1000.0, 150.0,
        )));
        let mut runtime = FollowRuntime::with_viewport(test_config(), viewport.clone());
        let (tx, mut rx) = mpsc::unbounded_channel();
        runtime.controller_mut().subscribe(move |snap| {
            let _ = tx.send(snap);
        });
        let handle = runtime.handle();
        let join = tokio::spawn(runtime.run());

        // Pause, then switch conversations: the final state must be the
        // reset one, not the pause.
        handle.disable();
        handle.conversation_changed("c2");
        tokio::time::sleep(Duration::from_millis(200)).await;

        let mut last = None;
        while let Ok(snap) = rx.try_recv() {
            last = Some(snap);
        }
        let last = last.expect("at least one snapshot");
        assert!(last.enabled);
        assert_eq!(last.conversation_id.as_deref(), Some("c2"));

        handle.shutdown();
        join.await.expect("runtime task");
    }
}
