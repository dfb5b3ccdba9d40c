//! Event intake types.
//!
//! Collaborators (the token stream, the message list, the conversation
//! switcher, the resume affordance) feed the controller through this single
//! enum. The runtime drains its inbox and dispatches each event to the
//! matching controller entry point, preserving arrival order.

use crate::metrics::ScrollMetrics;

/// An event delivered to the auto-follow controller.
#[derive(Debug, Clone, PartialEq)]
pub enum PaneEvent {
    /// Raw scroll notification from the host viewport.
    Scroll(ScrollMetrics),
    /// A token stream started appending to the viewport.
    StreamStarted,
    /// The token stream stopped.
    StreamStopped,
    /// Content was appended outside of continuous-drive mode
    /// (a new message, or a token while no stream state is tracked).
    ContentAppended,
    /// The active conversation changed; the controller resets.
    ConversationChanged(String),
    /// Explicit resume, e.g. the "jump to latest" affordance.
    Enable,
    /// Explicit pause requested by the host.
    Disable,
}
