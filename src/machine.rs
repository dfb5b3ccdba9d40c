//! Auto-scroll state machine.
//!
//! Holds whether auto-follow is enabled, whether the user has navigated away
//! from the bottom, and the latest position classification. All other
//! components request transitions through the methods here; none mutate the
//! state directly. Observers receive immutable [`FollowSnapshot`]s taken
//! after each transition, never a live reference.

use tracing::debug;

use crate::metrics::ScrollPosition;

/// Logical state derived from the two flags.
///
/// `FOLLOWING` is `enabled && !user_navigated_away`; `PAUSED` is the inverse
/// pair. Position is orthogonal metadata, not a third state dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowMode {
    /// Auto-follow active; the pane tracks the newest content.
    Following,
    /// The user navigated away; the pane holds its position.
    Paused,
}

/// Immutable state snapshot published to subscribers after each transition.
#[derive(Debug, Clone, PartialEq)]
pub struct FollowSnapshot {
    /// Whether auto-follow is enabled.
    pub enabled: bool,
    /// Whether the user deliberately navigated away from the bottom.
    pub user_navigated_away: bool,
    /// Latest position classification.
    pub position: ScrollPosition,
    /// Whether the host should show its "resume auto-scroll" affordance.
    pub show_resume_affordance: bool,
    /// Conversation the snapshot belongs to, for host-side correlation.
    pub conversation_id: Option<String>,
}

/// Outcome of feeding a classified position into the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionOutcome {
    /// No state change.
    Unchanged,
    /// The user scrolled back to the bottom while paused; following resumed
    /// without an explicit jump (they are already there).
    ImplicitResume,
}

/// The authoritative auto-follow state.
///
/// Created in following mode when a conversation becomes active, reset to the
/// same defaults on conversation change, and discarded on teardown.
#[derive(Debug)]
pub struct AutoScrollMachine {
    enabled: bool,
    user_navigated_away: bool,
    position: ScrollPosition,
    last_offset: f64,
}

impl Default for AutoScrollMachine {
    fn default() -> Self {
        Self {
            enabled: true,
            user_navigated_away: false,
            position: ScrollPosition::AtBottom,
            last_offset: 0.0,
        }
    }
}

impl AutoScrollMachine {
    /// Creates a machine in following mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current logical mode.
    pub fn mode(&self) -> FollowMode {
        if self.enabled && !self.user_navigated_away {
            FollowMode::Following
        } else {
            FollowMode::Paused
        }
    }

    /// Returns true if auto-follow is active.
    pub fn is_following(&self) -> bool {
        self.mode() == FollowMode::Following
    }

    /// Returns true if the user deliberately navigated away.
    pub fn user_navigated_away(&self) -> bool {
        self.user_navigated_away
    }

    /// Latest position classification.
    pub fn position(&self) -> ScrollPosition {
        self.position
    }

    /// Offset recorded by the last accepted sample.
    pub fn last_offset(&self) -> f64 {
        self.last_offset
    }

    /// Records the latest sampled offset without a full classification pass.
    ///
    /// Used by the immediate detection path so the next comparison starts
    /// from the event that was just handled.
    pub fn set_last_offset(&mut self, offset: f64) {
        self.last_offset = offset;
    }

    /// Explicit resume: user invoked the affordance, a new conversation
    /// started, or streaming started while not paused by the user.
    ///
    /// Idempotent; the caller issues the jump-to-bottom instruction.
    pub fn enable(&mut self) {
        if !self.is_following() {
            debug!("auto-follow enabled");
        }
        self.enabled = true;
        self.user_navigated_away = false;
        self.position = ScrollPosition::AtBottom;
    }

    /// Deliberate upward navigation detected; stop following.
    pub fn disable(&mut self) {
        if self.is_following() {
            debug!("auto-follow paused: user navigated away");
        }
        self.enabled = false;
        self.user_navigated_away = true;
        self.position = ScrollPosition::ScrolledUp;
    }

    /// Feeds a classified position into the machine.
    ///
    /// Transitions back to following when the classifier reports `AtBottom`
    /// while paused (the user scrolled back down manually).
    pub fn observe_position(&mut self, position: ScrollPosition, offset: f64) -> PositionOutcome {
        self.position = position;
        self.last_offset = offset;

        if position == ScrollPosition::AtBottom && !self.is_following() {
            debug!("auto-follow resumed: user returned to bottom");
            self.enabled = true;
            self.user_navigated_away = false;
            PositionOutcome::ImplicitResume
        } else {
            PositionOutcome::Unchanged
        }
    }

    /// Unconditionally returns to the initial following state.
    ///
    /// Idempotent. Timer and loop cancellation is the controller's job.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Takes an immutable snapshot for publication.
    pub fn snapshot(&self, conversation_id: Option<String>) -> FollowSnapshot {
        FollowSnapshot {
            enabled: self.enabled,
            user_navigated_away: self.user_navigated_away,
            position: self.position,
            show_resume_affordance: self.user_navigated_away
                && self.position != ScrollPosition::AtBottom,
            conversation_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_following_at_bottom() {
        let machine = AutoScrollMachine::new();
        assert_eq!(machine.mode(), FollowMode::Following);
        assert_eq!(machine.position(), ScrollPosition::AtBottom);
        assert!(!machine.user_navigated_away());
    }

    #[test]
    fn disable_pauses_and_marks_navigated_away() {
        let mut machine = AutoScrollMachine::new();
        machine.disable();
        assert_eq!(machine.mode(), FollowMode::Paused);
        assert!(machine.user_navigated_away());
        assert_eq!(machine.position(), ScrollPosition::ScrolledUp);
    }

    #[test]
    fn enable_is_idempotent() {
        let mut machine = AutoScrollMachine::new();
        machine.disable();
        machine.enable();
        let once = machine.snapshot(None);
        machine.enable();
        let twice = machine.snapshot(None);
        assert_eq!(once, twice);
        assert!(machine.is_following());
        assert_eq!(machine.position(), ScrollPosition::AtBottom);
    }

    #[test]
    fn at_bottom_while_paused_resumes_implicitly() {
        let mut machine = AutoScrollMachine::new();
        machine.disable();
        let outcome = machine.observe_position(ScrollPosition::AtBottom, 850.0);
        assert_eq!(outcome, PositionOutcome::ImplicitResume);
        assert!(machine.is_following());
        assert_eq!(machine.last_offset(), 850.0);
    }

    #[test]
    fn at_bottom_while_following_is_unchanged() {
        let mut machine = AutoScrollMachine::new();
        let outcome = machine.observe_position(ScrollPosition::AtBottom, 850.0);
        assert_eq!(outcome, PositionOutcome::Unchanged);
    }

    #[test]
    fn scrolled_up_while_paused_stays_paused() {
        let mut machine = AutoScrollMachine::new();
        machine.disable();
        let outcome = machine.observe_position(ScrollPosition::ScrolledUp, 400.0);
        assert_eq!(outcome, PositionOutcome::Unchanged);
        assert_eq!(machine.mode(), FollowMode::Paused);
    }

    #[test]
    fn reset_restores_defaults_from_any_state() {
        let mut machine = AutoScrollMachine::new();
        machine.disable();
        machine.set_last_offset(123.0);
        machine.reset();
        assert!(machine.is_following());
        assert!(!machine.user_navigated_away());
        assert_eq!(machine.position(), ScrollPosition::AtBottom);
        assert_eq!(machine.last_offset(), 0.0);

        // Idempotent
        machine.reset();
        assert!(machine.is_following());
    }

    #[test]
    fn snapshot_derives_resume_affordance() {
        let mut machine = AutoScrollMachine::new();
        assert!(!machine.snapshot(None).show_resume_affordance);

        machine.disable();
        assert!(machine.snapshot(None).show_resume_affordance);

        // Paused but physically at the bottom: implicit resume clears it
        machine.observe_position(ScrollPosition::AtBottom, 850.0);
        assert!(!machine.snapshot(None).show_resume_affordance);
    }

    #[test]
    fn snapshot_carries_conversation_id() {
        let machine = AutoScrollMachine::new();
        let snap = machine.snapshot(Some("c1".to_string()));
        assert_eq!(snap.conversation_id.as_deref(), Some("c1"));
    }
}
