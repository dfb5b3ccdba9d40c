//! Controller configuration.
//!
//! All thresholds and delays are fixed per controller instance; a new
//! conversation view constructs a new controller with its own config.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Pixel tolerance within which the viewport counts as "at the bottom".
const DEFAULT_BOTTOM_THRESHOLD_PX: f64 = 50.0;

/// Trailing debounce window for the classification pass.
const DEFAULT_DEBOUNCE_DELAY_MS: u64 = 100;

/// Duration of the smooth scroll-to-bottom animation issued by `enable()`.
const DEFAULT_ANIMATION_DURATION_MS: u64 = 300;

/// Upward delta (debounced pass) treated as deliberate navigation.
const DEFAULT_MANUAL_SCROLL_THRESHOLD_PX: f64 = 10.0;

/// Upward delta (immediate path) that cancels the driver in the same tick.
///
/// Stricter than the debounced threshold so that event noise cannot stop a
/// running driver; a genuine flick easily clears it.
const DEFAULT_IMMEDIATE_SCROLL_THRESHOLD_PX: f64 = 25.0;

/// Tuning for the auto-follow controller.
///
/// Deserializable so hosts can carry it inside their own config files;
/// every field falls back to its default when omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowConfig {
    /// Distance from the bottom (px) still considered `AtBottom`.
    pub bottom_threshold_px: f64,
    /// Debounce window (ms) for the classification pass.
    pub debounce_delay_ms: u64,
    /// Smooth-scroll animation duration (ms); also the settle window during
    /// which scroll events are attributed to the animation, not the user.
    pub animation_duration_ms: u64,
    /// Upward delta (px) the debounced pass treats as deliberate.
    pub manual_scroll_threshold_px: f64,
    /// Upward delta (px) the immediate path treats as deliberate.
    pub immediate_scroll_threshold_px: f64,
}

impl Default for FollowConfig {
    fn default() -> Self {
        Self {
            bottom_threshold_px: DEFAULT_BOTTOM_THRESHOLD_PX,
            debounce_delay_ms: DEFAULT_DEBOUNCE_DELAY_MS,
            animation_duration_ms: DEFAULT_ANIMATION_DURATION_MS,
            manual_scroll_threshold_px: DEFAULT_MANUAL_SCROLL_THRESHOLD_PX,
            immediate_scroll_threshold_px: DEFAULT_IMMEDIATE_SCROLL_THRESHOLD_PX,
        }
    }
}

impl FollowConfig {
    /// Debounce window as a `Duration`.
    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_delay_ms)
    }

    /// Animation settle window as a `Duration`.
    pub fn animation_duration(&self) -> Duration {
        Duration::from_millis(self.animation_duration_ms)
    }
}
