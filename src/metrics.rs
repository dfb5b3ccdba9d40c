//! Scroll metrics and position classification.
//!
//! Metrics are read fresh from the viewport on every classification pass and
//! never cached across passes; the position enum is derived from them, not
//! stored as ground truth.

/// Raw numbers describing a scrollable viewport.
///
/// All values are pixels; fractional offsets are common on real hosts.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollMetrics {
    /// Current scroll offset from the top of the content.
    pub offset: f64,
    /// Total content extent.
    pub content_extent: f64,
    /// Visible extent of the viewport.
    pub viewport_extent: f64,
}

impl ScrollMetrics {
    /// Zeroed metrics, returned when no viewport handle is attached.
    pub const ZERO: Self = Self {
        offset: 0.0,
        content_extent: 0.0,
        viewport_extent: 0.0,
    };

    /// Creates metrics from raw values.
    pub fn new(offset: f64, content_extent: f64, viewport_extent: f64) -> Self {
        Self {
            offset,
            content_extent,
            viewport_extent,
        }
    }

    /// Returns true if the extents are internally consistent.
    ///
    /// Requires `content_extent >= viewport_extent >= 0` and finite values.
    /// Invalid metrics cause the classification pass to be skipped.
    pub fn is_valid(&self) -> bool {
        self.offset.is_finite()
            && self.content_extent.is_finite()
            && self.viewport_extent.is_finite()
            && self.viewport_extent >= 0.0
            && self.content_extent >= self.viewport_extent
    }

    /// Pixels of content below the bottom edge of the viewport.
    ///
    /// Negative when the viewport overshoots the end of the content, which
    /// hosts report during elastic overscroll; that still counts as bottom.
    pub fn distance_from_bottom(&self) -> f64 {
        self.content_extent - self.offset - self.viewport_extent
    }

    /// Offset that pins the bottom of the content to the viewport.
    pub fn bottom_offset(&self) -> f64 {
        (self.content_extent - self.viewport_extent).max(0.0)
    }
}

/// Classified scroll position, recomputed from metrics each pass.
///
/// `MovingUp` is purely observational: the offset decreased since the last
/// sample. Whether that movement is deliberate is the detector's call, not
/// the classifier's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollPosition {
    /// Within the bottom threshold band.
    AtBottom,
    /// Offset decreased since the last sample (heading toward the top).
    MovingUp,
    /// Resting above the bottom band.
    ScrolledUp,
}

/// Maps metrics plus the previous offset to a position.
///
/// The bottom band test wins regardless of movement direction, so overscroll
/// past the end and small settles inside the band both read as `AtBottom`.
pub fn classify(
    metrics: &ScrollMetrics,
    last_offset: f64,
    bottom_threshold_px: f64,
) -> ScrollPosition {
    if metrics.distance_from_bottom() <= bottom_threshold_px {
        ScrollPosition::AtBottom
    } else if metrics.offset < last_offset {
        ScrollPosition::MovingUp
    } else {
        ScrollPosition::ScrolledUp
    }
}
