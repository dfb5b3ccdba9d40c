//! Manual-scroll detection.
//!
//! Compares consecutive offsets to decide whether a scroll event represents
//! deliberate user navigation, as opposed to noise or a programmatic jump.
//! Programmatic jumps to the bottom move the offset *down* (it increases),
//! so an upward delta over the threshold can only come from the user.
//!
//! Two thresholds exist: the immediate/synchronous path inside the scroll
//! handler uses the stricter one and always runs before any debounced work,
//! so a rapid flick cancels the continuous driver in the same tick. The
//! debounced classification pass re-checks with the looser threshold.

/// Returns true if the move from `last_offset` to `offset` is deliberate
/// upward navigation under the given threshold.
pub fn is_deliberate_upward(offset: f64, last_offset: f64, threshold_px: f64) -> bool {
    let delta = last_offset - offset;
    delta > threshold_px && offset < last_offset
}
