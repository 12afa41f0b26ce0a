//! Sun score representation shared by every scoring stage.
//!
//! Scores are integers in `0..=100`. Every boundary that produces a score
//! (input parsing, interpolation, kernel blending) funnels through
//! [`clamp_score`], so non-finite or out-of-range values never escape.

/// Highest possible sun score.
pub const MAX_SCORE: u8 = 100;

/// Round and clamp a raw score into `0..=100`.
///
/// Non-finite input maps to `0`.
///
/// # Examples
/// ```
/// use sunseat_core::clamp_score;
///
/// assert_eq!(clamp_score(64.5), 65);
/// assert_eq!(clamp_score(-12.0), 0);
/// assert_eq!(clamp_score(180.0), 100);
/// assert_eq!(clamp_score(f64::NAN), 0);
/// ```
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "value is clamped to 0..=100 and rounded before the cast"
)]
pub fn clamp_score(raw: f64) -> u8 {
    if !raw.is_finite() {
        return 0;
    }
    raw.clamp(0.0, f64::from(MAX_SCORE)).round() as u8
}

/// Clamp a value into the unit interval, mapping non-finite input to `0.0`.
#[must_use]
pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
