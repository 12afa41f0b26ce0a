//! Compass bearing a terrace faces.

use serde::{Deserialize, Serialize};

/// Fold a bearing into the compass range.
///
/// The value is reduced modulo 360, negative remainders are shifted up by
/// 360, and the result is clamped to `0.0..=360.0`. A bearing of exactly 360
/// therefore folds to 0. Non-finite input maps to 0.
///
/// # Examples
/// ```
/// use sunseat_core::normalize_degrees;
///
/// assert_eq!(normalize_degrees(-10.0), 350.0);
/// assert_eq!(normalize_degrees(370.0), 10.0);
/// assert_eq!(normalize_degrees(360.0), 0.0);
/// ```
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "bearing normalisation is modular float arithmetic"
)]
pub fn normalize_degrees(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let folded = degrees % 360.0;
    let positive = if folded < 0.0 { folded + 360.0 } else { folded };
    // Tiny negative remainders round up to exactly 360.0 when shifted.
    if positive >= 360.0 {
        return 0.0;
    }
    // `-0.0 % 360.0` stays negative zero.
    (positive + 0.0).clamp(0.0, 360.0)
}

/// A normalised compass bearing: 0 = north, 90 = east, 180 = south,
/// 270 = west.
///
/// Construction always folds the bearing through [`normalize_degrees`].
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Orientation(f64);

impl Orientation {
    /// Due south, the orientation that collects the most sun in the northern
    /// hemisphere.
    pub const SOUTH: Self = Self(180.0);

    /// Normalise `degrees` into an orientation.
    #[must_use]
    pub fn new(degrees: f64) -> Self {
        Self(normalize_degrees(degrees))
    }

    /// Bearing in degrees.
    #[must_use]
    pub const fn degrees(self) -> f64 {
        self.0
    }

    /// Smallest angle between this bearing and `other`, in `0.0..=180.0`.
    ///
    /// `other_degrees` is normalised first, so any finite bearing works.
    #[must_use]
    #[expect(clippy::float_arithmetic, reason = "angular difference")]
    pub fn difference(self, other_degrees: f64) -> f64 {
        let raw = (normalize_degrees(other_degrees) - self.0).abs();
        raw.min(360.0 - raw)
    }
}

impl From<f64> for Orientation {
    fn from(degrees: f64) -> Self {
        Self::new(degrees)
    }
}

impl From<Orientation> for f64 {
    fn from(orientation: Orientation) -> Self {
        orientation.0
    }
}
