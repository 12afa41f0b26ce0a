//! Direct-sunlight exposure scoring.
//!
//! [`score_exposure`] relates the sun's position to the way a terrace faces
//! and to the street it sits on. The thresholds below are the whole model:
//!
//! | Term        | Condition                     | Contribution |
//! |-------------|-------------------------------|--------------|
//! | alignment   | `diff < 45`                   | `+55`        |
//! |             | `45 <= diff < 90`             | `+35`        |
//! |             | otherwise                     | `+10`        |
//! | altitude    | `alt < 8`                     | `-30`        |
//! |             | `8 <= alt < 15`               | `-15`        |
//! |             | otherwise                     | `+10`        |
//! | street      | `alt < 20`                    | `-15` / `-5` / `0` |
//!
//! An optional cloud fraction scales the running total by
//! `1 - 0.6 * cloud`. The total is clamped to `0..=100` and rounded.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Orientation, StreetWidth, clamp_score, score::clamp_unit};

/// Position of the sun as seen from a terrace.
///
/// Azimuth is measured in degrees clockwise from true north (0 = N,
/// 90 = E, 180 = S, 270 = W), the same convention as [`Orientation`].
/// Altitude is degrees above the horizon and negative below it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SunPosition {
    /// Clockwise bearing from north, in degrees.
    pub azimuth_deg: f64,
    /// Elevation above the horizon, in degrees.
    pub altitude_deg: f64,
}

impl SunPosition {
    /// Construct a position from azimuth and altitude in degrees.
    #[must_use]
    pub const fn new(azimuth_deg: f64, altitude_deg: f64) -> Self {
        Self {
            azimuth_deg,
            altitude_deg,
        }
    }

    /// Whether the sun is above the horizon.
    #[must_use]
    pub fn is_up(&self) -> bool {
        self.altitude_deg > 0.0
    }
}

/// Coarse bucket describing a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExposureLabel {
    /// Score above 66.
    Sun,
    /// Score above 33 and at most 66.
    Mixed,
    /// Score at most 33.
    Shade,
}

/// Error returned when parsing an unknown exposure label.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown exposure label '{0}'")]
pub struct ParseExposureLabelError(pub String);

impl ExposureLabel {
    /// Bucket a score.
    #[must_use]
    pub const fn for_score(score: u8) -> Self {
        if score > 66 {
            Self::Sun
        } else if score > 33 {
            Self::Mixed
        } else {
            Self::Shade
        }
    }

    /// Return the label as a `&str`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sun => "Sun",
            Self::Mixed => "Mixed",
            Self::Shade => "Shade",
        }
    }
}

impl std::fmt::Display for ExposureLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExposureLabel {
    type Err = ParseExposureLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sun" => Ok(Self::Sun),
            "mixed" => Ok(Self::Mixed),
            "shade" => Ok(Self::Shade),
            _ => Err(ParseExposureLabelError(s.to_owned())),
        }
    }
}

/// Result of [`score_exposure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exposure {
    /// Sun score in `0..=100`.
    pub score: u8,
    /// Bucket for `score`.
    pub label: ExposureLabel,
}

impl Exposure {
    /// Wrap a score together with its label.
    #[must_use]
    pub const fn from_score(score: u8) -> Self {
        Self {
            score,
            label: ExposureLabel::for_score(score),
        }
    }
}

/// Score how much direct sun a terrace receives.
///
/// `cloud_fraction` is the sky cover in `0.0..=1.0`; values outside that
/// range are clamped and non-finite values are ignored.
///
/// # Examples
/// ```
/// use sunseat_core::{ExposureLabel, Orientation, StreetWidth, SunPosition, score_exposure};
///
/// let exposure = score_exposure(
///     SunPosition::new(180.0, 30.0),
///     Orientation::SOUTH,
///     StreetWidth::Wide,
///     None,
/// );
/// assert_eq!(exposure.score, 65);
/// assert_eq!(exposure.label, ExposureLabel::Mixed);
/// ```
#[must_use]
#[expect(clippy::float_arithmetic, reason = "scoring sums weighted terms")]
pub fn score_exposure(
    sun: SunPosition,
    orientation: Orientation,
    street_width: StreetWidth,
    cloud_fraction: Option<f64>,
) -> Exposure {
    let diff = orientation.difference(sun.azimuth_deg);
    let altitude = sun.altitude_deg;

    let mut score = alignment_term(diff) + altitude_term(altitude);
    if altitude < 20.0 {
        score -= street_width.low_sun_penalty();
    }
    if let Some(cloud) = cloud_fraction.filter(|c| c.is_finite()) {
        score *= 1.0 - 0.6 * clamp_unit(cloud);
    }

    Exposure::from_score(clamp_score(score))
}

fn alignment_term(diff: f64) -> f64 {
    if diff < 45.0 {
        55.0
    } else if diff < 90.0 {
        35.0
    } else {
        10.0
    }
}

fn altitude_term(altitude: f64) -> f64 {
    if altitude < 8.0 {
        -30.0
    } else if altitude < 15.0 {
        -15.0
    } else {
        10.0
    }
}
