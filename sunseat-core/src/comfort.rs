//! Overall comfort combining sun, temperature and wind.

use serde::{Deserialize, Serialize};

use crate::{StreetWidth, clamp_score, score::clamp_unit};

/// Centre of the ideal temperature band, in °C.
pub const IDEAL_TEMPERATURE_C: f64 = 22.5;

/// Deviation from the ideal at which the temperature score reaches zero.
pub const TEMPERATURE_TOLERANCE_C: f64 = 9.0;

/// Wind speed below which wind causes no discomfort, in m/s.
pub const CALM_WIND_MS: f64 = 2.0;

/// Wind speed range over which the penalty grows from 0 to 1.
pub const WIND_PENALTY_SPAN_MS: f64 = 8.0;

const UNKNOWN_TEMPERATURE_SCORE: f64 = 0.7;
const UNKNOWN_WIND_PENALTY: f64 = 0.1;

const SUN_WEIGHT: f64 = 0.6;
const TEMPERATURE_WEIGHT: f64 = 0.35;
const WIND_WEIGHT: f64 = 0.25;

/// Current conditions at the search centre.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    /// Air temperature in °C.
    pub temp_c: Option<f64>,
    /// Wind speed in m/s.
    pub wind_ms: Option<f64>,
}

#[expect(clippy::float_arithmetic, reason = "temperature scoring")]
fn temperature_score(temp_c: Option<f64>) -> f64 {
    match temp_c {
        Some(t) if t.is_finite() => {
            clamp_unit(1.0 - (t - IDEAL_TEMPERATURE_C).abs() / TEMPERATURE_TOLERANCE_C)
        }
        _ => UNKNOWN_TEMPERATURE_SCORE,
    }
}

#[expect(clippy::float_arithmetic, reason = "wind scoring")]
fn wind_penalty(wind_ms: Option<f64>, street_width: Option<StreetWidth>) -> f64 {
    match wind_ms {
        Some(w) if w.is_finite() => {
            let shelter = street_width.map_or(1.0, StreetWidth::wind_exposure);
            clamp_unit((w - CALM_WIND_MS) / WIND_PENALTY_SPAN_MS) * shelter
        }
        _ => UNKNOWN_WIND_PENALTY,
    }
}

/// Blend a sun score with the weather into a `0..=100` comfort score.
///
/// Temperature peaks at 22.5 °C and fades to nothing 9 °C either side. Wind
/// is free up to 2 m/s and fully penalised at 10 m/s, softened on narrower
/// streets. Unknown readings use neutral defaults.
///
/// # Examples
/// ```
/// use sunseat_core::{StreetWidth, comfort_score};
///
/// assert_eq!(comfort_score(80, Some(22.5), Some(2.0), Some(StreetWidth::Medium)), 83);
/// assert_eq!(comfort_score(0, None, None, None), 22);
/// ```
#[must_use]
#[expect(clippy::float_arithmetic, reason = "weighted blend")]
pub fn comfort_score(
    sun_score: u8,
    temp_c: Option<f64>,
    wind_ms: Option<f64>,
    street_width: Option<StreetWidth>,
) -> u8 {
    let sun = clamp_unit(f64::from(sun_score) / 100.0);
    let base = SUN_WEIGHT.mul_add(
        sun,
        TEMPERATURE_WEIGHT.mul_add(
            temperature_score(temp_c),
            -WIND_WEIGHT * wind_penalty(wind_ms, street_width),
        ),
    );
    clamp_score(clamp_unit(base) * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(100, Some(22.5), Some(0.0), None, 95)]
    #[case(100, Some(31.5), Some(0.0), None, 60)]
    #[case(100, Some(13.5), Some(0.0), None, 60)]
    #[case(0, Some(40.0), Some(20.0), Some(StreetWidth::Wide), 0)]
    #[case(50, None, Some(6.0), Some(StreetWidth::Narrow), 48)]
    #[case(50, None, Some(6.0), Some(StreetWidth::Wide), 42)]
    #[case(50, Some(f64::NAN), Some(f64::INFINITY), None, 52)]
    fn blends_sun_and_weather(
        #[case] sun: u8,
        #[case] temp: Option<f64>,
        #[case] wind: Option<f64>,
        #[case] width: Option<StreetWidth>,
        #[case] expected: u8,
    ) {
        assert_eq!(comfort_score(sun, temp, wind, width), expected);
    }

    #[rstest]
    fn narrow_streets_shelter_from_wind() {
        let narrow = comfort_score(70, Some(20.0), Some(8.0), Some(StreetWidth::Narrow));
        let wide = comfort_score(70, Some(20.0), Some(8.0), Some(StreetWidth::Wide));
        assert!(narrow > wide);
    }
}
