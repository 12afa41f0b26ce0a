//! Sun position as a pluggable capability.
//!
//! Scoring only needs an azimuth and an altitude. [`SolarPositionProvider`]
//! abstracts where they come from so callers can plug in an ephemeris
//! service or a fixed position in tests. [`NoaaSolarPosition`] implements
//! the NOAA solar calculator equations, accurate to a fraction of a degree
//! for dates near the present.
//!
//! Azimuths are degrees clockwise from true north, the same convention as
//! [`Orientation`].

use chrono::{DateTime, NaiveDate, TimeDelta, Timelike, Utc};
use geo::Coord;
use serde::{Deserialize, Serialize};

use crate::{Exposure, Orientation, StreetWidth, SunPosition, normalize_degrees, score_exposure};

/// Altitude at which the evening golden hour begins, in degrees.
pub const GOLDEN_HOUR_ALTITUDE: f64 = 6.0;

/// Altitude of the sun's centre at apparent sunset, in degrees.
pub const SUNSET_ALTITUDE: f64 = -0.833;

/// Furthest offset, in minutes, that [`minutes_bucket`] returns.
pub const MAX_BUCKET_MINUTES: u32 = 120;

const SCAN_STEP_MINUTES: i64 = 5;
const SCAN_SPAN_MINUTES: i64 = 12 * 60;
const BISECTION_ROUNDS: u32 = 20;

/// Supply the sun's position for an instant and place.
///
/// Implementations must be thread-safe (`Send` + `Sync`) so a single
/// provider can serve concurrent scoring calls.
///
/// # Examples
///
/// ```rust
/// use chrono::{DateTime, Utc};
/// use geo::Coord;
/// use sunseat_core::{SolarPositionProvider, SunPosition};
///
/// struct HighNoon;
///
/// impl SolarPositionProvider for HighNoon {
///     fn position(&self, _at: DateTime<Utc>, _location: Coord<f64>) -> SunPosition {
///         SunPosition::new(180.0, 60.0)
///     }
/// }
///
/// let sun = HighNoon.position(Utc::now(), Coord { x: 0.0, y: 0.0 });
/// assert!(sun.is_up());
/// ```
pub trait SolarPositionProvider: Send + Sync {
    /// Position of the sun at `at` as seen from `location`.
    fn position(&self, at: DateTime<Utc>, location: Coord<f64>) -> SunPosition;
}

/// NOAA solar calculator.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoaaSolarPosition;

impl SolarPositionProvider for NoaaSolarPosition {
    #[expect(
        clippy::float_arithmetic,
        reason = "solar ephemeris is floating-point astronomy"
    )]
    fn position(&self, at: DateTime<Utc>, location: Coord<f64>) -> SunPosition {
        let t = julian_century(at);
        let declination = solar_declination(t);
        let minutes = minutes_since_midnight(at);

        let true_solar_time = (minutes + equation_of_time(t) + 4.0 * location.x).rem_euclid(1440.0);
        let hour_angle = (true_solar_time / 4.0 - 180.0).to_radians();
        let lat = location.y.to_radians();
        let decl = declination.to_radians();

        let cos_zenith = lat
            .sin()
            .mul_add(decl.sin(), lat.cos() * decl.cos() * hour_angle.cos())
            .clamp(-1.0, 1.0);
        let altitude = 90.0 - cos_zenith.acos().to_degrees();

        let azimuth = hour_angle
            .sin()
            .atan2(hour_angle.cos() * lat.sin() - decl.tan() * lat.cos())
            .to_degrees()
            + 180.0;

        SunPosition::new(normalize_degrees(azimuth), altitude)
    }
}

#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "Julian dates are fractional day counts"
)]
fn julian_century(at: DateTime<Utc>) -> f64 {
    let seconds = at.timestamp() as f64 + f64::from(at.timestamp_subsec_nanos()) * 1e-9;
    let julian_day = seconds / 86_400.0 + 2_440_587.5;
    (julian_day - 2_451_545.0) / 36_525.0
}

#[expect(clippy::float_arithmetic, reason = "fractional minutes of the day")]
fn minutes_since_midnight(at: DateTime<Utc>) -> f64 {
    f64::from(at.num_seconds_from_midnight()) / 60.0
        + f64::from(at.nanosecond() % 1_000_000_000) * 1e-9 / 60.0
}

#[expect(clippy::float_arithmetic, reason = "orbital polynomial terms")]
fn mean_longitude(t: f64) -> f64 {
    normalize_degrees(t.mul_add(t.mul_add(0.000_303_2, 36_000.769_83), 280.466_46))
}

#[expect(clippy::float_arithmetic, reason = "orbital polynomial terms")]
fn mean_anomaly(t: f64) -> f64 {
    t.mul_add(t.mul_add(-0.000_153_7, 35_999.050_29), 357.529_11)
}

#[expect(clippy::float_arithmetic, reason = "orbital polynomial terms")]
fn eccentricity(t: f64) -> f64 {
    0.016_708_634 - t * t.mul_add(0.000_000_126_7, 0.000_042_037)
}

#[expect(clippy::float_arithmetic, reason = "orbital polynomial terms")]
fn apparent_longitude(t: f64) -> f64 {
    let m = mean_anomaly(t).to_radians();
    let centre = m.sin() * t.mul_add(-t.mul_add(0.000_014, 0.004_817), 1.914_602)
        + (2.0 * m).sin() * t.mul_add(-0.000_101, 0.019_993)
        + (3.0 * m).sin() * 0.000_289;
    let omega = t.mul_add(-1_934.136, 125.04).to_radians();
    mean_longitude(t) + centre - 0.005_69 - 0.004_78 * omega.sin()
}

#[expect(clippy::float_arithmetic, reason = "orbital polynomial terms")]
fn obliquity(t: f64) -> f64 {
    let seconds = 21.448 - t * t.mul_add(t.mul_add(-0.001_813, 0.000_59), 46.815);
    let mean = 23.0 + (26.0 + seconds / 60.0) / 60.0;
    let omega = t.mul_add(-1_934.136, 125.04).to_radians();
    mean + 0.002_56 * omega.cos()
}

#[expect(clippy::float_arithmetic, reason = "spherical astronomy")]
fn solar_declination(t: f64) -> f64 {
    let e = obliquity(t).to_radians();
    let lambda = apparent_longitude(t).to_radians();
    (e.sin() * lambda.sin()).asin().to_degrees()
}

/// Equation of time in minutes.
#[expect(clippy::float_arithmetic, reason = "equation of time series")]
fn equation_of_time(t: f64) -> f64 {
    let y = (obliquity(t).to_radians() / 2.0).tan().powi(2);
    let l0 = mean_longitude(t).to_radians();
    let e = eccentricity(t);
    let m = mean_anomaly(t).to_radians();
    let radians = y * (2.0 * l0).sin() - 2.0 * e * m.sin()
        + 4.0 * e * y * m.sin() * (2.0 * l0).cos()
        - 0.5 * y * y * (4.0 * l0).sin()
        - 1.25 * e * e * (2.0 * m).sin();
    4.0 * radians.to_degrees()
}

/// Exposure computed from a provider together with the sun position used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SunReading {
    /// Score and label.
    pub exposure: Exposure,
    /// Sun position the score was derived from.
    pub sun: SunPosition,
}

/// Score a terrace at `at` using `provider` for the sun's position.
#[must_use]
pub fn score_at(
    provider: &dyn SolarPositionProvider,
    at: DateTime<Utc>,
    location: Coord<f64>,
    orientation: Orientation,
    street_width: StreetWidth,
    cloud_fraction: Option<f64>,
) -> SunReading {
    let sun = provider.position(at, location);
    SunReading {
        exposure: score_exposure(sun, orientation, street_width, cloud_fraction),
        sun,
    }
}

/// Evening golden hour: from the sun dropping through
/// [`GOLDEN_HOUR_ALTITUDE`] until sunset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldenWindow {
    /// Start of the window, if the sun reaches it.
    pub start: Option<DateTime<Utc>>,
    /// Sunset, if the sun sets.
    pub end: Option<DateTime<Utc>>,
}

/// Evening golden-hour window for `date` at `location`.
///
/// When the sun sets without ever climbing above the golden-hour altitude
/// the window starts an hour before sunset; when it crosses the golden-hour
/// altitude but never sets the window lasts an hour. Polar night yields an
/// empty window.
#[must_use]
pub fn golden_window(
    provider: &dyn SolarPositionProvider,
    date: NaiveDate,
    location: Coord<f64>,
) -> GoldenWindow {
    let Some(noon) = approximate_solar_noon(date, location) else {
        return GoldenWindow::default();
    };
    let start = descending_crossing(provider, noon, location, GOLDEN_HOUR_ALTITUDE);
    let end = descending_crossing(provider, noon, location, SUNSET_ALTITUDE);
    let hour = TimeDelta::minutes(60);
    match (start, end) {
        (None, Some(sunset)) => GoldenWindow {
            start: Some(sunset - hour),
            end: Some(sunset),
        },
        (Some(begin), None) => GoldenWindow {
            start: Some(begin),
            end: Some(begin + hour),
        },
        (start, end) => GoldenWindow { start, end },
    }
}

#[expect(
    clippy::float_arithmetic,
    clippy::cast_possible_truncation,
    reason = "longitude offset in whole minutes fits comfortably in i64"
)]
fn approximate_solar_noon(date: NaiveDate, location: Coord<f64>) -> Option<DateTime<Utc>> {
    let utc_noon = date.and_hms_opt(12, 0, 0)?.and_utc();
    let offset = (location.x * 4.0).round() as i64;
    Some(utc_noon - TimeDelta::minutes(offset))
}

/// First instant after `from` at which the sun descends through `altitude`.
fn descending_crossing(
    provider: &dyn SolarPositionProvider,
    from: DateTime<Utc>,
    location: Coord<f64>,
    altitude: f64,
) -> Option<DateTime<Utc>> {
    let above = |at: DateTime<Utc>| provider.position(at, location).altitude_deg >= altitude;
    let step = TimeDelta::minutes(SCAN_STEP_MINUTES);
    let mut previous = from;
    let mut elapsed = 0;
    while elapsed < SCAN_SPAN_MINUTES {
        let next = previous + step;
        if above(previous) && !above(next) {
            return Some(bisect(previous, next, above));
        }
        previous = next;
        elapsed += SCAN_STEP_MINUTES;
    }
    None
}

fn bisect(
    mut high: DateTime<Utc>,
    mut low: DateTime<Utc>,
    above: impl Fn(DateTime<Utc>) -> bool,
) -> DateTime<Utc> {
    for _ in 0..BISECTION_ROUNDS {
        let mid = high + (low - high) / 2;
        if above(mid) {
            high = mid;
        } else {
            low = mid;
        }
    }
    high
}

/// Minutes from `now` until `target`, bucketed for the horizon selector.
///
/// The difference is rounded to whole minutes, clamped to
/// `0..=`[`MAX_BUCKET_MINUTES`] and rounded to the nearest multiple of
/// `step`. A missing target maps to 0; a zero step is treated as 1.
///
/// # Examples
/// ```
/// use chrono::{TimeDelta, Utc};
/// use sunseat_core::minutes_bucket;
///
/// let now = Utc::now();
/// assert_eq!(minutes_bucket(Some(now + TimeDelta::minutes(37)), now, 15), 30);
/// assert_eq!(minutes_bucket(Some(now + TimeDelta::minutes(38)), now, 15), 45);
/// assert_eq!(minutes_bucket(Some(now + TimeDelta::hours(5)), now, 15), 120);
/// assert_eq!(minutes_bucket(None, now, 15), 0);
/// ```
#[must_use]
#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "bucket arithmetic is bounded to 0..=120 minutes"
)]
pub fn minutes_bucket(target: Option<DateTime<Utc>>, now: DateTime<Utc>, step: u32) -> u32 {
    let Some(target) = target else {
        return 0;
    };
    let step = f64::from(step.max(1));
    let minutes = ((target - now).num_milliseconds() as f64 / 60_000.0).round();
    let clamped = minutes.clamp(0.0, f64::from(MAX_BUCKET_MINUTES));
    ((clamped / step).round() * step) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn paris() -> Coord<f64> {
        Coord {
            x: 2.3522,
            y: 48.8566,
        }
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[rstest]
    #[expect(
        clippy::float_arithmetic,
        reason = "test uses float maths for assertions"
    )]
    fn summer_solar_noon_in_paris_is_high_and_south() {
        // Solar noon in Paris around the solstice is close to 11:52 UTC.
        let sun = NoaaSolarPosition.position(utc(2024, 6, 21, 11, 52), paris());
        assert!((sun.altitude_deg - 64.6).abs() < 0.5, "{sun:?}");
        assert!((sun.azimuth_deg - 180.0).abs() < 3.0, "{sun:?}");
    }

    #[rstest]
    fn morning_sun_is_in_the_east() {
        let sun = NoaaSolarPosition.position(utc(2024, 3, 20, 6, 30), paris());
        assert!(sun.azimuth_deg > 60.0 && sun.azimuth_deg < 120.0, "{sun:?}");
    }

    #[rstest]
    fn midnight_sun_is_below_horizon() {
        let sun = NoaaSolarPosition.position(utc(2024, 12, 21, 0, 0), paris());
        assert!(!sun.is_up());
    }

    #[rstest]
    #[expect(
        clippy::float_arithmetic,
        reason = "test uses float maths for assertions"
    )]
    fn equinox_noon_altitude_matches_colatitude() {
        // At the equinox the noon altitude is roughly 90 - latitude.
        let location = Coord { x: 0.0, y: 40.0 };
        let sun = NoaaSolarPosition.position(utc(2024, 3, 20, 12, 7), location);
        assert!((sun.altitude_deg - 50.0).abs() < 1.0, "{sun:?}");
    }

    #[rstest]
    fn score_at_uses_provider_position() {
        struct Fixed;
        impl SolarPositionProvider for Fixed {
            fn position(&self, _at: DateTime<Utc>, _location: Coord<f64>) -> SunPosition {
                SunPosition::new(180.0, 30.0)
            }
        }
        let reading = score_at(
            &Fixed,
            utc(2024, 6, 1, 12, 0),
            paris(),
            Orientation::SOUTH,
            StreetWidth::Wide,
            None,
        );
        assert_eq!(reading.exposure.score, 65);
        assert_eq!(reading.sun, SunPosition::new(180.0, 30.0));
    }

    #[rstest]
    fn golden_window_precedes_sunset_in_paris_summer() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 21).unwrap();
        let window = golden_window(&NoaaSolarPosition, date, paris());
        let start = window.start.expect("golden hour start");
        let end = window.end.expect("sunset");
        assert!(start < end);
        // Sunset in Paris at the solstice is around 19:58 UTC.
        assert!((end - utc(2024, 6, 21, 19, 58)).num_minutes().abs() < 10, "{end}");
        let length = (end - start).num_minutes();
        assert!((40..=90).contains(&length), "{length}");
    }

    #[rstest]
    fn polar_night_has_no_window() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 21).unwrap();
        let window = golden_window(&NoaaSolarPosition, date, Coord { x: 15.6, y: 78.2 });
        assert_eq!(window, GoldenWindow::default());
    }

    #[rstest]
    fn low_winter_sun_starts_an_hour_before_sunset() {
        // Near the Arctic circle the December sun never reaches 6 degrees.
        let date = NaiveDate::from_ymd_opt(2024, 12, 21).unwrap();
        let window = golden_window(&NoaaSolarPosition, date, Coord { x: 25.7, y: 66.0 });
        let (start, end) = (window.start.unwrap(), window.end.unwrap());
        assert_eq!((end - start).num_minutes(), 60);
    }

    #[rstest]
    #[case(-30, 0)]
    #[case(7, 0)]
    #[case(8, 15)]
    #[case(60, 60)]
    #[case(113, 120)]
    #[case(400, 120)]
    fn buckets_minutes(#[case] minutes: i64, #[case] expected: u32) {
        let now = utc(2024, 6, 1, 12, 0);
        let target = now + TimeDelta::minutes(minutes);
        assert_eq!(minutes_bucket(Some(target), now, 15), expected);
    }

    #[rstest]
    fn zero_step_is_treated_as_one() {
        let now = utc(2024, 6, 1, 12, 0);
        assert_eq!(
            minutes_bucket(Some(now + TimeDelta::minutes(17)), now, 0),
            17
        );
    }
}
