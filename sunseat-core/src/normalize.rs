//! Coercion boundary between loosely-typed service records and [`Terrace`].
//!
//! The nearby-terraces service returns JSON whose field names and value
//! types drift between deployments. [`normalize`] never fails: any field it
//! cannot resolve falls back to a documented default.
//!
//! | Field        | Keys (first non-null wins)                     | Fallback |
//! |--------------|------------------------------------------------|----------|
//! | id           | `id`                                           | none     |
//! | name         | `name`                                         | `"Unnamed"` |
//! | latitude     | `lat`                                          | 48.8566  |
//! | longitude    | `lon`                                          | 2.3522   |
//! | orientation  | `orientationDeg`, `orientation_deg`            | 0        |
//! | street width | `streetWidth`, `street_width`                  | medium   |
//! | distance     | `distance_m`, `distance`, `distanceMeters`     | 0        |
//! | score        | `sunScore`, `score`                            | 0        |
//! | forecast     | `forecast[].tmin`, `forecast[].score`          | empty    |

use std::collections::HashSet;

use geo::Coord;
use log::{debug, warn};
use serde_json::Value;

use crate::{
    Forecast, ForecastSample, Orientation, StreetWidth, Terrace, TerraceId, clamp_score,
    score::clamp_unit,
};

/// Location substituted for unresolvable coordinates (central Paris).
pub const REFERENCE_LOCATION: Coord<f64> = Coord {
    x: 2.3522,
    y: 48.8566,
};

/// Name given to records without one.
pub const DEFAULT_NAME: &str = "Unnamed";

const ORIENTATION_KEYS: &[&str] = &["orientationDeg", "orientation_deg"];
const STREET_WIDTH_KEYS: &[&str] = &["streetWidth", "street_width"];
const DISTANCE_KEYS: &[&str] = &["distance_m", "distance", "distanceMeters"];
const SCORE_KEYS: &[&str] = &["sunScore", "score"];
const OFFSET_KEYS: &[&str] = &["tmin", "offset_minutes", "offsetMinutes"];

/// Interpret a JSON value as a finite number.
///
/// - numbers are taken as-is when finite;
/// - strings yield their first signed decimal number (`"approx. -12.5 m"`
///   gives `-12.5`);
/// - booleans map to `1.0` and `0.0`;
/// - everything else yields `None`.
///
/// # Examples
/// ```
/// use serde_json::json;
/// use sunseat_core::coerce_number;
///
/// assert_eq!(coerce_number(&json!(4.5)), Some(4.5));
/// assert_eq!(coerce_number(&json!("about 120m")), Some(120.0));
/// assert_eq!(coerce_number(&json!(true)), Some(1.0));
/// assert_eq!(coerce_number(&json!("n/a")), None);
/// assert_eq!(coerce_number(&json!(null)), None);
/// ```
#[must_use]
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => first_number_in(s),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Extract the first `-?digits(.digits)?` run from `text`.
fn first_number_in(text: &str) -> Option<f64> {
    let bytes = text.as_bytes();
    let start = bytes.iter().position(u8::is_ascii_digit)?;
    let signed_start = match start.checked_sub(1) {
        Some(prev) if bytes.get(prev) == Some(&b'-') => prev,
        _ => start,
    };
    let mut end = start + count_digits(bytes.get(start..)?);
    if bytes.get(end) == Some(&b'.') {
        let fraction = count_digits(bytes.get(end + 1..)?);
        if fraction > 0 {
            end += 1 + fraction;
        }
    }
    text.get(signed_start..end)?
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// First non-null value among `keys`.
fn field<'a>(record: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| record.get(key))
        .find(|value| !value.is_null())
}

fn number_field(record: &Value, keys: &[&str]) -> Option<f64> {
    field(record, keys).and_then(coerce_number)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0 && !v.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn parse_id(value: &Value) -> Option<TerraceId> {
    match value {
        Value::Number(n) => Some(
            n.as_i64()
                .map_or_else(|| TerraceId::Text(n.to_string()), TerraceId::Numeric),
        ),
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| TerraceId::Text(trimmed.to_owned()))
        }
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
    }
}

fn parse_name(record: &Value) -> String {
    record
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_NAME)
        .to_owned()
}

fn parse_street_width(record: &Value) -> StreetWidth {
    STREET_WIDTH_KEYS
        .iter()
        .filter_map(|key| record.get(key).and_then(Value::as_str))
        .find_map(|raw| raw.parse().ok())
        .unwrap_or_default()
}

fn parse_location(record: &Value) -> Coord<f64> {
    let lat = record
        .get("lat")
        .and_then(coerce_number)
        .map_or(REFERENCE_LOCATION.y, |lat| lat.clamp(-90.0, 90.0));
    let lon = record
        .get("lon")
        .and_then(coerce_number)
        .map_or(REFERENCE_LOCATION.x, |lon| lon.clamp(-180.0, 180.0));
    Coord { x: lon, y: lat }
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "offset is clamped to the u32 range and rounded before the cast"
)]
fn parse_sample(entry: &Value) -> ForecastSample {
    let offset = number_field(entry, OFFSET_KEYS)
        .unwrap_or(0.0)
        .round()
        .clamp(0.0, f64::from(u32::MAX)) as u32;
    let score = number_field(entry, &["score"]).map_or(0, clamp_score);
    ForecastSample::new(offset, score)
}

fn parse_forecast(record: &Value) -> Forecast {
    record
        .get("forecast")
        .and_then(Value::as_array)
        .map(|entries| Forecast::new(entries.iter().map(parse_sample).collect()))
        .unwrap_or_default()
}

/// Convert one loosely-typed record into a [`Terrace`].
///
/// See the module documentation for accepted keys and fallbacks. Latitude
/// and longitude outside their valid ranges are clamped.
///
/// # Examples
/// ```
/// use serde_json::json;
/// use sunseat_core::{StreetWidth, normalize};
///
/// let terrace = normalize(&json!({
///     "id": 3,
///     "name": "  Au Pin Soleil ",
///     "lat": "48.8532",
///     "lon": 2.3499,
///     "orientation_deg": -20,
///     "street_width": "wide",
///     "distance": "240 m",
///     "score": 81.6,
///     "forecast": [{ "tmin": 30, "score": 140 }]
/// }));
/// assert_eq!(terrace.name, "Au Pin Soleil");
/// assert_eq!(terrace.orientation.degrees(), 340.0);
/// assert_eq!(terrace.street_width, StreetWidth::Wide);
/// assert_eq!(terrace.distance_meters, 240.0);
/// assert_eq!(terrace.sun_score_now, 82);
/// assert_eq!(terrace.forecast.samples()[0].score, 100);
/// ```
#[must_use]
pub fn normalize(record: &Value) -> Terrace {
    Terrace {
        id: record.get("id").and_then(parse_id),
        name: parse_name(record),
        location: parse_location(record),
        orientation: Orientation::new(number_field(record, ORIENTATION_KEYS).unwrap_or(0.0)),
        street_width: parse_street_width(record),
        distance_meters: number_field(record, DISTANCE_KEYS).map_or(0.0, |d| d.max(0.0)),
        sun_score_now: number_field(record, SCORE_KEYS).map_or(0, clamp_score),
        forecast: parse_forecast(record),
        amenity: record
            .get("amenity")
            .and_then(Value::as_str)
            .map(str::to_owned),
        has_outdoor: record.get("hasOutdoor").is_some_and(is_truthy),
        terrace_confidence: record
            .get("terraceConfidence")
            .and_then(Value::as_f64)
            .map(clamp_unit),
    }
}

/// Normalise a whole service payload.
///
/// Accepts either a bare array of records or an object wrapping them in an
/// `items` array. Any other shape yields an empty list.
#[must_use]
pub fn normalize_payload(payload: &Value) -> Vec<Terrace> {
    let records = match payload {
        Value::Array(items) => items,
        Value::Object(map) => {
            if let Some(Value::Array(items)) = map.get("items") {
                items
            } else {
                warn!("payload object has no `items` array; treating as empty");
                return Vec::new();
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            warn!("payload is neither an array nor an object; treating as empty");
            return Vec::new();
        }
    };
    let terraces: Vec<Terrace> = records
        .iter()
        .filter(|record| record.is_object())
        .map(normalize)
        .collect();
    debug!(
        "normalised {} of {} payload records",
        terraces.len(),
        records.len()
    );
    terraces
}

/// Drop records whose [`Terrace::dedup_key`] was already seen.
///
/// The first occurrence wins and survivors keep their relative order.
#[must_use]
pub fn dedupe(terraces: Vec<Terrace>) -> Vec<Terrace> {
    let before = terraces.len();
    let mut seen = HashSet::with_capacity(before);
    let unique: Vec<Terrace> = terraces
        .into_iter()
        .filter(|terrace| seen.insert(terrace.dedup_key()))
        .collect();
    if unique.len() < before {
        debug!("dropped {} duplicate terraces", before - unique.len());
    }
    unique
}

#[cfg(test)]
#[expect(
    clippy::float_arithmetic,
    reason = "assertions compare floats within tolerances"
)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!(12), Some(12.0))]
    #[case(json!(-3.25), Some(-3.25))]
    #[case(json!("42"), Some(42.0))]
    #[case(json!("  -7.5deg"), Some(-7.5))]
    #[case(json!("x-1"), Some(-1.0))]
    #[case(json!("12."), Some(12.0))]
    #[case(json!(".5"), Some(5.0))]
    #[case(json!("1.2.3"), Some(1.2))]
    #[case(json!("--4"), Some(-4.0))]
    #[case(json!(""), None)]
    #[case(json!("none"), None)]
    #[case(json!(false), Some(0.0))]
    #[case(json!([1]), None)]
    #[case(json!({"v": 1}), None)]
    #[case(json!(null), None)]
    fn coerces_numbers(#[case] value: Value, #[case] expected: Option<f64>) {
        assert_eq!(coerce_number(&value), expected);
    }

    #[rstest]
    fn empty_record_uses_fallbacks() {
        let terrace = normalize(&json!({}));
        assert_eq!(terrace.id, None);
        assert_eq!(terrace.name, DEFAULT_NAME);
        assert_eq!(terrace.location, REFERENCE_LOCATION);
        assert!(terrace.orientation.degrees().abs() < f64::EPSILON);
        assert_eq!(terrace.street_width, StreetWidth::Medium);
        assert!(terrace.distance_meters.abs() < f64::EPSILON);
        assert_eq!(terrace.sun_score_now, 0);
        assert!(terrace.forecast.is_empty());
        assert!(!terrace.has_outdoor);
    }

    #[rstest]
    fn invalid_street_width_defaults_to_medium() {
        let terrace = normalize(&json!({ "streetWidth": "huge", "street_width": "narrow" }));
        assert_eq!(terrace.street_width, StreetWidth::Narrow);
        let fallback = normalize(&json!({ "streetWidth": "huge" }));
        assert_eq!(fallback.street_width, StreetWidth::Medium);
    }

    #[rstest]
    fn first_non_null_distance_key_wins() {
        let terrace = normalize(&json!({
            "distance_m": null,
            "distance": 80,
            "distanceMeters": 120
        }));
        assert!((terrace.distance_meters - 80.0).abs() < f64::EPSILON);
    }

    #[rstest]
    fn negative_distance_is_floored() {
        let terrace = normalize(&json!({ "distance_m": -5 }));
        assert!(terrace.distance_meters.abs() < f64::EPSILON);
    }

    #[rstest]
    #[case(json!(370), 10.0)]
    #[case(json!(-10), 350.0)]
    #[case(json!("360"), 0.0)]
    fn orientation_is_folded(#[case] raw: Value, #[case] expected: f64) {
        let terrace = normalize(&json!({ "orientationDeg": raw }));
        assert!((terrace.orientation.degrees() - expected).abs() < 1e-9);
    }

    #[rstest]
    fn out_of_range_coordinates_are_clamped() {
        let terrace = normalize(&json!({ "lat": 95, "lon": -200 }));
        assert_eq!(terrace.location, Coord { x: -180.0, y: 90.0 });
    }

    #[rstest]
    fn forecast_entries_are_coerced_and_sorted() {
        let terrace = normalize(&json!({
            "forecast": [
                { "tmin": "60", "score": 40 },
                { "tmin": -15, "score": 30 },
                { "tmin": 30, "score": "n/a" },
                null
            ]
        }));
        let samples: Vec<(u32, u8)> = terrace
            .forecast
            .samples()
            .iter()
            .map(|s| (s.offset_minutes, s.score))
            .collect();
        assert_eq!(samples, vec![(0, 30), (30, 0), (60, 40)]);
    }

    #[rstest]
    #[case(json!(7), Some(TerraceId::Numeric(7)))]
    #[case(json!(7.5), Some(TerraceId::Text("7.5".into())))]
    #[case(json!(" n7 "), Some(TerraceId::Text("n7".into())))]
    #[case(json!(""), None)]
    #[case(json!(true), None)]
    fn parses_ids(#[case] raw: Value, #[case] expected: Option<TerraceId>) {
        assert_eq!(normalize(&json!({ "id": raw })).id, expected);
    }

    #[rstest]
    #[case(json!(true), true)]
    #[case(json!(1), true)]
    #[case(json!("yes"), true)]
    #[case(json!(0), false)]
    #[case(json!(""), false)]
    fn outdoor_flag_follows_truthiness(#[case] raw: Value, #[case] expected: bool) {
        assert_eq!(normalize(&json!({ "hasOutdoor": raw })).has_outdoor, expected);
    }

    #[rstest]
    fn confidence_is_clamped() {
        let terrace = normalize(&json!({ "terraceConfidence": 1.4 }));
        assert_eq!(terrace.terrace_confidence, Some(1.0));
    }

    #[rstest]
    #[case(json!([{ "name": "a" }, { "name": "b" }]), 2)]
    #[case(json!({ "items": [{ "name": "a" }] }), 1)]
    #[case(json!({ "results": [{ "name": "a" }] }), 0)]
    #[case(json!("oops"), 0)]
    #[case(json!([{ "name": "a" }, 3, "x"]), 1)]
    fn accepts_bare_and_wrapped_payloads(#[case] payload: Value, #[case] expected: usize) {
        assert_eq!(normalize_payload(&payload).len(), expected);
    }

    #[rstest]
    fn dedupe_keeps_first_and_preserves_order() {
        let payload = json!([
            { "id": 1, "name": "first", "lat": 48.0, "lon": 2.0, "orientationDeg": 180 },
            { "id": 2, "name": "other", "lat": 48.0, "lon": 2.0, "orientationDeg": 180 },
            { "id": 1, "name": "second", "lat": 48.000_000_01, "lon": 2.0, "orientationDeg": 180.2 },
            { "name": "Chez Azur", "lat": 48.0, "lon": 2.0 },
            { "name": "chez   azur", "lat": 48.0, "lon": 2.0 }
        ]);
        let names: Vec<String> = dedupe(normalize_payload(&payload))
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["first", "other", "Chez Azur"]);
    }
}
