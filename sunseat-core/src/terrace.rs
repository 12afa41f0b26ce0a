//! Canonical, fully-typed terrace records.
//!
//! Terraces are produced by [`normalize`](crate::normalize) from the
//! loosely-typed records returned by the nearby-terraces service; nothing
//! past that boundary carries untyped data.

use geo::Coord;
use serde::{Deserialize, Serialize};

use crate::{Forecast, Orientation, StreetWidth};

/// Identifier assigned by the nearby-terraces service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TerraceId {
    /// Integer identifier.
    Numeric(i64),
    /// Any other identifier, kept verbatim.
    Text(String),
}

impl std::fmt::Display for TerraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Numeric(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for TerraceId {
    fn from(id: i64) -> Self {
        Self::Numeric(id)
    }
}

impl From<&str> for TerraceId {
    fn from(id: &str) -> Self {
        Self::Text(id.to_owned())
    }
}

/// A georeferenced outdoor seating area with its sun scores.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use sunseat_core::{Orientation, StreetWidth, Terrace};
///
/// let terrace = Terrace::new("Le Rayon Vert", Coord { x: 2.3522, y: 48.8566 })
///     .with_orientation(Orientation::new(-90.0))
///     .with_street_width(StreetWidth::Narrow)
///     .with_sun_score(72);
/// assert_eq!(terrace.orientation.degrees(), 270.0);
/// assert_eq!(terrace.sun_score_now, 72);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Terrace {
    /// Service identifier, when one was supplied.
    pub id: Option<TerraceId>,
    /// Display name.
    pub name: String,
    /// WGS84 position with `x = longitude` and `y = latitude`.
    pub location: Coord<f64>,
    /// Bearing the seating faces.
    pub orientation: Orientation,
    /// Street width in front of the terrace.
    pub street_width: StreetWidth,
    /// Distance from the search centre, in metres.
    pub distance_meters: f64,
    /// Current sun score in `0..=100`.
    pub sun_score_now: u8,
    /// Predicted scores at future offsets.
    pub forecast: Forecast,
    /// Amenity type reported by the map data (cafe, bar, ...).
    pub amenity: Option<String>,
    /// Whether the map data strongly indicates outdoor seating.
    pub has_outdoor: bool,
    /// Confidence in `0.0..=1.0` that outdoor seating exists.
    pub terrace_confidence: Option<f64>,
}

impl Terrace {
    /// Create a terrace with neutral defaults: facing north, medium street,
    /// zero score and no forecast.
    #[must_use]
    pub fn new(name: impl Into<String>, location: Coord<f64>) -> Self {
        Self {
            id: None,
            name: name.into(),
            location,
            orientation: Orientation::default(),
            street_width: StreetWidth::default(),
            distance_meters: 0.0,
            sun_score_now: 0,
            forecast: Forecast::default(),
            amenity: None,
            has_outdoor: false,
            terrace_confidence: None,
        }
    }

    /// Set the identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<TerraceId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the orientation.
    #[must_use]
    pub const fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Set the street width.
    #[must_use]
    pub const fn with_street_width(mut self, street_width: StreetWidth) -> Self {
        self.street_width = street_width;
        self
    }

    /// Set the current score, clamped to `0..=100`.
    #[must_use]
    pub fn with_sun_score(mut self, score: u8) -> Self {
        self.sun_score_now = score.min(crate::MAX_SCORE);
        self
    }

    /// Set the forecast.
    #[must_use]
    pub fn with_forecast(mut self, forecast: Forecast) -> Self {
        self.forecast = forecast;
        self
    }

    /// Composite key identifying duplicate records.
    ///
    /// Built from the identifier (or the lowercased name with whitespace runs
    /// replaced by `-`), the coordinates to six decimals and the rounded
    /// orientation.
    ///
    /// # Examples
    /// ```
    /// use geo::Coord;
    /// use sunseat_core::{Orientation, Terrace};
    ///
    /// let named = Terrace::new("Chez  Azur", Coord { x: 2.3479, y: 48.8581 })
    ///     .with_orientation(Orientation::new(219.6));
    /// assert_eq!(named.dedup_key(), "nm:chez-azur:48.858100:2.347900:220");
    ///
    /// let keyed = named.with_id(7);
    /// assert_eq!(keyed.dedup_key(), "id:7:48.858100:2.347900:220");
    /// ```
    #[must_use]
    pub fn dedup_key(&self) -> String {
        let identity = self.id.as_ref().map_or_else(
            || {
                let slug = self
                    .name
                    .to_lowercase()
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join("-");
                format!("nm:{slug}")
            },
            |id| format!("id:{id}"),
        );
        format!(
            "{identity}:{:.6}:{:.6}:{:.0}",
            self.location.y,
            self.location.x,
            self.orientation.degrees().round()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_display_verbatim() {
        assert_eq!(TerraceId::Numeric(-3).to_string(), "-3");
        assert_eq!(TerraceId::from("osm/node/12").to_string(), "osm/node/12");
    }

    #[test]
    fn ids_deserialise_untagged() {
        let numeric: TerraceId = serde_json::from_str("12").unwrap();
        let text: TerraceId = serde_json::from_str("\"n12\"").unwrap();
        assert_eq!(numeric, TerraceId::Numeric(12));
        assert_eq!(text, TerraceId::Text("n12".into()));
    }

    #[test]
    fn dedup_key_distinguishes_orientation() {
        let base = Terrace::new("Cafe", Coord { x: 1.0, y: 2.0 }).with_id(1);
        let turned = base.clone().with_orientation(Orientation::new(90.0));
        assert_ne!(base.dedup_key(), turned.dedup_key());
    }

    #[test]
    fn dedup_key_ignores_sub_micro_degree_jitter() {
        let a = Terrace::new("Cafe", Coord { x: 1.000_000_1, y: 2.0 }).with_id(1);
        let b = Terrace::new("Cafe", Coord { x: 1.000_000_2, y: 2.0 }).with_id(1);
        assert_eq!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn sun_score_is_clamped() {
        let terrace = Terrace::new("Cafe", Coord { x: 0.0, y: 0.0 }).with_sun_score(250);
        assert_eq!(terrace.sun_score_now, 100);
    }
}
