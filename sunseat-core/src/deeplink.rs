//! Shareable links restoring the map centre, selection and filters.
//!
//! The link state lives in the query string:
//! `lat=<deg>&lon=<deg>[&id=<terrace>][&t=<minutes>][&min=<score>]`.
//! Coordinates carry six decimals; a zero offset or minimum is omitted.

use geo::Coord;
use log::debug;
use serde::{Deserialize, Serialize};
use url::{Url, form_urlencoded};

use crate::{MAX_SCORE, TerraceId};

/// Largest time offset a link can carry, in minutes.
pub const MAX_LINK_OFFSET_MINUTES: u32 = 120;

/// Restorable view state.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use sunseat_core::DeepLink;
///
/// let link = DeepLink::new(Coord { x: 2.3522, y: 48.8566 })
///     .with_terrace(42)
///     .with_offset_minutes(30);
/// assert_eq!(link.to_query(), "lat=48.856600&lon=2.352200&id=42&t=30");
/// assert_eq!(DeepLink::parse(&link.to_query()), link);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeepLink {
    /// Map centre, absent when the link carried no valid coordinates.
    pub center: Option<Coord<f64>>,
    /// Selected terrace.
    pub terrace_id: Option<TerraceId>,
    /// Time offset in `0..=120` minutes.
    pub offset_minutes: u32,
    /// Minimum score filter in `0..=100`.
    pub min_score: u8,
}

impl DeepLink {
    /// Link centred on `center` with no selection or filters.
    #[must_use]
    pub const fn new(center: Coord<f64>) -> Self {
        Self {
            center: Some(center),
            terrace_id: None,
            offset_minutes: 0,
            min_score: 0,
        }
    }

    /// Select a terrace.
    #[must_use]
    pub fn with_terrace(mut self, id: impl Into<TerraceId>) -> Self {
        self.terrace_id = Some(id.into());
        self
    }

    /// Set the time offset, capped at [`MAX_LINK_OFFSET_MINUTES`].
    #[must_use]
    pub fn with_offset_minutes(mut self, minutes: u32) -> Self {
        self.offset_minutes = minutes.min(MAX_LINK_OFFSET_MINUTES);
        self
    }

    /// Set the minimum score, capped at 100.
    #[must_use]
    pub fn with_min_score(mut self, score: u8) -> Self {
        self.min_score = score.min(MAX_SCORE);
        self
    }

    /// Render the state as a URL query string without the leading `?`.
    #[must_use]
    pub fn to_query(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if let Some(center) = self.center {
            query.append_pair("lat", &format!("{:.6}", center.y));
            query.append_pair("lon", &format!("{:.6}", center.x));
        }
        if let Some(id) = &self.terrace_id {
            query.append_pair("id", &id.to_string());
        }
        if self.offset_minutes > 0 {
            query.append_pair("t", &self.offset_minutes.to_string());
        }
        if self.min_score > 0 {
            query.append_pair("min", &self.min_score.to_string());
        }
        query.finish()
    }

    /// Replace the query of `base` with this state.
    #[must_use]
    pub fn to_url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        let query = self.to_query();
        url.set_query((!query.is_empty()).then_some(query.as_str()));
        url
    }

    /// Restore state from a query string, with or without the leading `?`.
    ///
    /// The first occurrence of each key wins. Values that do not parse are
    /// dropped; the offset and minimum are clamped to their ranges. The
    /// centre is restored only when both coordinates are finite numbers.
    #[must_use]
    pub fn parse(query: &str) -> Self {
        let mut lat = None;
        let mut lon = None;
        let mut link = Self::default();
        let mut seen_t = false;
        let mut seen_min = false;
        let query = query.strip_prefix('?').unwrap_or(query);
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let value = value.trim();
            match key.as_ref() {
                "lat" if lat.is_none() => lat = Some(parse_coordinate(value)),
                "lon" if lon.is_none() => lon = Some(parse_coordinate(value)),
                "id" if link.terrace_id.is_none() && !value.is_empty() => {
                    link.terrace_id = Some(parse_terrace_id(value));
                }
                "t" if !seen_t => {
                    seen_t = true;
                    link.offset_minutes = parse_clamped(value, MAX_LINK_OFFSET_MINUTES);
                }
                "min" if !seen_min => {
                    seen_min = true;
                    link.min_score = u8::try_from(parse_clamped(value, u32::from(MAX_SCORE)))
                        .unwrap_or(MAX_SCORE);
                }
                other => debug!("ignoring deep link parameter {other:?}"),
            }
        }
        if let (Some(Some(y)), Some(Some(x))) = (lat, lon) {
            link.center = Some(Coord { x, y });
        }
        link
    }

    /// Restore state from the query of `url`.
    #[must_use]
    pub fn from_url(url: &Url) -> Self {
        Self::parse(url.query().unwrap_or_default())
    }
}

fn parse_coordinate(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_terrace_id(value: &str) -> TerraceId {
    if value.bytes().all(|b| b.is_ascii_digit())
        && let Ok(id) = value.parse::<i64>()
    {
        return TerraceId::Numeric(id);
    }
    TerraceId::Text(value.to_owned())
}

fn parse_clamped(value: &str, max: u32) -> u32 {
    value
        .parse::<i64>()
        .ok()
        .map_or(0, |v| u32::try_from(v.clamp(0, i64::from(max))).unwrap_or(0))
}
