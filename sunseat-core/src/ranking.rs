//! Distance recomputation, radius filtering and score ranking.

use geo::Coord;
use log::debug;
use serde::Serialize;

use crate::{Terrace, distance_meters, forecast::score_at_offset};

/// A terrace paired with its score at the requested offset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankedTerrace<'a> {
    /// The ranked terrace.
    pub terrace: &'a Terrace,
    /// Score at the ranking offset.
    pub score: u8,
}

/// Replace every terrace's distance with its haversine distance from
/// `center`.
pub fn with_distance_from(terraces: &mut [Terrace], center: Coord<f64>) {
    for terrace in terraces {
        terrace.distance_meters = distance_meters(center, terrace.location);
    }
}

/// Keep terraces no further than `radius_meters` from the search centre.
///
/// A NaN or negative radius keeps nothing.
#[must_use]
pub fn within_radius(mut terraces: Vec<Terrace>, radius_meters: f64) -> Vec<Terrace> {
    let before = terraces.len();
    terraces.retain(|t| t.distance_meters <= radius_meters);
    debug!(
        "kept {} of {before} terraces within {radius_meters} m",
        terraces.len()
    );
    terraces
}

/// Score every terrace `offset_minutes` from now and order the result.
///
/// Terraces are sorted by score, highest first, then by distance, nearest
/// first. The sort is stable so equal entries keep their input order.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use sunseat_core::{Terrace, rank_at_offset};
///
/// let mut near = Terrace::new("Near", Coord { x: 0.0, y: 0.0 }).with_sun_score(60);
/// near.distance_meters = 50.0;
/// let mut far = Terrace::new("Far", Coord { x: 0.0, y: 0.0 }).with_sun_score(60);
/// far.distance_meters = 400.0;
/// let bright = Terrace::new("Bright", Coord { x: 0.0, y: 0.0 }).with_sun_score(90);
///
/// let terraces = [far, bright, near];
/// let names: Vec<_> = rank_at_offset(&terraces, 0)
///     .iter()
///     .map(|r| r.terrace.name.as_str())
///     .collect();
/// assert_eq!(names, ["Bright", "Near", "Far"]);
/// ```
#[must_use]
pub fn rank_at_offset(terraces: &[Terrace], offset_minutes: i64) -> Vec<RankedTerrace<'_>> {
    let mut ranked: Vec<RankedTerrace<'_>> = terraces
        .iter()
        .map(|terrace| RankedTerrace {
            terrace,
            score: score_at_offset(terrace, offset_minutes),
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.score.cmp(&a.score).then_with(|| {
            a.terrace
                .distance_meters
                .total_cmp(&b.terrace.distance_meters)
        })
    });
    ranked
}

/// Display filters applied after ranking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RankFilter {
    /// Lowest score shown.
    pub min_score: u8,
    /// Only show terraces with confirmed outdoor seating.
    pub only_outdoor: bool,
}

impl RankFilter {
    /// Whether `ranked` passes the filter.
    #[must_use]
    pub const fn accepts(&self, ranked: &RankedTerrace<'_>) -> bool {
        ranked.score >= self.min_score && (!self.only_outdoor || ranked.terrace.has_outdoor)
    }

    /// Drop entries that fail the filter, preserving order.
    #[must_use]
    pub fn apply<'a>(&self, mut ranked: Vec<RankedTerrace<'a>>) -> Vec<RankedTerrace<'a>> {
        ranked.retain(|entry| self.accepts(entry));
        ranked
    }
}

#[cfg(test)]
#[expect(
    clippy::float_arithmetic,
    reason = "assertions compare floats within tolerances"
)]
mod tests {
    use super::*;
    use crate::{Forecast, ForecastSample};
    use rstest::{fixture, rstest};

    const CENTER: Coord<f64> = Coord {
        x: 2.3522,
        y: 48.8566,
    };

    fn at(name: &str, lon: f64, lat: f64, score: u8) -> Terrace {
        Terrace::new(name, Coord { x: lon, y: lat }).with_sun_score(score)
    }

    #[fixture]
    fn terraces() -> Vec<Terrace> {
        let mut list = vec![
            at("Louvre", 2.3376, 48.8606, 40),
            at("Hotel de Ville", 2.3522, 48.8566, 70),
            at("Lyon", 4.8357, 45.7640, 95),
        ];
        with_distance_from(&mut list, CENTER);
        list
    }

    #[rstest]
    fn distances_are_recomputed_from_center(terraces: Vec<Terrace>) {
        let [louvre, here, lyon] = terraces.as_slice() else {
            panic!("expected three terraces");
        };
        assert!(here.distance_meters.abs() < 1e-6);
        assert!((louvre.distance_meters - 1_150.0).abs() < 25.0);
        assert!(lyon.distance_meters > 390_000.0);
    }

    #[rstest]
    fn radius_filter_is_inclusive(terraces: Vec<Terrace>) {
        let kept = within_radius(terraces.clone(), 1_500.0);
        let names: Vec<_> = kept.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["Louvre", "Hotel de Ville"]);

        let exact = terraces[0].distance_meters;
        assert_eq!(within_radius(terraces, exact).len(), 2);
    }

    #[rstest]
    #[case(-1.0)]
    #[case(f64::NAN)]
    fn invalid_radius_keeps_nothing(terraces: Vec<Terrace>, #[case] radius: f64) {
        assert!(within_radius(terraces, radius).is_empty());
    }

    #[rstest]
    fn ranking_uses_offset_scores(terraces: Vec<Terrace>) {
        let mut terraces = terraces;
        terraces[0].forecast = Forecast::new(vec![ForecastSample::new(30, 100)]);
        let ranked = rank_at_offset(&terraces, 30);
        let first = ranked.first().unwrap();
        assert_eq!(first.terrace.name, "Louvre");
        assert_eq!(first.score, 100);
    }

    #[rstest]
    fn ties_keep_input_order_when_distance_matches() {
        let list = vec![at("A", 0.0, 0.0, 50), at("B", 0.0, 0.0, 50)];
        let ranked = rank_at_offset(&list, 0);
        let names: Vec<_> = ranked.iter().map(|r| r.terrace.name.as_str()).collect();
        assert_eq!(names, ["A", "B"]);
    }

    #[rstest]
    fn filter_applies_threshold_and_outdoor_flag(terraces: Vec<Terrace>) {
        let mut terraces = terraces;
        terraces[2].has_outdoor = true;
        let ranked = rank_at_offset(&terraces, 0);

        let strict = RankFilter {
            min_score: 60,
            only_outdoor: false,
        };
        assert_eq!(strict.apply(ranked.clone()).len(), 2);

        let outdoor = RankFilter {
            min_score: 0,
            only_outdoor: true,
        };
        let shown = outdoor.apply(ranked.clone());
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].terrace.name, "Lyon");

        assert_eq!(RankFilter::default().apply(ranked).len(), 3);
    }
}
