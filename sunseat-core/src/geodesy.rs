//! Great-circle helpers for search radii and distances.
//!
//! Coordinates are WGS84 with `x = longitude` and `y = latitude`, matching
//! the convention used by [`geo::Coord`].

use geo::{Coord, Rect};
use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the haversine formula, in metres.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Padding applied to the corner distance by [`radius_from_bounds`].
pub const BOUNDS_PADDING: f64 = 1.05;

/// Haversine great-circle distance between two coordinates, in metres.
///
/// The result is symmetric and zero for identical points.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use sunseat_core::distance_meters;
///
/// let paris = Coord { x: 2.3522, y: 48.8566 };
/// let london = Coord { x: -0.1276, y: 51.5072 };
/// let d = distance_meters(paris, london);
/// assert!((d - 343_500.0).abs() < 1_000.0);
/// assert_eq!(distance_meters(paris, paris), 0.0);
/// ```
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "haversine requires floating-point trigonometry"
)]
pub fn distance_meters(from: Coord<f64>, to: Coord<f64>) -> f64 {
    let d_lat = (to.y - from.y).to_radians();
    let d_lon = (to.x - from.x).to_radians();
    let half_lat = (d_lat / 2.0).sin();
    let half_lon = (d_lon / 2.0).sin();
    let a = half_lat.mul_add(
        half_lat,
        from.y.to_radians().cos() * to.y.to_radians().cos() * half_lon * half_lon,
    );
    let c = 2.0 * a.sqrt().atan2((1.0 - a).max(0.0).sqrt());
    (EARTH_RADIUS_METERS * c).max(0.0)
}

/// Visible map extent expressed as edge latitudes and longitudes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Northern edge latitude.
    pub north: f64,
    /// Southern edge latitude.
    pub south: f64,
    /// Eastern edge longitude.
    pub east: f64,
    /// Western edge longitude.
    pub west: f64,
}

impl Bounds {
    /// The four corners of the extent.
    #[must_use]
    pub const fn corners(&self) -> [Coord<f64>; 4] {
        [
            Coord {
                x: self.east,
                y: self.north,
            },
            Coord {
                x: self.west,
                y: self.north,
            },
            Coord {
                x: self.east,
                y: self.south,
            },
            Coord {
                x: self.west,
                y: self.south,
            },
        ]
    }
}

impl From<Rect<f64>> for Bounds {
    fn from(rect: Rect<f64>) -> Self {
        Self {
            north: rect.max().y,
            south: rect.min().y,
            east: rect.max().x,
            west: rect.min().x,
        }
    }
}

/// Search radius covering `bounds` when searching from `center`.
///
/// Takes the largest haversine distance from `center` to any corner, pads it
/// by [`BOUNDS_PADDING`] and rounds to whole metres.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use sunseat_core::{Bounds, radius_from_bounds};
///
/// let bounds = Bounds { north: 48.86, south: 48.85, east: 2.36, west: 2.34 };
/// let radius = radius_from_bounds(&bounds, Coord { x: 2.35, y: 48.855 });
/// assert!(radius > 900 && radius < 1_000);
/// ```
#[must_use]
#[expect(
    clippy::float_arithmetic,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "distance is non-negative and rounded before conversion to metres"
)]
pub fn radius_from_bounds(bounds: &Bounds, center: Coord<f64>) -> u32 {
    let farthest = bounds
        .corners()
        .into_iter()
        .map(|corner| distance_meters(center, corner))
        .filter(|d| d.is_finite())
        .fold(0.0_f64, f64::max);
    (farthest * BOUNDS_PADDING).round() as u32
}

#[cfg(test)]
#[expect(
    clippy::float_arithmetic,
    reason = "assertions compare floats within tolerances"
)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn coord(lat: f64, lon: f64) -> Coord<f64> {
        Coord { x: lon, y: lat }
    }

    #[rstest]
    #[case(coord(0.0, 0.0), coord(0.0, 1.0), 111_194.9)]
    #[case(coord(0.0, 0.0), coord(1.0, 0.0), 111_194.9)]
    #[case(coord(48.8566, 2.3522), coord(45.764, 4.8357), 391_500.0)]
    fn matches_reference_distances(
        #[case] a: Coord<f64>,
        #[case] b: Coord<f64>,
        #[case] expected: f64,
    ) {
        let d = distance_meters(a, b);
        assert!(
            (d - expected).abs() < expected * 0.005,
            "expected about {expected}, got {d}"
        );
    }

    #[rstest]
    #[expect(clippy::float_cmp, reason = "identical points yield exact zero")]
    fn identical_points_are_zero_apart() {
        let p = coord(43.2965, 5.3698);
        assert_eq!(distance_meters(p, p), 0.0);
    }

    #[rstest]
    fn antipodes_are_half_the_circumference() {
        let d = distance_meters(coord(0.0, 0.0), coord(0.0, 180.0));
        let half = std::f64::consts::PI * EARTH_RADIUS_METERS;
        assert!((d - half).abs() < 1.0, "got {d}");
    }

    #[rstest]
    fn radius_is_padded_farthest_corner() {
        let bounds = Bounds {
            north: 1.0,
            south: -1.0,
            east: 1.0,
            west: -1.0,
        };
        let center = coord(0.0, 0.0);
        let corner = distance_meters(center, coord(1.0, 1.0));
        let radius = radius_from_bounds(&bounds, center);
        let expected = (corner * BOUNDS_PADDING).round();
        assert!((f64::from(radius) - expected).abs() < f64::EPSILON);
    }

    #[rstest]
    fn off_centre_search_uses_the_far_corner() {
        let bounds = Bounds {
            north: 0.01,
            south: 0.0,
            east: 0.01,
            west: 0.0,
        };
        let near = radius_from_bounds(&bounds, coord(0.0, 0.0));
        let mid = radius_from_bounds(&bounds, coord(0.005, 0.005));
        assert!(near > mid);
    }

    #[rstest]
    fn bounds_from_rect_maps_edges() {
        let rect = Rect::new(Coord { x: 2.0, y: 48.0 }, Coord { x: 3.0, y: 49.0 });
        let bounds = Bounds::from(rect);
        assert_eq!(
            bounds,
            Bounds {
                north: 49.0,
                south: 48.0,
                east: 3.0,
                west: 2.0
            }
        );
    }
}
