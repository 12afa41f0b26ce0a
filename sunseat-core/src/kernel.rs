//! Gaussian kernel density estimate over scored points.
//!
//! Points are projected once into spherical (web) Mercator metres and held
//! in an R\*-tree. A query projects the probe coordinate, gathers the points
//! within the cutoff distance and blends their values:
//!
//! ```text
//! value = Σ wᵢ·vᵢ / Σ wᵢ,   wᵢ = exp(−dᵢ² / 2σ²)
//! ```
//!
//! Points beyond the cutoff (3σ unless overridden) contribute exactly
//! nothing; when no point is in range the value is 0.

use std::f64::consts::{FRAC_PI_4, PI};
use std::sync::Arc;

use geo::Coord;
use log::{debug, warn};
use rstar::{AABB, PointDistance, RTree, RTreeObject};
use serde::{Deserialize, Serialize};

use crate::{Terrace, clamp_score, forecast::score_at_offset, score::clamp_unit};

/// Equatorial radius of the spherical Mercator projection, in metres.
pub const MERCATOR_RADIUS_METERS: f64 = 6_378_137.0;

/// Latitude limit of the square Mercator world.
pub const MERCATOR_MAX_LATITUDE: f64 = 85.051_128_779_8;

/// Default standard deviation of the kernel, in metres.
pub const DEFAULT_SIGMA_METERS: f64 = 140.0;

/// Cutoff distance expressed in standard deviations.
pub const CUTOFF_SIGMAS: f64 = 3.0;

/// Project a WGS84 coordinate into spherical Mercator metres.
///
/// Latitudes beyond [`MERCATOR_MAX_LATITUDE`] are clamped.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use sunseat_core::project_mercator;
///
/// let origin = project_mercator(Coord { x: 0.0, y: 0.0 });
/// assert!(origin.x.abs() < 1e-9 && origin.y.abs() < 1e-9);
/// ```
#[must_use]
#[expect(clippy::float_arithmetic, reason = "map projection")]
pub fn project_mercator(location: Coord<f64>) -> Coord<f64> {
    let lat = location
        .y
        .clamp(-MERCATOR_MAX_LATITUDE, MERCATOR_MAX_LATITUDE)
        .to_radians();
    Coord {
        x: MERCATOR_RADIUS_METERS * location.x.to_radians(),
        y: MERCATOR_RADIUS_METERS * (FRAC_PI_4 + lat / 2.0).tan().ln(),
    }
}

/// Inverse of [`project_mercator`].
#[must_use]
#[expect(clippy::float_arithmetic, reason = "map projection")]
pub fn unproject_mercator(point: Coord<f64>) -> Coord<f64> {
    Coord {
        x: (point.x / MERCATOR_RADIUS_METERS).to_degrees(),
        y: (2.0 * (point.y / MERCATOR_RADIUS_METERS).exp().atan() - PI / 2.0).to_degrees(),
    }
}

/// A scored location fed to the estimator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatPoint {
    /// WGS84 position with `x = longitude` and `y = latitude`.
    pub location: Coord<f64>,
    /// Score on the `0..=100` scale.
    pub score: f64,
}

impl HeatPoint {
    /// Construct a heat point.
    #[must_use]
    pub const fn new(location: Coord<f64>, score: f64) -> Self {
        Self { location, score }
    }
}

/// A point in Mercator metres with its value normalised to `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedPoint {
    /// Easting in metres.
    pub x: f64,
    /// Northing in metres.
    pub y: f64,
    /// Normalised value.
    pub value: f64,
}

impl ProjectedPoint {
    /// Project `point` and normalise its score.
    #[must_use]
    #[expect(clippy::float_arithmetic, reason = "score normalisation")]
    pub fn from_heat_point(point: &HeatPoint) -> Self {
        let projected = project_mercator(point.location);
        Self {
            x: projected.x,
            y: projected.y,
            value: clamp_unit(point.score / 100.0),
        }
    }
}

impl RTreeObject for ProjectedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.x, self.y])
    }
}

impl PointDistance for ProjectedPoint {
    #[expect(clippy::float_arithmetic, reason = "squared euclidean distance")]
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let [px, py] = *point;
        let dx = self.x - px;
        let dy = self.y - py;
        dx.mul_add(dx, dy * dy)
    }
}

/// Kernel width and cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KernelConfig {
    sigma_meters: f64,
    cutoff_meters: f64,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SIGMA_METERS)
    }
}

impl KernelConfig {
    /// Kernel with standard deviation `sigma_meters` and a cutoff of
    /// [`CUTOFF_SIGMAS`] standard deviations.
    ///
    /// A non-positive or non-finite sigma is replaced by
    /// [`DEFAULT_SIGMA_METERS`].
    #[must_use]
    #[expect(clippy::float_arithmetic, reason = "cutoff scales with sigma")]
    pub fn new(sigma_meters: f64) -> Self {
        let sigma = if sigma_meters.is_finite() && sigma_meters > 0.0 {
            sigma_meters
        } else {
            warn!("invalid kernel sigma {sigma_meters}; using {DEFAULT_SIGMA_METERS} m");
            DEFAULT_SIGMA_METERS
        };
        Self {
            sigma_meters: sigma,
            cutoff_meters: sigma * CUTOFF_SIGMAS,
        }
    }

    /// Override the cutoff distance. Invalid values keep the current cutoff.
    #[must_use]
    pub fn with_cutoff_meters(mut self, cutoff_meters: f64) -> Self {
        if cutoff_meters.is_finite() && cutoff_meters > 0.0 {
            self.cutoff_meters = cutoff_meters;
        } else {
            warn!("invalid kernel cutoff {cutoff_meters}; keeping {} m", self.cutoff_meters);
        }
        self
    }

    /// Standard deviation in metres.
    #[must_use]
    pub const fn sigma_meters(&self) -> f64 {
        self.sigma_meters
    }

    /// Cutoff distance in metres.
    #[must_use]
    pub const fn cutoff_meters(&self) -> f64 {
        self.cutoff_meters
    }
}

/// Immutable estimator built from a point set, reusable across queries.
///
/// The sampler owns no interior mutability and is `Send + Sync`, so tiles
/// and probes can share one instance across threads.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use sunseat_core::{HeatPoint, KernelConfig, KernelSampler};
///
/// let sampler = KernelSampler::new(
///     [HeatPoint::new(Coord { x: 0.0, y: 0.0 }, 100.0)],
///     KernelConfig::new(100.0),
/// );
/// assert_eq!(sampler.sample(Coord { x: 0.0, y: 0.0 }), 100);
/// assert_eq!(sampler.sample(Coord { x: 0.01, y: 0.0 }), 0);
/// ```
#[derive(Debug, Clone)]
pub struct KernelSampler {
    tree: RTree<ProjectedPoint>,
    config: KernelConfig,
}

impl KernelSampler {
    /// Project `points` and index them.
    #[must_use]
    pub fn new<I>(points: I, config: KernelConfig) -> Self
    where
        I: IntoIterator<Item = HeatPoint>,
    {
        let projected: Vec<ProjectedPoint> = points
            .into_iter()
            .map(|point| ProjectedPoint::from_heat_point(&point))
            .collect();
        debug!(
            "indexed {} points for kernel sigma {} m",
            projected.len(),
            config.sigma_meters
        );
        Self {
            tree: RTree::bulk_load(projected),
            config,
        }
    }

    /// Sampler over the terraces' current scores.
    #[must_use]
    pub fn from_terraces(terraces: &[Terrace], config: KernelConfig) -> Self {
        Self::new(
            terraces
                .iter()
                .map(|t| HeatPoint::new(t.location, f64::from(t.sun_score_now))),
            config,
        )
    }

    /// Sampler over the terraces' scores `offset_minutes` from now.
    #[must_use]
    pub fn from_terraces_at_offset(
        terraces: &[Terrace],
        offset_minutes: i64,
        config: KernelConfig,
    ) -> Self {
        Self::new(
            terraces.iter().map(|t| {
                HeatPoint::new(t.location, f64::from(score_at_offset(t, offset_minutes)))
            }),
            config,
        )
    }

    /// Kernel parameters.
    #[must_use]
    pub const fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Number of indexed points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Whether the sampler has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Indexed points in no particular order.
    pub fn points(&self) -> impl Iterator<Item = &ProjectedPoint> {
        self.tree.iter()
    }

    /// Blended value in `0.0..=1.0` at a Mercator position.
    #[must_use]
    #[expect(clippy::float_arithmetic, reason = "gaussian weighting")]
    pub fn value_at_projected(&self, point: Coord<f64>) -> f64 {
        let cutoff_2 = self.config.cutoff_meters * self.config.cutoff_meters;
        let two_sigma_2 = 2.0 * self.config.sigma_meters * self.config.sigma_meters;
        let (weighted, total) = self
            .tree
            .locate_within_distance([point.x, point.y], cutoff_2)
            .fold((0.0_f64, 0.0_f64), |(weighted, total), candidate| {
                let weight = (-candidate.distance_2(&[point.x, point.y]) / two_sigma_2).exp();
                (weight.mul_add(candidate.value, weighted), total + weight)
            });
        if total > 0.0 {
            clamp_unit(weighted / total)
        } else {
            0.0
        }
    }

    /// Blended value in `0.0..=1.0` at a WGS84 coordinate.
    #[must_use]
    pub fn value_at(&self, location: Coord<f64>) -> f64 {
        self.value_at_projected(project_mercator(location))
    }

    /// Blended score in `0..=100` at a WGS84 coordinate.
    #[must_use]
    #[expect(clippy::float_arithmetic, reason = "rescale unit value to a score")]
    pub fn sample(&self, location: Coord<f64>) -> u8 {
        clamp_score(self.value_at(location) * 100.0)
    }

    /// Whether any point lies within the cutoff of the Mercator rectangle
    /// spanned by `min` and `max`.
    #[must_use]
    #[expect(clippy::float_arithmetic, reason = "envelope padding")]
    pub fn has_points_near(&self, min: Coord<f64>, max: Coord<f64>) -> bool {
        let pad = self.config.cutoff_meters;
        let envelope = AABB::from_corners([min.x - pad, min.y - pad], [max.x + pad, max.y + pad]);
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .next()
            .is_some()
    }
}

/// Build a sampler with the given kernel width.
#[must_use]
pub fn build_sampler(points: &[HeatPoint], sigma_meters: f64) -> KernelSampler {
    KernelSampler::new(points.iter().copied(), KernelConfig::new(sigma_meters))
}

/// Memoises the most recently built sampler.
///
/// The sampler is rebuilt only when the point set or kernel parameters
/// change. Callers receive an [`Arc`] so renders already in flight keep the
/// sampler they started with.
#[derive(Debug, Default)]
pub struct SamplerCache {
    entry: Option<CacheEntry>,
}

#[derive(Debug)]
struct CacheEntry {
    points: Vec<HeatPoint>,
    config: KernelConfig,
    sampler: Arc<KernelSampler>,
}

impl CacheEntry {
    fn matches(&self, points: &[HeatPoint], config: &KernelConfig) -> bool {
        same_config(&self.config, config)
            && self.points.len() == points.len()
            && self.points.iter().zip(points).all(|(a, b)| same_point(a, b))
    }
}

impl SamplerCache {
    /// Create an empty cache.
    #[must_use]
    pub const fn new() -> Self {
        Self { entry: None }
    }

    /// Return the cached sampler for `points` and `config`, building it if
    /// the inputs changed.
    ///
    /// Inputs are compared bit for bit, so a point set containing NaN
    /// scores still hits the cache.
    pub fn get_or_build(&mut self, points: &[HeatPoint], config: KernelConfig) -> Arc<KernelSampler> {
        if let Some(entry) = &self.entry
            && entry.matches(points, &config)
        {
            return Arc::clone(&entry.sampler);
        }
        let sampler = Arc::new(KernelSampler::new(points.iter().copied(), config));
        self.entry = Some(CacheEntry {
            points: points.to_vec(),
            config,
            sampler: Arc::clone(&sampler),
        });
        sampler
    }

    /// Drop the cached sampler.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}

fn same_config(a: &KernelConfig, b: &KernelConfig) -> bool {
    a.sigma_meters.to_bits() == b.sigma_meters.to_bits()
        && a.cutoff_meters.to_bits() == b.cutoff_meters.to_bits()
}

fn same_point(a: &HeatPoint, b: &HeatPoint) -> bool {
    a.location.x.to_bits() == b.location.x.to_bits()
        && a.location.y.to_bits() == b.location.y.to_bits()
        && a.score.to_bits() == b.score.to_bits()
}

#[cfg(test)]
#[expect(
    clippy::float_arithmetic,
    reason = "assertions compare floats within tolerances"
)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    const ORIGIN: Coord<f64> = Coord { x: 0.0, y: 0.0 };

    /// Coordinate `meters` east of the origin along the equator.
    fn east_of_origin(meters: f64) -> Coord<f64> {
        unproject_mercator(Coord { x: meters, y: 0.0 })
    }

    #[fixture]
    fn single() -> KernelSampler {
        build_sampler(&[HeatPoint::new(ORIGIN, 100.0)], 100.0)
    }

    #[rstest]
    fn empty_sampler_is_zero_everywhere() {
        let sampler = build_sampler(&[], 100.0);
        assert!(sampler.is_empty());
        assert_eq!(sampler.sample(ORIGIN), 0);
        assert_eq!(sampler.sample(Coord { x: 45.0, y: 45.0 }), 0);
    }

    #[rstest]
    fn single_point_is_exact_at_its_location(single: KernelSampler) {
        assert_eq!(single.sample(ORIGIN), 100);
    }

    #[rstest]
    fn single_point_keeps_its_value_inside_cutoff(single: KernelSampler) {
        // A lone point's weight cancels out of the ratio.
        assert_eq!(single.sample(east_of_origin(250.0)), 100);
    }

    #[rstest]
    #[case(301.0)]
    #[case(5_000.0)]
    fn contributions_beyond_cutoff_are_zero(single: KernelSampler, #[case] meters: f64) {
        assert_eq!(single.sample(east_of_origin(meters)), 0);
    }

    #[rstest]
    fn blends_by_gaussian_weight() {
        let sampler = build_sampler(
            &[
                HeatPoint::new(ORIGIN, 100.0),
                HeatPoint::new(east_of_origin(200.0), 0.0),
            ],
            100.0,
        );
        // Midway both weights are equal.
        assert_eq!(sampler.sample(east_of_origin(100.0)), 50);
        // Closer to the hot point the blend leans hot.
        assert!(sampler.sample(east_of_origin(50.0)) > 50);
    }

    #[rstest]
    fn coincident_points_average() {
        let sampler = build_sampler(
            &[HeatPoint::new(ORIGIN, 80.0), HeatPoint::new(ORIGIN, 20.0)],
            50.0,
        );
        assert_eq!(sampler.sample(ORIGIN), 50);
    }

    #[rstest]
    fn out_of_range_scores_are_normalised() {
        let sampler = build_sampler(&[HeatPoint::new(ORIGIN, 250.0)], 50.0);
        let point = sampler.points().next().unwrap();
        assert!((point.value - 1.0).abs() < f64::EPSILON);
    }

    #[rstest]
    #[case(0.0)]
    #[case(-5.0)]
    #[case(f64::NAN)]
    fn invalid_sigma_falls_back(#[case] sigma: f64) {
        let config = KernelConfig::new(sigma);
        assert!((config.sigma_meters() - DEFAULT_SIGMA_METERS).abs() < f64::EPSILON);
        assert!((config.cutoff_meters() - 420.0).abs() < 1e-9);
    }

    #[rstest]
    fn cutoff_override_is_honoured() {
        let config = KernelConfig::new(100.0).with_cutoff_meters(150.0);
        let sampler = KernelSampler::new([HeatPoint::new(ORIGIN, 100.0)], config);
        assert_eq!(sampler.sample(east_of_origin(140.0)), 100);
        assert_eq!(sampler.sample(east_of_origin(160.0)), 0);
    }

    #[rstest]
    fn projection_round_trips() {
        let paris = Coord {
            x: 2.3522,
            y: 48.8566,
        };
        let back = unproject_mercator(project_mercator(paris));
        assert!((back.x - paris.x).abs() < 1e-9);
        assert!((back.y - paris.y).abs() < 1e-9);
    }

    #[rstest]
    fn nearby_envelope_query_respects_cutoff(single: KernelSampler) {
        let near = Coord { x: 250.0, y: 250.0 };
        let far = Coord { x: 10_000.0, y: 10_000.0 };
        assert!(single.has_points_near(near, near));
        assert!(!single.has_points_near(far, far));
    }

    #[rstest]
    fn offset_sampler_uses_interpolated_scores() {
        use crate::{Forecast, ForecastSample};
        let terrace = Terrace::new("Cafe", ORIGIN)
            .with_sun_score(10)
            .with_forecast(Forecast::new(vec![ForecastSample::new(60, 90)]));
        let now = KernelSampler::from_terraces(std::slice::from_ref(&terrace), KernelConfig::default());
        let later =
            KernelSampler::from_terraces_at_offset(&[terrace], 60, KernelConfig::default());
        assert_eq!(now.sample(ORIGIN), 10);
        assert_eq!(later.sample(ORIGIN), 90);
    }

    #[rstest]
    fn cache_reuses_sampler_until_inputs_change() {
        let mut cache = SamplerCache::new();
        let points = vec![HeatPoint::new(ORIGIN, 40.0)];
        let first = cache.get_or_build(&points, KernelConfig::default());
        let second = cache.get_or_build(&points, KernelConfig::default());
        assert!(Arc::ptr_eq(&first, &second));

        let wider = cache.get_or_build(&points, KernelConfig::new(300.0));
        assert!(!Arc::ptr_eq(&first, &wider));

        let moved = vec![HeatPoint::new(Coord { x: 0.001, y: 0.0 }, 40.0)];
        let rebuilt = cache.get_or_build(&moved, KernelConfig::new(300.0));
        assert!(!Arc::ptr_eq(&wider, &rebuilt));

        cache.invalidate();
        let fresh = cache.get_or_build(&moved, KernelConfig::new(300.0));
        assert!(!Arc::ptr_eq(&rebuilt, &fresh));
    }

    #[rstest]
    fn cache_compares_points_not_just_their_count() {
        let mut cache = SamplerCache::new();
        let config = KernelConfig::default();
        let hot = vec![HeatPoint::new(ORIGIN, 90.0), HeatPoint::new(east_of_origin(50.0), 90.0)];
        let cool = vec![HeatPoint::new(ORIGIN, 10.0), HeatPoint::new(east_of_origin(50.0), 10.0)];
        let first = cache.get_or_build(&hot, config);
        let second = cache.get_or_build(&cool, config);
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.sample(ORIGIN), 10);

        let again = cache.get_or_build(&cool.clone(), config);
        assert!(Arc::ptr_eq(&second, &again));
    }

    #[rstest]
    fn cache_hits_for_nan_scores() {
        let mut cache = SamplerCache::new();
        let points = vec![HeatPoint::new(ORIGIN, f64::NAN)];
        let first = cache.get_or_build(&points, KernelConfig::default());
        let second = cache.get_or_build(&points, KernelConfig::default());
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[rstest]
    fn sampler_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<KernelSampler>();
    }
}
