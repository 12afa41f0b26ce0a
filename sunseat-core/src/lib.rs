//! Sun scoring, forecasting and heatmap sampling for SunSeat.
//!
//! The crate turns loosely-typed terrace records into canonical
//! [`Terrace`] values, estimates how sunny each one is now and over the next
//! two hours, ranks them, and blends point scores into a continuous field
//! that can be probed or rendered as map tiles.
//!
//! Every operation is pure: no I/O happens here and malformed input degrades
//! to documented defaults rather than failing.
//!
//! ```
//! use serde_json::json;
//! use sunseat_core::{KernelConfig, KernelSampler, normalize_payload, dedupe, rank_at_offset};
//!
//! let payload = json!([
//!     { "id": 1, "name": "Cafe Azur", "lat": 48.8566, "lon": 2.3522, "sunScore": 82 },
//!     { "id": 1, "name": "Cafe Azur", "lat": 48.8566, "lon": 2.3522, "sunScore": 82 },
//!     { "id": 2, "name": "Bar Ombre", "lat": 48.8570, "lon": 2.3530, "sunScore": "31%" },
//! ]);
//! let terraces = dedupe(normalize_payload(&payload));
//! assert_eq!(terraces.len(), 2);
//!
//! let ranked = rank_at_offset(&terraces, 0);
//! assert_eq!(ranked[0].terrace.name, "Cafe Azur");
//!
//! let sampler = KernelSampler::from_terraces(&terraces, KernelConfig::default());
//! assert!(sampler.sample(terraces[0].location) > 31);
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod comfort;
mod deeplink;
mod exposure;
mod forecast;
mod geodesy;
mod heatmap;
mod kernel;
mod normalize;
mod orientation;
mod ranking;
mod score;
#[cfg(feature = "solar")]
#[cfg_attr(docsrs, doc(cfg(feature = "solar")))]
mod solar;
mod street;
mod terrace;

pub use comfort::{
    CALM_WIND_MS, IDEAL_TEMPERATURE_C, TEMPERATURE_TOLERANCE_C, WIND_PENALTY_SPAN_MS, Weather,
    comfort_score,
};
pub use deeplink::{DeepLink, MAX_LINK_OFFSET_MINUTES};
pub use exposure::{Exposure, ExposureLabel, ParseExposureLabelError, SunPosition, score_exposure};
pub use forecast::{Forecast, ForecastSample, HORIZON_OFFSETS, score_at_offset};
pub use geodesy::{BOUNDS_PADDING, Bounds, EARTH_RADIUS_METERS, distance_meters, radius_from_bounds};
pub use heatmap::{
    HEAT_THRESHOLD, RAMP_GAMMA, TileConfig, TileCoord, TileImage, WORLD_TILE_PIXELS, color_ramp,
    render_tile,
};
pub use kernel::{
    CUTOFF_SIGMAS, DEFAULT_SIGMA_METERS, HeatPoint, KernelConfig, KernelSampler,
    MERCATOR_MAX_LATITUDE, MERCATOR_RADIUS_METERS, ProjectedPoint, SamplerCache, build_sampler,
    project_mercator, unproject_mercator,
};
pub use normalize::{
    DEFAULT_NAME, REFERENCE_LOCATION, coerce_number, dedupe, normalize, normalize_payload,
};
pub use orientation::{Orientation, normalize_degrees};
pub use ranking::{RankFilter, RankedTerrace, rank_at_offset, within_radius, with_distance_from};
pub use score::{MAX_SCORE, clamp_score};
#[cfg(feature = "solar")]
pub use solar::{
    GOLDEN_HOUR_ALTITUDE, GoldenWindow, MAX_BUCKET_MINUTES, NoaaSolarPosition, SUNSET_ALTITUDE,
    SolarPositionProvider, SunReading, golden_window, minutes_bucket, score_at,
};
pub use street::{ParseStreetWidthError, StreetWidth};
pub use terrace::{Terrace, TerraceId};
