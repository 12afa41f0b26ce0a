//! Facade crate for the SunSeat scoring engine.
//!
//! This crate re-exports the core domain types and operations. The built-in
//! solar calculator is available behind the `solar` feature.

#![forbid(unsafe_code)]

pub use sunseat_core::{
    Bounds, DeepLink, Exposure, ExposureLabel, Forecast, ForecastSample, HeatPoint, KernelConfig,
    KernelSampler, Orientation, RankFilter, RankedTerrace, SamplerCache, StreetWidth, SunPosition,
    Terrace, TerraceId, TileConfig, TileCoord, TileImage, Weather, color_ramp, comfort_score,
    dedupe, distance_meters, normalize, normalize_payload, radius_from_bounds, rank_at_offset,
    render_tile, score_at_offset, score_exposure, with_distance_from, within_radius,
};

#[cfg(feature = "solar")]
pub use sunseat_core::{
    GoldenWindow, NoaaSolarPosition, SolarPositionProvider, SunReading, golden_window,
    minutes_bucket, score_at,
};
