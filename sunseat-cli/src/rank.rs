//! Rank command implementation for the SunSeat CLI.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use geo::Coord;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use sunseat_core::{
    DeepLink, ExposureLabel, RankFilter, TerraceId, Weather, comfort_score, rank_at_offset,
    with_distance_from, within_radius,
};

use crate::{
    ARG_LAT, ARG_LON, ARG_MIN_SCORE, ARG_OFFSET, ARG_ONLY_OUTDOOR, ARG_PAYLOAD, ARG_RADIUS,
    ARG_TEMP_C, ARG_WIND_MS, CliError, ENV_RANK_PAYLOAD, check_offset, load_terraces,
    require_existing, resolve_center, write_json,
};

/// Default search radius in metres.
pub(crate) const DEFAULT_RADIUS_METERS: f64 = 1_500.0;

/// CLI arguments for the `rank` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Rank the terraces in a nearby-terraces JSON payload by their \
                 sun score at a time offset. Distances are recomputed from the \
                 search centre, which defaults to central Paris.",
    about = "Rank terraces by sun score"
)]
#[ortho_config(prefix = "SUNSEAT")]
pub(crate) struct RankArgs {
    /// Path to the nearby-terraces JSON payload.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) payload: Option<Utf8PathBuf>,
    /// Latitude of the search centre.
    #[arg(long = ARG_LAT, value_name = "deg", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) lat: Option<f64>,
    /// Longitude of the search centre.
    #[arg(long = ARG_LON, value_name = "deg", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) lon: Option<f64>,
    /// Search radius in metres (default 1500).
    #[arg(long = ARG_RADIUS, value_name = "m")]
    #[serde(default)]
    pub(crate) radius: Option<f64>,
    /// Minutes from now to rank at, up to 120 (default 0).
    #[arg(long = ARG_OFFSET, value_name = "min")]
    #[serde(default)]
    pub(crate) offset: Option<u32>,
    /// Hide terraces scoring below this value (default 0).
    #[arg(long = ARG_MIN_SCORE, value_name = "score")]
    #[serde(default)]
    pub(crate) min_score: Option<u8>,
    /// Only list terraces with confirmed outdoor seating.
    #[arg(
        long = ARG_ONLY_OUTDOOR,
        value_name = "bool",
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    #[serde(default)]
    pub(crate) only_outdoor: Option<bool>,
    /// Air temperature in °C, enabling comfort scores.
    #[arg(long = ARG_TEMP_C, value_name = "celsius", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) temp_c: Option<f64>,
    /// Wind speed in m/s, enabling comfort scores.
    #[arg(long = ARG_WIND_MS, value_name = "m/s")]
    #[serde(default)]
    pub(crate) wind_ms: Option<f64>,
}

impl RankArgs {
    pub(crate) fn into_config(self) -> Result<RankConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        RankConfig::try_from(merged)
    }
}

/// Resolved `rank` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RankConfig {
    pub(crate) payload: Utf8PathBuf,
    pub(crate) center: Coord<f64>,
    pub(crate) radius_meters: f64,
    pub(crate) offset_minutes: u32,
    pub(crate) filter: RankFilter,
    pub(crate) weather: Option<Weather>,
}

impl TryFrom<RankArgs> for RankConfig {
    type Error = CliError;

    fn try_from(args: RankArgs) -> Result<Self, Self::Error> {
        let payload = args.payload.ok_or(CliError::MissingArgument {
            field: ARG_PAYLOAD,
            env: ENV_RANK_PAYLOAD,
        })?;
        let center = resolve_center(args.lat, args.lon)?;
        let radius_meters = args.radius.unwrap_or(DEFAULT_RADIUS_METERS);
        if !(radius_meters.is_finite() && radius_meters > 0.0) {
            return Err(CliError::InvalidArgument {
                field: ARG_RADIUS,
                reason: format!("{radius_meters} is not a positive distance"),
            });
        }
        let offset_minutes = check_offset(args.offset.unwrap_or(0))?;
        let min_score = args.min_score.unwrap_or(0);
        if min_score > sunseat_core::MAX_SCORE {
            return Err(CliError::InvalidArgument {
                field: ARG_MIN_SCORE,
                reason: format!("{min_score} exceeds {}", sunseat_core::MAX_SCORE),
            });
        }
        let weather = (args.temp_c.is_some() || args.wind_ms.is_some()).then_some(Weather {
            temp_c: args.temp_c,
            wind_ms: args.wind_ms,
        });
        Ok(Self {
            payload,
            center,
            radius_meters,
            offset_minutes,
            filter: RankFilter {
                min_score,
                only_outdoor: args.only_outdoor.unwrap_or(false),
            },
            weather,
        })
    }
}

/// One line of `rank` output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct RankedRow {
    pub(crate) id: Option<TerraceId>,
    pub(crate) name: String,
    pub(crate) score: u8,
    pub(crate) label: ExposureLabel,
    pub(crate) distance_meters: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub(crate) comfort: Option<u8>,
    pub(crate) link: String,
}

pub(crate) fn run_rank(args: RankArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    require_existing(&config.payload, ARG_PAYLOAD)?;
    let rows = execute_rank(&config)?;
    write_json(writer, &rows)
}

pub(crate) fn execute_rank(config: &RankConfig) -> Result<Vec<RankedRow>, CliError> {
    let mut terraces = load_terraces(&config.payload)?;
    with_distance_from(&mut terraces, config.center);
    let nearby = within_radius(terraces, config.radius_meters);
    let offset = i64::from(config.offset_minutes);
    let ranked = config.filter.apply(rank_at_offset(&nearby, offset));
    info!(
        "ranked {} terraces within {} m at +{} min",
        ranked.len(),
        config.radius_meters,
        config.offset_minutes
    );
    Ok(ranked
        .into_iter()
        .map(|entry| {
            let terrace = entry.terrace;
            let comfort = config.weather.map(|weather| {
                comfort_score(
                    entry.score,
                    weather.temp_c,
                    weather.wind_ms,
                    Some(terrace.street_width),
                )
            });
            let mut link = DeepLink::new(config.center)
                .with_offset_minutes(config.offset_minutes)
                .with_min_score(config.filter.min_score);
            if let Some(id) = &terrace.id {
                link = link.with_terrace(id.clone());
            }
            RankedRow {
                id: terrace.id.clone(),
                name: terrace.name.clone(),
                score: entry.score,
                label: ExposureLabel::for_score(entry.score),
                distance_meters: terrace.distance_meters.round(),
                comfort,
                link: link.to_query(),
            }
        })
        .collect())
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<RankConfig, CliError> {
    let merged = RankArgs::merge_from_layers(layers).map_err(CliError::from)?;
    RankConfig::try_from(merged)
}
