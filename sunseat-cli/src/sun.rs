//! Sun command: live exposure from the built-in solar calculator.

use std::io::Write;

use chrono::{DateTime, Utc};
use clap::Parser;
use geo::Coord;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use sunseat_core::{
    ExposureLabel, NoaaSolarPosition, Orientation, StreetWidth, golden_window, minutes_bucket,
    score_at,
};

use crate::{ARG_LAT, ARG_LON, CliError, resolve_center, write_json};

const ARG_AT: &str = "at";
const ARG_ORIENTATION: &str = "orientation";
const ARG_STREET_WIDTH: &str = "street-width";
const ARG_CLOUD: &str = "cloud";
const GOLDEN_BUCKET_STEP: u32 = 15;

/// CLI arguments for the `sun` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Score a single terrace from the sun's computed position and \
                 report the evening golden-hour window for the same day.",
    about = "Report live sun exposure"
)]
#[ortho_config(prefix = "SUNSEAT")]
pub(crate) struct SunArgs {
    /// Latitude of the terrace.
    #[arg(long = ARG_LAT, value_name = "deg", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) lat: Option<f64>,
    /// Longitude of the terrace.
    #[arg(long = ARG_LON, value_name = "deg", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) lon: Option<f64>,
    /// RFC 3339 instant to score at (default now).
    #[arg(long = ARG_AT, value_name = "time")]
    #[serde(default)]
    pub(crate) at: Option<String>,
    /// Bearing the seating faces, degrees clockwise from north (default 0).
    #[arg(long = ARG_ORIENTATION, value_name = "deg", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) orientation: Option<f64>,
    /// Street width: narrow, medium or wide (default medium).
    #[arg(long = ARG_STREET_WIDTH, value_name = "width")]
    #[serde(default)]
    pub(crate) street_width: Option<String>,
    /// Cloud cover fraction in 0..=1.
    #[arg(long = ARG_CLOUD, value_name = "fraction")]
    #[serde(default)]
    pub(crate) cloud: Option<f64>,
}

impl SunArgs {
    pub(crate) fn into_config(self) -> Result<SunConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        SunConfig::try_from(merged)
    }
}

/// Resolved `sun` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SunConfig {
    pub(crate) location: Coord<f64>,
    pub(crate) at: DateTime<Utc>,
    pub(crate) orientation: Orientation,
    pub(crate) street_width: StreetWidth,
    pub(crate) cloud_fraction: Option<f64>,
}

impl TryFrom<SunArgs> for SunConfig {
    type Error = CliError;

    fn try_from(args: SunArgs) -> Result<Self, Self::Error> {
        let location = resolve_center(args.lat, args.lon)?;
        let at = match args.at.as_deref() {
            Some(raw) => DateTime::parse_from_rfc3339(raw)
                .map_err(|err| CliError::InvalidArgument {
                    field: ARG_AT,
                    reason: format!("{raw:?} is not an RFC 3339 time: {err}"),
                })?
                .with_timezone(&Utc),
            None => Utc::now(),
        };
        let street_width = args
            .street_width
            .as_deref()
            .map(str::parse::<StreetWidth>)
            .transpose()?
            .unwrap_or_default();
        if let Some(cloud) = args.cloud
            && !(0.0..=1.0).contains(&cloud)
        {
            return Err(CliError::InvalidArgument {
                field: ARG_CLOUD,
                reason: format!("{cloud} is outside 0..=1"),
            });
        }
        Ok(Self {
            location,
            at,
            orientation: Orientation::new(args.orientation.unwrap_or(0.0)),
            street_width,
            cloud_fraction: args.cloud,
        })
    }
}

/// Result of a `sun` run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub(crate) struct SunReport {
    pub(crate) at: DateTime<Utc>,
    pub(crate) score: u8,
    pub(crate) label: ExposureLabel,
    pub(crate) azimuth_deg: f64,
    pub(crate) altitude_deg: f64,
    pub(crate) golden_start: Option<DateTime<Utc>>,
    pub(crate) sunset: Option<DateTime<Utc>>,
    /// Horizon offset closest to the start of golden hour.
    pub(crate) golden_offset_minutes: u32,
}

pub(crate) fn run_sun(args: SunArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    let report = execute_sun(&config);
    write_json(writer, &report)
}

pub(crate) fn execute_sun(config: &SunConfig) -> SunReport {
    let provider = NoaaSolarPosition;
    let reading = score_at(
        &provider,
        config.at,
        config.location,
        config.orientation,
        config.street_width,
        config.cloud_fraction,
    );
    let window = golden_window(&provider, config.at.date_naive(), config.location);
    info!(
        "sun at {}: azimuth {:.1}, altitude {:.1}, score {}",
        config.at, reading.sun.azimuth_deg, reading.sun.altitude_deg, reading.exposure.score
    );
    SunReport {
        at: config.at,
        score: reading.exposure.score,
        label: reading.exposure.label,
        azimuth_deg: reading.sun.azimuth_deg,
        altitude_deg: reading.sun.altitude_deg,
        golden_start: window.start,
        sunset: window.end,
        golden_offset_minutes: minutes_bucket(window.start, config.at, GOLDEN_BUCKET_STEP),
    }
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<SunConfig, CliError> {
    let merged = SunArgs::merge_from_layers(layers).map_err(CliError::from)?;
    SunConfig::try_from(merged)
}
