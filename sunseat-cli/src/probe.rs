//! Probe command: sample the blended sun heatmap at a point.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use geo::Coord;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use sunseat_core::{DEFAULT_SIGMA_METERS, ExposureLabel, KernelConfig, KernelSampler};

use crate::{
    ARG_LAT, ARG_LON, ARG_OFFSET, ARG_PAYLOAD, ARG_SIGMA, CliError, ENV_PROBE_PAYLOAD,
    check_offset, load_terraces, require_existing, resolve_center, write_json,
};

/// CLI arguments for the `probe` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Blend the terrace scores of a nearby-terraces JSON payload \
                 with a Gaussian kernel and report the field value at a point.",
    about = "Sample the sun heatmap at a point"
)]
#[ortho_config(prefix = "SUNSEAT")]
pub(crate) struct ProbeArgs {
    /// Path to the nearby-terraces JSON payload.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) payload: Option<Utf8PathBuf>,
    /// Latitude of the probe point.
    #[arg(long = ARG_LAT, value_name = "deg", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) lat: Option<f64>,
    /// Longitude of the probe point.
    #[arg(long = ARG_LON, value_name = "deg", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) lon: Option<f64>,
    /// Minutes from now to sample at, up to 120 (default 0).
    #[arg(long = ARG_OFFSET, value_name = "min")]
    #[serde(default)]
    pub(crate) offset: Option<u32>,
    /// Kernel standard deviation in metres (default 140).
    #[arg(long = ARG_SIGMA, value_name = "m")]
    #[serde(default)]
    pub(crate) sigma: Option<f64>,
}

impl ProbeArgs {
    pub(crate) fn into_config(self) -> Result<ProbeConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ProbeConfig::try_from(merged)
    }
}

/// Resolved `probe` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ProbeConfig {
    pub(crate) payload: Utf8PathBuf,
    pub(crate) point: Coord<f64>,
    pub(crate) offset_minutes: u32,
    pub(crate) kernel: KernelConfig,
}

impl TryFrom<ProbeArgs> for ProbeConfig {
    type Error = CliError;

    fn try_from(args: ProbeArgs) -> Result<Self, Self::Error> {
        let payload = args.payload.ok_or(CliError::MissingArgument {
            field: ARG_PAYLOAD,
            env: ENV_PROBE_PAYLOAD,
        })?;
        let point = resolve_center(args.lat, args.lon)?;
        let offset_minutes = check_offset(args.offset.unwrap_or(0))?;
        let sigma = args.sigma.unwrap_or(DEFAULT_SIGMA_METERS);
        if !(sigma.is_finite() && sigma > 0.0) {
            return Err(CliError::InvalidArgument {
                field: ARG_SIGMA,
                reason: format!("{sigma} is not a positive distance"),
            });
        }
        Ok(Self {
            payload,
            point,
            offset_minutes,
            kernel: KernelConfig::new(sigma),
        })
    }
}

/// Result of a `probe` run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub(crate) struct ProbeReport {
    pub(crate) score: u8,
    pub(crate) label: ExposureLabel,
    pub(crate) points: usize,
    pub(crate) sigma_meters: f64,
}

pub(crate) fn run_probe(args: ProbeArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    require_existing(&config.payload, ARG_PAYLOAD)?;
    let report = execute_probe(&config)?;
    write_json(writer, &report)
}

pub(crate) fn execute_probe(config: &ProbeConfig) -> Result<ProbeReport, CliError> {
    let terraces = load_terraces(&config.payload)?;
    let sampler = KernelSampler::from_terraces_at_offset(
        &terraces,
        i64::from(config.offset_minutes),
        config.kernel,
    );
    let score = sampler.sample(config.point);
    info!(
        "probed {} points at ({}, {}): {score}",
        sampler.len(),
        config.point.y,
        config.point.x
    );
    Ok(ProbeReport {
        score,
        label: ExposureLabel::for_score(score),
        points: sampler.len(),
        sigma_meters: config.kernel.sigma_meters(),
    })
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<ProbeConfig, CliError> {
    let merged = ProbeArgs::merge_from_layers(layers).map_err(CliError::from)?;
    ProbeConfig::try_from(merged)
}
