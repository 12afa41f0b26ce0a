//! Command-line interface for exploring SunSeat terrace scores.
//!
//! `rank` orders the terraces of a nearby-terraces payload by their sun
//! score at a chosen offset, `probe` samples the blended heatmap at a point
//! and `sun` reports live exposure from the built-in solar calculator.
#![forbid(unsafe_code)]

use std::io::{BufReader, Write};

use camino::Utf8Path;
use clap::{Parser, Subcommand};
use geo::Coord;
use log::debug;
use serde::Serialize;
use sunseat_core::{REFERENCE_LOCATION, Terrace, dedupe, normalize_payload};

mod error;
mod fs;
mod probe;
mod rank;
#[cfg(feature = "solar")]
mod sun;

pub use error::CliError;

use probe::ProbeArgs;
use rank::RankArgs;
#[cfg(feature = "solar")]
use sun::SunArgs;

pub(crate) const ARG_PAYLOAD: &str = "payload";
pub(crate) const ARG_LAT: &str = "lat";
pub(crate) const ARG_LON: &str = "lon";
pub(crate) const ARG_RADIUS: &str = "radius";
pub(crate) const ARG_OFFSET: &str = "offset";
pub(crate) const ARG_MIN_SCORE: &str = "min-score";
pub(crate) const ARG_ONLY_OUTDOOR: &str = "only-outdoor";
pub(crate) const ARG_TEMP_C: &str = "temp-c";
pub(crate) const ARG_WIND_MS: &str = "wind-ms";
pub(crate) const ARG_SIGMA: &str = "sigma";
pub(crate) const ENV_RANK_PAYLOAD: &str = "SUNSEAT_CMDS_RANK_PAYLOAD";
pub(crate) const ENV_PROBE_PAYLOAD: &str = "SUNSEAT_CMDS_PROBE_PAYLOAD";

/// Largest offset the forecast horizon covers, in minutes.
pub(crate) const MAX_OFFSET_MINUTES: u32 = 120;

/// Run the SunSeat CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdout = std::io::stdout().lock();
    dispatch(cli.command, &mut stdout)
}

fn dispatch(command: Command, writer: &mut dyn Write) -> Result<(), CliError> {
    match command {
        Command::Rank(args) => rank::run_rank(args, writer),
        Command::Probe(args) => probe::run_probe(args, writer),
        #[cfg(feature = "solar")]
        Command::Sun(args) => sun::run_sun(args, writer),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "sunseat",
    about = "Rank nearby terraces by expected sunshine",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rank the terraces in a payload by sun score.
    Rank(RankArgs),
    /// Sample the blended sun heatmap at a point.
    Probe(ProbeArgs),
    /// Report live sun exposure and the golden hour window.
    #[cfg(feature = "solar")]
    Sun(SunArgs),
}

/// Search centre from optional coordinates, defaulting to the reference
/// location.
pub(crate) fn resolve_center(lat: Option<f64>, lon: Option<f64>) -> Result<Coord<f64>, CliError> {
    let lat = lat.unwrap_or(REFERENCE_LOCATION.y);
    let lon = lon.unwrap_or(REFERENCE_LOCATION.x);
    if !(-90.0..=90.0).contains(&lat) {
        return Err(CliError::InvalidArgument {
            field: ARG_LAT,
            reason: format!("{lat} is outside -90..=90"),
        });
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(CliError::InvalidArgument {
            field: ARG_LON,
            reason: format!("{lon} is outside -180..=180"),
        });
    }
    Ok(Coord { x: lon, y: lat })
}

/// Reject offsets beyond the forecast horizon.
pub(crate) fn check_offset(offset: u32) -> Result<u32, CliError> {
    if offset > MAX_OFFSET_MINUTES {
        return Err(CliError::InvalidArgument {
            field: ARG_OFFSET,
            reason: format!("{offset} exceeds {MAX_OFFSET_MINUTES} minutes"),
        });
    }
    Ok(offset)
}

/// Ensure a configured input path names an existing regular file.
pub(crate) fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match fs::file_is_file(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Load, normalise and deduplicate a nearby-terraces payload.
pub(crate) fn load_terraces(path: &Utf8Path) -> Result<Vec<Terrace>, CliError> {
    let file = fs::open_utf8_file(path).map_err(|source| CliError::OpenPayload {
        path: path.to_path_buf(),
        source,
    })?;
    let payload: serde_json::Value = serde_json::from_reader(BufReader::new(file))
        .map_err(|source| CliError::ParsePayload {
            path: path.to_path_buf(),
            source,
        })?;
    let terraces = dedupe(normalize_payload(&payload));
    debug!("loaded {} terraces from {path}", terraces.len());
    Ok(terraces)
}

/// Pretty-print `value` as JSON followed by a newline.
pub(crate) fn write_json<T: Serialize + ?Sized>(
    writer: &mut dyn Write,
    value: &T,
) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerialiseOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
mod tests;
