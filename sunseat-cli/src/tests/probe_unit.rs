//! Unit tests for the probe command.

use super::helpers::sample_payload;
use super::*;
use crate::probe::{ProbeArgs, ProbeConfig, config_from_layers_for_test, execute_probe, run_probe};
use camino::Utf8PathBuf;
use geo::Coord;
use rstest::rstest;
use sunseat_core::{DEFAULT_SIGMA_METERS, ExposureLabel};

fn config_at(payload: Utf8PathBuf, lat: f64, lon: f64) -> ProbeConfig {
    ProbeConfig::try_from(ProbeArgs {
        payload: Some(payload),
        lat: Some(lat),
        lon: Some(lon),
        ..ProbeArgs::default()
    })
    .expect("config should build")
}

#[rstest]
fn converting_probe_without_payload_errors() {
    let err = ProbeConfig::try_from(ProbeArgs::default()).expect_err("missing payload");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_PAYLOAD);
            assert_eq!(env, ENV_PROBE_PAYLOAD);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
#[case(0.0)]
#[case(-10.0)]
#[case(f64::INFINITY)]
fn probe_rejects_invalid_sigma(#[case] sigma: f64) {
    let args = ProbeArgs {
        payload: Some(Utf8PathBuf::from("terraces.json")),
        sigma: Some(sigma),
        ..ProbeArgs::default()
    };
    let err = ProbeConfig::try_from(args).expect_err("invalid sigma should error");
    match err {
        CliError::InvalidArgument { field, .. } => assert_eq!(field, ARG_SIGMA),
        other => panic!("expected InvalidArgument, found {other:?}"),
    }
}

#[rstest]
fn probe_blends_nearby_scores() {
    let (_tmp, payload) = sample_payload();
    let report = execute_probe(&config_at(payload, 48.8566, 2.3522)).expect("probe");
    assert_eq!(report.points, 3);
    assert_eq!(report.sigma_meters, DEFAULT_SIGMA_METERS);
    assert!(report.score > 31 && report.score < 82, "score {}", report.score);
}

#[rstest]
fn probe_at_isolated_terrace_returns_its_score() {
    let (_tmp, payload) = sample_payload();
    let report = execute_probe(&config_at(payload, 48.9016, 2.3522)).expect("probe");
    assert_eq!(report.score, 95);
    assert_eq!(report.label, ExposureLabel::Sun);
}

#[rstest]
fn probe_far_from_every_terrace_is_zero() {
    let (_tmp, payload) = sample_payload();
    let report = execute_probe(&config_at(payload, 0.0, 0.0)).expect("probe");
    assert_eq!(report.score, 0);
    assert_eq!(report.label, ExposureLabel::Shade);
}

#[rstest]
fn probe_follows_forecast_offset() {
    let (_tmp, payload) = sample_payload();
    let config = ProbeConfig {
        offset_minutes: 30,
        ..config_at(payload, 48.8566, 2.3522)
    };
    let report = execute_probe(&config).expect("probe");
    assert!(report.score >= 31 && report.score <= 40, "score {}", report.score);
}

#[rstest]
fn run_probe_prints_report() {
    let (_tmp, payload) = sample_payload();
    let args = ProbeArgs {
        payload: Some(payload),
        lat: Some(48.9016),
        lon: Some(2.3522),
        ..ProbeArgs::default()
    };
    let mut stdout = Vec::new();
    run_probe(args, &mut stdout).expect("probe should succeed");
    let report: serde_json::Value = serde_json::from_slice(&stdout).expect("JSON output");
    assert_eq!(report["score"], 95);
    assert_eq!(report["points"], 3);
}

#[rstest]
fn merge_layers_reads_sigma_from_environment() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let mut composer = MergeComposer::new();
    composer.push_environment(json!({ "payload": "env.json", "sigma": 60.0 }));
    let config = config_from_layers_for_test(composer.layers()).expect("config should build");
    assert_eq!(config.payload, Utf8PathBuf::from("env.json"));
    assert_eq!(config.kernel.sigma_meters(), 60.0);
    assert_eq!(config.point, Coord { x: 2.3522, y: 48.8566 });
}
