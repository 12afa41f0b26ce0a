//! Behaviour-driven step definitions driving the rank CLI scenarios.

use super::helpers::{SAMPLE_PAYLOAD, temp_root, write_utf8};
use super::*;
use camino::Utf8PathBuf;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;
use tempfile::TempDir;

#[derive(Debug)]
struct RankWorld {
    _tmp: TempDir,
    payload_path: Utf8PathBuf,
    include_payload: RefCell<bool>,
    cli_args: RefCell<Vec<String>>,
    stdout: RefCell<Vec<u8>>,
    result: RefCell<Option<Result<(), CliError>>>,
}

impl RankWorld {
    fn new() -> Self {
        let (tmp, root) = temp_root();
        Self {
            _tmp: tmp,
            payload_path: root.join("terraces.json"),
            include_payload: RefCell::new(true),
            cli_args: RefCell::new(Vec::new()),
            stdout: RefCell::new(Vec::new()),
            result: RefCell::new(None),
        }
    }

    fn build_command_line(&self) -> Vec<String> {
        let mut argv = vec!["sunseat".to_owned(), "rank".to_owned()];
        if *self.include_payload.borrow() {
            argv.push(self.payload_path.as_str().to_owned());
        }
        argv.extend(self.cli_args.borrow().iter().cloned());
        argv
    }

    fn pass(&self, args: &[&str]) {
        self.cli_args
            .borrow_mut()
            .extend(args.iter().map(|arg| (*arg).to_owned()));
    }

    fn listed_names(&self) -> Vec<String> {
        let borrowed = self.result.borrow();
        let result = borrowed.as_ref().expect("result recorded");
        if let Err(err) = result {
            panic!("expected success, found {err:?}");
        }
        let stdout = String::from_utf8(self.stdout.borrow().clone()).expect("stdout utf-8");
        let rows: Vec<serde_json::Value> =
            serde_json::from_str(&stdout).expect("output should be a JSON array");
        rows.iter()
            .map(|row| row["name"].as_str().expect("row name").to_owned())
            .collect()
    }

    fn error(&self) -> std::cell::Ref<'_, CliError> {
        std::cell::Ref::map(self.result.borrow(), |result| {
            result
                .as_ref()
                .expect("result recorded")
                .as_ref()
                .expect_err("expected error")
        })
    }
}

#[fixture]
fn world() -> RankWorld {
    RankWorld::new()
}

#[given("a terrace payload exists on disk")]
fn terrace_payload_exists(#[from(world)] world: &RankWorld) {
    write_utf8(&world.payload_path, SAMPLE_PAYLOAD.as_bytes());
}

#[given("the terrace payload contains invalid JSON")]
fn terrace_payload_invalid(#[from(world)] world: &RankWorld) {
    write_utf8(&world.payload_path, b"[{ \"name\": ");
}

#[given("I omit the payload path")]
fn omit_payload_path(#[from(world)] world: &RankWorld) {
    *world.include_payload.borrow_mut() = false;
}

#[given("I widen the radius and require outdoor seating")]
fn widen_radius_outdoor(#[from(world)] world: &RankWorld) {
    world.pass(&["--radius", "10000", "--only-outdoor"]);
}

#[given("I rank half an hour ahead with a minimum score")]
fn rank_half_hour_ahead(#[from(world)] world: &RankWorld) {
    world.pass(&["--offset", "30", "--min-score", "35"]);
}

#[given("I rank three hours ahead")]
fn rank_three_hours_ahead(#[from(world)] world: &RankWorld) {
    world.pass(&["--offset", "180"]);
}

#[when("I run the rank command")]
fn run_rank_command(#[from(world)] world: &RankWorld) {
    let invocation = world.build_command_line();
    let parsed = Cli::try_parse_from(invocation).map_err(CliError::from);
    let outcome = parsed.and_then(|cli| match cli.command {
        Command::Rank(args) => {
            let mut buffer = world.stdout.borrow_mut();
            rank::run_rank(args, &mut *buffer)
        }
        other => panic!("expected rank command, found {other:?}"),
    });
    world.result.replace(Some(outcome));
}

#[then("the command succeeds and lists the two central terraces")]
fn lists_central_terraces(#[from(world)] world: &RankWorld) {
    assert_eq!(world.listed_names(), vec!["Cafe Azur", "Bar Ombre"]);
}

#[then("the command succeeds and lists only outdoor terraces")]
fn lists_outdoor_terraces(#[from(world)] world: &RankWorld) {
    assert_eq!(world.listed_names(), vec!["Le Lointain", "Cafe Azur"]);
}

#[then("the command succeeds and lists the forecast leader")]
fn lists_forecast_leader(#[from(world)] world: &RankWorld) {
    assert_eq!(world.listed_names(), vec!["Cafe Azur"]);
}

#[then("the command fails because the payload JSON is invalid")]
fn fails_invalid_json(#[from(world)] world: &RankWorld) {
    match &*world.error() {
        CliError::ParsePayload { path, .. } => assert_eq!(*path, world.payload_path),
        other => panic!("expected ParsePayload, found {other:?}"),
    }
}

#[then("the command fails because the payload path is missing")]
fn fails_missing_payload(#[from(world)] world: &RankWorld) {
    match &*world.error() {
        CliError::MissingArgument { field, env } => {
            assert_eq!(*field, ARG_PAYLOAD);
            assert_eq!(*env, ENV_RANK_PAYLOAD);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[then("the command fails because the offset is out of range")]
fn fails_offset_out_of_range(#[from(world)] world: &RankWorld) {
    match &*world.error() {
        CliError::InvalidArgument { field, .. } => assert_eq!(*field, ARG_OFFSET),
        other => panic!("expected InvalidArgument, found {other:?}"),
    }
}

macro_rules! register_rank_scenario {
    ($fn_name:ident, $scenario_title:literal) => {
        #[scenario(path = "tests/features/rank_command.feature", name = $scenario_title)]
        fn $fn_name(#[from(world)] world: RankWorld) {
            let _ = world;
        }
    };
}

register_rank_scenario!(rank_happy_path, "ranking a nearby-terraces payload");
register_rank_scenario!(
    rank_outdoor_wide,
    "widening the radius and requiring outdoor seating"
);
register_rank_scenario!(rank_with_offset, "ranking ahead with a forecast offset");
register_rank_scenario!(rank_invalid_json, "rejecting invalid JSON input");
register_rank_scenario!(rank_missing_payload, "rejecting missing payload paths");
register_rank_scenario!(
    rank_offset_out_of_range,
    "rejecting offsets beyond the forecast horizon"
);
