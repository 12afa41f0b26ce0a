//! Behavioural tests for the normalisation boundary.
#![expect(
    clippy::float_arithmetic,
    reason = "assertions compare floats within tolerances"
)]

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::{Value, json};
use std::cell::RefCell;
use sunseat_core::{REFERENCE_LOCATION, StreetWidth, Terrace, dedupe, normalize_payload};

#[fixture]
fn payload() -> RefCell<Value> {
    RefCell::new(Value::Null)
}

#[fixture]
fn terraces() -> RefCell<Vec<Terrace>> {
    RefCell::new(Vec::new())
}

fn only(terraces: &RefCell<Vec<Terrace>>) -> Terrace {
    let terraces = terraces.borrow();
    assert_eq!(terraces.len(), 1, "expected exactly one terrace");
    terraces.first().cloned().expect("one terrace")
}

#[given("a record with string numbers, a missing longitude and a negative orientation")]
fn given_messy(#[from(payload)] payload: &RefCell<Value>) {
    *payload.borrow_mut() = json!([{
        "name": "  Cafe Lumiere ",
        "lat": "48.85 N",
        "lon": null,
        "orientationDeg": -10,
        "street_width": "narrow",
        "distance": "120m",
        "sunScore": "88%"
    }]);
}

#[given("two records sharing an id, position and orientation followed by a distinct record")]
fn given_duplicates(#[from(payload)] payload: &RefCell<Value>) {
    *payload.borrow_mut() = json!([
        { "id": 9, "name": "Le Soleil", "lat": 48.8566, "lon": 2.3522, "orientationDeg": 180, "sunScore": 75 },
        { "id": 9, "name": "Le Soleil", "lat": "48.8566000001", "lon": 2.3522, "orientationDeg": 180.2, "sunScore": 20 },
        { "id": 10, "name": "La Lune", "lat": 48.8566, "lon": 2.3522, "orientationDeg": 180, "sunScore": 5 }
    ]);
}

#[given("a payload wrapping one record in an items envelope")]
fn given_envelope(#[from(payload)] payload: &RefCell<Value>) {
    *payload.borrow_mut() = json!({ "items": [{ "name": "   ", "lat": 45.0, "lon": 4.0 }] });
}

#[given("a payload that is a bare string")]
fn given_string(#[from(payload)] payload: &RefCell<Value>) {
    *payload.borrow_mut() = json!("not a payload");
}

#[when("I normalise the payload")]
fn when_normalise(
    #[from(payload)] payload: &RefCell<Value>,
    #[from(terraces)] terraces: &RefCell<Vec<Terrace>>,
) {
    *terraces.borrow_mut() = normalize_payload(&payload.borrow());
}

#[when("I normalise and deduplicate the payload")]
fn when_dedupe(
    #[from(payload)] payload: &RefCell<Value>,
    #[from(terraces)] terraces: &RefCell<Vec<Terrace>>,
) {
    *terraces.borrow_mut() = dedupe(normalize_payload(&payload.borrow()));
}

#[then("one terrace named Cafe Lumiere is produced")]
fn then_named_lumiere(#[from(terraces)] terraces: &RefCell<Vec<Terrace>>) {
    assert_eq!(only(terraces).name, "Cafe Lumiere");
}

#[then("one terrace named Unnamed is produced")]
fn then_named_default(#[from(terraces)] terraces: &RefCell<Vec<Terrace>>) {
    assert_eq!(only(terraces).name, "Unnamed");
}

#[then("its latitude is 48.85 and its longitude falls back to the reference location")]
fn then_location(#[from(terraces)] terraces: &RefCell<Vec<Terrace>>) {
    let terrace = only(terraces);
    assert!((terrace.location.y - 48.85).abs() < 1e-9);
    assert!((terrace.location.x - REFERENCE_LOCATION.x).abs() < f64::EPSILON);
}

#[then("it faces 350 degrees on a narrow street")]
fn then_orientation(#[from(terraces)] terraces: &RefCell<Vec<Terrace>>) {
    let terrace = only(terraces);
    assert!((terrace.orientation.degrees() - 350.0).abs() < 1e-9);
    assert_eq!(terrace.street_width, StreetWidth::Narrow);
}

#[then("its distance is 120 metres and its score is 88")]
fn then_distance_and_score(#[from(terraces)] terraces: &RefCell<Vec<Terrace>>) {
    let terrace = only(terraces);
    assert!((terrace.distance_meters - 120.0).abs() < f64::EPSILON);
    assert_eq!(terrace.sun_score_now, 88);
}

#[then("two terraces remain")]
fn then_two(#[from(terraces)] terraces: &RefCell<Vec<Terrace>>) {
    assert_eq!(terraces.borrow().len(), 2);
}

#[then("the first survivor keeps the score of the first duplicate")]
fn then_first_wins(#[from(terraces)] terraces: &RefCell<Vec<Terrace>>) {
    let terraces = terraces.borrow();
    let names: Vec<_> = terraces.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["Le Soleil", "La Lune"]);
    assert_eq!(terraces.first().map(|t| t.sun_score_now), Some(75));
}

#[then("no terraces are produced")]
fn then_none(#[from(terraces)] terraces: &RefCell<Vec<Terrace>>) {
    assert!(terraces.borrow().is_empty());
}

#[scenario(path = "tests/features/normalization.feature", index = 0)]
fn scenario_messy_record(payload: RefCell<Value>, terraces: RefCell<Vec<Terrace>>) {
    let _ = (payload, terraces);
}

#[scenario(path = "tests/features/normalization.feature", index = 1)]
fn scenario_duplicates(payload: RefCell<Value>, terraces: RefCell<Vec<Terrace>>) {
    let _ = (payload, terraces);
}

#[scenario(path = "tests/features/normalization.feature", index = 2)]
fn scenario_envelope(payload: RefCell<Value>, terraces: RefCell<Vec<Terrace>>) {
    let _ = (payload, terraces);
}

#[scenario(path = "tests/features/normalization.feature", index = 3)]
fn scenario_bare_string(payload: RefCell<Value>, terraces: RefCell<Vec<Terrace>>) {
    let _ = (payload, terraces);
}
