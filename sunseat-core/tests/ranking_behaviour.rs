//! Behavioural tests for ranking and display filters.

use geo::Coord;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;
use sunseat_core::{
    Forecast, ForecastSample, RankFilter, Terrace, rank_at_offset, with_distance_from,
    within_radius,
};

const HOTEL_DE_VILLE: Coord<f64> = Coord {
    x: 2.3522,
    y: 48.8566,
};

#[fixture]
fn terraces() -> RefCell<Vec<Terrace>> {
    RefCell::new(Vec::new())
}

#[fixture]
fn order() -> RefCell<Vec<String>> {
    RefCell::new(Vec::new())
}

#[expect(clippy::float_arithmetic, reason = "offsets the test terrace")]
fn north_of_centre(name: &str, degrees: f64, now: u8, later: u8) -> Terrace {
    Terrace::new(
        name,
        Coord {
            x: HOTEL_DE_VILLE.x,
            y: HOTEL_DE_VILLE.y + degrees,
        },
    )
    .with_sun_score(now)
    .with_forecast(Forecast::new(vec![ForecastSample::new(60, later)]))
}

fn rank(
    terraces: &[Terrace],
    offset: i64,
    filter: RankFilter,
    order: &RefCell<Vec<String>>,
) {
    *order.borrow_mut() = filter
        .apply(rank_at_offset(terraces, offset))
        .iter()
        .map(|entry| entry.terrace.name.clone())
        .collect();
}

#[given("three terraces around the Hotel de Ville")]
fn given_terraces(#[from(terraces)] terraces: &RefCell<Vec<Terrace>>) {
    let mut quai = north_of_centre("Quai", -0.0036, 35, 95);
    quai.has_outdoor = true;
    let mut list = vec![
        north_of_centre("Rivoli", 0.0018, 70, 30),
        quai,
        north_of_centre("Parvis", 0.00045, 70, 40),
    ];
    with_distance_from(&mut list, HOTEL_DE_VILLE);
    *terraces.borrow_mut() = list;
}

#[when("I rank them 60 minutes from now")]
fn when_rank_later(
    #[from(terraces)] terraces: &RefCell<Vec<Terrace>>,
    #[from(order)] order: &RefCell<Vec<String>>,
) {
    rank(&terraces.borrow(), 60, RankFilter::default(), order);
}

#[when("I rank them now")]
fn when_rank_now(
    #[from(terraces)] terraces: &RefCell<Vec<Terrace>>,
    #[from(order)] order: &RefCell<Vec<String>>,
) {
    rank(&terraces.borrow(), 0, RankFilter::default(), order);
}

#[when("I rank them now showing only scores of at least 60")]
fn when_rank_min(
    #[from(terraces)] terraces: &RefCell<Vec<Terrace>>,
    #[from(order)] order: &RefCell<Vec<String>>,
) {
    let filter = RankFilter {
        min_score: 60,
        only_outdoor: false,
    };
    rank(&terraces.borrow(), 0, filter, order);
}

#[when("I rank them now showing only confirmed outdoor seating")]
fn when_rank_outdoor(
    #[from(terraces)] terraces: &RefCell<Vec<Terrace>>,
    #[from(order)] order: &RefCell<Vec<String>>,
) {
    let filter = RankFilter {
        min_score: 0,
        only_outdoor: true,
    };
    rank(&terraces.borrow(), 0, filter, order);
}

#[when("I keep the terraces within 300 metres and rank them now")]
fn when_rank_nearby(
    #[from(terraces)] terraces: &RefCell<Vec<Terrace>>,
    #[from(order)] order: &RefCell<Vec<String>>,
) {
    let nearby = within_radius(terraces.borrow().clone(), 300.0);
    rank(&nearby, 0, RankFilter::default(), order);
}

#[then("the order is Quai, Parvis, Rivoli")]
fn then_quai_first(#[from(order)] order: &RefCell<Vec<String>>) {
    assert_eq!(*order.borrow(), ["Quai", "Parvis", "Rivoli"]);
}

#[then("the order is Parvis, Rivoli, Quai")]
fn then_parvis_first(#[from(order)] order: &RefCell<Vec<String>>) {
    assert_eq!(*order.borrow(), ["Parvis", "Rivoli", "Quai"]);
}

#[then("the order is Parvis, Rivoli")]
fn then_parvis_rivoli(#[from(order)] order: &RefCell<Vec<String>>) {
    assert_eq!(*order.borrow(), ["Parvis", "Rivoli"]);
}

#[then("the order is Quai")]
fn then_quai_only(#[from(order)] order: &RefCell<Vec<String>>) {
    assert_eq!(*order.borrow(), ["Quai"]);
}

#[scenario(path = "tests/features/ranking.feature", index = 0)]
fn scenario_forecast_reorders(terraces: RefCell<Vec<Terrace>>, order: RefCell<Vec<String>>) {
    let _ = (terraces, order);
}

#[scenario(path = "tests/features/ranking.feature", index = 1)]
fn scenario_distance_breaks_ties(terraces: RefCell<Vec<Terrace>>, order: RefCell<Vec<String>>) {
    let _ = (terraces, order);
}

#[scenario(path = "tests/features/ranking.feature", index = 2)]
fn scenario_min_score(terraces: RefCell<Vec<Terrace>>, order: RefCell<Vec<String>>) {
    let _ = (terraces, order);
}

#[scenario(path = "tests/features/ranking.feature", index = 3)]
fn scenario_outdoor_only(terraces: RefCell<Vec<Terrace>>, order: RefCell<Vec<String>>) {
    let _ = (terraces, order);
}

#[scenario(path = "tests/features/ranking.feature", index = 4)]
fn scenario_radius(terraces: RefCell<Vec<Terrace>>, order: RefCell<Vec<String>>) {
    let _ = (terraces, order);
}
