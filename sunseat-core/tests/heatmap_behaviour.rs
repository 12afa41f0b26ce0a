//! Behavioural tests for kernel sampling and tile rendering.

use geo::Coord;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::{Cell, RefCell};
use sunseat_core::{
    HeatPoint, KernelConfig, KernelSampler, TileConfig, TileCoord, TileImage, render_tile,
    unproject_mercator,
};

const ORIGIN: Coord<f64> = Coord { x: 0.0, y: 0.0 };
const PARIS: Coord<f64> = Coord {
    x: 2.3522,
    y: 48.8566,
};

#[fixture]
fn sampler() -> RefCell<Option<KernelSampler>> {
    RefCell::new(None)
}

#[fixture]
fn sampled() -> Cell<Option<u8>> {
    Cell::new(None)
}

#[fixture]
fn tile() -> RefCell<Option<TileImage>> {
    RefCell::new(None)
}

fn sample_at(
    sampler: &RefCell<Option<KernelSampler>>,
    sampled: &Cell<Option<u8>>,
    location: Coord<f64>,
) {
    let sampler = sampler.borrow();
    let sampler = sampler.as_ref().expect("sampler built");
    sampled.set(Some(sampler.sample(location)));
}

fn render_over(
    sampler: &RefCell<Option<KernelSampler>>,
    tile: &RefCell<Option<TileImage>>,
    location: Coord<f64>,
) {
    let sampler = sampler.borrow();
    let sampler = sampler.as_ref().expect("sampler built");
    let config = TileConfig::default();
    let coord = TileCoord::containing(location, 16, config.tile_size);
    *tile.borrow_mut() = Some(render_tile(sampler, coord, &config));
}

#[given("a single point scoring 100 at the origin with a 100 metre kernel")]
fn given_single_point(#[from(sampler)] sampler: &RefCell<Option<KernelSampler>>) {
    *sampler.borrow_mut() = Some(KernelSampler::new(
        [HeatPoint::new(ORIGIN, 100.0)],
        KernelConfig::new(100.0),
    ));
}

#[given("no points with a 100 metre kernel")]
fn given_no_points(#[from(sampler)] sampler: &RefCell<Option<KernelSampler>>) {
    *sampler.borrow_mut() = Some(KernelSampler::new([], KernelConfig::new(100.0)));
}

#[given("a sunny terrace in central Paris with the default kernel")]
fn given_paris(#[from(sampler)] sampler: &RefCell<Option<KernelSampler>>) {
    *sampler.borrow_mut() = Some(KernelSampler::new(
        [HeatPoint::new(PARIS, 90.0)],
        KernelConfig::default(),
    ));
}

#[when("I sample the field at the origin")]
fn when_sample_origin(
    #[from(sampler)] sampler: &RefCell<Option<KernelSampler>>,
    #[from(sampled)] sampled: &Cell<Option<u8>>,
) {
    sample_at(sampler, sampled, ORIGIN);
}

#[when("I sample the field one kilometre east of the origin")]
fn when_sample_far(
    #[from(sampler)] sampler: &RefCell<Option<KernelSampler>>,
    #[from(sampled)] sampled: &Cell<Option<u8>>,
) {
    sample_at(sampler, sampled, unproject_mercator(Coord { x: 1_000.0, y: 0.0 }));
}

#[when("I render the zoom 16 tile containing the terrace")]
fn when_render_paris(
    #[from(sampler)] sampler: &RefCell<Option<KernelSampler>>,
    #[from(tile)] tile: &RefCell<Option<TileImage>>,
) {
    render_over(sampler, tile, PARIS);
}

#[when("I render the zoom 16 tile over New York")]
fn when_render_new_york(
    #[from(sampler)] sampler: &RefCell<Option<KernelSampler>>,
    #[from(tile)] tile: &RefCell<Option<TileImage>>,
) {
    render_over(sampler, tile, Coord { x: -74.006, y: 40.7128 });
}

#[then("the sampled score is 100")]
fn then_sampled_100(#[from(sampled)] sampled: &Cell<Option<u8>>) {
    assert_eq!(sampled.get(), Some(100));
}

#[then("the sampled score is 0")]
fn then_sampled_0(#[from(sampled)] sampled: &Cell<Option<u8>>) {
    assert_eq!(sampled.get(), Some(0));
}

#[then("the tile contains coloured pixels at the layer opacity")]
fn then_tile_coloured(#[from(tile)] tile: &RefCell<Option<TileImage>>) {
    let tile = tile.borrow();
    let image = tile.as_ref().expect("tile rendered");
    assert!(!image.is_blank());
    assert!(
        image
            .as_rgba()
            .chunks_exact(4)
            .all(|px| matches!(px, [_, _, _, 0 | 179])),
        "alpha is either transparent or 70% opaque"
    );
}

#[then("the tile is fully transparent")]
fn then_tile_blank(#[from(tile)] tile: &RefCell<Option<TileImage>>) {
    assert!(tile.borrow().as_ref().expect("tile rendered").is_blank());
}

#[scenario(path = "tests/features/heatmap.feature", index = 0)]
fn scenario_lone_point(
    sampler: RefCell<Option<KernelSampler>>,
    sampled: Cell<Option<u8>>,
    tile: RefCell<Option<TileImage>>,
) {
    let _ = (sampler, sampled, tile);
}

#[scenario(path = "tests/features/heatmap.feature", index = 1)]
fn scenario_beyond_cutoff(
    sampler: RefCell<Option<KernelSampler>>,
    sampled: Cell<Option<u8>>,
    tile: RefCell<Option<TileImage>>,
) {
    let _ = (sampler, sampled, tile);
}

#[scenario(path = "tests/features/heatmap.feature", index = 2)]
fn scenario_empty_field(
    sampler: RefCell<Option<KernelSampler>>,
    sampled: Cell<Option<u8>>,
    tile: RefCell<Option<TileImage>>,
) {
    let _ = (sampler, sampled, tile);
}

#[scenario(path = "tests/features/heatmap.feature", index = 3)]
fn scenario_sunny_tile(
    sampler: RefCell<Option<KernelSampler>>,
    sampled: Cell<Option<u8>>,
    tile: RefCell<Option<TileImage>>,
) {
    let _ = (sampler, sampled, tile);
}

#[scenario(path = "tests/features/heatmap.feature", index = 4)]
fn scenario_distant_tile(
    sampler: RefCell<Option<KernelSampler>>,
    sampled: Cell<Option<u8>>,
    tile: RefCell<Option<TileImage>>,
) {
    let _ = (sampler, sampled, tile);
}
