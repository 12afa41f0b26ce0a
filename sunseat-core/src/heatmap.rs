//! Heatmap colouring and raster tile rendering.
//!
//! Tiles follow the slippy-map scheme over spherical Mercator: tile `(x, y)`
//! at zoom `z` covers pixels `x·size..(x+1)·size` horizontally of a world
//! that is `256·2^z` pixels wide. The sampler is evaluated once per
//! `sample_step × sample_step` block and the block is filled with the ramp
//! colour at the configured opacity.

use std::f64::consts::PI;

use geo::Coord;
use serde::{Deserialize, Serialize};

use crate::{KernelSampler, MERCATOR_RADIUS_METERS, score::clamp_unit};

/// Values at or below this level are left transparent.
pub const HEAT_THRESHOLD: f64 = 0.01;

/// Exponent applied before colour lookup to lift faint areas.
pub const RAMP_GAMMA: f64 = 0.85;

/// Pixel width of the world at zoom 0.
pub const WORLD_TILE_PIXELS: f64 = 256.0;

#[derive(Debug, Clone, Copy)]
struct RampStop {
    position: f64,
    rgb: [u8; 3],
}

const fn stop(position: f64, rgb: [u8; 3]) -> RampStop {
    RampStop { position, rgb }
}

const RAMP: [RampStop; 6] = [
    stop(0.0, [255, 255, 255]),
    stop(0.2, [255, 243, 176]),
    stop(0.5, [253, 204, 78]),
    stop(0.7, [251, 140, 0]),
    stop(0.9, [229, 57, 53]),
    stop(1.0, [183, 28, 28]),
];

const LAST_STOP: RampStop = stop(1.0, [183, 28, 28]);

/// Map a value in `0.0..=1.0` to an RGBA colour.
///
/// The value is clamped and raised to [`RAMP_GAMMA`]; anything at or below
/// [`HEAT_THRESHOLD`] afterwards is fully transparent. Otherwise the colour
/// is linearly interpolated between the surrounding stops of a
/// white → yellow → orange → red ramp, fully opaque.
///
/// # Examples
/// ```
/// use sunseat_core::color_ramp;
///
/// assert_eq!(color_ramp(0.0), [0, 0, 0, 0]);
/// assert_eq!(color_ramp(1.0), [183, 28, 28, 255]);
/// ```
#[must_use]
#[expect(clippy::float_arithmetic, reason = "colour interpolation")]
pub fn color_ramp(value: f64) -> [u8; 4] {
    let t = clamp_unit(value).powf(RAMP_GAMMA);
    if t <= HEAT_THRESHOLD {
        return [0, 0, 0, 0];
    }
    let (from, to) = RAMP
        .windows(2)
        .find_map(|pair| match pair {
            [from, to] if t <= to.position => Some((*from, *to)),
            _ => None,
        })
        .unwrap_or((LAST_STOP, LAST_STOP));
    let span = (to.position - from.position).max(1e-6);
    let u = clamp_unit((t - from.position) / span);
    let [r, g, b] = lerp_rgb(from.rgb, to.rgb, u);
    [r, g, b, 255]
}

#[expect(clippy::float_arithmetic, reason = "channel interpolation")]
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "channel is clamped to 0..=255 before the cast"
)]
fn lerp_rgb(from: [u8; 3], to: [u8; 3], u: f64) -> [u8; 3] {
    let mut out = [0_u8; 3];
    for ((slot, a), b) in out.iter_mut().zip(from).zip(to) {
        let a = f64::from(a);
        *slot = (f64::from(b) - a).mul_add(u, a).round().clamp(0.0, 255.0) as u8;
    }
    out
}

/// Convert a unit value to a byte, rounding to nearest.
#[expect(clippy::float_arithmetic, reason = "byte quantisation")]
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "value is clamped to 0..=255 before the cast"
)]
fn unit_byte(value: f64) -> u8 {
    (clamp_unit(value) * 255.0).round() as u8
}

/// Slippy-map tile address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    /// Column, increasing eastwards.
    pub x: u32,
    /// Row, increasing southwards.
    pub y: u32,
    /// Zoom level.
    pub z: u8,
}

impl TileCoord {
    /// Construct a tile address.
    #[must_use]
    pub const fn new(x: u32, y: u32, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Tile containing `location` at zoom `z`.
    ///
    /// # Examples
    /// ```
    /// use geo::Coord;
    /// use sunseat_core::TileCoord;
    ///
    /// let tile = TileCoord::containing(Coord { x: 2.3522, y: 48.8566 }, 12, 256);
    /// assert_eq!(tile, TileCoord::new(2074, 1409, 12));
    /// ```
    #[must_use]
    #[expect(clippy::float_arithmetic, reason = "pixel coordinates")]
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "pixel coordinates are clamped to the world before the cast"
    )]
    pub fn containing(location: Coord<f64>, z: u8, tile_size: u32) -> Self {
        let scale = world_pixels(z);
        let projected = crate::project_mercator(location);
        let circumference = 2.0 * PI * MERCATOR_RADIUS_METERS;
        let px = ((projected.x / circumference + 0.5) * scale).clamp(0.0, scale - 1.0);
        let py = ((0.5 - projected.y / circumference) * scale).clamp(0.0, scale - 1.0);
        let size = f64::from(tile_size.max(1));
        Self {
            x: (px / size).floor() as u32,
            y: (py / size).floor() as u32,
            z,
        }
    }
}

/// Rendering parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileConfig {
    /// Tile edge in pixels.
    pub tile_size: u32,
    /// Edge of the pixel block sharing one sample.
    pub sample_step: u32,
    /// Layer opacity in `0.0..=1.0`.
    pub opacity: f64,
}

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            tile_size: 256,
            sample_step: 2,
            opacity: 0.7,
        }
    }
}

/// Row-major RGBA8 raster, not premultiplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl TileImage {
    fn transparent(width: u32, height: u32) -> Self {
        let len = usize::try_from(u64::from(width) * u64::from(height) * 4).unwrap_or(0);
        Self {
            width,
            height,
            pixels: vec![0; len],
        }
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA bytes.
    #[must_use]
    pub fn as_rgba(&self) -> &[u8] {
        &self.pixels
    }

    /// Consume the image and return its RGBA bytes.
    #[must_use]
    pub fn into_rgba(self) -> Vec<u8> {
        self.pixels
    }

    /// Colour at `(x, y)`, if inside the image.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let start = self.offset(x, y)?;
        let bytes = self.pixels.get(start..start + 4)?;
        <[u8; 4]>::try_from(bytes).ok()
    }

    /// Whether every pixel is fully transparent.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.pixels.chunks_exact(4).all(|px| matches!(px, [_, _, _, 0]))
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = u64::from(y) * u64::from(self.width) + u64::from(x);
        usize::try_from(index * 4).ok()
    }

    fn fill_block(&mut self, x: u32, y: u32, step: u32, rgba: [u8; 4]) {
        let x_end = x.saturating_add(step).min(self.width);
        let y_end = y.saturating_add(step).min(self.height);
        for row in y..y_end {
            for col in x..x_end {
                if let Some(start) = self.offset(col, row)
                    && let Some(slot) = self.pixels.get_mut(start..start + 4)
                {
                    slot.copy_from_slice(&rgba);
                }
            }
        }
    }
}

#[expect(clippy::float_arithmetic, reason = "world size doubles per zoom")]
fn world_pixels(z: u8) -> f64 {
    WORLD_TILE_PIXELS * 2_f64.powi(i32::from(z))
}

/// Mercator metres at a world pixel position for zoom scale `scale`.
#[expect(clippy::float_arithmetic, reason = "pixel to projected metres")]
fn pixel_to_mercator(px: f64, py: f64, scale: f64) -> Coord<f64> {
    let circumference = 2.0 * PI * MERCATOR_RADIUS_METERS;
    Coord {
        x: (px / scale - 0.5) * circumference,
        y: (0.5 - py / scale) * circumference,
    }
}

/// Render one heatmap tile.
///
/// Each `sample_step` block is sampled at its top-left pixel; blocks whose
/// value does not exceed [`HEAT_THRESHOLD`] stay transparent. Tiles with no
/// point within the kernel cutoff are returned blank without sampling.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use sunseat_core::{HeatPoint, KernelConfig, KernelSampler, TileConfig, TileCoord, render_tile};
///
/// let sampler = KernelSampler::new([], KernelConfig::default());
/// let image = render_tile(&sampler, TileCoord::new(0, 0, 0), &TileConfig::default());
/// assert_eq!((image.width(), image.height()), (256, 256));
/// assert!(image.is_blank());
/// ```
#[must_use]
#[expect(clippy::float_arithmetic, reason = "tile geometry")]
pub fn render_tile(sampler: &KernelSampler, tile: TileCoord, config: &TileConfig) -> TileImage {
    let size = config.tile_size.max(1);
    let step = config.sample_step.max(1);
    let alpha = unit_byte(config.opacity);
    let stride = usize::try_from(step).unwrap_or(1);
    let mut image = TileImage::transparent(size, size);
    if sampler.is_empty() || alpha == 0 {
        return image;
    }

    let scale = world_pixels(tile.z);
    let origin_x = f64::from(tile.x) * f64::from(size);
    let origin_y = f64::from(tile.y) * f64::from(size);
    let north_west = pixel_to_mercator(origin_x, origin_y, scale);
    let south_east = pixel_to_mercator(
        origin_x + f64::from(size),
        origin_y + f64::from(size),
        scale,
    );
    let min = Coord {
        x: north_west.x,
        y: south_east.y,
    };
    let max = Coord {
        x: south_east.x,
        y: north_west.y,
    };
    if !sampler.has_points_near(min, max) {
        return image;
    }

    for y in (0..size).step_by(stride) {
        for x in (0..size).step_by(stride) {
            let probe = pixel_to_mercator(origin_x + f64::from(x), origin_y + f64::from(y), scale);
            let value = sampler.value_at_projected(probe);
            if value <= HEAT_THRESHOLD {
                continue;
            }
            let [r, g, b, _] = color_ramp(value);
            image.fill_block(x, y, step, [r, g, b, alpha]);
        }
    }
    image
}

#[cfg(test)]
#[expect(
    clippy::float_arithmetic,
    reason = "assertions compare floats within tolerances"
)]
mod tests {
    use super::*;
    use crate::{HeatPoint, KernelConfig};
    use rstest::rstest;

    #[rstest]
    #[case(0.0, [0, 0, 0, 0])]
    #[case(-1.0, [0, 0, 0, 0])]
    #[case(f64::NAN, [0, 0, 0, 0])]
    #[case(1.0, [183, 28, 28, 255])]
    #[case(7.0, [183, 28, 28, 255])]
    fn ramp_endpoints(#[case] value: f64, #[case] expected: [u8; 4]) {
        assert_eq!(color_ramp(value), expected);
    }

    #[rstest]
    fn ramp_stops_ascend_to_the_last_stop() {
        assert!(RAMP.windows(2).all(|pair| match pair {
            [from, to] => from.position < to.position,
            _ => false,
        }));
        let last = RAMP.last().expect("ramp has stops");
        assert!((last.position - LAST_STOP.position).abs() < f64::EPSILON);
        assert_eq!(last.rgb, LAST_STOP.rgb);
    }

    #[rstest]
    fn faint_values_stay_transparent() {
        // 0.004^0.85 ≈ 0.0091, still under the threshold.
        assert_eq!(color_ramp(0.004)[3], 0);
        assert_eq!(color_ramp(0.02)[3], 255);
    }

    #[rstest]
    fn ramp_hits_interior_stops() {
        // t = 0.5 exactly when value = 0.5^(1/0.85).
        let value = 0.5_f64.powf(1.0 / RAMP_GAMMA);
        assert_eq!(color_ramp(value), [253, 204, 78, 255]);
    }

    #[rstest]
    fn ramp_interpolates_between_stops() {
        // t = 0.6 sits midway between the amber and orange stops.
        let value = 0.6_f64.powf(1.0 / RAMP_GAMMA);
        assert_eq!(color_ramp(value), [252, 172, 39, 255]);
    }

    #[rstest]
    fn ramp_darkens_monotonically_in_green() {
        let greens: Vec<u8> = (1..=10)
            .map(|i| color_ramp(f64::from(i) / 10.0)[1])
            .collect();
        assert!(greens.windows(2).all(|w| matches!(w, [a, b] if a >= b)));
    }

    #[rstest]
    fn tile_containing_origin() {
        let tile = TileCoord::containing(Coord { x: 0.0, y: 0.0 }, 1, 256);
        assert_eq!(tile, TileCoord::new(1, 1, 1));
    }

    #[rstest]
    fn empty_sampler_renders_blank_tile() {
        let sampler = KernelSampler::new([], KernelConfig::default());
        let image = render_tile(&sampler, TileCoord::new(0, 0, 0), &TileConfig::default());
        assert!(image.is_blank());
        assert_eq!(image.as_rgba().len(), 256 * 256 * 4);
    }

    #[rstest]
    fn hot_point_colours_its_tile() {
        let paris = Coord {
            x: 2.3522,
            y: 48.8566,
        };
        let sampler = KernelSampler::new([HeatPoint::new(paris, 100.0)], KernelConfig::default());
        let config = TileConfig::default();
        let tile = TileCoord::containing(paris, 16, config.tile_size);
        let image = render_tile(&sampler, tile, &config);
        assert!(!image.is_blank());
        let coloured = image
            .as_rgba()
            .chunks_exact(4)
            .find(|px| matches!(px, [_, _, _, a] if *a > 0))
            .unwrap();
        assert_eq!(coloured, [183, 28, 28, 179]);
    }

    #[rstest]
    fn distant_tile_is_blank() {
        let paris = Coord {
            x: 2.3522,
            y: 48.8566,
        };
        let sampler = KernelSampler::new([HeatPoint::new(paris, 100.0)], KernelConfig::default());
        let config = TileConfig::default();
        let far = TileCoord::containing(Coord { x: -74.0, y: 40.7 }, 16, config.tile_size);
        assert!(render_tile(&sampler, far, &config).is_blank());
    }

    #[rstest]
    fn blocks_share_one_sample() {
        let paris = Coord {
            x: 2.3522,
            y: 48.8566,
        };
        let sampler = KernelSampler::new([HeatPoint::new(paris, 100.0)], KernelConfig::default());
        let config = TileConfig {
            sample_step: 4,
            ..TileConfig::default()
        };
        let tile = TileCoord::containing(paris, 16, config.tile_size);
        let image = render_tile(&sampler, tile, &config);
        for y in (0..image.height()).step_by(4) {
            for x in (0..image.width()).step_by(4) {
                let anchor = image.pixel(x, y);
                assert_eq!(image.pixel(x + 3, y + 3), anchor);
            }
        }
    }

    #[rstest]
    fn zero_opacity_renders_nothing() {
        let sampler = KernelSampler::new(
            [HeatPoint::new(Coord { x: 0.0, y: 0.0 }, 100.0)],
            KernelConfig::default(),
        );
        let config = TileConfig {
            opacity: 0.0,
            ..TileConfig::default()
        };
        let image = render_tile(&sampler, TileCoord::new(0, 0, 0), &config);
        assert!(image.is_blank());
    }

    #[rstest]
    fn pixel_outside_image_is_none() {
        let image = TileImage::transparent(4, 4);
        assert_eq!(image.pixel(4, 0), None);
        assert_eq!(image.pixel(3, 3), Some([0, 0, 0, 0]));
    }
}
