//! Sparse exposure forecasts and interpolation between their samples.
//!
//! A forecast is a partial function from minute offsets to scores. Offsets
//! between samples are linearly interpolated; offsets past the last sample
//! hold the last known score rather than extrapolating.

use serde::{Deserialize, Serialize};

use crate::{Terrace, clamp_score};

/// Horizon offsets, in minutes, offered when browsing ahead in time.
pub const HORIZON_OFFSETS: [u32; 7] = [0, 15, 30, 45, 60, 90, 120];

/// Predicted score at a future offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastSample {
    /// Minutes from now.
    pub offset_minutes: u32,
    /// Predicted sun score in `0..=100`.
    pub score: u8,
}

impl ForecastSample {
    /// Construct a sample, clamping the score to `0..=100`.
    #[must_use]
    pub fn new(offset_minutes: u32, score: u8) -> Self {
        Self {
            offset_minutes,
            score: score.min(crate::MAX_SCORE),
        }
    }
}

/// Samples ordered by ascending offset with no duplicate offsets.
///
/// # Examples
/// ```
/// use sunseat_core::{Forecast, ForecastSample};
///
/// let forecast = Forecast::new(vec![
///     ForecastSample::new(60, 90),
///     ForecastSample::new(0, 50),
///     ForecastSample::new(60, 10),
/// ]);
/// let offsets: Vec<u32> = forecast.samples().iter().map(|s| s.offset_minutes).collect();
/// assert_eq!(offsets, vec![0, 60]);
/// assert_eq!(forecast.samples()[1].score, 90);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ForecastSample>", into = "Vec<ForecastSample>")]
pub struct Forecast {
    samples: Vec<ForecastSample>,
}

impl Forecast {
    /// Sort `samples` by offset and clamp their scores to `0..=100`. When
    /// several samples share an offset the first one supplied wins.
    #[must_use]
    pub fn new(mut samples: Vec<ForecastSample>) -> Self {
        for sample in &mut samples {
            sample.score = sample.score.min(crate::MAX_SCORE);
        }
        // Stable sort keeps input order among equal offsets.
        samples.sort_by_key(|s| s.offset_minutes);
        samples.dedup_by_key(|s| s.offset_minutes);
        Self { samples }
    }

    /// Ordered samples.
    #[must_use]
    pub fn samples(&self) -> &[ForecastSample] {
        &self.samples
    }

    /// Whether the forecast has no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Score at `offset_minutes`, starting from `now` at offset zero.
    ///
    /// - Offsets `<= 0`, or an empty forecast, return `now`.
    /// - A sample exactly at the offset returns that sample's score.
    /// - Otherwise the score is linearly interpolated between the last
    ///   sample at or before the offset (or `now` at offset 0) and the first
    ///   sample after it.
    /// - Offsets past the last sample return the last sample's score.
    ///
    /// # Examples
    /// ```
    /// use sunseat_core::{Forecast, ForecastSample};
    ///
    /// let forecast = Forecast::new(vec![
    ///     ForecastSample::new(0, 50),
    ///     ForecastSample::new(60, 90),
    /// ]);
    /// assert_eq!(forecast.score_at(50, 30), 70);
    /// assert_eq!(forecast.score_at(50, 240), 90);
    /// ```
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "linear interpolation between integer samples"
    )]
    pub fn score_at(&self, now: u8, offset_minutes: i64) -> u8 {
        let now = now.min(crate::MAX_SCORE);
        if offset_minutes <= 0 || self.samples.is_empty() {
            return now;
        }
        // Offsets beyond u32 range lie past every sample.
        let request = u32::try_from(offset_minutes).unwrap_or(u32::MAX);

        let mut previous = ForecastSample {
            offset_minutes: 0,
            score: now,
        };
        for sample in &self.samples {
            if sample.offset_minutes == request {
                return sample.score;
            }
            if sample.offset_minutes > request {
                let span = f64::from(sample.offset_minutes - previous.offset_minutes);
                let ratio = f64::from(request - previous.offset_minutes) / span;
                let from = f64::from(previous.score);
                let to = f64::from(sample.score);
                return clamp_score((to - from).mul_add(ratio, from));
            }
            previous = *sample;
        }
        previous.score
    }
}

impl From<Vec<ForecastSample>> for Forecast {
    fn from(samples: Vec<ForecastSample>) -> Self {
        Self::new(samples)
    }
}

impl From<Forecast> for Vec<ForecastSample> {
    fn from(forecast: Forecast) -> Self {
        forecast.samples
    }
}

/// Score of `terrace` at `offset_minutes` from now.
///
/// Convenience wrapper around [`Forecast::score_at`] seeded with the
/// terrace's current score.
#[must_use]
pub fn score_at_offset(terrace: &Terrace, offset_minutes: i64) -> u8 {
    terrace
        .forecast
        .score_at(terrace.sun_score_now, offset_minutes)
}
