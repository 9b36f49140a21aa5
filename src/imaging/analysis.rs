//! Descriptive statistics and blur detection.
//!
//! [`analyze`] reports population mean / standard deviation / min / max over
//! all samples plus a `blur_score`: the variance of the 4-neighbour Laplacian
//! response
//!
//! ```text
//! [ 0  1  0 ]
//! [ 1 -4  1 ]
//! [ 0  1  0 ]
//! ```
//!
//! evaluated in `f64`. Unlike the filters, the Laplacian mirrors the image at
//! its border without repeating the edge sample (`dcb|abcd|cba`), the default
//! border of common vision libraries, so blur scores line up with theirs.
//! Flat or blurred images score low; sharp edges and grain score high. A
//! uniform image scores exactly 0.

use super::buffer::PixelBuffer;
use serde::{Deserialize, Serialize};

/// Summary of a single buffer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub mean: f64,
    pub std: f64,
    pub min: u8,
    pub max: u8,
    pub blur_score: f64,
}

/// Compute [`Statistics`] for a buffer.
pub fn analyze(buffer: &PixelBuffer) -> Statistics {
    let samples = buffer.samples();
    let (mean, variance) = population_moments(samples.iter().map(|&v| v as f64));
    // Buffers are never empty, so the folds always see at least one sample.
    let min = samples.iter().copied().min().unwrap_or(0);
    let max = samples.iter().copied().max().unwrap_or(0);

    Statistics {
        mean,
        std: variance.sqrt(),
        min,
        max,
        blur_score: blur_score(buffer),
    }
}

/// Variance of the Laplacian response.
pub fn blur_score(buffer: &PixelBuffer) -> f64 {
    let response = laplacian(buffer);
    population_moments(response.iter().copied()).1
}

/// Per-pixel 4-neighbour Laplacian, row-major.
pub fn laplacian(buffer: &PixelBuffer) -> Vec<f64> {
    buffer.map_rows_f64(|y, row| {
        let y = y as i64;
        for (x, out) in row.iter_mut().enumerate() {
            let x = x as i64;
            let center = buffer.get_reflected(x, y) as f64;
            let neighbours = buffer.get_reflected(x - 1, y) as f64
                + buffer.get_reflected(x + 1, y) as f64
                + buffer.get_reflected(x, y - 1) as f64
                + buffer.get_reflected(x, y + 1) as f64;
            *out = neighbours - 4.0 * center;
        }
    })
}

/// Population mean and variance in one pass (Welford).
///
/// Returns `(0.0, 0.0)` for an empty sequence.
pub(crate) fn population_moments(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut count = 0u64;
    let mut mean = 0.0;
    let mut m2 = 0.0;
    for value in values {
        count += 1;
        let delta = value - mean;
        mean += delta / count as f64;
        m2 += delta * (value - mean);
    }
    if count == 0 {
        return (0.0, 0.0);
    }
    (mean, (m2 / count as f64).max(0.0))
}
