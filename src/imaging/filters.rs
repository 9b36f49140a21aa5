//! Rank, bilateral and Wiener denoising filters.
//!
//! Every function here is pure: it validates its size parameters, reads the
//! source [`PixelBuffer`] through border-replicated window access and returns
//! a new buffer of identical dimensions. The morphological filter lives in
//! [`morphology`](super::morphology).
//!
//! | Filter | Window | Output per pixel |
//! |---|---|---|
//! | [`median_filter`] | k×k | middle element of the sorted window |
//! | [`adaptive_filter`] | w×w | same order statistic, sliding histogram |
//! | [`bilateral_filter`] | d×d | spatial × range weighted mean |
//! | [`wiener_filter`] | w×w | local mean + gain·(x − local mean) |

use super::analysis::population_moments;
use super::buffer::{PixelBuffer, to_sample};
use super::error::ImagingError;
use super::params::{BilateralParams, validate_window_size};

/// Floor for the local variance in the Wiener gain denominator.
pub const WIENER_VARIANCE_FLOOR: f64 = 1e-5;

/// Classic k×k median filter.
///
/// Collects the k² border-replicated neighbours, partially sorts them and
/// emits the middle one.
pub fn median_filter(src: &PixelBuffer, kernel_size: u32) -> Result<PixelBuffer, ImagingError> {
    validate_window_size("kernel_size", kernel_size)?;
    let radius = (kernel_size / 2) as i64;
    let area = kernel_size as usize * kernel_size as usize;

    Ok(src.map_rows(|y, row| {
        let y = y as i64;
        let mut window = Vec::with_capacity(area);
        for (x, out) in row.iter_mut().enumerate() {
            let x = x as i64;
            window.clear();
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    window.push(src.get_replicated(x + dx, y + dy));
                }
            }
            let mid = window.len() / 2;
            *out = *window.select_nth_unstable(mid).1;
        }
    }))
}

/// Fixed-size windowed order filter ("adaptive" in the filter catalog).
///
/// Emits the median of the w×w neighbourhood, the same order statistic as
/// [`median_filter`]. The window never grows. Each row is swept with a
/// 256-bin histogram that is updated one column at a time, which keeps the
/// per-pixel cost linear in `w` instead of quadratic.
pub fn adaptive_filter(src: &PixelBuffer, window_size: u32) -> Result<PixelBuffer, ImagingError> {
    validate_window_size("window_size", window_size)?;
    let radius = (window_size / 2) as i64;
    // Rank of the median inside the window (area is odd).
    let rank = window_size as usize * window_size as usize / 2;

    Ok(src.map_rows(|y, row| {
        let y = y as i64;
        let mut histogram = [0usize; 256];
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                histogram[src.get_replicated(dx, y + dy) as usize] += 1;
            }
        }

        for (x, out) in row.iter_mut().enumerate() {
            let x = x as i64;
            if x > 0 {
                for dy in -radius..=radius {
                    histogram[src.get_replicated(x - radius - 1, y + dy) as usize] -= 1;
                    histogram[src.get_replicated(x + radius, y + dy) as usize] += 1;
                }
            }
            *out = histogram_rank(&histogram, rank);
        }
    }))
}

/// Smallest intensity whose cumulative count exceeds `rank`.
fn histogram_rank(histogram: &[usize; 256], rank: usize) -> u8 {
    let mut seen = 0usize;
    for (value, &count) in histogram.iter().enumerate() {
        seen += count;
        if seen > rank {
            return value as u8;
        }
    }
    255
}

/// Edge-preserving bilateral filter over a d×d neighbourhood.
///
/// `weight(q) = exp(-|q - p|² / 2σs²) · exp(-(I(q) - I(p))² / 2σc²)`, and the
/// output is the weight-normalised mean. The centre always contributes a
/// weight of 1, so the normaliser is never zero.
pub fn bilateral_filter(
    src: &PixelBuffer,
    params: &BilateralParams,
) -> Result<PixelBuffer, ImagingError> {
    params.validate()?;
    let radius = (params.diameter / 2) as i64;
    let space_coeff = -0.5 / (params.sigma_space * params.sigma_space);
    let color_coeff = -0.5 / (params.sigma_color * params.sigma_color);

    let spatial: Vec<(i64, i64, f64)> = (-radius..=radius)
        .flat_map(|dy| (-radius..=radius).map(move |dx| (dx, dy)))
        .map(|(dx, dy)| (dx, dy, (((dx * dx + dy * dy) as f64) * space_coeff).exp()))
        .collect();
    let range: Vec<f64> = (0..256)
        .map(|diff| ((diff * diff) as f64 * color_coeff).exp())
        .collect();

    Ok(src.map_rows(|y, row| {
        let y = y as i64;
        for (x, out) in row.iter_mut().enumerate() {
            let x = x as i64;
            let center = src.get_replicated(x, y);
            let mut weighted = 0.0;
            let mut total = 0.0;
            for &(dx, dy, space_weight) in &spatial {
                let q = src.get_replicated(x + dx, y + dy);
                let w = space_weight * range[center.abs_diff(q) as usize];
                weighted += w * q as f64;
                total += w;
            }
            *out = to_sample(weighted / total);
        }
    }))
}

/// Adaptive Wiener filter with a single global noise estimate.
///
/// Per pixel: local mean μ and variance v over a w×w window (mean of squares
/// minus squared mean). The noise variance `g` is the variance of the whole
/// image. Output is `μ + max(v − g, 0) / max(v, ε) · (x − μ)`, rounded and
/// clamped.
pub fn wiener_filter(src: &PixelBuffer, window_size: u32) -> Result<PixelBuffer, ImagingError> {
    validate_window_size("window_size", window_size)?;
    let local_mean = box_mean(src, window_size, |v| v);
    let local_sq_mean = box_mean(src, window_size, |v| v * v);
    let (_, noise_variance) = population_moments(src.samples().iter().map(|&v| v as f64));

    let width = src.width() as usize;
    Ok(src.map_rows(|y, row| {
        let offset = y as usize * width;
        for (x, out) in row.iter_mut().enumerate() {
            let idx = offset + x;
            *out = wiener_sample(
                src.samples()[idx] as f64,
                local_mean[idx],
                local_sq_mean[idx],
                noise_variance,
            );
        }
    }))
}

#[inline]
fn wiener_sample(value: f64, mean: f64, sq_mean: f64, noise_variance: f64) -> u8 {
    let variance = sq_mean - mean * mean;
    let gain = (variance - noise_variance).max(0.0) / variance.max(WIENER_VARIANCE_FLOOR);
    to_sample(mean + gain * (value - mean))
}

/// Border-replicated w×w mean of `f(sample)`, computed as two separable passes.
pub(crate) fn box_mean(
    src: &PixelBuffer,
    size: u32,
    f: impl Fn(f64) -> f64 + Sync,
) -> Vec<f64> {
    let radius = (size / 2) as i64;
    let norm = 1.0 / size as f64;
    let width = src.width() as usize;
    let last_row = src.height() as i64 - 1;

    let horizontal = src.map_rows_f64(|y, row| {
        for (x, out) in row.iter_mut().enumerate() {
            let sum: f64 = (-radius..=radius)
                .map(|dx| f(src.get_replicated(x as i64 + dx, y as i64) as f64))
                .sum();
            *out = sum * norm;
        }
    });

    src.map_rows_f64(|y, row| {
        for (x, out) in row.iter_mut().enumerate() {
            let sum: f64 = (-radius..=radius)
                .map(|dy| {
                    let yy = (y as i64 + dy).clamp(0, last_row) as usize;
                    horizontal[yy * width + x]
                })
                .sum();
            *out = sum * norm;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    #[test]
    fn median_3x3_known_neighbourhood() {
        #[rustfmt::skip]
        let src = PixelBuffer::new(3, 3, vec![
            10, 20, 30,
            40, 255, 60,
            70, 80, 90,
        ]).unwrap();
        let out = median_filter(&src, 3).unwrap();
        // centre window is the whole image: sorted middle is 60
        assert_eq!(out.get(1, 1), 60);
        // top-left window with replication: 10 10 20 / 10 10 20 / 40 40 255
        assert_eq!(out.get(0, 0), 20);
    }

    #[test]
    fn median_removes_isolated_impulses() {
        let mut samples = vec![100u8; 49];
        samples[3 * 7 + 3] = 255;
        samples[5 * 7 + 1] = 0;
        let src = PixelBuffer::new(7, 7, samples).unwrap();
        let out = median_filter(&src, 3).unwrap();
        assert_uniform(&out, 100);
    }

    #[test]
    fn median_is_idempotent_on_constant_image() {
        let src = uniform(6, 5, 42);
        let once = median_filter(&src, 5).unwrap();
        let twice = median_filter(&once, 5).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once, src);
    }

    #[test]
    fn adaptive_matches_median_order_statistic() {
        let src = noisy(23, 17, 7);
        for size in [3, 5, 7] {
            assert_eq!(
                adaptive_filter(&src, size).unwrap(),
                median_filter(&src, size).unwrap(),
                "window {size}"
            );
        }
    }

    #[test]
    fn adaptive_window_larger_than_image() {
        let src = noisy(2, 3, 11);
        assert_eq!(
            adaptive_filter(&src, 9).unwrap(),
            median_filter(&src, 9).unwrap()
        );
    }

    #[test]
    fn histogram_rank_picks_median() {
        let mut histogram = [0usize; 256];
        for v in [3u8, 9, 9, 200, 1] {
            histogram[v as usize] += 1;
        }
        assert_eq!(histogram_rank(&histogram, 2), 9);
        assert_eq!(histogram_rank(&histogram, 0), 1);
        assert_eq!(histogram_rank(&histogram, 4), 200);
    }

    #[test]
    fn bilateral_diameter_one_is_identity() {
        let src = noisy(9, 9, 3);
        let params = BilateralParams {
            diameter: 1,
            ..BilateralParams::default()
        };
        assert_eq!(bilateral_filter(&src, &params).unwrap(), src);
    }

    #[test]
    fn bilateral_keeps_strong_edges() {
        let src = PixelBuffer::from_fn(10, 6, |x, _| if x < 5 { 20 } else { 220 }).unwrap();
        let params = BilateralParams {
            diameter: 5,
            sigma_color: 10.0,
            sigma_space: 3.0,
        };
        let out = bilateral_filter(&src, &params).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn bilateral_smooths_small_fluctuations() {
        let src = PixelBuffer::from_fn(9, 9, |x, y| if (x + y) % 2 == 0 { 100 } else { 104 })
            .unwrap();
        let out = bilateral_filter(&src, &BilateralParams::default()).unwrap();
        assert!(out.samples().iter().all(|&v| (101..=103).contains(&v)));
    }

    #[test]
    fn wiener_keeps_constant_image() {
        let src = uniform(8, 8, 200);
        assert_eq!(wiener_filter(&src, 5).unwrap(), src);
    }

    #[test]
    fn wiener_flattens_regions_below_noise_level() {
        // One bright outlier makes the global variance exceed the variance
        // of the gentle ramp everywhere except around the outlier.
        let src = PixelBuffer::from_fn(15, 15, |x, y| {
            if x == 7 && y == 7 { 255 } else { 100 + (x % 2) as u8 }
        })
        .unwrap();
        let out = wiener_filter(&src, 3).unwrap();
        assert_eq!(out.get(0, 0), 100);
        assert_eq!(out.get(14, 0), 100);
        // The outlier's window variance dwarfs the global estimate: kept mostly.
        assert!(out.get(7, 7) > 200);
    }

    /// Border-replicated w×w window around `(x, y)`.
    fn window(src: &PixelBuffer, x: i64, y: i64, size: u32) -> Vec<(i64, i64, f64)> {
        let r = (size / 2) as i64;
        let mut values = Vec::new();
        for dy in -r..=r {
            for dx in -r..=r {
                values.push((dx, dy, src.get_replicated(x + dx, y + dy) as f64));
            }
        }
        values
    }

    #[test]
    fn wiener_matches_closed_form() {
        let src = noisy(11, 9, 17);
        let out = wiener_filter(&src, 5).unwrap();

        let n = src.len() as f64;
        let global_mean = src.samples().iter().map(|&v| v as f64).sum::<f64>() / n;
        let noise = src
            .samples()
            .iter()
            .map(|&v| (v as f64 - global_mean).powi(2))
            .sum::<f64>()
            / n;

        for y in 0..9u32 {
            for x in 0..11u32 {
                let values = window(&src, x as i64, y as i64, 5);
                let count = values.len() as f64;
                let mean = values.iter().map(|v| v.2).sum::<f64>() / count;
                let sq_mean = values.iter().map(|v| v.2 * v.2).sum::<f64>() / count;
                let variance = sq_mean - mean * mean;
                let gain = (variance - noise).max(0.0) / variance.max(1e-5);
                let value = src.get(x, y) as f64;
                let expected = (mean + gain * (value - mean)).round().clamp(0.0, 255.0) as u8;
                assert_eq!(out.get(x, y), expected, "at ({x}, {y})");
            }
        }
    }

    #[test]
    fn bilateral_matches_closed_form() {
        let src = noisy(10, 8, 23);
        let (sigma_color, sigma_space) = (30.0, 2.0);
        let params = BilateralParams {
            diameter: 5,
            sigma_color,
            sigma_space,
        };
        let out = bilateral_filter(&src, &params).unwrap();

        for y in 0..8u32 {
            for x in 0..10u32 {
                let center = src.get(x, y) as f64;
                let mut weighted = 0.0;
                let mut total = 0.0;
                for (dx, dy, q) in window(&src, x as i64, y as i64, 5) {
                    let spatial = (-((dx * dx + dy * dy) as f64) / (2.0 * sigma_space * sigma_space)).exp();
                    let range = (-(q - center).powi(2) / (2.0 * sigma_color * sigma_color)).exp();
                    weighted += spatial * range * q;
                    total += spatial * range;
                }
                let expected = (weighted / total).round().clamp(0.0, 255.0) as u8;
                assert_eq!(out.get(x, y), expected, "at ({x}, {y})");
            }
        }
    }

    #[test]
    fn oversized_windows_fail_without_panicking() {
        let src = uniform(1, 1, 7);
        for size in [257, 65_537, u32::MAX] {
            assert!(matches!(
                median_filter(&src, size),
                Err(ImagingError::InvalidParameter { .. })
            ));
            assert!(matches!(
                adaptive_filter(&src, size),
                Err(ImagingError::InvalidParameter { .. })
            ));
            assert!(matches!(
                wiener_filter(&src, size),
                Err(ImagingError::InvalidParameter { .. })
            ));
            let params = BilateralParams {
                diameter: size,
                ..BilateralParams::default()
            };
            assert!(matches!(
                bilateral_filter(&src, &params),
                Err(ImagingError::InvalidParameter { .. })
            ));
        }
        // The largest accepted window still runs.
        assert_uniform(&median_filter(&src, 255).unwrap(), 7);
    }

    #[test]
    fn box_mean_matches_direct_average() {
        let src = noisy(6, 5, 19);
        let plane = box_mean(&src, 3, |v| v);
        for y in 0..5i64 {
            for x in 0..6i64 {
                let mut sum = 0.0;
                for dy in -1..=1 {
                    for dx in -1..=1 {
                        sum += src.get_replicated(x + dx, y + dy) as f64;
                    }
                }
                let expected = sum / 9.0;
                assert!((plane[(y * 6 + x) as usize] - expected).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn invalid_sizes_are_rejected() {
        let src = uniform(4, 4, 1);
        assert!(matches!(
            median_filter(&src, 4),
            Err(ImagingError::InvalidParameter { .. })
        ));
        assert!(matches!(
            adaptive_filter(&src, 1),
            Err(ImagingError::InvalidParameter { .. })
        ));
        assert!(matches!(
            wiener_filter(&src, 0),
            Err(ImagingError::InvalidParameter { .. })
        ));
        let params = BilateralParams {
            diameter: 6,
            ..BilateralParams::default()
        };
        assert!(matches!(
            bilateral_filter(&src, &params),
            Err(ImagingError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn single_row_and_column_buffers() {
        for src in [noisy(9, 1, 5), noisy(1, 9, 6)] {
            for out in [
                median_filter(&src, 3).unwrap(),
                adaptive_filter(&src, 5).unwrap(),
                bilateral_filter(&src, &BilateralParams::default()).unwrap(),
                wiener_filter(&src, 3).unwrap(),
            ] {
                assert_eq!(out.dimensions(), src.dimensions());
            }
        }
    }
}
