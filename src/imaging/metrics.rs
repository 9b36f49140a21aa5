//! Full-reference quality metrics: PSNR and SSIM.
//!
//! Both metrics assume a fixed data range of 255.
//!
//! - **PSNR** = `10 · log10(255² / MSE)`. Identical buffers have an MSE of
//!   zero; PSNR is then reported as `f64::INFINITY` (serialized as `"inf"`).
//! - **SSIM** uses a 7×7 uniform window with sample covariance
//!   (`N / (N − 1)` normalisation), `K1 = 0.01`, `K2 = 0.03`, and averages the
//!   per-window index over every window position that lies fully inside the
//!   image. Window sums come from summed-area tables, which are exact for
//!   8-bit inputs, so `ssim(a, a)` is exactly 1.
//!
//! [`compare`] is best-effort: a dimension mismatch is a hard error, but when
//! SSIM cannot be evaluated (image smaller than the window) the result carries
//! an `error` note with both metrics zeroed.

use super::buffer::PixelBuffer;
use super::error::ImagingError;
use serde::{Serialize, Serializer};

pub const DATA_RANGE: f64 = 255.0;
pub const SSIM_WINDOW: u32 = 7;
const K1: f64 = 0.01;
const K2: f64 = 0.03;

/// PSNR/SSIM of a candidate against a reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricResult {
    #[serde(serialize_with = "serialize_psnr")]
    pub psnr: f64,
    pub ssim: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MetricResult {
    /// True when the candidate is sample-for-sample identical to the reference.
    pub fn is_identical(&self) -> bool {
        self.psnr == f64::INFINITY
    }

    fn unavailable(reason: String) -> Self {
        Self {
            psnr: 0.0,
            ssim: 0.0,
            error: Some(reason),
        }
    }
}

fn serialize_psnr<S: Serializer>(psnr: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if psnr.is_infinite() {
        serializer.serialize_str("inf")
    } else {
        serializer.serialize_f64(*psnr)
    }
}

/// Compute PSNR and SSIM of `candidate` against `reference`.
pub fn compare(
    reference: &PixelBuffer,
    candidate: &PixelBuffer,
) -> Result<MetricResult, ImagingError> {
    ensure_same_dimensions(reference, candidate)?;
    let psnr = psnr(reference, candidate)?;
    match ssim(reference, candidate) {
        Ok(ssim) => Ok(MetricResult {
            psnr,
            ssim,
            error: None,
        }),
        Err(ImagingError::MetricUnavailable(reason)) => {
            tracing::warn!("Metrics downgraded: {reason}");
            Ok(MetricResult::unavailable(reason))
        }
        Err(other) => Err(other),
    }
}

/// Mean squared error between two buffers of equal size.
pub fn mse(reference: &PixelBuffer, candidate: &PixelBuffer) -> Result<f64, ImagingError> {
    ensure_same_dimensions(reference, candidate)?;
    let sum: u64 = reference
        .samples()
        .iter()
        .zip(candidate.samples())
        .map(|(&a, &b)| {
            let d = a.abs_diff(b) as u64;
            d * d
        })
        .sum();
    Ok(sum as f64 / reference.len() as f64)
}

/// Peak signal-to-noise ratio in dB; `f64::INFINITY` for identical buffers.
pub fn psnr(reference: &PixelBuffer, candidate: &PixelBuffer) -> Result<f64, ImagingError> {
    let mse = mse(reference, candidate)?;
    if mse == 0.0 {
        return Ok(f64::INFINITY);
    }
    Ok(10.0 * (DATA_RANGE * DATA_RANGE / mse).log10())
}

/// Mean structural similarity index.
///
/// Fails with `MetricUnavailable` when either dimension is below
/// [`SSIM_WINDOW`].
pub fn ssim(reference: &PixelBuffer, candidate: &PixelBuffer) -> Result<f64, ImagingError> {
    ensure_same_dimensions(reference, candidate)?;
    let (width, height) = reference.dimensions();
    if width < SSIM_WINDOW || height < SSIM_WINDOW {
        return Err(ImagingError::MetricUnavailable(format!(
            "SSIM needs at least {SSIM_WINDOW}x{SSIM_WINDOW} pixels, image is {width}x{height}"
        )));
    }

    let x = reference.samples();
    let y = candidate.samples();
    let (w, h) = (width as usize, height as usize);
    let sum_x = SummedArea::build(w, h, |i| x[i] as f64);
    let sum_y = SummedArea::build(w, h, |i| y[i] as f64);
    let sum_xx = SummedArea::build(w, h, |i| (x[i] as f64) * (x[i] as f64));
    let sum_yy = SummedArea::build(w, h, |i| (y[i] as f64) * (y[i] as f64));
    let sum_xy = SummedArea::build(w, h, |i| (x[i] as f64) * (y[i] as f64));

    let win = SSIM_WINDOW as usize;
    let np = (win * win) as f64;
    let cov_norm = np / (np - 1.0);
    let c1 = (K1 * DATA_RANGE).powi(2);
    let c2 = (K2 * DATA_RANGE).powi(2);

    let mut total = 0.0;
    let mut windows = 0usize;
    for top in 0..=h - win {
        for left in 0..=w - win {
            let ux = sum_x.window(left, top, win) / np;
            let uy = sum_y.window(left, top, win) / np;
            let uxx = sum_xx.window(left, top, win) / np;
            let uyy = sum_yy.window(left, top, win) / np;
            let uxy = sum_xy.window(left, top, win) / np;

            let vx = cov_norm * (uxx - ux * ux);
            let vy = cov_norm * (uyy - uy * uy);
            let vxy = cov_norm * (uxy - ux * uy);

            let numerator = (2.0 * ux * uy + c1) * (2.0 * vxy + c2);
            let denominator = (ux * ux + uy * uy + c1) * (vx + vy + c2);
            total += numerator / denominator;
            windows += 1;
        }
    }
    Ok(total / windows as f64)
}

fn ensure_same_dimensions(
    reference: &PixelBuffer,
    candidate: &PixelBuffer,
) -> Result<(), ImagingError> {
    if reference.dimensions() != candidate.dimensions() {
        return Err(ImagingError::DimensionMismatch {
            reference: reference.dimensions(),
            candidate: candidate.dimensions(),
        });
    }
    Ok(())
}

/// Summed-area table with a zero guard row and column.
struct SummedArea {
    stride: usize,
    table: Vec<f64>,
}

impl SummedArea {
    fn build(width: usize, height: usize, value: impl Fn(usize) -> f64) -> Self {
        let stride = width + 1;
        let mut table = vec![0.0; stride * (height + 1)];
        for y in 0..height {
            let mut row_sum = 0.0;
            for x in 0..width {
                row_sum += value(y * width + x);
                table[(y + 1) * stride + x + 1] = table[y * stride + x + 1] + row_sum;
            }
        }
        Self { stride, table }
    }

    /// Sum of the `size × size` block whose top-left corner is `(left, top)`.
    fn window(&self, left: usize, top: usize, size: usize) -> f64 {
        let (right, bottom) = (left + size, top + size);
        self.table[bottom * self.stride + right] - self.table[top * self.stride + right]
            - self.table[bottom * self.stride + left]
            + self.table[top * self.stride + left]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    #[test]
    fn identical_buffers_hit_the_sentinels() {
        let buf = noisy(32, 24, 1);
        let result = compare(&buf, &buf).unwrap();
        assert!(result.is_identical());
        assert_eq!(result.psnr, f64::INFINITY);
        assert!((result.ssim - 1.0).abs() < 1e-12);
        assert!(result.error.is_none());
    }

    #[test]
    fn psnr_of_unit_error() {
        let a = uniform(10, 10, 100);
        let b = uniform(10, 10, 101);
        assert_eq!(mse(&a, &b).unwrap(), 1.0);
        let expected = 10.0 * (255.0f64 * 255.0).log10();
        assert!((psnr(&a, &b).unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn psnr_drops_as_error_grows() {
        let reference = noisy(16, 16, 2);
        let slightly = PixelBuffer::from_fn(16, 16, |x, y| {
            reference.get(x, y).saturating_add(2)
        })
        .unwrap();
        let heavily = PixelBuffer::from_fn(16, 16, |x, y| {
            reference.get(x, y).saturating_add(40)
        })
        .unwrap();
        assert!(psnr(&reference, &slightly).unwrap() > psnr(&reference, &heavily).unwrap());
    }

    #[test]
    fn ssim_penalises_structural_damage() {
        let reference = PixelBuffer::from_fn(20, 20, |x, y| ((x * 12 + y * 3) % 256) as u8)
            .unwrap();
        let damaged = noisy(20, 20, 9);
        let score = ssim(&reference, &damaged).unwrap();
        assert!(score < 0.5, "ssim {score}");
        assert!((-1.0..=1.0).contains(&score));
    }

    #[test]
    fn ssim_is_symmetric() {
        let a = noisy(12, 9, 4);
        let b = noisy(12, 9, 5);
        let ab = ssim(&a, &b).unwrap();
        let ba = ssim(&b, &a).unwrap();
        assert!((ab - ba).abs() < 1e-12);
    }

    #[test]
    fn dimension_mismatch_is_fatal() {
        let err = compare(&uniform(8, 8, 0), &uniform(8, 9, 0)).unwrap_err();
        assert_eq!(
            err,
            ImagingError::DimensionMismatch {
                reference: (8, 8),
                candidate: (8, 9)
            }
        );
    }

    #[test]
    fn small_images_downgrade_to_annotated_zeros() {
        let buf = uniform(4, 4, 128);
        let result = compare(&buf, &buf).unwrap();
        assert_eq!(result.psnr, 0.0);
        assert_eq!(result.ssim, 0.0);
        assert!(result.error.as_deref().unwrap().contains("7x7"));
        assert!(matches!(
            ssim(&buf, &buf),
            Err(ImagingError::MetricUnavailable(_))
        ));
    }

    #[test]
    fn json_encodes_infinite_psnr_as_string() {
        let buf = uniform(8, 8, 3);
        let json = serde_json::to_value(compare(&buf, &buf).unwrap()).unwrap();
        assert_eq!(json["psnr"], "inf");
        assert_eq!(json["ssim"], 1.0);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn summed_area_window_sums() {
        let table = SummedArea::build(3, 3, |i| i as f64);
        // 0 1 2 / 3 4 5 / 6 7 8
        assert_eq!(table.window(0, 0, 3), 36.0);
        assert_eq!(table.window(1, 1, 2), 4.0 + 5.0 + 7.0 + 8.0);
    }
}
