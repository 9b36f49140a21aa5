//! Grayscale morphology with an elliptical structuring element.
//!
//! The morphological denoiser is an **opening followed by a closing**:
//!
//! ```text
//! open(I)  = dilate(erode(I))     removes bright specks smaller than the disc
//! close(I) = erode(dilate(I))     fills dark gaps smaller than the disc
//! filter(I) = close(open(I))
//! ```
//!
//! Erosion takes the minimum over the structuring-element footprint, dilation
//! the maximum. Reads outside the image replicate the edge sample.

use super::buffer::PixelBuffer;
use super::error::ImagingError;
use super::params::validate_window_size;

/// Disc-shaped footprint inscribed in a `size × size` square.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuringElement {
    size: u32,
    offsets: Vec<(i64, i64)>,
}

impl StructuringElement {
    /// Build the elliptical element for an odd `size ≥ 3`.
    ///
    /// Row `dy` spans `c ± round(c · sqrt(1 − dy²/r²))` with `r = c = size / 2`,
    /// which gives a plus sign for 3 and a rounded diamond for 5.
    pub fn ellipse(size: u32) -> Result<Self, ImagingError> {
        validate_window_size("kernel_size", size)?;
        let r = (size / 2) as i64;
        let inv_r2 = 1.0 / (r * r) as f64;

        let mut offsets = Vec::new();
        for dy in -r..=r {
            let half = (r as f64 * (((r * r - dy * dy) as f64) * inv_r2).sqrt()).round() as i64;
            for dx in -half..=half {
                offsets.push((dx, dy));
            }
        }
        Ok(Self { size, offsets })
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Footprint as `(dx, dy)` offsets from the centre, row by row.
    pub fn offsets(&self) -> &[(i64, i64)] {
        &self.offsets
    }

    /// Whether the footprint covers `(dx, dy)`.
    pub fn contains(&self, dx: i64, dy: i64) -> bool {
        self.offsets.contains(&(dx, dy))
    }
}

/// Minimum over the footprint.
pub fn erode(src: &PixelBuffer, element: &StructuringElement) -> PixelBuffer {
    reduce_footprint(src, element, u8::MAX, u8::min)
}

/// Maximum over the footprint.
pub fn dilate(src: &PixelBuffer, element: &StructuringElement) -> PixelBuffer {
    reduce_footprint(src, element, u8::MIN, u8::max)
}

pub fn open(src: &PixelBuffer, element: &StructuringElement) -> PixelBuffer {
    dilate(&erode(src, element), element)
}

pub fn close(src: &PixelBuffer, element: &StructuringElement) -> PixelBuffer {
    erode(&dilate(src, element), element)
}

/// Opening then closing with a disc of diameter `kernel_size`.
pub fn morphological_filter(
    src: &PixelBuffer,
    kernel_size: u32,
) -> Result<PixelBuffer, ImagingError> {
    let element = StructuringElement::ellipse(kernel_size)?;
    Ok(close(&open(src, &element), &element))
}

fn reduce_footprint(
    src: &PixelBuffer,
    element: &StructuringElement,
    identity: u8,
    combine: fn(u8, u8) -> u8,
) -> PixelBuffer {
    src.map_rows(|y, row| {
        let y = y as i64;
        for (x, out) in row.iter_mut().enumerate() {
            let x = x as i64;
            *out = element
                .offsets
                .iter()
                .fold(identity, |acc, &(dx, dy)| {
                    combine(acc, src.get_replicated(x + dx, y + dy))
                });
        }
    })
}
