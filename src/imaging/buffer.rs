//! The grayscale sample grid every filter, analyzer and metric operates on.
//!
//! A [`PixelBuffer`] is immutable once built: filters read one buffer and
//! return a freshly allocated one of the same dimensions. Window reads that
//! fall outside the grid use **border replication**: the coordinate is clamped
//! to the nearest edge, so the edge sample is repeated. There is no wraparound,
//! no zero padding, and no output shrinkage.
//!
//! ```text
//!   x = -2 -1 | 0  1  2  3 | 4  5
//!       a  a  | a  b  c  d | d  d
//! ```

use super::error::ImagingError;
use rayon::prelude::*;

/// Row-major 8-bit grayscale image with validated, non-zero dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    samples: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap an existing sample vector.
    ///
    /// Fails with `EmptyImage` when either dimension is zero and with
    /// `MalformedBuffer` when `samples.len() != width * height`.
    pub fn new(width: u32, height: u32, samples: Vec<u8>) -> Result<Self, ImagingError> {
        ensure_non_empty(width, height)?;
        let expected = width as usize * height as usize;
        if samples.len() != expected {
            return Err(ImagingError::MalformedBuffer {
                width,
                height,
                expected,
                actual: samples.len(),
            });
        }
        Ok(Self {
            width,
            height,
            samples,
        })
    }

    /// A buffer where every sample equals `value`.
    pub fn filled(width: u32, height: u32, value: u8) -> Result<Self, ImagingError> {
        ensure_non_empty(width, height)?;
        Ok(Self {
            width,
            height,
            samples: vec![value; width as usize * height as usize],
        })
    }

    /// Build a buffer by evaluating `f(x, y)` for every position.
    pub fn from_fn(
        width: u32,
        height: u32,
        mut f: impl FnMut(u32, u32) -> u8,
    ) -> Result<Self, ImagingError> {
        ensure_non_empty(width, height)?;
        let mut samples = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                samples.push(f(x, y));
            }
        }
        Ok(Self {
            width,
            height,
            samples,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of samples (`width * height`, never zero).
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false: zero-sized buffers cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<u8> {
        self.samples
    }

    /// Sample at an in-bounds position. Panics when out of range.
    pub fn get(&self, x: u32, y: u32) -> u8 {
        assert!(
            x < self.width && y < self.height,
            "({x}, {y}) outside {}x{}",
            self.width,
            self.height
        );
        self.samples[y as usize * self.width as usize + x as usize]
    }

    /// Sample at any signed position, replicating the nearest edge sample
    /// when the position lies outside the grid.
    #[inline]
    pub fn get_replicated(&self, x: i64, y: i64) -> u8 {
        let cx = x.clamp(0, self.width as i64 - 1) as usize;
        let cy = y.clamp(0, self.height as i64 - 1) as usize;
        self.samples[cy * self.width as usize + cx]
    }

    /// Sample at any signed position, mirroring about the edge sample without
    /// repeating it (`dcb|abcd|cba`).
    #[inline]
    pub fn get_reflected(&self, x: i64, y: i64) -> u8 {
        let cx = reflect_101(x, self.width as i64) as usize;
        let cy = reflect_101(y, self.height as i64) as usize;
        self.samples[cy * self.width as usize + cx]
    }

    /// Produce a new buffer of the same dimensions by filling each output row
    /// with `fill(y, row)`. Rows are filled in parallel on the rayon pool.
    pub(crate) fn map_rows<F>(&self, fill: F) -> PixelBuffer
    where
        F: Fn(u32, &mut [u8]) + Sync + Send,
    {
        let mut samples = vec![0u8; self.samples.len()];
        samples
            .par_chunks_mut(self.width as usize)
            .enumerate()
            .for_each(|(y, row)| fill(y as u32, row));
        PixelBuffer {
            width: self.width,
            height: self.height,
            samples,
        }
    }

    /// Like [`map_rows`](Self::map_rows) but for a floating-point plane.
    pub(crate) fn map_rows_f64<F>(&self, fill: F) -> Vec<f64>
    where
        F: Fn(u32, &mut [f64]) + Sync + Send,
    {
        let mut plane = vec![0.0f64; self.samples.len()];
        plane
            .par_chunks_mut(self.width as usize)
            .enumerate()
            .for_each(|(y, row)| fill(y as u32, row));
        plane
    }
}

fn ensure_non_empty(width: u32, height: u32) -> Result<(), ImagingError> {
    if width == 0 || height == 0 {
        return Err(ImagingError::EmptyImage { width, height });
    }
    Ok(())
}

/// Map `i` into `0..n` by reflection about the end samples.
fn reflect_101(i: i64, n: i64) -> i64 {
    if n == 1 {
        return 0;
    }
    let period = 2 * n - 2;
    let i = i.rem_euclid(period);
    if i < n { i } else { period - i }
}

/// Round and clamp a floating-point intensity into a valid sample.
#[inline]
pub(crate) fn to_sample(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 255.0) as u8
}
