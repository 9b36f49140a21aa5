//! Shared buffer builders and assertions for the unit test suite.
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let src = spike(9, 9, 20, 255);
//! let out = morphological_filter(&src, 3).unwrap();
//! assert_uniform(&out, 20);
//! ```

use crate::imaging::PixelBuffer;

// =========================================================================
// Builders
// =========================================================================

/// Every sample equals `value`.
pub fn uniform(width: u32, height: u32, value: u8) -> PixelBuffer {
    PixelBuffer::filled(width, height, value).unwrap()
}

/// Deterministic pseudo-random samples (64-bit LCG, high byte).
///
/// Different seeds give unrelated images; the same seed always gives the
/// same image, so failures reproduce.
pub fn noisy(width: u32, height: u32, seed: u64) -> PixelBuffer {
    let mut state = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15).wrapping_add(1);
    PixelBuffer::from_fn(width, height, |_, _| {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (state >> 56) as u8
    })
    .unwrap()
}

/// `background` everywhere except a single `peak` sample at the centre.
pub fn spike(width: u32, height: u32, background: u8, peak: u8) -> PixelBuffer {
    let (cx, cy) = (width / 2, height / 2);
    PixelBuffer::from_fn(width, height, |x, y| {
        if (x, y) == (cx, cy) { peak } else { background }
    })
    .unwrap()
}

// =========================================================================
// Assertions
// =========================================================================

/// Assert every sample equals `value`, reporting the first offender.
pub fn assert_uniform(buffer: &PixelBuffer, value: u8) {
    if let Some(pos) = buffer.samples().iter().position(|&v| v != value) {
        let width = buffer.width() as usize;
        panic!(
            "expected uniform {value}, found {} at ({}, {})",
            buffer.samples()[pos],
            pos % width,
            pos / width
        );
    }
}
