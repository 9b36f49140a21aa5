//! # Retina Denoise
//!
//! Denoising and quality assessment for grayscale retinal fundus images.
//! Five classical filters are offered side by side so their effect on vessel
//! detail can be compared on the same input.
//!
//! # Architecture: Decode, Filter, Assess
//!
//! ```text
//! 1. Decode   file/bytes  →  PixelBuffer       (codec boundary, luma only)
//! 2. Filter   PixelBuffer →  PixelBuffer       (one filter, or all five)
//! 3. Assess   PixelBuffer →  Statistics / MetricResult
//! ```
//!
//! Filters and metrics are pure functions over [`imaging::PixelBuffer`]. They
//! never see file formats, so unit tests build buffers in memory and the
//! codec can be swapped for a mock.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Pixel buffer, the five filters, analysis, PSNR/SSIM, dispatch, codec |
//! | [`dataset`] | DRIVE-style `training/images` + `test/images` loader |
//! | [`config`] | `denoise.toml` loading, merging, and validation |
//! | [`output`] | CLI output formatting for every subcommand |
//!
//! # Design Decisions
//!
//! ## Closed Filter Set
//!
//! The filters form a closed enum ([`imaging::FilterKind`]). Selection by name
//! is parsed once, up front, and an unknown token fails with `UnknownFilter`
//! before any pixel is read. Each kind carries its own validated parameters in
//! [`imaging::FilterSpec`], so a filter cannot run with an even window or a
//! non-positive sigma.
//!
//! ## Independent Run-All
//!
//! [`imaging::run_all`] runs the five filters in parallel and keeps one
//! `Result` per filter. A failing filter produces a failed entry; the other
//! four still return their outputs.
//!
//! ## Border Handling
//!
//! Every filter window (rank filters, bilateral, Wiener statistics and
//! morphology) extends the image by repeating its nearest edge sample.
//! Outputs always have the input's dimensions. The analyzer's Laplacian
//! mirrors instead (`dcb|abcd|cba`) so blur scores match the usual vision
//! library convention.
//!
//! ## Soft-Failing Metrics
//!
//! SSIM needs at least one full 7×7 window. For smaller inputs
//! [`imaging::compare`] returns zeroed metrics with an `error` note instead
//! of failing, so batch comparisons over mixed inputs keep going. Mismatched
//! dimensions are still a hard error.

pub mod config;
pub mod dataset;
pub mod imaging;
pub mod output;

#[cfg(test)]
pub(crate) mod test_helpers;
