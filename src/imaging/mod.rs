//! Grayscale denoising: filters, analysis, metrics, and the codec boundary.
//!
//! | Operation | Function |
//! |---|---|
//! | **Median** | [`median_filter`]: k×k rank filter via `select_nth_unstable` |
//! | **Adaptive** | [`adaptive_filter`]: w×w windowed median via sliding histogram |
//! | **Bilateral** | [`bilateral_filter`]: spatial × range Gaussian weights |
//! | **Morphological** | [`morphological_filter`]: opening then closing with a disc |
//! | **Wiener** | [`wiener_filter`]: local mean/variance with global noise estimate |
//! | **Analyze** | [`analyze`]: mean, std, range, Laplacian-variance blur score |
//! | **Compare** | [`compare`]: PSNR + SSIM, soft-fails on small inputs |
//! | **Decode / Encode** | [`ImageCodec`] trait + [`RustCodec`] |
//!
//! The module is split into:
//! - **Buffer**: [`PixelBuffer`], the only image type the filters see
//! - **Parameters**: [`FilterKind`] and the validated [`FilterSpec`]
//! - **Filters / Morphology**: pure functions from buffer to buffer
//! - **Dispatch**: selection by name, run-all with per-filter failure isolation
//! - **Codec**: container formats in and out, kept out of the filter code
//!
//! Filter windows that reach outside the image replicate the nearest border
//! sample. The blur score's Laplacian mirrors about the edge sample instead.

pub mod analysis;
pub mod buffer;
pub mod codec;
pub mod dispatch;
pub mod error;
pub mod filters;
pub mod metrics;
pub mod morphology;
mod params;
pub mod rust_codec;

pub use analysis::{Statistics, analyze};
pub use buffer::PixelBuffer;
pub use codec::{CodecError, Dimensions, ImageCodec, OutputFormat};
pub use dispatch::{
    ComparisonResult, FilterEvaluation, FilterInfo, catalog, evaluate_all, evaluate_all_with, run,
    run_all, run_all_with, run_named,
};
pub use error::ImagingError;
pub use filters::{adaptive_filter, bilateral_filter, median_filter, wiener_filter};
pub use metrics::{MetricResult, compare};
pub use morphology::morphological_filter;
pub use params::{
    BilateralParams, DEFAULT_BILATERAL_DIAMETER, DEFAULT_BILATERAL_SIGMA, DEFAULT_WINDOW_SIZE,
    FilterKind, FilterParams, FilterSpec, MAX_WINDOW_SIZE, validate_diameter,
    validate_window_size,
};
pub use rust_codec::{RustCodec, is_supported_input, supported_input_extensions};
