//! Filter selection and the run-all comparison.
//!
//! Selection is a closed enum ([`FilterKind`]) matched exhaustively in
//! [`run`]; an unrecognized token is rejected while parsing, before any
//! buffer is touched. [`run_all`] fans the five filters out on the rayon pool
//! and collects one independent `Result` per filter, so a failing filter
//! becomes a failed entry instead of aborting its siblings.

use super::buffer::PixelBuffer;
use super::error::ImagingError;
use super::filters::{adaptive_filter, bilateral_filter, median_filter, wiener_filter};
use super::metrics::{MetricResult, compare};
use super::morphology::morphological_filter;
use super::params::{FilterKind, FilterParams, FilterSpec};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

/// Apply one filter.
pub fn run(buffer: &PixelBuffer, spec: &FilterSpec) -> Result<PixelBuffer, ImagingError> {
    tracing::debug!(filter = %spec, width = buffer.width(), height = buffer.height(), "Applying filter");
    match spec {
        FilterSpec::Median { kernel_size } => median_filter(buffer, *kernel_size),
        FilterSpec::Adaptive { window_size } => adaptive_filter(buffer, *window_size),
        FilterSpec::Bilateral(params) => bilateral_filter(buffer, params),
        FilterSpec::Morphological { kernel_size } => morphological_filter(buffer, *kernel_size),
        FilterSpec::Wiener { window_size } => wiener_filter(buffer, *window_size),
    }
}

/// Resolve a filter token plus raw parameters and apply it.
///
/// Fails with `UnknownFilter` for tokens outside the catalog and with
/// `InvalidParameter` for bad parameters; neither case allocates an output.
pub fn run_named(
    buffer: &PixelBuffer,
    name: &str,
    params: &FilterParams,
) -> Result<PixelBuffer, ImagingError> {
    let kind: FilterKind = name.parse()?;
    let spec = FilterSpec::from_params(kind, params)?;
    run(buffer, &spec)
}

/// Per-filter outcome of a run-all comparison.
///
/// Always holds exactly one entry per [`FilterKind`].
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonResult {
    entries: BTreeMap<FilterKind, Result<PixelBuffer, ImagingError>>,
}

impl ComparisonResult {
    pub fn get(&self, kind: FilterKind) -> Option<&Result<PixelBuffer, ImagingError>> {
        self.entries.get(&kind)
    }

    /// Entries in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (FilterKind, &Result<PixelBuffer, ImagingError>)> {
        self.entries.iter().map(|(kind, result)| (*kind, result))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.entries.values().filter(|r| r.is_ok()).count()
    }

    /// Kinds that failed, with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (FilterKind, &ImagingError)> {
        self.entries
            .iter()
            .filter_map(|(kind, result)| result.as_ref().err().map(|e| (*kind, e)))
    }

    pub fn into_entries(self) -> BTreeMap<FilterKind, Result<PixelBuffer, ImagingError>> {
        self.entries
    }
}

/// Run all five filters with their stock parameters.
pub fn run_all(buffer: &PixelBuffer) -> ComparisonResult {
    run_all_with(buffer, FilterSpec::default_for)
}

/// Run all five filters, taking each filter's parameters from `spec_for`.
pub fn run_all_with(
    buffer: &PixelBuffer,
    spec_for: impl Fn(FilterKind) -> FilterSpec + Sync,
) -> ComparisonResult {
    let entries = FilterKind::ALL
        .par_iter()
        .map(|&kind| {
            let result = run(buffer, &spec_for(kind));
            if let Err(e) = &result {
                tracing::warn!("Filter {kind} failed: {e}");
            }
            (kind, result)
        })
        .collect();
    ComparisonResult { entries }
}

/// A filtered output together with its metrics against the input.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterEvaluation {
    pub output: PixelBuffer,
    pub metrics: MetricResult,
}

/// Run all filters (as [`run_all_with`]) and score each output against the input.
pub fn evaluate_all_with(
    buffer: &PixelBuffer,
    spec_for: impl Fn(FilterKind) -> FilterSpec + Sync,
) -> BTreeMap<FilterKind, Result<FilterEvaluation, ImagingError>> {
    run_all_with(buffer, spec_for)
        .into_entries()
        .into_par_iter()
        .map(|(kind, result)| {
            let evaluation = result.and_then(|output| {
                let metrics = compare(buffer, &output)?;
                Ok(FilterEvaluation { output, metrics })
            });
            (kind, evaluation)
        })
        .collect()
}

/// [`evaluate_all_with`] using stock parameters.
pub fn evaluate_all(
    buffer: &PixelBuffer,
) -> BTreeMap<FilterKind, Result<FilterEvaluation, ImagingError>> {
    evaluate_all_with(buffer, FilterSpec::default_for)
}

/// Client-facing description of one filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: &'static [&'static str],
}

/// Static listing of every filter, in catalog order.
pub fn catalog() -> Vec<FilterInfo> {
    FilterKind::ALL
        .into_iter()
        .map(|kind| FilterInfo {
            name: kind.name(),
            description: describe(kind),
            parameters: kind.parameter_names(),
        })
        .collect()
}

fn describe(kind: FilterKind) -> &'static str {
    match kind {
        FilterKind::Median => "Standard median filter",
        FilterKind::Adaptive => "Windowed median (fixed window order filter)",
        FilterKind::Bilateral => "Bilateral filter (edge-preserving)",
        FilterKind::Morphological => "Morphological opening + closing",
        FilterKind::Wiener => "Wiener filter (local variance reduction)",
    }
}
