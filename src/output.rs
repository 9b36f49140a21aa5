//! CLI output formatting for every subcommand.
//!
//! # Output Format
//!
//! ## Analyze
//!
//! ```text
//! Mean:       127.50
//! Std:        12.34
//! Range:      3..251
//! Blur score: 1234.56
//! ```
//!
//! ## Compare
//!
//! ```text
//! median         → 01_test-median.png  PSNR 34.21 dB  SSIM 0.9123
//! adaptive       → 01_test-adaptive.png
//! bilateral      FAILED: Invalid parameter `d`: must be a positive odd integer, got 4
//!
//! Succeeded 2 of 3 filters
//! ```
//!
//! ## Filters
//!
//! ```text
//! median         Standard median filter
//!     Parameters: kernel_size
//! ```
//!
//! ## Dataset
//!
//! ```text
//! training (2 images)
//! 001 21_training.tif
//!     Mean 120.10  Std 30.20  Blur 44.10
//! 002 22_training.tif
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure.

use crate::dataset::Split;
use crate::imaging::{FilterInfo, FilterKind, MetricResult, Statistics};
use serde::Serialize;
use std::path::PathBuf;

/// Width of the filter-name column.
const NAME_WIDTH: usize = 14;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn format_psnr(psnr: f64) -> String {
    if psnr.is_infinite() {
        "inf".to_string()
    } else {
        format!("{psnr:.2}")
    }
}

// ============================================================================
// Analyze
// ============================================================================

pub fn format_statistics(stats: &Statistics) -> Vec<String> {
    vec![
        format!("Mean:       {:.2}", stats.mean),
        format!("Std:        {:.2}", stats.std),
        format!("Range:      {}..{}", stats.min, stats.max),
        format!("Blur score: {:.2}", stats.blur_score),
    ]
}

pub fn print_statistics(stats: &Statistics) {
    for line in format_statistics(stats) {
        println!("{}", line);
    }
}

// ============================================================================
// Metrics
// ============================================================================

pub fn format_metrics(metrics: &MetricResult) -> Vec<String> {
    let mut lines = vec![
        format!("PSNR: {} dB", format_psnr(metrics.psnr)),
        format!("SSIM: {:.4}", metrics.ssim),
    ];
    if let Some(error) = &metrics.error {
        lines.push(format!("Unavailable: {error}"));
    }
    lines
}

pub fn print_metrics(metrics: &MetricResult) {
    for line in format_metrics(metrics) {
        println!("{}", line);
    }
}

// ============================================================================
// Compare
// ============================================================================

/// One row of a run-all comparison as reported to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOutcome {
    pub filter: FilterKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn outcome_line(outcome: &FilterOutcome) -> String {
    let name = format!("{:<NAME_WIDTH$}", outcome.filter.name());
    if let Some(error) = &outcome.error {
        return format!("{name} FAILED: {error}");
    }
    let mut line = name;
    if let Some(path) = &outcome.output {
        let file = path
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        line.push_str(&format!(" → {file}"));
    }
    if let Some(metrics) = &outcome.metrics {
        line.push_str(&format!(
            "  PSNR {} dB  SSIM {:.4}",
            format_psnr(metrics.psnr),
            metrics.ssim
        ));
    }
    line
}

pub fn format_comparison(outcomes: &[FilterOutcome]) -> Vec<String> {
    let mut lines: Vec<String> = outcomes.iter().map(outcome_line).collect();
    let succeeded = outcomes.iter().filter(|o| o.error.is_none()).count();
    lines.push(String::new());
    lines.push(format!(
        "Succeeded {} of {} filters",
        succeeded,
        outcomes.len()
    ));
    lines
}

pub fn print_comparison(outcomes: &[FilterOutcome]) {
    for line in format_comparison(outcomes) {
        println!("{}", line);
    }
}

// ============================================================================
// Filters
// ============================================================================

pub fn format_catalog(catalog: &[FilterInfo]) -> Vec<String> {
    let mut lines = Vec::new();
    for info in catalog {
        lines.push(format!("{:<NAME_WIDTH$} {}", info.name, info.description));
        lines.push(format!(
            "{}Parameters: {}",
            indent(1),
            info.parameters.join(", ")
        ));
    }
    lines
}

pub fn print_catalog(catalog: &[FilterInfo]) {
    for line in format_catalog(catalog) {
        println!("{}", line);
    }
}

// ============================================================================
// Dataset
// ============================================================================

/// A dataset image with optional statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<Statistics>,
}

pub fn format_dataset(split: Split, entries: &[DatasetEntry]) -> Vec<String> {
    let noun = if entries.len() == 1 { "image" } else { "images" };
    let mut lines = vec![format!("{} ({} {})", split, entries.len(), noun)];
    for (i, entry) in entries.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), entry.name));
        if let Some(stats) = &entry.statistics {
            lines.push(format!(
                "{}Mean {:.2}  Std {:.2}  Blur {:.2}",
                indent(1),
                stats.mean,
                stats.std,
                stats.blur_score
            ));
        }
    }
    lines
}

pub fn print_dataset(split: Split, entries: &[DatasetEntry]) {
    for line in format_dataset(split, entries) {
        println!("{}", line);
    }
}
