//! Error taxonomy shared by every imaging operation.
//!
//! Structural errors ([`InvalidParameter`](ImagingError::InvalidParameter),
//! [`EmptyImage`](ImagingError::EmptyImage),
//! [`MalformedBuffer`](ImagingError::MalformedBuffer),
//! [`DimensionMismatch`](ImagingError::DimensionMismatch),
//! [`UnknownFilter`](ImagingError::UnknownFilter)) are fatal to the operation
//! that raised them. [`MetricUnavailable`](ImagingError::MetricUnavailable) is
//! only produced inside metric computation and is downgraded to an annotated
//! zero result before it reaches a caller.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImagingError {
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },
    #[error("Image is empty ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
    #[error("Buffer holds {actual} samples, expected {expected} for {width}x{height}")]
    MalformedBuffer {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error(
        "Dimension mismatch: reference is {}x{}, candidate is {}x{}",
        .reference.0, .reference.1, .candidate.0, .candidate.1
    )]
    DimensionMismatch {
        reference: (u32, u32),
        candidate: (u32, u32),
    },
    #[error("Unknown filter: {0}")]
    UnknownFilter(String),
    #[error("Metric unavailable: {0}")]
    MetricUnavailable(String),
}

impl ImagingError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
