//! Parameter types for filter operations.
//!
//! These types describe *which* filter to run and *with what*; the pixel work
//! lives in [`filters`](super::filters) and [`morphology`](super::morphology).
//! A [`FilterSpec`] is built once per request, either from the stock defaults
//! ([`FilterSpec::default_for`]) or from a caller-supplied name→number map
//! ([`FilterSpec::from_params`]), and is consumed by the
//! [`dispatch`](super::dispatch) layer.
//!
//! ## Types
//!
//! - [`FilterKind`]: closed set of the five filters; parsing an unrecognized
//!   token fails with `UnknownFilter`.
//! - [`BilateralParams`]: the `d, sigma_color, sigma_space` triple.
//! - [`FilterSpec`]: one variant per kind carrying its validated sizes.
//! - [`FilterParams`]: raw parameter map as received from a client.

use super::error::ImagingError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Default kernel/window size for median, adaptive, morphological and Wiener.
pub const DEFAULT_WINDOW_SIZE: u32 = 5;
/// Default bilateral neighbourhood diameter.
pub const DEFAULT_BILATERAL_DIAMETER: u32 = 9;
/// Default bilateral sigma (used for both colour and space).
pub const DEFAULT_BILATERAL_SIGMA: f64 = 75.0;
/// Largest accepted kernel, window or bilateral diameter.
pub const MAX_WINDOW_SIZE: u32 = 255;

/// Raw parameter map, e.g. `{"kernel_size": 7.0}`.
pub type FilterParams = BTreeMap<String, f64>;

/// The five denoising filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Median,
    Adaptive,
    Bilateral,
    Morphological,
    Wiener,
}

impl FilterKind {
    /// Every kind, in catalog order.
    pub const ALL: [FilterKind; 5] = [
        FilterKind::Median,
        FilterKind::Adaptive,
        FilterKind::Bilateral,
        FilterKind::Morphological,
        FilterKind::Wiener,
    ];

    /// The selection token clients use for this filter.
    pub fn name(self) -> &'static str {
        match self {
            FilterKind::Median => "median",
            FilterKind::Adaptive => "adaptive",
            FilterKind::Bilateral => "bilateral",
            FilterKind::Morphological => "morphological",
            FilterKind::Wiener => "wiener",
        }
    }

    /// Parameter names this filter accepts.
    pub fn parameter_names(self) -> &'static [&'static str] {
        match self {
            FilterKind::Median | FilterKind::Morphological => &["kernel_size"],
            FilterKind::Adaptive | FilterKind::Wiener => &["window_size"],
            FilterKind::Bilateral => &["d", "sigma_color", "sigma_space"],
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterKind {
    type Err = ImagingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| ImagingError::UnknownFilter(s.to_string()))
    }
}

/// Bilateral filter settings.
///
/// - `diameter`: side of the square neighbourhood (odd, ≥ 1)
/// - `sigma_color`: intensity-difference falloff (> 0)
/// - `sigma_space`: spatial-distance falloff (> 0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BilateralParams {
    #[serde(rename = "d")]
    pub diameter: u32,
    pub sigma_color: f64,
    pub sigma_space: f64,
}

impl Default for BilateralParams {
    fn default() -> Self {
        Self {
            diameter: DEFAULT_BILATERAL_DIAMETER,
            sigma_color: DEFAULT_BILATERAL_SIGMA,
            sigma_space: DEFAULT_BILATERAL_SIGMA,
        }
    }
}

impl BilateralParams {
    pub fn validate(&self) -> Result<(), ImagingError> {
        validate_diameter("d", self.diameter)?;
        validate_sigma("sigma_color", self.sigma_color)?;
        validate_sigma("sigma_space", self.sigma_space)
    }
}

/// A fully-specified filter invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterSpec {
    Median { kernel_size: u32 },
    Adaptive { window_size: u32 },
    Bilateral(BilateralParams),
    Morphological { kernel_size: u32 },
    Wiener { window_size: u32 },
}

impl FilterSpec {
    /// Stock parameters: size 5 everywhere, bilateral `d=9, σc=σs=75`.
    pub fn default_for(kind: FilterKind) -> Self {
        match kind {
            FilterKind::Median => FilterSpec::Median {
                kernel_size: DEFAULT_WINDOW_SIZE,
            },
            FilterKind::Adaptive => FilterSpec::Adaptive {
                window_size: DEFAULT_WINDOW_SIZE,
            },
            FilterKind::Bilateral => FilterSpec::Bilateral(BilateralParams::default()),
            FilterKind::Morphological => FilterSpec::Morphological {
                kernel_size: DEFAULT_WINDOW_SIZE,
            },
            FilterKind::Wiener => FilterSpec::Wiener {
                window_size: DEFAULT_WINDOW_SIZE,
            },
        }
    }

    pub fn kind(&self) -> FilterKind {
        match self {
            FilterSpec::Median { .. } => FilterKind::Median,
            FilterSpec::Adaptive { .. } => FilterKind::Adaptive,
            FilterSpec::Bilateral(_) => FilterKind::Bilateral,
            FilterSpec::Morphological { .. } => FilterKind::Morphological,
            FilterSpec::Wiener { .. } => FilterKind::Wiener,
        }
    }

    /// Build a spec from a raw parameter map, filling absent values from
    /// `base` (usually [`default_for`](Self::default_for) or configured
    /// defaults).
    ///
    /// Window-based filters (`adaptive`, `wiener`) also accept `kernel_size`
    /// as a synonym for `window_size`. Unknown names, non-integral sizes and
    /// values violating the size invariants fail with `InvalidParameter`.
    pub fn from_params_with_base(
        base: FilterSpec,
        params: &FilterParams,
    ) -> Result<Self, ImagingError> {
        let kind = base.kind();
        for name in params.keys() {
            let accepted = kind.parameter_names().contains(&name.as_str())
                || (name == "kernel_size"
                    && matches!(kind, FilterKind::Adaptive | FilterKind::Wiener));
            if !accepted {
                return Err(ImagingError::invalid(
                    name,
                    format!("not accepted by the {kind} filter"),
                ));
            }
        }

        let spec = match base {
            FilterSpec::Median { kernel_size } => FilterSpec::Median {
                kernel_size: size_param(params, "kernel_size")?.unwrap_or(kernel_size),
            },
            FilterSpec::Morphological { kernel_size } => FilterSpec::Morphological {
                kernel_size: size_param(params, "kernel_size")?.unwrap_or(kernel_size),
            },
            FilterSpec::Adaptive { window_size } => FilterSpec::Adaptive {
                window_size: window_param(params)?.unwrap_or(window_size),
            },
            FilterSpec::Wiener { window_size } => FilterSpec::Wiener {
                window_size: window_param(params)?.unwrap_or(window_size),
            },
            FilterSpec::Bilateral(defaults) => FilterSpec::Bilateral(BilateralParams {
                diameter: size_param(params, "d")?.unwrap_or(defaults.diameter),
                sigma_color: params
                    .get("sigma_color")
                    .copied()
                    .unwrap_or(defaults.sigma_color),
                sigma_space: params
                    .get("sigma_space")
                    .copied()
                    .unwrap_or(defaults.sigma_space),
            }),
        };
        spec.validate()?;
        Ok(spec)
    }

    /// [`from_params_with_base`](Self::from_params_with_base) over the stock defaults.
    pub fn from_params(kind: FilterKind, params: &FilterParams) -> Result<Self, ImagingError> {
        Self::from_params_with_base(Self::default_for(kind), params)
    }

    pub fn validate(&self) -> Result<(), ImagingError> {
        match self {
            FilterSpec::Median { kernel_size } | FilterSpec::Morphological { kernel_size } => {
                validate_window_size("kernel_size", *kernel_size)
            }
            FilterSpec::Adaptive { window_size } | FilterSpec::Wiener { window_size } => {
                validate_window_size("window_size", *window_size)
            }
            FilterSpec::Bilateral(params) => params.validate(),
        }
    }
}

impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterSpec::Median { kernel_size } | FilterSpec::Morphological { kernel_size } => {
                write!(f, "{}(kernel_size={kernel_size})", self.kind())
            }
            FilterSpec::Adaptive { window_size } | FilterSpec::Wiener { window_size } => {
                write!(f, "{}(window_size={window_size})", self.kind())
            }
            FilterSpec::Bilateral(p) => write!(
                f,
                "bilateral(d={}, sigma_color={}, sigma_space={})",
                p.diameter, p.sigma_color, p.sigma_space
            ),
        }
    }
}

/// Kernel and window sizes must be odd and within `3..=MAX_WINDOW_SIZE`.
pub fn validate_window_size(name: &str, size: u32) -> Result<(), ImagingError> {
    if size < 3 {
        return Err(ImagingError::invalid(
            name,
            format!("must be at least 3, got {size}"),
        ));
    }
    ensure_at_most_max(name, size)?;
    if size % 2 == 0 {
        return Err(ImagingError::invalid(
            name,
            format!("must be odd, got {size}"),
        ));
    }
    Ok(())
}

/// The bilateral diameter must be odd, positive and at most `MAX_WINDOW_SIZE`.
pub fn validate_diameter(name: &str, size: u32) -> Result<(), ImagingError> {
    if size == 0 || size % 2 == 0 {
        return Err(ImagingError::invalid(
            name,
            format!("must be a positive odd integer, got {size}"),
        ));
    }
    ensure_at_most_max(name, size)
}

fn ensure_at_most_max(name: &str, size: u32) -> Result<(), ImagingError> {
    if size > MAX_WINDOW_SIZE {
        return Err(ImagingError::invalid(
            name,
            format!("must be at most {MAX_WINDOW_SIZE}, got {size}"),
        ));
    }
    Ok(())
}

fn validate_sigma(name: &str, sigma: f64) -> Result<(), ImagingError> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(ImagingError::invalid(
            name,
            format!("must be a positive finite number, got {sigma}"),
        ));
    }
    Ok(())
}

fn size_param(params: &FilterParams, name: &str) -> Result<Option<u32>, ImagingError> {
    let Some(&value) = params.get(name) else {
        return Ok(None);
    };
    if !value.is_finite() || value.fract() != 0.0 || value < 0.0 || value > u32::MAX as f64 {
        return Err(ImagingError::invalid(
            name,
            format!("must be a non-negative integer, got {value}"),
        ));
    }
    Ok(Some(value as u32))
}

fn window_param(params: &FilterParams) -> Result<Option<u32>, ImagingError> {
    let window = size_param(params, "window_size")?;
    let kernel = size_param(params, "kernel_size")?;
    match (window, kernel) {
        (Some(w), Some(k)) if w != k => Err(ImagingError::invalid(
            "window_size",
            format!("conflicts with kernel_size ({w} vs {k})"),
        )),
        (Some(w), _) => Ok(Some(w)),
        (None, k) => Ok(k),
    }
}
