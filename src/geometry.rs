//! Derivation of nominal window size from raw width/height samples.
//!
//! A window is measured at three positions per dimension (widths at
//! left/center/right, heights at top/middle/bottom). The nominal size is the
//! average of those readings in centimeters, and the area is reported in
//! square meters.

use serde::{Deserialize, Serialize};

use crate::config::{AveragingPolicy, CM_PER_M, SAMPLES_PER_DIMENSION};
use crate::model::fields;

/// One dimension's worth of samples, in position order.
pub type SampleTriple = [Option<f64>; SAMPLES_PER_DIMENSION];

/// Derived size of a window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Geometry {
    /// Average width in centimeters.
    #[serde(rename = "Width_Cm", deserialize_with = "fields::lenient_f64")]
    pub avg_width: f64,
    /// Average height in centimeters.
    #[serde(rename = "Height_Cm", deserialize_with = "fields::lenient_f64")]
    pub avg_height: f64,
    /// Area in square meters.
    #[serde(rename = "Sq_mt", deserialize_with = "fields::lenient_f64")]
    pub area_sq_meters: f64,
}

impl Geometry {
    /// Build from averages, computing the area.
    pub fn from_averages(avg_width: f64, avg_height: f64) -> Self {
        Self {
            avg_width,
            avg_height,
            area_sq_meters: (avg_width / CM_PER_M) * (avg_height / CM_PER_M),
        }
    }
}

/// Derive geometry with the historical zero-fill averaging.
pub fn derive_geometry(widths: SampleTriple, heights: SampleTriple) -> Geometry {
    derive_geometry_with(widths, heights, AveragingPolicy::ZeroFill)
}

/// Derive geometry with an explicit averaging policy.
pub fn derive_geometry_with(
    widths: SampleTriple,
    heights: SampleTriple,
    policy: AveragingPolicy,
) -> Geometry {
    Geometry::from_averages(average(&widths, policy), average(&heights, policy))
}

/// Average one dimension's samples.
fn average(samples: &SampleTriple, policy: AveragingPolicy) -> f64 {
    let values = samples.iter().map(|s| s.map(finite_or_zero));

    match policy {
        AveragingPolicy::ZeroFill => {
            let sum: f64 = values.map(|v| v.unwrap_or(0.0)).sum();
            sum / SAMPLES_PER_DIMENSION as f64
        }
        AveragingPolicy::PresentOnly => {
            let present: Vec<f64> = values.flatten().collect();
            if present.is_empty() {
                0.0
            } else {
                present.iter().sum::<f64>() / present.len() as f64
            }
        }
    }
}

#[inline]
fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Number of samples present in a triple.
pub fn present_count(samples: &SampleTriple) -> usize {
    samples.iter().filter(|s| s.is_some()).count()
}

/// Parse a sample typed as text.
///
/// Uses the longest leading numeric prefix, so `"120.5cm"` reads as 120.5.
/// Blank or non-numeric text yields `None`.
pub fn parse_sample(text: &str) -> Option<f64> {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        end = frac_end;
    }

    if digits == 0 {
        return None;
    }

    // Exponent only counts when followed by at least one digit.
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}
