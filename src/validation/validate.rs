//! Validation of measurements before they are submitted.

use crate::config::AveragingPolicy;
use crate::error::{MeasureError, Result};
use crate::geometry::{present_count, SampleTriple};
use crate::model::MeasurementData;

/// Validation result with warnings.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Whether validation passed.
    pub passed: bool,
    /// Warning messages.
    pub warnings: Vec<String>,
    /// Error messages.
    pub errors: Vec<String>,
}

impl ValidationResult {
    /// Create a passing result.
    pub fn ok() -> Self {
        Self {
            passed: true,
            ..Default::default()
        }
    }

    /// Create a failing result with an error.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            errors: vec![message.into()],
            ..Default::default()
        }
    }

    /// Add a warning.
    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Add an error.
    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
        self.passed = false;
    }

    /// Merge another result into this one.
    pub fn merge(&mut self, other: ValidationResult) {
        self.warnings.extend(other.warnings);
        self.errors.extend(other.errors);
        if !other.passed {
            self.passed = false;
        }
    }
}

/// Validate a measurement about to be created or saved.
pub fn validate_measurement(data: &MeasurementData, policy: AveragingPolicy) -> ValidationResult {
    let mut result = ValidationResult::ok();

    if data.customer_name.trim().is_empty() {
        result.add_error("Customer name is required");
    } else if data.customer_name.trim() != data.customer_name {
        // Grouping is exact, so "Lee " and "Lee" become two customers.
        result.add_warning(format!(
            "Customer name '{}' has leading or trailing spaces",
            data.customer_name
        ));
    }

    if data.window_description.trim().is_empty() {
        result.add_error("Window description is required");
    }

    result.merge(validate_samples("Width", &data.width_samples(), policy));
    result.merge(validate_samples("Height", &data.height_samples(), policy));

    result
}

/// Validate one dimension's samples.
pub fn validate_samples(
    dimension: &str,
    samples: &SampleTriple,
    policy: AveragingPolicy,
) -> ValidationResult {
    let mut result = ValidationResult::ok();

    for (idx, sample) in samples.iter().enumerate() {
        if let Some(v) = sample {
            if !v.is_finite() {
                result.add_error(format!("{} sample {}: not a number", dimension, idx + 1));
            } else if *v < 0.0 {
                result.add_error(format!(
                    "{} sample {}: negative value {}",
                    dimension,
                    idx + 1,
                    v
                ));
            }
        }
    }

    let present = present_count(samples);
    if present == 0 {
        result.add_warning(format!("{}: no samples entered", dimension));
    } else if present < samples.len() && policy == AveragingPolicy::ZeroFill {
        result.add_warning(format!(
            "{}: only {} of {} samples entered; missing samples count as 0 in the average",
            dimension,
            present,
            samples.len()
        ));
    }

    result
}

/// Validate several measurements, numbering messages by position.
pub fn validate_measurements(
    items: &[MeasurementData],
    policy: AveragingPolicy,
) -> ValidationResult {
    let mut result = ValidationResult::ok();

    for (idx, data) in items.iter().enumerate() {
        let item = validate_measurement(data, policy);
        result.passed &= item.passed;
        result
            .errors
            .extend(item.errors.into_iter().map(|e| format!("Measurement {}: {}", idx + 1, e)));
        result
            .warnings
            .extend(item.warnings.into_iter().map(|w| format!("Measurement {}: {}", idx + 1, w)));
    }

    result
}

/// Fail with the joined error messages if validation does not pass.
pub fn quick_validate(data: &MeasurementData, policy: AveragingPolicy) -> Result<()> {
    let result = validate_measurement(data, policy);

    if !result.passed {
        return Err(MeasureError::Validation(result.errors.join("; ")));
    }

    Ok(())
}
