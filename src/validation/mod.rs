//! Measurement validation.

mod validate;

pub use validate::{
    quick_validate, validate_measurement, validate_measurements, validate_samples,
    ValidationResult,
};
