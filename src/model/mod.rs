//! Data model for measurement rows and customer groups.

pub mod categorical;
pub mod fields;
mod group;
mod record;

pub use categorical::{BlindType, Categorical, CeilingType, ControlType, MountType};
pub use group::{CustomerGroup, UNSPECIFIED_WINDOW};
pub use record::{MeasurementData, MeasurementDraft, MeasurementPatch, MeasurementRecord};
