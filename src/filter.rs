//! Record queries for list views.

use chrono::NaiveDate;

use crate::model::{BlindType, ControlType, MeasurementRecord, MountType};

/// Criteria for selecting measurements. Unset criteria match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasurementFilter {
    /// Exact customer name.
    pub customer: Option<String>,
    /// Case-insensitive substring of the window description.
    pub window: Option<String>,
    pub blind_type: Option<BlindType>,
    pub mount: Option<MountType>,
    pub control: Option<ControlType>,
    /// First day included.
    pub start_date: Option<NaiveDate>,
    /// Last day included.
    pub end_date: Option<NaiveDate>,
    /// Minimum area in square meters.
    pub min_area: Option<f64>,
    /// Maximum area in square meters.
    pub max_area: Option<f64>,
}

impl MeasurementFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Check whether a record satisfies every set criterion.
    ///
    /// Records without a date never match a date range.
    pub fn matches(&self, record: &MeasurementRecord) -> bool {
        let data = &record.data;

        if let Some(customer) = &self.customer {
            if data.customer_name != *customer {
                return false;
            }
        }

        if let Some(window) = &self.window {
            let needle = window.to_lowercase();
            if !data.window_description.to_lowercase().contains(&needle) {
                return false;
            }
        }

        if self.blind_type.is_some_and(|t| t != data.blind_type) {
            return false;
        }
        if self.mount.is_some_and(|m| m != data.mount) {
            return false;
        }
        if self.control.is_some_and(|c| c != data.control) {
            return false;
        }

        if self.start_date.is_some() || self.end_date.is_some() {
            let Some(date) = data.date else {
                return false;
            };
            if self.start_date.is_some_and(|start| date < start) {
                return false;
            }
            if self.end_date.is_some_and(|end| date > end) {
                return false;
            }
        }

        let area = record.geometry.area_sq_meters;
        if self.min_area.is_some_and(|min| area < min) {
            return false;
        }
        if self.max_area.is_some_and(|max| area > max) {
            return false;
        }

        true
    }
}
