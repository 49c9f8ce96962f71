//! Per-customer view of the measurement rows.

use serde::Serialize;
use std::collections::BTreeMap;

use super::record::MeasurementRecord;

/// Label used for measurements with a blank window description.
pub const UNSPECIFIED_WINDOW: &str = "Unspecified Window";

/// All measurements sharing one customer key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerGroup {
    /// Grouping key (the exact name, or its normalized form).
    pub key: String,
    /// Customer name as first seen.
    pub name: String,
    /// Contact from the most recent measurement that carried one.
    pub contact: String,
    /// Measurements in the order they were applied.
    pub measurements: Vec<MeasurementRecord>,
}

impl CustomerGroup {
    /// Create an empty group.
    pub fn new(key: impl Into<String>, name: impl Into<String>, contact: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            contact: contact.into(),
            measurements: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    /// Position of a measurement by id.
    pub fn position(&self, id: u64) -> Option<usize> {
        self.measurements.iter().position(|m| m.id == id)
    }

    /// Append a measurement, taking its contact when it has one.
    pub fn push(&mut self, record: MeasurementRecord) {
        self.note_contact(record.contact());
        self.measurements.push(record);
    }

    /// Replace a measurement in place. Returns false if the id is absent.
    pub fn replace(&mut self, record: MeasurementRecord) -> bool {
        match self.position(record.id) {
            Some(pos) => {
                self.note_contact(record.contact());
                self.measurements[pos] = record;
                true
            }
            None => false,
        }
    }

    /// Remove a measurement by id.
    pub fn remove(&mut self, id: u64) -> Option<MeasurementRecord> {
        self.position(id).map(|pos| self.measurements.remove(pos))
    }

    fn note_contact(&mut self, contact: &str) {
        if !contact.is_empty() {
            self.contact = contact.to_string();
        }
    }

    /// Total area in square meters.
    pub fn total_area(&self) -> f64 {
        self.measurements
            .iter()
            .map(|m| m.geometry.area_sq_meters)
            .sum()
    }

    /// Measurements grouped by window description.
    pub fn by_window(&self) -> BTreeMap<&str, Vec<&MeasurementRecord>> {
        let mut windows: BTreeMap<&str, Vec<&MeasurementRecord>> = BTreeMap::new();
        for m in &self.measurements {
            let desc = m.data.window_description.trim();
            let label = if desc.is_empty() {
                UNSPECIFIED_WINDOW
            } else {
                m.data.window_description.as_str()
            };
            windows.entry(label).or_default().push(m);
        }
        windows
    }
}
