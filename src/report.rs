//! Customer summaries for the terminal and for JSON export.

use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

use crate::error::Result;
use crate::model::{CustomerGroup, MeasurementRecord};

/// One customer's entry in the JSON report.
#[derive(Debug, Serialize)]
pub struct CustomerReport<'a> {
    pub name: &'a str,
    pub contact: &'a str,
    pub measurement_count: usize,
    pub total_area_sq_meters: f64,
    pub measurements: &'a [MeasurementRecord],
}

impl<'a> From<&'a CustomerGroup> for CustomerReport<'a> {
    fn from(group: &'a CustomerGroup) -> Self {
        Self {
            name: &group.name,
            contact: &group.contact,
            measurement_count: group.len(),
            total_area_sq_meters: group.total_area(),
            measurements: &group.measurements,
        }
    }
}

/// Write every customer with their measurements as pretty JSON.
pub fn write_customer_report<'a, I>(path: &Path, customers: I) -> Result<()>
where
    I: IntoIterator<Item = &'a CustomerGroup>,
{
    let report: Vec<CustomerReport<'_>> = customers.into_iter().map(CustomerReport::from).collect();
    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// One line per customer: name, contact, count and total area.
pub fn customer_summary<'a, I>(customers: I) -> String
where
    I: IntoIterator<Item = &'a CustomerGroup>,
{
    let mut out = String::new();
    for group in customers {
        let contact = if group.contact.is_empty() {
            "-"
        } else {
            group.contact.as_str()
        };
        let _ = writeln!(
            out,
            "{:<24} {:<16} {:>3} window(s) {:>8.2} m2",
            group.name,
            contact,
            group.len(),
            group.total_area()
        );
    }
    out
}

/// One line per measurement, areas and sizes to two decimals.
pub fn measurement_table<'a, I>(records: I) -> String
where
    I: IntoIterator<Item = &'a MeasurementRecord>,
{
    let mut out = String::new();
    for r in records {
        let date = r
            .data
            .date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{:>5}  {:<10}  {:<20} {:<20} {:>8.2} x {:>8.2} cm {:>7.2} m2  {} / {} / {}",
            r.id,
            date,
            r.data.customer_name,
            r.data.window_description,
            r.geometry.avg_width,
            r.geometry.avg_height,
            r.geometry.area_sq_meters,
            r.data.blind_type,
            r.data.control,
            r.data.mount
        );
    }
    out
}
