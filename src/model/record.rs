//! Measurement rows as stored in the Baserow table.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::categorical::{BlindType, CeilingType, ControlType, MountType};
use super::fields;
use crate::config::AveragingPolicy;
use crate::geometry::{derive_geometry_with, Geometry, SampleTriple};

/// User-entered columns of a measurement row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementData {
    /// Customer the window belongs to. Required.
    #[serde(rename = "Customer_Name", deserialize_with = "fields::lenient_string")]
    pub customer_name: String,
    #[serde(rename = "Contact", default, deserialize_with = "fields::lenient_string")]
    pub contact: String,
    /// Window location or name, e.g. "Master Large".
    #[serde(
        rename = "Window_Description",
        default,
        deserialize_with = "fields::lenient_string"
    )]
    pub window_description: String,

    #[serde(
        rename = "Width_Left",
        default,
        serialize_with = "fields::serialize_sample",
        deserialize_with = "fields::deserialize_sample"
    )]
    pub width_left: Option<f64>,
    #[serde(
        rename = "Width_Center",
        default,
        serialize_with = "fields::serialize_sample",
        deserialize_with = "fields::deserialize_sample"
    )]
    pub width_center: Option<f64>,
    #[serde(
        rename = "Width_Right",
        default,
        serialize_with = "fields::serialize_sample",
        deserialize_with = "fields::deserialize_sample"
    )]
    pub width_right: Option<f64>,
    #[serde(
        rename = "Height_Top",
        default,
        serialize_with = "fields::serialize_sample",
        deserialize_with = "fields::deserialize_sample"
    )]
    pub height_top: Option<f64>,
    #[serde(
        rename = "Height_Middle",
        default,
        serialize_with = "fields::serialize_sample",
        deserialize_with = "fields::deserialize_sample"
    )]
    pub height_middle: Option<f64>,
    #[serde(
        rename = "Height_Bottom",
        default,
        serialize_with = "fields::serialize_sample",
        deserialize_with = "fields::deserialize_sample"
    )]
    pub height_bottom: Option<f64>,

    #[serde(rename = "Fabric_Code", default, deserialize_with = "fields::lenient_string")]
    pub fabric_code: String,
    #[serde(rename = "Blind_Type", default)]
    pub blind_type: BlindType,
    #[serde(rename = "Control", default)]
    pub control: ControlType,
    #[serde(rename = "Mount", default)]
    pub mount: MountType,
    #[serde(rename = "Ceiling_Type", default)]
    pub ceiling_type: CeilingType,
    #[serde(rename = "Notes", default, deserialize_with = "fields::lenient_string")]
    pub notes: String,
    #[serde(
        rename = "Date",
        default,
        serialize_with = "fields::serialize_date",
        deserialize_with = "fields::deserialize_date"
    )]
    pub date: Option<NaiveDate>,
}

impl MeasurementData {
    /// Create a measurement with form defaults and today's date.
    pub fn new(customer_name: impl Into<String>, window_description: impl Into<String>) -> Self {
        Self {
            customer_name: customer_name.into(),
            contact: String::new(),
            window_description: window_description.into(),
            width_left: None,
            width_center: None,
            width_right: None,
            height_top: None,
            height_middle: None,
            height_bottom: None,
            fabric_code: String::new(),
            blind_type: BlindType::default(),
            control: ControlType::default(),
            mount: MountType::default(),
            ceiling_type: CeilingType::default(),
            notes: String::new(),
            date: Some(today()),
        }
    }

    /// Set the three width samples (left, center, right).
    pub fn with_widths(mut self, widths: SampleTriple) -> Self {
        [self.width_left, self.width_center, self.width_right] = widths;
        self
    }

    /// Set the three height samples (top, middle, bottom).
    pub fn with_heights(mut self, heights: SampleTriple) -> Self {
        [self.height_top, self.height_middle, self.height_bottom] = heights;
        self
    }

    /// Set the contact.
    pub fn with_contact(mut self, contact: impl Into<String>) -> Self {
        self.contact = contact.into();
        self
    }

    /// Width samples in position order.
    pub fn width_samples(&self) -> SampleTriple {
        [self.width_left, self.width_center, self.width_right]
    }

    /// Height samples in position order.
    pub fn height_samples(&self) -> SampleTriple {
        [self.height_top, self.height_middle, self.height_bottom]
    }

    /// Derive geometry from the current samples.
    pub fn derive(&self, policy: AveragingPolicy) -> Geometry {
        derive_geometry_with(self.width_samples(), self.height_samples(), policy)
    }

    /// Overwrite the columns a patch sets.
    pub fn apply(&mut self, patch: &MeasurementPatch) {
        if let Some(v) = &patch.customer_name {
            self.customer_name = v.clone();
        }
        if let Some(v) = &patch.contact {
            self.contact = v.clone();
        }
        if let Some(v) = &patch.window_description {
            self.window_description = v.clone();
        }
        if let Some(v) = patch.width_left {
            self.width_left = v;
        }
        if let Some(v) = patch.width_center {
            self.width_center = v;
        }
        if let Some(v) = patch.width_right {
            self.width_right = v;
        }
        if let Some(v) = patch.height_top {
            self.height_top = v;
        }
        if let Some(v) = patch.height_middle {
            self.height_middle = v;
        }
        if let Some(v) = patch.height_bottom {
            self.height_bottom = v;
        }
        if let Some(v) = &patch.fabric_code {
            self.fabric_code = v.clone();
        }
        if let Some(v) = patch.blind_type {
            self.blind_type = v;
        }
        if let Some(v) = patch.control {
            self.control = v;
        }
        if let Some(v) = patch.mount {
            self.mount = v;
        }
        if let Some(v) = patch.ceiling_type {
            self.ceiling_type = v;
        }
        if let Some(v) = &patch.notes {
            self.notes = v.clone();
        }
        if let Some(v) = patch.date {
            self.date = v;
        }
    }
}

/// A measurement not yet stored.
///
/// `geometry` is filled by the index before the row is created when the
/// caller has not already derived it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementDraft {
    #[serde(flatten)]
    pub data: MeasurementData,
    #[serde(flatten)]
    pub geometry: Option<Geometry>,
}

impl MeasurementDraft {
    /// Draft without derived geometry.
    pub fn new(data: MeasurementData) -> Self {
        Self {
            data,
            geometry: None,
        }
    }

    /// Draft with geometry derived now.
    pub fn derived(data: MeasurementData, policy: AveragingPolicy) -> Self {
        let geometry = Some(data.derive(policy));
        Self { data, geometry }
    }
}

impl From<MeasurementData> for MeasurementDraft {
    fn from(data: MeasurementData) -> Self {
        Self::new(data)
    }
}

/// A stored measurement row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    /// Row id assigned by the store.
    pub id: u64,
    #[serde(flatten)]
    pub data: MeasurementData,
    #[serde(flatten)]
    pub geometry: Geometry,
}

impl MeasurementRecord {
    /// Build a record from a draft and its assigned id.
    ///
    /// A draft without geometry gets the zero-fill derivation.
    pub fn from_draft(id: u64, draft: MeasurementDraft) -> Self {
        let geometry = draft
            .geometry
            .unwrap_or_else(|| draft.data.derive(AveragingPolicy::ZeroFill));
        Self {
            id,
            data: draft.data,
            geometry,
        }
    }

    pub fn customer_name(&self) -> &str {
        &self.data.customer_name
    }

    pub fn contact(&self) -> &str {
        &self.data.contact
    }

    /// Apply a patch, including any geometry it carries.
    pub fn apply(&mut self, patch: &MeasurementPatch) {
        self.data.apply(patch);
        if let Some(geometry) = patch.geometry {
            self.geometry = geometry;
        }
    }
}

/// A partial update.
///
/// `None` leaves a column unchanged. Samples and the date are doubly
/// optional so they can be cleared: `Some(None)` writes an empty cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MeasurementPatch {
    #[serde(rename = "Customer_Name", skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(rename = "Contact", skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(rename = "Window_Description", skip_serializing_if = "Option::is_none")]
    pub window_description: Option<String>,

    #[serde(
        rename = "Width_Left",
        skip_serializing_if = "Option::is_none",
        serialize_with = "fields::serialize_patch_sample"
    )]
    pub width_left: Option<Option<f64>>,
    #[serde(
        rename = "Width_Center",
        skip_serializing_if = "Option::is_none",
        serialize_with = "fields::serialize_patch_sample"
    )]
    pub width_center: Option<Option<f64>>,
    #[serde(
        rename = "Width_Right",
        skip_serializing_if = "Option::is_none",
        serialize_with = "fields::serialize_patch_sample"
    )]
    pub width_right: Option<Option<f64>>,
    #[serde(
        rename = "Height_Top",
        skip_serializing_if = "Option::is_none",
        serialize_with = "fields::serialize_patch_sample"
    )]
    pub height_top: Option<Option<f64>>,
    #[serde(
        rename = "Height_Middle",
        skip_serializing_if = "Option::is_none",
        serialize_with = "fields::serialize_patch_sample"
    )]
    pub height_middle: Option<Option<f64>>,
    #[serde(
        rename = "Height_Bottom",
        skip_serializing_if = "Option::is_none",
        serialize_with = "fields::serialize_patch_sample"
    )]
    pub height_bottom: Option<Option<f64>>,

    #[serde(rename = "Fabric_Code", skip_serializing_if = "Option::is_none")]
    pub fabric_code: Option<String>,
    #[serde(rename = "Blind_Type", skip_serializing_if = "Option::is_none")]
    pub blind_type: Option<BlindType>,
    #[serde(rename = "Control", skip_serializing_if = "Option::is_none")]
    pub control: Option<ControlType>,
    #[serde(rename = "Mount", skip_serializing_if = "Option::is_none")]
    pub mount: Option<MountType>,
    #[serde(rename = "Ceiling_Type", skip_serializing_if = "Option::is_none")]
    pub ceiling_type: Option<CeilingType>,
    #[serde(rename = "Notes", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(
        rename = "Date",
        skip_serializing_if = "Option::is_none",
        serialize_with = "fields::serialize_patch_date"
    )]
    pub date: Option<Option<NaiveDate>>,

    /// Derived columns. Set by the index, never by callers.
    #[serde(flatten)]
    pub geometry: Option<Geometry>,
}

impl MeasurementPatch {
    /// Check whether any sample column is touched.
    pub fn touches_samples(&self) -> bool {
        [
            self.width_left,
            self.width_center,
            self.width_right,
            self.height_top,
            self.height_middle,
            self.height_bottom,
        ]
        .iter()
        .any(|s| s.is_some())
    }

    /// Set the width samples.
    pub fn with_widths(mut self, widths: SampleTriple) -> Self {
        self.width_left = Some(widths[0]);
        self.width_center = Some(widths[1]);
        self.width_right = Some(widths[2]);
        self
    }

    /// Set the height samples.
    pub fn with_heights(mut self, heights: SampleTriple) -> Self {
        self.height_top = Some(heights[0]);
        self.height_middle = Some(heights[1]);
        self.height_bottom = Some(heights[2]);
        self
    }

    /// Rename the customer.
    pub fn with_customer(mut self, name: impl Into<String>) -> Self {
        self.customer_name = Some(name.into());
        self
    }

    /// Set the contact.
    pub fn with_contact(mut self, contact: impl Into<String>) -> Self {
        self.contact = Some(contact.into());
        self
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
