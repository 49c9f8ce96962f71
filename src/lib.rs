//! blind-measure - Window-blind measurement records backed by a Baserow table.
//!
//! Each window is measured three times across and three times down. This
//! library derives the nominal size and area from those samples, stores the
//! rows in a Baserow table, and keeps an in-memory index of measurements
//! grouped by customer.
//!
//! # Example
//!
//! ```no_run
//! use blind_measure::{
//!     BaserowStore, IndexConfig, MeasurementData, MeasurementDraft, MeasurementIndex, StoreConfig,
//! };
//!
//! # async fn run() -> blind_measure::Result<()> {
//! let store = BaserowStore::new(StoreConfig::from_env()?)?;
//! let mut index = MeasurementIndex::new(store, IndexConfig::default());
//! index.load().await?;
//!
//! let data = MeasurementData::new("Priya Nair", "Master Large")
//!     .with_widths([Some(120.0), Some(121.0), Some(119.0)])
//!     .with_heights([Some(150.0), Some(150.0), Some(151.0)]);
//! let record = index.add(MeasurementDraft::new(data)).await?;
//! println!("{} m2", record.geometry.area_sq_meters);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod filter;
pub mod geometry;
pub mod index;
pub mod model;
pub mod report;
pub mod store;
pub mod validation;

// Re-exports for convenience
pub use config::{AveragingPolicy, GroupingPolicy, IndexConfig, StoreConfig};
pub use error::{ErrorKind, MeasureError, Result};
pub use filter::MeasurementFilter;
pub use geometry::{derive_geometry, derive_geometry_with, parse_sample, Geometry};
pub use index::{group_records, CustomerMap, IndexStatus, MeasurementIndex};
pub use model::{
    BlindType, CeilingType, ControlType, CustomerGroup, MeasurementData, MeasurementDraft,
    MeasurementPatch, MeasurementRecord, MountType,
};
pub use store::{BaserowStore, MemoryStore, RowStore};
pub use validation::{validate_measurement, ValidationResult};
