//! Row storage collaborators.
//!
//! The index only needs four calls from its backing store. [`BaserowStore`]
//! talks to a hosted Baserow table; [`MemoryStore`] keeps rows in process and
//! is used by tests and dry runs.

mod baserow;
mod memory;

pub use baserow::BaserowStore;
pub use memory::MemoryStore;

use std::future::Future;

use crate::error::Result;
use crate::model::{MeasurementDraft, MeasurementPatch, MeasurementRecord};

/// CRUD access to measurement rows.
pub trait RowStore {
    /// Fetch every row.
    fn list(&self) -> impl Future<Output = Result<Vec<MeasurementRecord>>> + Send;

    /// Create a row and return it with its assigned id.
    fn create(
        &self,
        draft: &MeasurementDraft,
    ) -> impl Future<Output = Result<MeasurementRecord>> + Send;

    /// Update the columns a patch sets and return the stored row.
    fn update(
        &self,
        id: u64,
        patch: &MeasurementPatch,
    ) -> impl Future<Output = Result<MeasurementRecord>> + Send;

    /// Delete a row.
    fn delete(&self, id: u64) -> impl Future<Output = Result<()>> + Send;
}
