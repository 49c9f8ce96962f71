//! In-process row store.

use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

use super::RowStore;
use crate::error::{MeasureError, Result};
use crate::model::{MeasurementDraft, MeasurementPatch, MeasurementRecord};

#[derive(Debug, Default)]
struct MemoryState {
    rows: Vec<MeasurementRecord>,
    next_id: u64,
    fail_next: Option<String>,
    calls: usize,
}

/// Row store that keeps rows in memory, with failure injection.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    /// Create an empty store. Ids start at 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding existing rows.
    pub fn with_rows(rows: Vec<MeasurementRecord>) -> Self {
        let next_id = rows.iter().map(|r| r.id).max().unwrap_or(0);
        Self {
            state: Mutex::new(MemoryState {
                rows,
                next_id,
                ..Default::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the next call fail with the given message.
    pub fn fail_next(&self, message: impl Into<String>) {
        self.lock().fail_next = Some(message.into());
    }

    /// Snapshot of the stored rows.
    pub fn rows(&self) -> Vec<MeasurementRecord> {
        self.lock().rows.clone()
    }

    /// Number of calls received, failed ones included.
    pub fn calls(&self) -> usize {
        self.lock().calls
    }

    /// Create a row without going through an index, as another client would.
    pub fn insert_external(&self, draft: MeasurementDraft) -> MeasurementRecord {
        let mut state = self.lock();
        state.next_id += 1;
        let record = MeasurementRecord::from_draft(state.next_id, draft);
        state.rows.push(record.clone());
        record
    }

    /// Count the call and consume any injected failure.
    fn begin(state: &mut MemoryState) -> Result<()> {
        state.calls += 1;
        match state.fail_next.take() {
            Some(body) => Err(MeasureError::Api { status: 500, body }),
            None => Ok(()),
        }
    }
}

fn not_found(id: u64) -> MeasureError {
    MeasureError::Api {
        status: 404,
        body: format!("ERROR_ROW_DOES_NOT_EXIST: row {} does not exist", id),
    }
}

impl RowStore for MemoryStore {
    async fn list(&self) -> Result<Vec<MeasurementRecord>> {
        let mut state = self.lock();
        Self::begin(&mut state)?;
        Ok(state.rows.clone())
    }

    async fn create(&self, draft: &MeasurementDraft) -> Result<MeasurementRecord> {
        let mut state = self.lock();
        Self::begin(&mut state)?;
        state.next_id += 1;
        let record = MeasurementRecord::from_draft(state.next_id, draft.clone());
        debug!("Memory store created row {}", record.id);
        state.rows.push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: u64, patch: &MeasurementPatch) -> Result<MeasurementRecord> {
        let mut state = self.lock();
        Self::begin(&mut state)?;
        let row = state
            .rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| not_found(id))?;
        row.apply(patch);
        Ok(row.clone())
    }

    async fn delete(&self, id: u64) -> Result<()> {
        let mut state = self.lock();
        Self::begin(&mut state)?;
        let pos = state
            .rows
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| not_found(id))?;
        state.rows.remove(pos);
        Ok(())
    }
}
