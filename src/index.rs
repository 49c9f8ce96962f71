//! In-memory measurement index.
//!
//! [`MeasurementIndex`] owns the flat list of measurement rows and the
//! customer mapping derived from it. Every mutation goes to the row store
//! first; local state only changes once the store call has succeeded, so a
//! failed call leaves the index exactly as it was.

use std::collections::BTreeMap;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::{GroupingPolicy, IndexConfig};
use crate::error::{MeasureError, Result};
use crate::filter::MeasurementFilter;
use crate::model::{CustomerGroup, MeasurementDraft, MeasurementPatch, MeasurementRecord};
use crate::store::RowStore;
use crate::validation::ValidationResult;

/// Customer groups keyed by grouping key.
pub type CustomerMap = BTreeMap<String, CustomerGroup>;

/// Summary published to subscribers after every state change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexStatus {
    pub loading: bool,
    pub error: Option<String>,
    pub records: usize,
    pub customers: usize,
}

/// Measurement rows plus their customer grouping.
pub struct MeasurementIndex<S> {
    store: S,
    config: IndexConfig,
    records: Vec<MeasurementRecord>,
    customers: CustomerMap,
    loading: bool,
    error: Option<String>,
    status_tx: watch::Sender<IndexStatus>,
}

impl<S: RowStore> MeasurementIndex<S> {
    /// Create an empty index over a store. Call [`load`](Self::load) to fill it.
    pub fn new(store: S, config: IndexConfig) -> Self {
        let (status_tx, _) = watch::channel(IndexStatus::default());
        Self {
            store,
            config,
            records: Vec::new(),
            customers: CustomerMap::new(),
            loading: false,
            error: None,
            status_tx,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// All measurements, in load/creation order.
    pub fn records(&self) -> &[MeasurementRecord] {
        &self.records
    }

    /// Customer groups keyed by grouping key.
    pub fn customers(&self) -> &CustomerMap {
        &self.customers
    }

    /// Look up a customer group by name.
    pub fn customer(&self, name: &str) -> Option<&CustomerGroup> {
        self.customers.get(&self.config.grouping.key(name))
    }

    /// Look up a measurement by id.
    pub fn get(&self, id: u64) -> Option<&MeasurementRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Message from the most recent failed operation, cleared on success.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Current status summary.
    pub fn status(&self) -> IndexStatus {
        IndexStatus {
            loading: self.loading,
            error: self.error.clone(),
            records: self.records.len(),
            customers: self.customers.len(),
        }
    }

    /// Receive a status summary after every state change.
    pub fn subscribe(&self) -> watch::Receiver<IndexStatus> {
        self.status_tx.subscribe()
    }

    /// Measurements matching a filter.
    pub fn filter(&self, filter: &MeasurementFilter) -> Vec<&MeasurementRecord> {
        self.records.iter().filter(|r| filter.matches(r)).collect()
    }

    // ==================== Operations ====================

    /// Replace local state with every row in the store.
    pub async fn load(&mut self) -> Result<()> {
        self.loading = true;
        self.publish();

        let result = self.store.list().await;
        self.loading = false;

        match result {
            Ok(records) => {
                self.customers = group_records(&records, self.config.grouping);
                self.records = records;
                info!(
                    "Loaded {} measurement(s) for {} customer(s)",
                    self.records.len(),
                    self.customers.len()
                );
                self.succeed();
                Ok(())
            }
            Err(e) => self.fail("Failed to load measurements", e),
        }
    }

    /// Store a new measurement.
    ///
    /// Geometry is derived from the samples unless the draft already carries
    /// it, and a missing date defaults to today.
    pub async fn add(&mut self, mut draft: MeasurementDraft) -> Result<MeasurementRecord> {
        if draft.geometry.is_none() {
            draft.geometry = Some(draft.data.derive(self.config.averaging));
        }
        if draft.data.date.is_none() {
            draft.data.date = Some(chrono::Local::now().date_naive());
        }

        let record = match self.store.create(&draft).await {
            Ok(record) => record,
            Err(e) => return self.fail("Failed to add measurement", e),
        };

        debug!(
            "Added measurement {} for '{}'",
            record.id,
            record.customer_name()
        );
        self.insert(record.clone());
        self.succeed();
        Ok(record)
    }

    /// Store a new measurement under an existing customer's name.
    ///
    /// A draft without a contact inherits the customer's contact.
    pub async fn add_for_customer(
        &mut self,
        customer_name: &str,
        mut draft: MeasurementDraft,
    ) -> Result<MeasurementRecord> {
        draft.data.customer_name = customer_name.to_string();
        if draft.data.contact.is_empty() {
            if let Some(group) = self.customer(customer_name) {
                draft.data.contact = group.contact.clone();
            }
        }
        self.add(draft).await
    }

    /// Update a measurement.
    ///
    /// When the patch touches any sample, geometry is re-derived from the
    /// merged samples; otherwise derived columns are left alone.
    pub async fn edit(
        &mut self,
        id: u64,
        mut patch: MeasurementPatch,
    ) -> Result<MeasurementRecord> {
        let Some(current) = self.get(id) else {
            return self.fail(
                "Failed to update measurement",
                MeasureError::RecordNotFound { id },
            );
        };

        patch.geometry = if patch.touches_samples() {
            let mut merged = current.data.clone();
            merged.apply(&patch);
            Some(merged.derive(self.config.averaging))
        } else {
            None
        };

        let updated = match self.store.update(id, &patch).await {
            Ok(record) => record,
            Err(e) => return self.fail("Failed to update measurement", e),
        };

        self.reconcile_edit(id, &patch, updated.clone());
        self.succeed();
        Ok(updated)
    }

    /// Delete a measurement.
    pub async fn remove(&mut self, id: u64) -> Result<()> {
        if let Err(e) = self.store.delete(id).await {
            return self.fail("Failed to delete measurement", e);
        }

        if let Some(pos) = self.records.iter().position(|r| r.id == id) {
            let removed = self.records.remove(pos);
            let key = self.config.grouping.key(removed.customer_name());
            self.detach(&key, id);
            debug!("Removed measurement {} from '{}'", id, removed.customer_name());
        }

        self.succeed();
        Ok(())
    }

    // ==================== Consistency ====================

    /// Rebuild the customer mapping from the flat list and compare it with
    /// the incrementally maintained one.
    pub fn check_consistency(&self) -> ValidationResult {
        let mut result = ValidationResult::ok();
        let rebuilt = group_records(&self.records, self.config.grouping);

        for (key, group) in &self.customers {
            if group.is_empty() {
                result.add_error(format!("Customer '{}': empty group", key));
            }
            if group.key != *key {
                result.add_error(format!(
                    "Customer '{}': group carries key '{}'",
                    key, group.key
                ));
            }
            for m in &group.measurements {
                if self.config.grouping.key(m.customer_name()) != *key {
                    result.add_error(format!(
                        "Customer '{}': holds measurement {} of '{}'",
                        key,
                        m.id,
                        m.customer_name()
                    ));
                }
                if self.get(m.id) != Some(m) {
                    result.add_error(format!(
                        "Customer '{}': measurement {} differs from the record list",
                        key, m.id
                    ));
                }
            }
            match rebuilt.get(key) {
                Some(expected) if sorted_ids(expected) == sorted_ids(group) => {}
                Some(expected) => result.add_error(format!(
                    "Customer '{}': holds {:?}, expected {:?}",
                    key,
                    sorted_ids(group),
                    sorted_ids(expected)
                )),
                None => result.add_error(format!("Customer '{}': no such customer", key)),
            }
        }

        for key in rebuilt.keys() {
            if !self.customers.contains_key(key) {
                result.add_error(format!("Customer '{}': missing group", key));
            }
        }

        if !result.passed {
            for e in &result.errors {
                warn!("{}", e);
            }
        }
        result
    }

    // ==================== Internal state updates ====================

    fn insert(&mut self, record: MeasurementRecord) {
        let key = self.config.grouping.key(record.customer_name());
        let name = record.customer_name().to_string();
        self.customers
            .entry(key.clone())
            .or_insert_with(|| CustomerGroup::new(key, name, ""))
            .push(record.clone());
        self.records.push(record);
    }

    fn reconcile_edit(&mut self, id: u64, patch: &MeasurementPatch, updated: MeasurementRecord) {
        let grouping = self.config.grouping;
        let new_key = grouping.key(updated.customer_name());

        let old_key = match self.records.iter().position(|r| r.id == id) {
            Some(pos) => {
                let old_key = grouping.key(self.records[pos].customer_name());
                self.records[pos] = updated.clone();
                Some(old_key)
            }
            None => {
                self.records.push(updated.clone());
                None
            }
        };

        if old_key.as_deref() == Some(new_key.as_str()) {
            if let Some(group) = self.customers.get_mut(&new_key) {
                if group.replace(updated.clone()) {
                    return;
                }
            }
            // Group out of step with the record list; fall through and re-home.
        }

        let old_contact = old_key
            .as_deref()
            .and_then(|k| self.detach(k, id))
            .unwrap_or_default();

        debug!(
            "Measurement {} moved to customer '{}'",
            id,
            updated.customer_name()
        );

        let contact = patch
            .contact
            .clone()
            .filter(|c| !c.is_empty())
            .unwrap_or(old_contact);
        let name = updated.customer_name().to_string();

        let group = self
            .customers
            .entry(new_key.clone())
            .or_insert_with(|| CustomerGroup::new(new_key, name, ""));
        group.push(updated);
        // The moved row's own contact does not win over the payload or old group.
        if !contact.is_empty() {
            group.contact = contact;
        }
    }

    /// Remove a measurement from a group, dropping the group once empty.
    /// Returns the group's contact.
    fn detach(&mut self, key: &str, id: u64) -> Option<String> {
        let group = self.customers.get_mut(key)?;
        group.remove(id);
        let contact = group.contact.clone();
        if group.is_empty() {
            self.customers.remove(key);
            debug!("Customer '{}' has no measurements left", key);
        }
        Some(contact)
    }

    fn succeed(&mut self) {
        self.error = None;
        self.publish();
    }

    fn fail<T>(&mut self, action: &str, err: MeasureError) -> Result<T> {
        let message = format!("{}: {}", action, err);
        warn!("{}", message);
        self.error = Some(message);
        self.publish();
        Err(err)
    }

    fn publish(&self) {
        self.status_tx.send_replace(self.status());
    }
}

/// Group records by customer key in a single pass.
pub fn group_records(records: &[MeasurementRecord], grouping: GroupingPolicy) -> CustomerMap {
    let mut customers = CustomerMap::new();
    for record in records {
        let key = grouping.key(record.customer_name());
        customers
            .entry(key.clone())
            .or_insert_with(|| CustomerGroup::new(key, record.customer_name(), ""))
            .push(record.clone());
    }
    customers
}

fn sorted_ids(group: &CustomerGroup) -> Vec<u64> {
    let mut ids: Vec<u64> = group.measurements.iter().map(|m| m.id).collect();
    ids.sort_unstable();
    ids
}
