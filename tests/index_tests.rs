//! Integration tests for the measurement index.
//!
//! These drive `MeasurementIndex` over the in-memory row store and check the
//! customer mapping against the flat record list after every operation.

use blind_measure::{
    AveragingPolicy, GroupingPolicy, IndexConfig, MeasureError, MeasurementData,
    MeasurementDraft, MeasurementIndex, MeasurementPatch, MeasurementRecord, MemoryStore,
};
use pretty_assertions::assert_eq;

// ==================== Helpers ====================

fn data(customer: &str, window: &str) -> MeasurementData {
    MeasurementData::new(customer, window)
        .with_widths([Some(100.0), Some(100.0), Some(100.0)])
        .with_heights([Some(200.0), Some(200.0), Some(200.0)])
}

fn draft(customer: &str, window: &str) -> MeasurementDraft {
    MeasurementDraft::new(data(customer, window))
}

fn index() -> MeasurementIndex<MemoryStore> {
    MeasurementIndex::new(MemoryStore::new(), IndexConfig::default())
}

/// Index over a store pre-filled with rows for two customers.
async fn seeded_index() -> MeasurementIndex<MemoryStore> {
    let store = MemoryStore::with_rows(vec![
        MeasurementRecord::from_draft(
            1,
            MeasurementDraft::new(data("Priya Nair", "Master Large").with_contact("555-0101")),
        ),
        MeasurementRecord::from_draft(2, draft("Priya Nair", "Bathroom")),
        MeasurementRecord::from_draft(
            3,
            MeasurementDraft::new(data("Tom Lee", "Kitchen").with_contact("555-0202")),
        ),
    ]);
    let mut index = MeasurementIndex::new(store, IndexConfig::default());
    index.load().await.expect("Load should succeed");
    index
}

fn assert_consistent(index: &MeasurementIndex<MemoryStore>) {
    let check = index.check_consistency();
    assert!(check.passed, "Index drifted: {:?}", check.errors);
}

fn group_ids(index: &MeasurementIndex<MemoryStore>, customer: &str) -> Vec<u64> {
    index
        .customer(customer)
        .map(|g| g.measurements.iter().map(|m| m.id).collect())
        .unwrap_or_default()
}

// ==================== load ====================

#[tokio::test]
async fn test_load_groups_by_customer() {
    let index = seeded_index().await;

    assert_eq!(index.records().len(), 3);
    assert_eq!(index.customers().len(), 2);
    assert_eq!(group_ids(&index, "Priya Nair"), vec![1, 2]);
    assert_eq!(index.customer("Priya Nair").unwrap().contact, "555-0101");
    assert!(!index.is_loading());
    assert_eq!(index.error(), None);
    assert_consistent(&index);
}

#[tokio::test]
async fn test_load_twice_is_idempotent() {
    let mut index = seeded_index().await;
    let records = index.records().to_vec();
    let customers = index.customers().clone();

    index.load().await.unwrap();

    assert_eq!(index.records(), records.as_slice());
    assert_eq!(index.customers(), &customers);
}

#[tokio::test]
async fn test_load_picks_up_external_rows() {
    let mut index = seeded_index().await;
    index
        .store()
        .insert_external(draft("Ana Ruiz", "Patio"));

    index.load().await.unwrap();

    assert_eq!(index.records().len(), 4);
    assert_eq!(group_ids(&index, "Ana Ruiz"), vec![4]);
    assert_consistent(&index);
}

#[tokio::test]
async fn test_failed_load_keeps_prior_state() {
    let mut index = seeded_index().await;
    let records = index.records().to_vec();
    index.store().insert_external(draft("Ana Ruiz", "Patio"));
    index.store().fail_next("connection reset");

    let err = index.load().await.unwrap_err();

    assert!(matches!(err, MeasureError::Api { status: 500, .. }));
    assert_eq!(index.records(), records.as_slice());
    assert!(index.customer("Ana Ruiz").is_none());
    assert!(!index.is_loading());
    assert_eq!(
        index.error(),
        Some("Failed to load measurements: API error: 500 - connection reset")
    );
}

// ==================== add ====================

#[tokio::test]
async fn test_add_new_customer_creates_group() {
    let mut index = index();

    let record = index
        .add(MeasurementDraft::new(
            data("Priya Nair", "Den").with_contact("555-0101"),
        ))
        .await
        .unwrap();

    assert_eq!(record.id, 1);
    let group = index.customer("Priya Nair").expect("Group should exist");
    assert_eq!(group.measurements.len(), 1);
    assert_eq!(group.contact, "555-0101");
    assert_eq!(index.customers().len(), 1);
    assert_consistent(&index);
}

#[tokio::test]
async fn test_add_derives_geometry_and_date() {
    let mut index = index();
    let mut data = MeasurementData::new("Lee", "Den")
        .with_widths([Some(90.0), None, None])
        .with_heights([Some(150.0), Some(150.0), Some(150.0)]);
    data.date = None;

    let record = index.add(MeasurementDraft::new(data)).await.unwrap();

    // Zero-fill divides the single width reading by three.
    assert_eq!(record.geometry.avg_width, 30.0);
    assert_eq!(record.geometry.avg_height, 150.0);
    assert!(record.data.date.is_some());
    assert_eq!(index.store().rows()[0].geometry, record.geometry);
}

#[tokio::test]
async fn test_add_present_only_policy() {
    let config = IndexConfig {
        averaging: AveragingPolicy::PresentOnly,
        ..Default::default()
    };
    let mut index = MeasurementIndex::new(MemoryStore::new(), config);
    let data = MeasurementData::new("Lee", "Den")
        .with_widths([Some(90.0), None, None])
        .with_heights([Some(150.0), None, Some(150.0)]);

    let record = index.add(MeasurementDraft::new(data)).await.unwrap();

    assert_eq!(record.geometry.avg_width, 90.0);
    assert_eq!(record.geometry.avg_height, 150.0);
    assert!((record.geometry.area_sq_meters - 1.35).abs() < 1e-9);
}

#[tokio::test]
async fn test_add_keeps_caller_geometry() {
    let mut index = index();
    let draft = MeasurementDraft::derived(data("Lee", "Den"), AveragingPolicy::ZeroFill);
    let expected = draft.geometry;

    let record = index.add(draft).await.unwrap();

    assert_eq!(Some(record.geometry), expected);
    assert_eq!(record.geometry.area_sq_meters, 2.0);
}

#[tokio::test]
async fn test_add_existing_customer_appends() {
    let mut index = seeded_index().await;

    let record = index.add(draft("Priya Nair", "Closet Up")).await.unwrap();

    assert_eq!(group_ids(&index, "Priya Nair"), vec![1, 2, record.id]);
    assert_eq!(index.customer("Priya Nair").unwrap().contact, "555-0101");
    assert_consistent(&index);
}

#[tokio::test]
async fn test_add_for_customer_inherits_contact() {
    let mut index = seeded_index().await;

    let record = index
        .add_for_customer("Tom Lee", draft("ignored", "Garage"))
        .await
        .unwrap();

    assert_eq!(record.customer_name(), "Tom Lee");
    assert_eq!(record.contact(), "555-0202");
    assert_eq!(group_ids(&index, "Tom Lee"), vec![3, record.id]);
}

#[tokio::test]
async fn test_failed_add_changes_nothing() {
    let mut index = seeded_index().await;
    let records = index.records().to_vec();
    index.store().fail_next("quota exceeded");

    let result = index.add(draft("Ana Ruiz", "Patio")).await;

    assert!(result.is_err());
    assert_eq!(index.records(), records.as_slice());
    assert!(index.customer("Ana Ruiz").is_none());
    assert!(index.error().unwrap().starts_with("Failed to add measurement"));
    assert_consistent(&index);
}

#[tokio::test]
async fn test_success_clears_error() {
    let mut index = seeded_index().await;
    index.store().fail_next("boom");
    assert!(index.add(draft("Ana Ruiz", "Patio")).await.is_err());
    assert!(index.error().is_some());

    index.add(draft("Ana Ruiz", "Patio")).await.unwrap();

    assert_eq!(index.error(), None);
}

// ==================== edit ====================

#[tokio::test]
async fn test_edit_same_customer_replaces_in_place() {
    let mut index = seeded_index().await;
    let patch = MeasurementPatch {
        notes: Some("Check sill depth".to_string()),
        ..Default::default()
    };

    let updated = index.edit(1, patch).await.unwrap();

    assert_eq!(updated.data.notes, "Check sill depth");
    assert_eq!(group_ids(&index, "Priya Nair"), vec![1, 2]);
    assert_eq!(
        index.customer("Priya Nair").unwrap().measurements[0].data.notes,
        "Check sill depth"
    );
    assert_eq!(index.records()[0], updated);
    assert_consistent(&index);
}

#[tokio::test]
async fn test_edit_rename_moves_record() {
    let mut index = seeded_index().await;

    index
        .edit(2, MeasurementPatch::default().with_customer("Tom Lee"))
        .await
        .unwrap();

    assert_eq!(group_ids(&index, "Priya Nair"), vec![1]);
    assert_eq!(group_ids(&index, "Tom Lee"), vec![3, 2]);
    assert_eq!(index.records().len(), 3);
    assert_consistent(&index);
}

#[tokio::test]
async fn test_edit_rename_last_record_drops_group() {
    let mut index = seeded_index().await;

    index
        .edit(3, MeasurementPatch::default().with_customer("Thomas Lee"))
        .await
        .unwrap();

    assert!(index.customer("Tom Lee").is_none());
    let group = index.customer("Thomas Lee").expect("New group should exist");
    assert_eq!(group_ids(&index, "Thomas Lee"), vec![3]);
    // Contact carries over from the old group.
    assert_eq!(group.contact, "555-0202");
    assert_consistent(&index);
}

#[tokio::test]
async fn test_edit_rename_uses_payload_contact() {
    let mut index = seeded_index().await;

    index
        .edit(
            2,
            MeasurementPatch::default()
                .with_customer("Ana Ruiz")
                .with_contact("555-0303"),
        )
        .await
        .unwrap();

    assert_eq!(index.customer("Ana Ruiz").unwrap().contact, "555-0303");
    assert_consistent(&index);
}

#[tokio::test]
async fn test_edit_rename_into_existing_group_takes_old_group_contact() {
    let store = MemoryStore::new();
    store.insert_external(MeasurementDraft::new(data("A", "Den").with_contact("X")));
    store.insert_external(MeasurementDraft::new(data("A", "Hall").with_contact("Y")));
    store.insert_external(MeasurementDraft::new(data("B", "Loft").with_contact("Z")));
    let mut index = MeasurementIndex::new(store, IndexConfig::default());
    index.load().await.unwrap();
    assert_eq!(index.customer("A").unwrap().contact, "Y");

    index
        .edit(1, MeasurementPatch::default().with_customer("B"))
        .await
        .unwrap();

    assert_eq!(group_ids(&index, "B"), vec![3, 1]);
    assert_eq!(index.customer("B").unwrap().contact, "Y");
    assert_consistent(&index);
}

#[tokio::test]
async fn test_edit_rename_into_existing_group_takes_payload_contact() {
    let mut index = seeded_index().await;

    index
        .edit(
            1,
            MeasurementPatch::default()
                .with_customer("Tom Lee")
                .with_contact("555-0404"),
        )
        .await
        .unwrap();

    assert_eq!(index.customer("Tom Lee").unwrap().contact, "555-0404");
    assert_consistent(&index);
}

#[tokio::test]
async fn test_edit_samples_rederives_geometry() {
    let mut index = seeded_index().await;

    let updated = index
        .edit(
            1,
            MeasurementPatch::default().with_widths([Some(50.0), Some(50.0), Some(50.0)]),
        )
        .await
        .unwrap();

    assert_eq!(updated.geometry.avg_width, 50.0);
    assert_eq!(updated.geometry.avg_height, 200.0);
    assert_eq!(updated.geometry.area_sq_meters, 1.0);
    assert_eq!(index.store().rows()[0].geometry, updated.geometry);
}

#[tokio::test]
async fn test_edit_without_samples_ignores_caller_geometry() {
    let mut index = seeded_index().await;
    let before = index.get(1).unwrap().geometry;
    let patch = MeasurementPatch {
        geometry: Some(blind_measure::Geometry::from_averages(1.0, 1.0)),
        ..MeasurementPatch::default().with_contact("555-0999")
    };

    let updated = index.edit(1, patch).await.unwrap();

    assert_eq!(updated.geometry, before);
}

#[tokio::test]
async fn test_edit_unknown_id() {
    let mut index = seeded_index().await;
    let calls = index.store().calls();

    let err = index
        .edit(99, MeasurementPatch::default().with_contact("x"))
        .await
        .unwrap_err();

    assert!(matches!(err, MeasureError::RecordNotFound { id: 99 }));
    assert_eq!(index.store().calls(), calls);
    assert!(index.error().is_some());
}

#[tokio::test]
async fn test_failed_edit_changes_nothing() {
    let mut index = seeded_index().await;
    let records = index.records().to_vec();
    let customers = index.customers().clone();
    index.store().fail_next("timeout");

    let result = index
        .edit(3, MeasurementPatch::default().with_customer("Thomas Lee"))
        .await;

    assert!(result.is_err());
    assert_eq!(index.records(), records.as_slice());
    assert_eq!(index.customers(), &customers);
    assert!(index.error().unwrap().starts_with("Failed to update measurement"));
}

// ==================== remove ====================

#[tokio::test]
async fn test_remove_only_record_drops_group() {
    let mut index = seeded_index().await;

    index.remove(3).await.unwrap();

    assert!(index.customer("Tom Lee").is_none());
    assert!(index.records().iter().all(|r| r.id != 3));
    assert_eq!(index.store().rows().len(), 2);
    assert_consistent(&index);
}

#[tokio::test]
async fn test_remove_keeps_other_measurements() {
    let mut index = seeded_index().await;

    index.remove(1).await.unwrap();

    assert_eq!(group_ids(&index, "Priya Nair"), vec![2]);
    assert_consistent(&index);
}

#[tokio::test]
async fn test_failed_remove_changes_nothing() {
    let mut index = seeded_index().await;
    index.store().fail_next("forbidden");

    assert!(index.remove(3).await.is_err());

    assert_eq!(group_ids(&index, "Tom Lee"), vec![3]);
    assert_eq!(index.records().len(), 3);
    assert!(index.error().unwrap().starts_with("Failed to delete measurement"));
}

#[tokio::test]
async fn test_remove_unknown_row_surfaces_store_error() {
    let mut index = seeded_index().await;

    let err = index.remove(42).await.unwrap_err();

    assert!(matches!(err, MeasureError::Api { status: 404, .. }));
    assert_eq!(index.records().len(), 3);
}

// ==================== grouping ====================

#[tokio::test]
async fn test_exact_grouping_keeps_variants_apart() {
    let mut index = index();
    index.add(draft("John Smith", "Den")).await.unwrap();
    index.add(draft("john smith ", "Den")).await.unwrap();

    assert_eq!(index.customers().len(), 2);
    assert_consistent(&index);
}

#[tokio::test]
async fn test_normalized_grouping_merges_variants() {
    let config = IndexConfig {
        grouping: GroupingPolicy::Normalized,
        ..Default::default()
    };
    let mut index = MeasurementIndex::new(MemoryStore::new(), config);
    index.add(draft("John Smith", "Den")).await.unwrap();
    index.add(draft("john smith ", "Hall")).await.unwrap();

    assert_eq!(index.customers().len(), 1);
    let group = index.customer("JOHN SMITH").unwrap();
    assert_eq!(group.name, "John Smith");
    assert_eq!(group.len(), 2);

    // A spelling change within the same key stays in place.
    index
        .edit(1, MeasurementPatch::default().with_customer("JOHN SMITH"))
        .await
        .unwrap();
    assert_eq!(group_ids(&index, "john smith"), vec![1, 2]);
    assert_consistent(&index);
}

// ==================== invariants ====================

#[tokio::test]
async fn test_mixed_operations_stay_consistent() {
    let mut index = seeded_index().await;

    let a = index.add(draft("Ana Ruiz", "Patio")).await.unwrap();
    index
        .edit(1, MeasurementPatch::default().with_customer("Ana Ruiz"))
        .await
        .unwrap();
    index.remove(2).await.unwrap();
    index
        .edit(a.id, MeasurementPatch::default().with_customer("Tom Lee"))
        .await
        .unwrap();
    index.remove(3).await.unwrap();
    assert_consistent(&index);

    let total: usize = index.customers().values().map(|g| g.len()).sum();
    assert_eq!(total, index.records().len());
    assert!(index.customers().values().all(|g| !g.is_empty()));

    // Reloading from the store gives the same membership.
    let before: Vec<(String, Vec<u64>)> = index
        .customers()
        .iter()
        .map(|(k, g)| {
            let mut ids: Vec<u64> = g.measurements.iter().map(|m| m.id).collect();
            ids.sort_unstable();
            (k.clone(), ids)
        })
        .collect();
    index.load().await.unwrap();
    let after: Vec<(String, Vec<u64>)> = index
        .customers()
        .iter()
        .map(|(k, g)| (k.clone(), g.measurements.iter().map(|m| m.id).collect()))
        .collect();
    assert_eq!(before, after);
}

// ==================== status ====================

#[tokio::test]
async fn test_status_subscription() {
    let mut index = index();
    let mut rx = index.subscribe();

    index.add(draft("Lee", "Den")).await.unwrap();
    assert!(rx.has_changed().unwrap());
    let status = rx.borrow_and_update().clone();
    assert_eq!(status.records, 1);
    assert_eq!(status.customers, 1);
    assert_eq!(status.error, None);

    index.store().fail_next("down");
    let _ = index.load().await;
    let status = rx.borrow_and_update().clone();
    assert!(!status.loading);
    assert!(status.error.unwrap().contains("down"));
    assert_eq!(index.status().records, 1);
}
