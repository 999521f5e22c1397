//! Observability specs: stats snapshots and pollable occupancy

use crate::prelude::*;

#[tokio::test]
async fn stats_serialize_with_snake_case_fields() {
    let (factory, _, _) = fixture(BackendKind::SortedSet);
    let mut sem = factory.create("jobs", 3, TTL).unwrap();
    assert!(sem.try_acquire().await);

    let stats = sem.stats().await.unwrap();
    let value = serde_json::to_value(&stats).unwrap();

    assert_eq!(value["key"], "jobs");
    assert_eq!(value["max_concurrent"], 3);
    assert_eq!(value["current_count"], 1);
    assert_eq!(value["available"], 2);
    assert_eq!(value["ttl_remaining"], 60);
    assert_eq!(value["is_full"], false);
    assert_eq!(value["is_acquired_by_me"], true);
    assert_eq!(value["driver"], "sorted_set");
    assert!(value["identifier"].is_string());
    assert!(value["created_at"].is_string());
    assert!(value["metadata"].is_object());
}

#[tokio::test]
async fn occupancy_is_pollable_without_holding() {
    for kind in KINDS {
        let (factory, _, _) = fixture(kind);
        let mut a = factory.create("jobs", 2, TTL).unwrap();
        let mut b = factory.create("jobs", 2, TTL).unwrap();
        assert!(a.try_acquire().await, "{kind}");
        assert!(b.try_acquire().await, "{kind}");

        // A pure observer never takes a slot
        let observer = factory.create("jobs", 2, TTL).unwrap();
        assert_eq!(observer.current_count().await, 2, "{kind}");
        assert!(!observer.is_acquired_by_me().await, "{kind}");

        let stats = observer.stats().await.unwrap();
        assert!(stats.is_full, "{kind}");
        assert!(!stats.is_acquired_by_me, "{kind}");
        assert_eq!(stats.driver, kind, "{kind}");
    }
}

#[tokio::test]
async fn metadata_distinguishes_the_backends() {
    let (factory, _, _) = fixture(BackendKind::SortedSet);
    let mut sem = factory.create("jobs", 2, TTL).unwrap();
    assert!(sem.try_acquire().await);
    let stats = sem.stats().await.unwrap();
    assert_eq!(
        stats.metadata.get("implementation"),
        Some(&serde_json::json!("sorted_set"))
    );
    assert_eq!(
        stats.metadata.get("store_key"),
        Some(&serde_json::json!("semaphore:jobs"))
    );

    let (factory, _, _) = fixture(BackendKind::SlotKey);
    let mut sem = factory.create("jobs", 2, TTL).unwrap();
    assert!(sem.try_acquire().await);
    let stats = sem.stats().await.unwrap();
    assert_eq!(
        stats.metadata.get("occupied_slots"),
        Some(&serde_json::json!([0]))
    );
    assert_eq!(
        stats.metadata.get("my_slot_index"),
        Some(&serde_json::json!(0))
    );
    assert_eq!(
        stats.metadata.get("slot_count"),
        Some(&serde_json::json!(2))
    );
}

#[tokio::test]
async fn usage_tracks_acquisitions_and_releases() {
    for kind in KINDS {
        let (factory, _, _) = fixture(kind);
        let mut a = factory.create("jobs", 4, TTL).unwrap();
        let mut b = factory.create("jobs", 4, TTL).unwrap();

        assert!(a.try_acquire().await, "{kind}");
        assert!(b.try_acquire().await, "{kind}");
        let stats = a.stats().await.unwrap();
        assert!((stats.usage_percentage() - 50.0).abs() < 0.001, "{kind}");
        assert!(stats.has_available_slots(), "{kind}");

        assert!(b.release().await, "{kind}");
        let stats = a.stats().await.unwrap();
        assert!((stats.usage_percentage() - 25.0).abs() < 0.001, "{kind}");
    }
}
