//! Integration tests for plan queries, including the next-due
//! compare-and-swap used by order generation.

use chrono::Duration;

use gmao_db::models::{FrequencyUnit, PlanStatus};
use gmao_db::queries::plans::{self, NewPlan};
use gmao_test_utils::fixtures::{seed_asset, seed_due_plan, seed_technician, utc_date};
use gmao_test_utils::{create_test_db, drop_test_db};

#[tokio::test]
async fn insert_and_get_plan() {
    let (pool, db_name) = create_test_db().await;
    let asset = seed_asset(&pool, "CMP-01").await;

    let plan = plans::insert_plan(
        &pool,
        &NewPlan {
            code: "PM-001",
            name: "Compressor oil change",
            asset_id: Some(asset.id),
            status: PlanStatus::Active,
            frequency_value: Some(3),
            frequency_unit: Some(FrequencyUnit::Months),
            next_due: Some(utc_date(2025, 10, 1)),
            auto_generate: true,
            technician_id: None,
        },
    )
    .await
    .expect("insert_plan should succeed");

    let fetched = plans::get_plan(&pool, plan.id)
        .await
        .expect("get_plan should succeed")
        .expect("plan should exist");
    assert_eq!(fetched, plan);
    assert_eq!(fetched.frequency_unit, Some(FrequencyUnit::Months));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn incomplete_plans_can_be_stored() {
    let (pool, db_name) = create_test_db().await;

    let plan = plans::insert_plan(
        &pool,
        &NewPlan {
            code: "PM-DRAFT",
            name: "Not yet scheduled",
            asset_id: None,
            status: PlanStatus::Inactive,
            frequency_value: None,
            frequency_unit: None,
            next_due: None,
            auto_generate: false,
            technician_id: None,
        },
    )
    .await
    .expect("incomplete plan should be accepted");

    assert_eq!(plan.asset_id, None);
    assert_eq!(plan.next_due, None);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn list_plans_is_ordered_by_id() {
    let (pool, db_name) = create_test_db().await;
    let asset = seed_asset(&pool, "A").await;

    let first = seed_due_plan(&pool, "Z-LAST-CODE", asset.id, utc_date(2025, 1, 1), 7).await;
    let second = seed_due_plan(&pool, "A-FIRST-CODE", asset.id, utc_date(2025, 1, 1), 7).await;

    let ids: Vec<i64> = plans::list_plans(&pool)
        .await
        .unwrap()
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(ids, vec![first.id, second.id]);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn update_operations_change_flags() {
    let (pool, db_name) = create_test_db().await;
    let asset = seed_asset(&pool, "A").await;
    let tech = seed_technician(&pool, "Luis", true).await;
    let plan = seed_due_plan(&pool, "PM-1", asset.id, utc_date(2025, 1, 1), 7).await;

    plans::set_plan_status(&pool, plan.id, PlanStatus::Inactive).await.unwrap();
    plans::set_auto_generate(&pool, plan.id, false).await.unwrap();
    plans::set_pinned_technician(&pool, plan.id, Some(tech.id)).await.unwrap();

    let updated = plans::get_plan(&pool, plan.id).await.unwrap().unwrap();
    assert_eq!(updated.status, PlanStatus::Inactive);
    assert!(!updated.auto_generate);
    assert_eq!(updated.technician_id, Some(tech.id));

    let missing = plans::set_plan_status(&pool, 9_999, PlanStatus::Active).await;
    assert!(missing.unwrap_err().to_string().contains("not found"));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn advance_next_due_is_compare_and_swap() {
    let (pool, db_name) = create_test_db().await;
    let asset = seed_asset(&pool, "A").await;
    let due = utc_date(2025, 10, 1);
    let plan = seed_due_plan(&pool, "PM-1", asset.id, due, 30).await;
    let next = due + Duration::days(30);

    let rows = plans::advance_next_due(&pool, plan.id, due, next).await.unwrap();
    assert_eq!(rows, 1);

    // Second writer still holding the old value loses.
    let rows = plans::advance_next_due(&pool, plan.id, due, next + Duration::days(30))
        .await
        .unwrap();
    assert_eq!(rows, 0);

    let stored = plans::get_plan(&pool, plan.id).await.unwrap().unwrap();
    assert_eq!(stored.next_due, Some(next));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn advance_next_due_rechecks_plan_status() {
    let (pool, db_name) = create_test_db().await;
    let asset = seed_asset(&pool, "A").await;
    let due = utc_date(2025, 10, 1);
    let plan = seed_due_plan(&pool, "PM-1", asset.id, due, 30).await;

    plans::set_plan_status(&pool, plan.id, PlanStatus::Inactive).await.unwrap();

    let rows = plans::advance_next_due(&pool, plan.id, due, due + Duration::days(30))
        .await
        .unwrap();
    assert_eq!(rows, 0, "inactive plans must not be advanced");

    pool.close().await;
    drop_test_db(&db_name).await;
}
