//! Integration tests for work order queries.

use chrono::Utc;

use gmao_db::models::{OrderStatus, OrderType};
use gmao_db::queries::work_orders::{self, NewWorkOrder};
use gmao_test_utils::fixtures::{seed_asset, seed_due_plan, utc_date};
use gmao_test_utils::{create_test_db, drop_test_db};

fn preventive(plan_id: i64, asset_id: i64, number: &str) -> NewWorkOrder {
    NewWorkOrder {
        order_number: number.to_string(),
        order_type: OrderType::Preventive,
        plan_id: Some(plan_id),
        asset_id,
        technician_id: None,
        scheduled_for: Some(utc_date(2025, 10, 1).date_naive()),
        created_at: utc_date(2025, 10, 3),
    }
}

#[tokio::test]
async fn insert_and_list_orders_for_plan() {
    let (pool, db_name) = create_test_db().await;
    let asset = seed_asset(&pool, "A").await;
    let plan = seed_due_plan(&pool, "PM-1", asset.id, utc_date(2025, 10, 1), 30).await;

    let order = work_orders::insert_work_order(&pool, &preventive(plan.id, asset.id, "WO-PM-1-20251001"))
        .await
        .expect("insert_work_order should succeed");
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.created_at, utc_date(2025, 10, 3));

    let orders = work_orders::list_orders_for_plan(&pool, plan.id).await.unwrap();
    assert_eq!(orders, vec![order.clone()]);

    let all = work_orders::list_work_orders(&pool, None).await.unwrap();
    assert_eq!(all.len(), 1);
    let other_plan = work_orders::list_work_orders(&pool, Some(plan.id + 1)).await.unwrap();
    assert!(other_plan.is_empty());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn duplicate_order_numbers_are_rejected() {
    let (pool, db_name) = create_test_db().await;
    let asset = seed_asset(&pool, "A").await;
    let plan = seed_due_plan(&pool, "PM-1", asset.id, utc_date(2025, 10, 1), 30).await;

    let new = preventive(plan.id, asset.id, "WO-PM-1-20251001");
    work_orders::insert_work_order(&pool, &new).await.unwrap();
    let err = work_orders::insert_work_order(&pool, &new).await.unwrap_err();

    let db_err = err
        .downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .expect("should be a database error");
    assert!(db_err.is_unique_violation());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn transition_uses_optimistic_lock() {
    let (pool, db_name) = create_test_db().await;
    let asset = seed_asset(&pool, "A").await;
    let plan = seed_due_plan(&pool, "PM-1", asset.id, utc_date(2025, 10, 1), 30).await;
    let order = work_orders::insert_work_order(&pool, &preventive(plan.id, asset.id, "N-1"))
        .await
        .unwrap();

    let rows = work_orders::transition_order_status(
        &pool,
        order.id,
        OrderStatus::Pending,
        OrderStatus::InProgress,
        None,
    )
    .await
    .unwrap();
    assert_eq!(rows, 1);

    // Stale `from` value.
    let rows = work_orders::transition_order_status(
        &pool,
        order.id,
        OrderStatus::Pending,
        OrderStatus::Cancelled,
        None,
    )
    .await
    .unwrap();
    assert_eq!(rows, 0);

    let now = Utc::now();
    work_orders::transition_order_status(
        &pool,
        order.id,
        OrderStatus::InProgress,
        OrderStatus::Done,
        Some(now),
    )
    .await
    .unwrap();

    let counts = work_orders::get_order_counts(&pool, plan.id).await.unwrap();
    assert_eq!(counts.done, 1);
    assert_eq!(counts.total, 1);

    pool.close().await;
    drop_test_db(&db_name).await;
}
