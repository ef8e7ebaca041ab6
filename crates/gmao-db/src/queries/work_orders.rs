//! Database query functions for the `work_orders` table.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgExecutor, PgPool};

use crate::models::{OrderStatus, OrderType, WorkOrder};

/// Parameters for inserting a new work order.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWorkOrder {
    pub order_number: String,
    pub order_type: OrderType,
    pub plan_id: Option<i64>,
    pub asset_id: i64,
    pub technician_id: Option<i64>,
    pub scheduled_for: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// Insert a work order in `pending` status. Accepts a pool or an open
/// transaction.
pub async fn insert_work_order<'e, E>(executor: E, order: &NewWorkOrder) -> Result<WorkOrder>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, WorkOrder>(
        "INSERT INTO work_orders \
             (order_number, order_type, plan_id, asset_id, technician_id, \
              scheduled_for, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING *",
    )
    .bind(&order.order_number)
    .bind(order.order_type)
    .bind(order.plan_id)
    .bind(order.asset_id)
    .bind(order.technician_id)
    .bind(order.scheduled_for)
    .bind(order.created_at)
    .fetch_one(executor)
    .await
    .with_context(|| format!("failed to insert work order {}", order.order_number))?;

    Ok(row)
}

/// Fetch a single work order by id.
pub async fn get_work_order(pool: &PgPool, id: i64) -> Result<Option<WorkOrder>> {
    let order = sqlx::query_as::<_, WorkOrder>("SELECT * FROM work_orders WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch work order")?;

    Ok(order)
}

/// List work orders, newest first, optionally restricted to one plan.
pub async fn list_work_orders(pool: &PgPool, plan_id: Option<i64>) -> Result<Vec<WorkOrder>> {
    let orders = sqlx::query_as::<_, WorkOrder>(
        "SELECT * FROM work_orders \
         WHERE ($1::BIGINT IS NULL OR plan_id = $1) \
         ORDER BY created_at DESC, id DESC",
    )
    .bind(plan_id)
    .fetch_all(pool)
    .await
    .context("failed to list work orders")?;

    Ok(orders)
}

/// All orders generated from a plan, oldest first.
pub async fn list_orders_for_plan(pool: &PgPool, plan_id: i64) -> Result<Vec<WorkOrder>> {
    let orders = sqlx::query_as::<_, WorkOrder>(
        "SELECT * FROM work_orders WHERE plan_id = $1 ORDER BY created_at ASC, id ASC",
    )
    .bind(plan_id)
    .fetch_all(pool)
    .await
    .context("failed to list work orders for plan")?;

    Ok(orders)
}

/// Atomically move an order from one status to another.
///
/// Optimistic lock on `status = $from`; returns the number of rows
/// affected (0 means the order is missing or its status changed).
pub async fn transition_order_status(
    pool: &PgPool,
    id: i64,
    from: OrderStatus,
    to: OrderStatus,
    completed_at: Option<DateTime<Utc>>,
) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE work_orders \
         SET status = $1, completed_at = $2 \
         WHERE id = $3 AND status = $4",
    )
    .bind(to)
    .bind(completed_at)
    .bind(id)
    .bind(from)
    .execute(pool)
    .await
    .context("failed to transition work order status")?;

    Ok(result.rows_affected())
}

/// Order counts by status for one plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderCounts {
    pub pending: i64,
    pub in_progress: i64,
    pub done: i64,
    pub cancelled: i64,
    pub total: i64,
}

/// Summarise a plan's orders by status.
pub async fn get_order_counts(pool: &PgPool, plan_id: i64) -> Result<OrderCounts> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT status, COUNT(*) \
         FROM work_orders \
         WHERE plan_id = $1 \
         GROUP BY status",
    )
    .bind(plan_id)
    .fetch_all(pool)
    .await
    .context("failed to count work orders")?;

    let mut counts = OrderCounts::default();
    for (status, count) in &rows {
        match status.as_str() {
            "pending" => counts.pending = *count,
            "in_progress" => counts.in_progress = *count,
            "done" => counts.done = *count,
            "cancelled" => counts.cancelled = *count,
            _ => {}
        }
        counts.total += count;
    }
    Ok(counts)
}
