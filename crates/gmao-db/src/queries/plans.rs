//! Database query functions for the `maintenance_plans` table.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};

use crate::models::{FrequencyUnit, MaintenancePlan, PlanStatus};

/// Parameters for inserting a new plan.
#[derive(Debug, Clone)]
pub struct NewPlan<'a> {
    pub code: &'a str,
    pub name: &'a str,
    pub asset_id: Option<i64>,
    pub status: PlanStatus,
    pub frequency_value: Option<i32>,
    pub frequency_unit: Option<FrequencyUnit>,
    pub next_due: Option<DateTime<Utc>>,
    pub auto_generate: bool,
    pub technician_id: Option<i64>,
}

/// Insert a new plan. Accepts a pool or an open transaction.
pub async fn insert_plan<'e, E>(executor: E, plan: &NewPlan<'_>) -> Result<MaintenancePlan>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, MaintenancePlan>(
        "INSERT INTO maintenance_plans \
             (code, name, asset_id, status, frequency_value, frequency_unit, \
              next_due, auto_generate, technician_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING *",
    )
    .bind(plan.code)
    .bind(plan.name)
    .bind(plan.asset_id)
    .bind(plan.status)
    .bind(plan.frequency_value)
    .bind(plan.frequency_unit)
    .bind(plan.next_due)
    .bind(plan.auto_generate)
    .bind(plan.technician_id)
    .fetch_one(executor)
    .await
    .with_context(|| format!("failed to insert plan {:?}", plan.code))?;

    Ok(row)
}

/// Fetch a plan by id.
pub async fn get_plan<'e, E>(executor: E, id: i64) -> Result<Option<MaintenancePlan>>
where
    E: PgExecutor<'e>,
{
    let plan =
        sqlx::query_as::<_, MaintenancePlan>("SELECT * FROM maintenance_plans WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
            .context("failed to fetch plan")?;

    Ok(plan)
}

/// List all plans in ascending id order (the generation order).
pub async fn list_plans(pool: &PgPool) -> Result<Vec<MaintenancePlan>> {
    let plans = sqlx::query_as::<_, MaintenancePlan>("SELECT * FROM maintenance_plans ORDER BY id")
        .fetch_all(pool)
        .await
        .context("failed to list plans")?;

    Ok(plans)
}

/// Update the status of a plan.
pub async fn set_plan_status(pool: &PgPool, id: i64, status: PlanStatus) -> Result<()> {
    let result = sqlx::query("UPDATE maintenance_plans SET status = $1 WHERE id = $2")
        .bind(status)
        .bind(id)
        .execute(pool)
        .await
        .context("failed to update plan status")?;

    if result.rows_affected() == 0 {
        anyhow::bail!("plan {id} not found");
    }

    Ok(())
}

/// Turn automatic order generation on or off for a plan.
pub async fn set_auto_generate(pool: &PgPool, id: i64, auto_generate: bool) -> Result<()> {
    let result = sqlx::query("UPDATE maintenance_plans SET auto_generate = $1 WHERE id = $2")
        .bind(auto_generate)
        .bind(id)
        .execute(pool)
        .await
        .context("failed to update plan auto_generate flag")?;

    if result.rows_affected() == 0 {
        anyhow::bail!("plan {id} not found");
    }

    Ok(())
}

/// Pin a technician to a plan, or clear the pin with `None`.
pub async fn set_pinned_technician(
    pool: &PgPool,
    id: i64,
    technician_id: Option<i64>,
) -> Result<()> {
    let result = sqlx::query("UPDATE maintenance_plans SET technician_id = $1 WHERE id = $2")
        .bind(technician_id)
        .bind(id)
        .execute(pool)
        .await
        .context("failed to update plan technician")?;

    if result.rows_affected() == 0 {
        anyhow::bail!("plan {id} not found");
    }

    Ok(())
}

/// Compare-and-swap the plan's next-due timestamp.
///
/// The row is only updated while `next_due` still equals `expected` and the
/// plan is still active with automatic generation on. Returns the number of
/// rows affected: 0 means another writer got there first or the plan was
/// deactivated in the meantime.
pub async fn advance_next_due<'e, E>(
    executor: E,
    id: i64,
    expected: DateTime<Utc>,
    next_due: DateTime<Utc>,
) -> Result<u64>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        "UPDATE maintenance_plans \
         SET next_due = $1 \
         WHERE id = $2 \
           AND next_due = $3 \
           AND status = 'active' \
           AND auto_generate",
    )
    .bind(next_due)
    .bind(id)
    .bind(expected)
    .execute(executor)
    .await
    .context("failed to advance plan next_due")?;

    Ok(result.rows_affected())
}
