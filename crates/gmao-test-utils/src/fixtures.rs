//! Seed helpers for integration tests.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use gmao_db::models::{Asset, FrequencyUnit, MaintenancePlan, PlanStatus, User, UserRole};
use gmao_db::queries::plans::{self, NewPlan};
use gmao_db::queries::{assets, users};

/// Midnight UTC of the given calendar date.
pub fn utc_date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|| panic!("invalid date {y}-{m}-{d}"))
}

pub async fn seed_asset(pool: &PgPool, code: &str) -> Asset {
    assets::insert_asset(pool, code, &format!("Asset {code}"), Some("Plant A"))
        .await
        .expect("insert_asset should succeed")
}

pub async fn seed_technician(pool: &PgPool, name: &str, active: bool) -> User {
    users::insert_user(pool, name, None, UserRole::Technician, active)
        .await
        .expect("insert_user should succeed")
}

/// Active, auto-generating plan with a day-based frequency.
pub async fn seed_due_plan(
    pool: &PgPool,
    code: &str,
    asset_id: i64,
    next_due: DateTime<Utc>,
    every_days: i32,
) -> MaintenancePlan {
    plans::insert_plan(
        pool,
        &NewPlan {
            code,
            name: &format!("Plan {code}"),
            asset_id: Some(asset_id),
            status: PlanStatus::Active,
            frequency_value: Some(every_days),
            frequency_unit: Some(FrequencyUnit::Days),
            next_due: Some(next_due),
            auto_generate: true,
            technician_id: None,
        },
    )
    .await
    .expect("insert_plan should succeed")
}
