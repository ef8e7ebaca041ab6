//! Plan import service.
//!
//! Inserts a batch of validated [`PlanDraft`]s within a single database
//! transaction. Asset codes are resolved inside the transaction; if any is
//! unknown nothing is written.

use std::collections::HashMap;

use anyhow::{Context, Result};
use sqlx::PgPool;

use gmao_db::models::MaintenancePlan;
use gmao_db::queries::plans::{self, NewPlan};

use super::parser::{PlanDraft, PlanImportError};

/// Insert all `drafts`, or none of them.
pub async fn import_plans(pool: &PgPool, drafts: &[PlanDraft]) -> Result<Vec<MaintenancePlan>> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    let mut codes: Vec<String> = drafts.iter().filter_map(|d| d.asset_code.clone()).collect();
    codes.sort();
    codes.dedup();

    let asset_ids: HashMap<String, i64> =
        sqlx::query_as::<_, (String, i64)>("SELECT code, id FROM assets WHERE code = ANY($1)")
            .bind(&codes)
            .fetch_all(&mut *tx)
            .await
            .context("failed to resolve asset codes")?
            .into_iter()
            .collect();

    let unknown: Vec<String> = codes
        .into_iter()
        .filter(|code| !asset_ids.contains_key(code))
        .collect();
    if !unknown.is_empty() {
        // Dropping `tx` rolls back.
        return Err(PlanImportError::UnknownAssets(unknown).into());
    }

    let mut created = Vec::with_capacity(drafts.len());
    for draft in drafts {
        let asset_id = draft
            .asset_code
            .as_ref()
            .and_then(|code| asset_ids.get(code).copied());
        let plan = plans::insert_plan(
            &mut *tx,
            &NewPlan {
                code: &draft.code,
                name: &draft.name,
                asset_id,
                status: draft.status,
                frequency_value: draft.frequency_value,
                frequency_unit: draft.frequency_unit,
                next_due: draft.next_due,
                auto_generate: draft.auto_generate,
                technician_id: draft.technician_id,
            },
        )
        .await?;
        created.push(plan);
    }

    tx.commit().await.context("failed to commit plan import")?;

    tracing::info!(count = created.len(), "imported maintenance plans");
    Ok(created)
}
