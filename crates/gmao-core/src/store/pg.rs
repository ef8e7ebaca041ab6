//! PostgreSQL-backed [`MaintenanceStore`].

use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;

use gmao_db::models::{MaintenancePlan, PlanStatus, User, WorkOrder};
use gmao_db::queries::{assets, plans, users, work_orders};

use super::{CommitOutcome, GenerationCommit, MaintenanceStore, Snapshot, StoreError};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Copy every table the generator reads into a [`Snapshot`].
    pub async fn snapshot(&self) -> anyhow::Result<Snapshot> {
        Ok(Snapshot {
            plans: plans::list_plans(&self.pool).await?,
            orders: work_orders::list_work_orders(&self.pool, None).await?,
            technicians: users::list_technicians(&self.pool).await?,
            assets: assets::list_assets(&self.pool).await?,
        })
    }
}

#[async_trait]
impl MaintenanceStore for PgStore {
    async fn list_plans(&self) -> Result<Vec<MaintenancePlan>, StoreError> {
        plans::list_plans(&self.pool)
            .await
            .map_err(StoreError::Unavailable)
    }

    async fn list_technicians(&self) -> Result<Vec<User>, StoreError> {
        users::list_technicians(&self.pool)
            .await
            .map_err(StoreError::Unavailable)
    }

    async fn orders_for_plan(&self, plan_id: i64) -> Result<Vec<WorkOrder>, StoreError> {
        work_orders::list_orders_for_plan(&self.pool, plan_id)
            .await
            .map_err(StoreError::Unavailable)
    }

    async fn commit_generation(
        &self,
        commit: &GenerationCommit,
    ) -> Result<CommitOutcome, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to begin transaction")
            .map_err(StoreError::Unavailable)?;

        let advanced = plans::advance_next_due(
            &mut *tx,
            commit.plan_id,
            commit.expected_next_due,
            commit.next_due,
        )
        .await
        .map_err(StoreError::from_query)?;

        if advanced == 0 {
            // Dropping the transaction rolls it back; find out why the
            // compare-and-swap missed.
            drop(tx);
            let current = plans::get_plan(&self.pool, commit.plan_id)
                .await
                .map_err(StoreError::Unavailable)?;
            return match current {
                None => Err(StoreError::Rejected(format!(
                    "plan {} no longer exists",
                    commit.plan_id
                ))),
                Some(plan) if plan.status != PlanStatus::Active || !plan.auto_generate => {
                    Ok(CommitOutcome::NoLongerEligible)
                }
                Some(_) => Ok(CommitOutcome::Conflict),
            };
        }

        let order = work_orders::insert_work_order(&mut *tx, &commit.order)
            .await
            .map_err(StoreError::from_query)?;

        tx.commit()
            .await
            .context("failed to commit generation")
            .map_err(StoreError::Unavailable)?;

        Ok(CommitOutcome::Committed(order))
    }
}
