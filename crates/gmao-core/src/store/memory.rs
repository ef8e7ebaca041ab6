//! In-memory [`MaintenanceStore`] over a JSON snapshot.
//!
//! Backs `gmao simulate`, the preview endpoint and the generator unit
//! tests. Applies the same compare-and-swap rules as the PostgreSQL store.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use gmao_db::models::{Asset, MaintenancePlan, OrderStatus, PlanStatus, User, WorkOrder};

use super::{CommitOutcome, GenerationCommit, MaintenanceStore, StoreError};

/// Plans, orders and technicians as seen at one instant.
///
/// `assets` is optional; when empty, asset references are not checked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub plans: Vec<MaintenancePlan>,
    #[serde(default)]
    pub orders: Vec<WorkOrder>,
    #[serde(default)]
    pub technicians: Vec<User>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assets: Vec<Asset>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<Snapshot>,
}

impl MemoryStore {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            state: Mutex::new(snapshot),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Snapshot>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable(anyhow::anyhow!("memory store lock poisoned")))
    }

    /// Clone of the current state.
    pub fn snapshot(&self) -> Result<Snapshot, StoreError> {
        Ok(self.lock()?.clone())
    }

    pub fn into_snapshot(self) -> Result<Snapshot, StoreError> {
        self.state
            .into_inner()
            .map_err(|_| StoreError::Unavailable(anyhow::anyhow!("memory store lock poisoned")))
    }
}

#[async_trait]
impl MaintenanceStore for MemoryStore {
    async fn list_plans(&self) -> Result<Vec<MaintenancePlan>, StoreError> {
        let mut plans = self.lock()?.plans.clone();
        plans.sort_by_key(|p| p.id);
        Ok(plans)
    }

    async fn list_technicians(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.lock()?.technicians.clone())
    }

    async fn orders_for_plan(&self, plan_id: i64) -> Result<Vec<WorkOrder>, StoreError> {
        let mut orders: Vec<WorkOrder> = self
            .lock()?
            .orders
            .iter()
            .filter(|o| o.plan_id == Some(plan_id))
            .cloned()
            .collect();
        orders.sort_by_key(|o| (o.created_at, o.id));
        Ok(orders)
    }

    async fn commit_generation(
        &self,
        commit: &GenerationCommit,
    ) -> Result<CommitOutcome, StoreError> {
        let mut state = self.lock()?;
        let Snapshot {
            plans,
            orders,
            assets,
            ..
        } = &mut *state;

        let plan = plans
            .iter_mut()
            .find(|p| p.id == commit.plan_id)
            .ok_or_else(|| {
                StoreError::Rejected(format!("plan {} no longer exists", commit.plan_id))
            })?;

        if plan.status != PlanStatus::Active || !plan.auto_generate {
            return Ok(CommitOutcome::NoLongerEligible);
        }
        if plan.next_due != Some(commit.expected_next_due) {
            return Ok(CommitOutcome::Conflict);
        }

        let new = &commit.order;
        if !assets.is_empty() && !assets.iter().any(|a| a.id == new.asset_id) {
            return Err(StoreError::Rejected(format!(
                "asset {} does not exist",
                new.asset_id
            )));
        }
        if orders.iter().any(|o| o.order_number == new.order_number) {
            return Err(StoreError::Rejected(format!(
                "order number {} already exists",
                new.order_number
            )));
        }

        plan.next_due = Some(commit.next_due);
        let order = WorkOrder {
            id: orders.iter().map(|o| o.id).max().unwrap_or(0) + 1,
            order_number: new.order_number.clone(),
            order_type: new.order_type,
            plan_id: new.plan_id,
            asset_id: new.asset_id,
            technician_id: new.technician_id,
            status: OrderStatus::Pending,
            scheduled_for: new.scheduled_for,
            created_at: new.created_at,
            completed_at: None,
        };
        orders.push(order.clone());

        Ok(CommitOutcome::Committed(order))
    }
}
