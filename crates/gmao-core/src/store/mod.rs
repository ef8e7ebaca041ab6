//! Storage seam for order generation.
//!
//! The generator talks to plans, orders and technicians only through
//! [`MaintenanceStore`], so the same code drives PostgreSQL in production
//! and an in-memory snapshot for dry runs and tests.

pub mod memory;
pub mod pg;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use gmao_db::models::{MaintenancePlan, User, WorkOrder};
use gmao_db::queries::work_orders::NewWorkOrder;

pub use memory::{MemoryStore, Snapshot};
pub use pg::PgStore;

/// Failure reported by a store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or failed internally. Fatal for a
    /// generation batch.
    #[error("store unavailable: {0:#}")]
    Unavailable(anyhow::Error),
    /// The store refused a single write (constraint violation, unknown
    /// reference). Only the affected plan fails.
    #[error("write rejected: {0}")]
    Rejected(String),
}

impl StoreError {
    /// Classify a query-layer error.
    ///
    /// Integrity violations reported by the database are per-record
    /// rejections; everything else means the store itself is unhealthy.
    pub fn from_query(err: anyhow::Error) -> Self {
        let violation = err
            .downcast_ref::<sqlx::Error>()
            .and_then(|e| e.as_database_error())
            .filter(|db| {
                matches!(
                    db.kind(),
                    sqlx::error::ErrorKind::UniqueViolation
                        | sqlx::error::ErrorKind::ForeignKeyViolation
                        | sqlx::error::ErrorKind::NotNullViolation
                        | sqlx::error::ErrorKind::CheckViolation
                )
            })
            .map(|db| db.message().to_string());

        match violation {
            Some(message) => Self::Rejected(message),
            None => Self::Unavailable(err),
        }
    }
}

/// Everything needed to record one generated order atomically.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationCommit {
    pub plan_id: i64,
    /// `next_due` as read during evaluation; the commit only applies if
    /// the plan still carries this value.
    pub expected_next_due: DateTime<Utc>,
    pub next_due: DateTime<Utc>,
    pub order: NewWorkOrder,
}

/// Result of [`MaintenanceStore::commit_generation`].
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    /// Order inserted and `next_due` advanced.
    Committed(WorkOrder),
    /// Another writer advanced `next_due` first.
    Conflict,
    /// The plan was deactivated or switched to manual after evaluation.
    NoLongerEligible,
}

#[async_trait]
pub trait MaintenanceStore: Send + Sync {
    /// All plans, ascending id.
    async fn list_plans(&self) -> Result<Vec<MaintenancePlan>, StoreError>;

    /// Technician directory. May include inactive technicians.
    async fn list_technicians(&self) -> Result<Vec<User>, StoreError>;

    async fn orders_for_plan(&self, plan_id: i64) -> Result<Vec<WorkOrder>, StoreError>;

    /// Advance the plan's `next_due` from `expected_next_due` and insert
    /// the order, both or neither. The plan must still be active and
    /// auto-generating.
    async fn commit_generation(
        &self,
        commit: &GenerationCommit,
    ) -> Result<CommitOutcome, StoreError>;
}
