//! Outcome of a generation batch.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use gmao_db::models::WorkOrder;

/// Counters and details of one `generate_due_orders` pass.
///
/// Every plan lands in exactly one of `generated`, `skipped_not_due`,
/// `skipped_duplicate`, `skipped_inactive_or_manual` or `failed`;
/// `unassigned` counts the subset of generated orders with no technician.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationReport {
    pub generated: usize,
    pub skipped_not_due: usize,
    pub skipped_duplicate: usize,
    pub skipped_inactive_or_manual: usize,
    pub unassigned: usize,
    pub failed: usize,
    pub created_order_ids: Vec<i64>,
    pub orders: Vec<GeneratedOrder>,
    pub failures: Vec<PlanFailure>,
}

impl GenerationReport {
    /// Number of plans examined.
    pub fn plans_seen(&self) -> usize {
        self.generated
            + self.skipped_not_due
            + self.skipped_duplicate
            + self.skipped_inactive_or_manual
            + self.failed
    }

    pub(crate) fn record_generated(&mut self, order: &WorkOrder, next_due: DateTime<Utc>) {
        self.generated += 1;
        if order.technician_id.is_none() {
            self.unassigned += 1;
        }
        self.created_order_ids.push(order.id);
        self.orders.push(GeneratedOrder {
            id: order.id,
            order_number: order.order_number.clone(),
            plan_id: order.plan_id,
            asset_id: order.asset_id,
            technician_id: order.technician_id,
            scheduled_for: order.scheduled_for,
            next_due,
        });
    }

    pub(crate) fn record_failure(&mut self, failure: PlanFailure) {
        self.failed += 1;
        self.failures.push(failure);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedOrder {
    pub id: i64,
    pub order_number: String,
    pub plan_id: Option<i64>,
    pub asset_id: i64,
    pub technician_id: Option<i64>,
    pub scheduled_for: Option<NaiveDate>,
    /// The plan's next-due date after this generation.
    pub next_due: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The plan record itself is malformed.
    Validation,
    /// The store refused the write.
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanFailure {
    pub plan_id: i64,
    pub plan_code: String,
    pub kind: FailureKind,
    pub message: String,
}
