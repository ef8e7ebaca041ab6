//! Preventive order generation.
//!
//! One pass walks every plan in ascending id order: evaluate it, skip it
//! when a previous order still covers the cycle, pick a technician and
//! commit the order together with the advanced next-due date. Plans fail
//! independently; only an unavailable store stops the batch.

mod report;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use gmao_db::models::{MaintenancePlan, OrderType, User, WorkOrder};
use gmao_db::queries::work_orders::NewWorkOrder;

use crate::assignment::assign_technician;
use crate::due::{self, DueStatus, PlanValidationError};
use crate::guard;
use crate::store::{
    CommitOutcome, GenerationCommit, MaintenanceStore, MemoryStore, Snapshot, StoreError,
};

pub use report::{FailureKind, GeneratedOrder, GenerationReport, PlanFailure};

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("maintenance store unavailable: {0:#}")]
    StoreUnavailable(anyhow::Error),
}

impl From<StoreError> for GenerationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(e) => Self::StoreUnavailable(e),
            StoreError::Rejected(message) => Self::StoreUnavailable(anyhow::anyhow!(message)),
        }
    }
}

/// Order number for the cycle of `plan_code` due on `cycle`.
///
/// At most one order per plan and cycle can carry a given number, which
/// the database enforces with a unique index.
pub fn order_number(plan_code: &str, cycle: NaiveDate) -> String {
    format!("WO-{plan_code}-{}", cycle.format("%Y%m%d"))
}

enum PlanOutcome {
    Generated {
        order: WorkOrder,
        next_due: DateTime<Utc>,
    },
    NotDue,
    Duplicate,
    InactiveOrManual,
    Failed(FailureKind, String),
}

/// Run one generation pass against `store` at `now`.
///
/// Calendar dates (due check, duplicate guard, cycle date of the order
/// number) are taken in `now`'s offset.
pub async fn generate_due_orders<S>(
    store: &S,
    now: &DateTime<FixedOffset>,
) -> Result<GenerationReport, GenerationError>
where
    S: MaintenanceStore + ?Sized,
{
    let plans = store.list_plans().await?;
    let technicians = store.list_technicians().await?;
    debug!(
        plans = plans.len(),
        technicians = technicians.len(),
        %now,
        "starting generation pass"
    );

    let mut report = GenerationReport::default();
    for plan in &plans {
        match process_plan(store, plan, &technicians, now).await? {
            PlanOutcome::Generated { order, next_due } => {
                info!(
                    plan_id = plan.id,
                    order_id = order.id,
                    order_number = %order.order_number,
                    technician_id = ?order.technician_id,
                    %next_due,
                    "generated preventive order"
                );
                report.record_generated(&order, next_due);
            }
            PlanOutcome::NotDue => report.skipped_not_due += 1,
            PlanOutcome::Duplicate => report.skipped_duplicate += 1,
            PlanOutcome::InactiveOrManual => report.skipped_inactive_or_manual += 1,
            PlanOutcome::Failed(kind, message) => {
                warn!(plan_id = plan.id, code = %plan.code, ?kind, %message, "plan skipped");
                report.record_failure(PlanFailure {
                    plan_id: plan.id,
                    plan_code: plan.code.clone(),
                    kind,
                    message,
                });
            }
        }
    }

    info!(
        generated = report.generated,
        skipped_not_due = report.skipped_not_due,
        skipped_duplicate = report.skipped_duplicate,
        skipped_inactive_or_manual = report.skipped_inactive_or_manual,
        unassigned = report.unassigned,
        failed = report.failed,
        "generation pass complete"
    );
    Ok(report)
}

/// Dry run: generate against an in-memory copy of `snapshot`.
///
/// Returns the report and the snapshot as it would look afterwards.
pub async fn preview_due_orders(
    snapshot: Snapshot,
    now: &DateTime<FixedOffset>,
) -> Result<(GenerationReport, Snapshot), GenerationError> {
    let store = MemoryStore::new(snapshot);
    let report = generate_due_orders(&store, now).await?;
    let after = store.into_snapshot()?;
    Ok((report, after))
}

async fn process_plan<S>(
    store: &S,
    plan: &MaintenancePlan,
    technicians: &[User],
    now: &DateTime<FixedOffset>,
) -> Result<PlanOutcome, GenerationError>
where
    S: MaintenanceStore + ?Sized,
{
    let (schedule, is_due) = match due::evaluate(plan, now) {
        DueStatus::Inactive | DueStatus::Manual => {
            debug!(plan_id = plan.id, status = %plan.status, "plan inactive or manual");
            return Ok(PlanOutcome::InactiveOrManual);
        }
        DueStatus::Invalid(err) => {
            return Ok(PlanOutcome::Failed(FailureKind::Validation, err.to_string()));
        }
        DueStatus::Due(schedule) => (schedule, true),
        DueStatus::NotDue(schedule) => (schedule, false),
    };

    let orders = match store.orders_for_plan(plan.id).await {
        Ok(orders) => orders,
        Err(StoreError::Rejected(message)) => {
            return Ok(PlanOutcome::Failed(FailureKind::Rejected, message));
        }
        Err(StoreError::Unavailable(e)) => return Err(GenerationError::StoreUnavailable(e)),
    };

    if !is_due {
        // A plan generated earlier today is no longer due, but the
        // repeated run is still a duplicate of today's cycle.
        if guard::generated_on_date(plan, &orders, now) {
            debug!(plan_id = plan.id, "already generated today");
            return Ok(PlanOutcome::Duplicate);
        }
        debug!(plan_id = plan.id, next_due = %schedule.next_due, "plan not due");
        return Ok(PlanOutcome::NotDue);
    }

    if let Some(blocking) = guard::find_blocking_order(plan, &orders, now) {
        debug!(
            plan_id = plan.id,
            order_id = blocking.id,
            status = %blocking.status,
            "existing order covers this cycle"
        );
        return Ok(PlanOutcome::Duplicate);
    }

    let technician_id = assign_technician(plan, technicians);

    // Anchor the next cycle on the previous due date, not on `now`.
    let local_due = schedule.next_due.with_timezone(&now.timezone());
    let Some(next_due) = schedule.frequency.advance(&local_due) else {
        return Ok(PlanOutcome::Failed(
            FailureKind::Validation,
            PlanValidationError::DueDateOverflow.to_string(),
        ));
    };
    let next_due = next_due.with_timezone(&Utc);
    let cycle = local_due.date_naive();

    let commit = GenerationCommit {
        plan_id: plan.id,
        expected_next_due: schedule.next_due,
        next_due,
        order: NewWorkOrder {
            order_number: order_number(&plan.code, cycle),
            order_type: OrderType::Preventive,
            plan_id: Some(plan.id),
            asset_id: schedule.asset_id,
            technician_id,
            scheduled_for: Some(cycle),
            created_at: now.with_timezone(&Utc),
        },
    };

    match store.commit_generation(&commit).await {
        Ok(CommitOutcome::Committed(order)) => Ok(PlanOutcome::Generated { order, next_due }),
        Ok(CommitOutcome::Conflict) => {
            warn!(plan_id = plan.id, "next_due changed concurrently, skipping plan");
            Ok(PlanOutcome::Duplicate)
        }
        Ok(CommitOutcome::NoLongerEligible) => {
            debug!(plan_id = plan.id, "plan deactivated before commit");
            Ok(PlanOutcome::InactiveOrManual)
        }
        Err(StoreError::Rejected(message)) => Ok(PlanOutcome::Failed(FailureKind::Rejected, message)),
        Err(StoreError::Unavailable(e)) => Err(GenerationError::StoreUnavailable(e)),
    }
}
