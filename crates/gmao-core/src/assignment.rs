//! Technician assignment for generated orders.

use gmao_db::models::{MaintenancePlan, User};

/// Pick the assignee for a new order of `plan`.
///
/// The plan's pinned technician wins when it is in the directory and
/// assignable; otherwise the assignable technician with the lowest id.
/// `None` leaves the order unassigned, which never blocks generation.
pub fn assign_technician(plan: &MaintenancePlan, technicians: &[User]) -> Option<i64> {
    if let Some(pinned) = plan.technician_id {
        if technicians.iter().any(|t| t.id == pinned && t.is_assignable()) {
            return Some(pinned);
        }
        tracing::debug!(
            plan_id = plan.id,
            technician_id = pinned,
            "pinned technician unavailable, falling back to default assignment"
        );
    }

    technicians
        .iter()
        .filter(|t| t.is_assignable())
        .map(|t| t.id)
        .min()
}
