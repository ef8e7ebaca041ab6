//! Duplicate-generation guard.
//!
//! Re-running generation on the same day, or while the previous cycle's
//! order is still open, must not produce a second order for the plan.

use chrono::{DateTime, TimeZone};

use gmao_db::models::{MaintenancePlan, WorkOrder};

/// First order of `plan` that blocks a new generation at `as_of`: one
/// created on `as_of`'s calendar date, or one still pending / in progress.
pub fn find_blocking_order<'a, Tz: TimeZone>(
    plan: &MaintenancePlan,
    orders: &'a [WorkOrder],
    as_of: &DateTime<Tz>,
) -> Option<&'a WorkOrder> {
    let tz = as_of.timezone();
    let today = as_of.date_naive();
    orders.iter().filter(|o| o.plan_id == Some(plan.id)).find(|o| {
        !o.status.is_terminal() || o.created_at.with_timezone(&tz).date_naive() == today
    })
}

/// Whether `plan` already produced an order on `as_of`'s calendar date.
///
/// Used to tell "generated earlier today" apart from "simply not due" once
/// the plan's next-due date has moved past `as_of`.
pub fn generated_on_date<Tz: TimeZone>(
    plan: &MaintenancePlan,
    orders: &[WorkOrder],
    as_of: &DateTime<Tz>,
) -> bool {
    let tz = as_of.timezone();
    let today = as_of.date_naive();
    orders
        .iter()
        .any(|o| o.plan_id == Some(plan.id) && o.created_at.with_timezone(&tz).date_naive() == today)
}

pub fn has_pending_or_recent_order<Tz: TimeZone>(
    plan: &MaintenancePlan,
    orders: &[WorkOrder],
    as_of: &DateTime<Tz>,
) -> bool {
    find_blocking_order(plan, orders, as_of).is_some()
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use gmao_db::models::{OrderStatus, OrderType, PlanStatus};

    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
            .and_utc()
    }

    fn plan(id: i64) -> MaintenancePlan {
        MaintenancePlan {
            id,
            code: format!("PM-{id}"),
            name: "Filter swap".to_string(),
            asset_id: Some(1),
            status: PlanStatus::Active,
            frequency_value: Some(7),
            frequency_unit: Some(gmao_db::models::FrequencyUnit::Days),
            next_due: Some(at(2025, 10, 1, 0)),
            auto_generate: true,
            technician_id: None,
            created_at: at(2025, 1, 1, 0),
        }
    }

    fn order(id: i64, plan_id: Option<i64>, status: OrderStatus, created_at: DateTime<Utc>) -> WorkOrder {
        WorkOrder {
            id,
            order_number: format!("WO-{id}"),
            order_type: if plan_id.is_some() {
                OrderType::Preventive
            } else {
                OrderType::Corrective
            },
            plan_id,
            asset_id: 1,
            technician_id: None,
            status,
            scheduled_for: None,
            created_at,
            completed_at: None,
        }
    }

    #[test]
    fn no_orders_means_no_block() {
        assert!(!has_pending_or_recent_order(&plan(1), &[], &at(2025, 10, 3, 9)));
    }

    #[test]
    fn order_created_today_blocks_even_when_done() {
        let orders = [order(1, Some(1), OrderStatus::Done, at(2025, 10, 3, 1))];
        assert!(has_pending_or_recent_order(&plan(1), &orders, &at(2025, 10, 3, 22)));
    }

    #[test]
    fn open_order_from_an_earlier_day_blocks() {
        for status in [OrderStatus::Pending, OrderStatus::InProgress] {
            let orders = [order(1, Some(1), status, at(2025, 9, 1, 8))];
            assert!(has_pending_or_recent_order(&plan(1), &orders, &at(2025, 10, 3, 9)));
        }
    }

    #[test]
    fn closed_order_from_an_earlier_day_does_not_block() {
        let orders = [
            order(1, Some(1), OrderStatus::Done, at(2025, 9, 1, 8)),
            order(2, Some(1), OrderStatus::Cancelled, at(2025, 10, 2, 23)),
        ];
        assert!(!has_pending_or_recent_order(&plan(1), &orders, &at(2025, 10, 3, 9)));
    }

    #[test]
    fn orders_of_other_plans_or_corrective_orders_are_ignored() {
        let orders = [
            order(1, Some(2), OrderStatus::Pending, at(2025, 10, 3, 8)),
            order(2, None, OrderStatus::Pending, at(2025, 10, 3, 8)),
        ];
        assert!(!has_pending_or_recent_order(&plan(1), &orders, &at(2025, 10, 3, 9)));
    }

    #[test]
    fn generated_on_date_ignores_open_orders_from_earlier_days() {
        let orders = [order(1, Some(1), OrderStatus::Pending, at(2025, 9, 1, 8))];
        assert!(!generated_on_date(&plan(1), &orders, &at(2025, 10, 3, 9)));

        let orders = [order(2, Some(1), OrderStatus::Cancelled, at(2025, 10, 3, 0))];
        assert!(generated_on_date(&plan(1), &orders, &at(2025, 10, 3, 9)));
    }

    #[test]
    fn reports_which_order_blocks() {
        let orders = [
            order(1, Some(1), OrderStatus::Done, at(2025, 9, 1, 8)),
            order(2, Some(1), OrderStatus::InProgress, at(2025, 9, 20, 8)),
        ];
        let blocking = find_blocking_order(&plan(1), &orders, &at(2025, 10, 3, 9));
        assert_eq!(blocking.map(|o| o.id), Some(2));
    }
}
