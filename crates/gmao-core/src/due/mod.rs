//! Due-date evaluation for maintenance plans.
//!
//! A plan is due when it is active, flagged for automatic generation, and
//! the calendar date of its next-due timestamp has been reached. Dates are
//! compared in the offset of the caller-supplied `now`, so a plan due at
//! 23:00 today is due all day today. Nothing in this module reads a clock.

pub mod frequency;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use thiserror::Error;

use gmao_db::models::{MaintenancePlan, PlanStatus};

pub use frequency::Frequency;

/// Why an active, auto-generating plan cannot be scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanValidationError {
    #[error("plan has no asset reference")]
    MissingAsset,
    #[error("plan has no frequency")]
    MissingFrequency,
    #[error("frequency must be a positive integer, got {0}")]
    InvalidFrequency(i32),
    #[error("plan has no next-due date")]
    MissingNextDue,
    #[error("next-due date cannot be advanced past the supported calendar range")]
    DueDateOverflow,
}

/// Scheduling fields of a plan after validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub asset_id: i64,
    pub frequency: Frequency,
    pub next_due: DateTime<Utc>,
}

impl Schedule {
    /// Check the fields an order-generating plan must carry.
    pub fn of(plan: &MaintenancePlan) -> Result<Self, PlanValidationError> {
        let asset_id = plan.asset_id.ok_or(PlanValidationError::MissingAsset)?;
        let (value, unit) = plan
            .frequency_value
            .zip(plan.frequency_unit)
            .ok_or(PlanValidationError::MissingFrequency)?;
        let frequency =
            Frequency::new(value, unit).ok_or(PlanValidationError::InvalidFrequency(value))?;
        let next_due = plan.next_due.ok_or(PlanValidationError::MissingNextDue)?;
        Ok(Self {
            asset_id,
            frequency,
            next_due,
        })
    }
}

/// Classification of a plan at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueStatus {
    Due(Schedule),
    NotDue(Schedule),
    /// Status is not `active`.
    Inactive,
    /// Active, but automatic generation is off.
    Manual,
    Invalid(PlanValidationError),
}

impl DueStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Due(_) => "due",
            Self::NotDue(_) => "not_due",
            Self::Inactive => "inactive",
            Self::Manual => "manual",
            Self::Invalid(_) => "invalid",
        }
    }
}

/// `true` when the calendar date of `due`, seen from `now`'s offset, is on
/// or before `now`'s calendar date.
pub fn date_reached<Tz: TimeZone>(due: &DateTime<Utc>, now: &DateTime<Tz>) -> bool {
    due.with_timezone(&now.timezone()).date_naive() <= now.date_naive()
}

/// Whether `plan` must produce an order at `now`.
///
/// Pure: the same inputs always give the same answer. A plan without a
/// next-due date is never due.
pub fn is_due<Tz: TimeZone>(plan: &MaintenancePlan, now: &DateTime<Tz>) -> bool {
    plan.status == PlanStatus::Active
        && plan.auto_generate
        && plan.next_due.is_some_and(|due| date_reached(&due, now))
}

/// Classify `plan` at `now`, validating the schedule of active,
/// auto-generating plans.
pub fn evaluate<Tz: TimeZone>(plan: &MaintenancePlan, now: &DateTime<Tz>) -> DueStatus {
    if plan.status != PlanStatus::Active {
        return DueStatus::Inactive;
    }
    if !plan.auto_generate {
        return DueStatus::Manual;
    }
    match Schedule::of(plan) {
        Err(err) => DueStatus::Invalid(err),
        Ok(schedule) if date_reached(&schedule.next_due, now) => DueStatus::Due(schedule),
        Ok(schedule) => DueStatus::NotDue(schedule),
    }
}
