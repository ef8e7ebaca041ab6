use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Error returned when a stored or user-supplied string does not name a
/// variant of one of the enums below.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {:?}", self.kind, self.value)
    }
}

impl std::error::Error for ParseEnumError {}

/// Status of a maintenance plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Active,
    Inactive,
    Archived,
}

impl PlanStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "archived" => Ok(Self::Archived),
            other => Err(ParseEnumError {
                kind: "plan status",
                value: other.to_owned(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------

/// Unit of a plan's recurrence interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FrequencyUnit {
    Days,
    Weeks,
    Months,
    Years,
}

impl FrequencyUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Days => "days",
            Self::Weeks => "weeks",
            Self::Months => "months",
            Self::Years => "years",
        }
    }
}

impl fmt::Display for FrequencyUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FrequencyUnit {
    type Err = ParseEnumError;

    /// Accepts the plural form plus singular aliases ("day", "week", ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "days" | "day" => Ok(Self::Days),
            "weeks" | "week" => Ok(Self::Weeks),
            "months" | "month" => Ok(Self::Months),
            "years" | "year" => Ok(Self::Years),
            other => Err(ParseEnumError {
                kind: "frequency unit",
                value: other.to_owned(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------

/// Role of an application user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Planner,
    Technician,
    LeadTechnician,
    Viewer,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Planner => "planner",
            Self::Technician => "technician",
            Self::LeadTechnician => "lead_technician",
            Self::Viewer => "viewer",
        }
    }

    /// Roles that may be assigned work orders.
    pub fn is_technician(self) -> bool {
        matches!(self, Self::Technician | Self::LeadTechnician)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "planner" => Ok(Self::Planner),
            "technician" => Ok(Self::Technician),
            "lead_technician" => Ok(Self::LeadTechnician),
            "viewer" => Ok(Self::Viewer),
            other => Err(ParseEnumError {
                kind: "user role",
                value: other.to_owned(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------

/// Kind of work order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Preventive,
    Corrective,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Preventive => "preventive",
            Self::Corrective => "corrective",
        })
    }
}

impl FromStr for OrderType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "preventive" => Ok(Self::Preventive),
            "corrective" => Ok(Self::Corrective),
            other => Err(ParseEnumError {
                kind: "order type",
                value: other.to_owned(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------

/// Status of a work order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    InProgress,
    Done,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        }
    }

    /// `done` and `cancelled` orders no longer block a new cycle.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Cancelled)
    }

    /// Allowed manual status changes:
    ///
    /// ```text
    /// pending     -> in_progress | cancelled
    /// in_progress -> done | cancelled | pending
    /// ```
    pub fn can_transition_to(self, to: OrderStatus) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::InProgress)
                | (Self::Pending, Self::Cancelled)
                | (Self::InProgress, Self::Done)
                | (Self::InProgress, Self::Cancelled)
                | (Self::InProgress, Self::Pending)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(ParseEnumError {
                kind: "order status",
                value: other.to_owned(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Row structs
// ---------------------------------------------------------------------------

/// A maintained piece of equipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Asset {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An application user. Technicians are users with a technician role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub role: UserRole,
    pub active: bool,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Active user holding a technician role.
    pub fn is_assignable(&self) -> bool {
        self.active && self.role.is_technician()
    }
}

/// A recurring preventive-maintenance schedule tied to an asset.
///
/// Most scheduling fields are nullable so that incomplete records can be
/// stored and reported instead of rejected at insert time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct MaintenancePlan {
    pub id: i64,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub asset_id: Option<i64>,
    pub status: PlanStatus,
    #[serde(default)]
    pub frequency_value: Option<i32>,
    #[serde(default)]
    pub frequency_unit: Option<FrequencyUnit>,
    #[serde(default)]
    pub next_due: Option<DateTime<Utc>>,
    pub auto_generate: bool,
    /// Pinned technician, preferred over the default assignment.
    #[serde(default)]
    pub technician_id: Option<i64>,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

/// A unit of maintenance work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct WorkOrder {
    pub id: i64,
    pub order_number: String,
    pub order_type: OrderType,
    /// Originating plan; `None` for corrective orders.
    #[serde(default)]
    pub plan_id: Option<i64>,
    pub asset_id: i64,
    #[serde(default)]
    pub technician_id: Option<i64>,
    pub status: OrderStatus,
    /// Calendar date of the due cycle this order was generated for.
    #[serde(default)]
    pub scheduled_for: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_status_parses_stored_values() {
        for v in [PlanStatus::Active, PlanStatus::Inactive, PlanStatus::Archived] {
            assert_eq!(v.as_str().parse::<PlanStatus>(), Ok(v));
        }
        let err = "paused".parse::<PlanStatus>().unwrap_err();
        assert_eq!(err.to_string(), "invalid plan status: \"paused\"");
    }

    #[test]
    fn frequency_unit_accepts_singular_aliases() {
        assert_eq!("day".parse::<FrequencyUnit>(), Ok(FrequencyUnit::Days));
        assert_eq!("weeks".parse::<FrequencyUnit>(), Ok(FrequencyUnit::Weeks));
        assert_eq!("month".parse::<FrequencyUnit>(), Ok(FrequencyUnit::Months));
        assert_eq!("years".parse::<FrequencyUnit>(), Ok(FrequencyUnit::Years));
        assert!("fortnight".parse::<FrequencyUnit>().is_err());
    }

    #[test]
    fn only_technician_roles_are_assignable() {
        let mut user = User {
            id: 1,
            name: "Ana".to_string(),
            email: None,
            role: UserRole::Planner,
            active: true,
            created_at: Utc::now(),
        };
        assert!(!user.is_assignable());

        user.role = UserRole::LeadTechnician;
        assert!(user.is_assignable());

        user.active = false;
        assert!(!user.is_assignable());
    }

    #[test]
    fn order_status_terminal_states() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::InProgress.is_terminal());
        assert!(OrderStatus::Done.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
    }

    #[test]
    fn order_status_transitions() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::InProgress));
        assert!(OrderStatus::InProgress.can_transition_to(OrderStatus::Done));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Done));
        assert!(!OrderStatus::Done.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::InProgress));
    }

    #[test]
    fn plan_deserializes_with_missing_optional_fields() {
        let plan: MaintenancePlan = serde_json::from_value(serde_json::json!({
            "id": 7,
            "code": "PM-007",
            "name": "Belt inspection",
            "status": "active",
            "auto_generate": true
        }))
        .expect("plan should deserialize");
        assert_eq!(plan.asset_id, None);
        assert_eq!(plan.frequency_unit, None);
        assert_eq!(plan.next_due, None);
    }
}
