//! Plan import parser with validation.
//!
//! Parses an import file into [`PlanDraft`]s and validates:
//! - At least one plan, each with a non-empty code.
//! - Plan codes are unique.
//! - Status and frequency unit are known values.
//! - Frequency is positive and comes with a unit (and vice versa).
//! - `next_due` is a date or an RFC 3339 timestamp.

use std::collections::HashSet;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use thiserror::Error;

use gmao_db::models::{FrequencyUnit, PlanStatus};

use super::toml_format::{PlanEntry, PlanFile};

/// Errors that can occur while importing plans.
#[derive(Debug, Error)]
pub enum PlanImportError {
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("import file must contain at least one [[plan]]")]
    NoPlans,

    #[error("plan code must not be empty")]
    EmptyCode,

    #[error("duplicate plan code: {0:?}")]
    DuplicateCode(String),

    #[error("invalid status {value:?} on plan {plan:?} (expected active, inactive, or archived)")]
    InvalidStatus { plan: String, value: String },

    #[error("invalid unit {value:?} on plan {plan:?} (expected days, weeks, months, or years)")]
    InvalidUnit { plan: String, value: String },

    #[error("frequency on plan {plan:?} must be a positive integer, got {value}")]
    InvalidFrequency { plan: String, value: i32 },

    #[error("plan {0:?} must set both frequency and unit, or neither")]
    IncompleteFrequency(String),

    #[error("invalid next_due {value:?} on plan {plan:?} (expected YYYY-MM-DD or RFC 3339)")]
    InvalidDate { plan: String, value: String },

    #[error("unknown asset codes: {}", .0.join(", "))]
    UnknownAssets(Vec<String>),
}

/// A validated plan, ready to be inserted once its asset is resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanDraft {
    pub code: String,
    pub name: String,
    pub asset_code: Option<String>,
    pub status: PlanStatus,
    pub frequency_value: Option<i32>,
    pub frequency_unit: Option<FrequencyUnit>,
    pub next_due: Option<DateTime<Utc>>,
    pub auto_generate: bool,
    pub technician_id: Option<i64>,
}

/// Parse and validate an import file.
///
/// Bare dates in `next_due` are read as midnight at `offset`.
pub fn parse_plan_file(
    content: &str,
    offset: FixedOffset,
) -> Result<Vec<PlanDraft>, PlanImportError> {
    let file: PlanFile = toml::from_str(content)?;
    if file.plans.is_empty() {
        return Err(PlanImportError::NoPlans);
    }

    let mut seen = HashSet::new();
    for entry in &file.plans {
        if entry.code.trim().is_empty() {
            return Err(PlanImportError::EmptyCode);
        }
        if !seen.insert(entry.code.as_str()) {
            return Err(PlanImportError::DuplicateCode(entry.code.clone()));
        }
    }

    file.plans.iter().map(|e| to_draft(e, offset)).collect()
}

fn to_draft(entry: &PlanEntry, offset: FixedOffset) -> Result<PlanDraft, PlanImportError> {
    let status = entry
        .status
        .parse::<PlanStatus>()
        .map_err(|_| PlanImportError::InvalidStatus {
            plan: entry.code.clone(),
            value: entry.status.clone(),
        })?;

    let frequency_unit = entry
        .unit
        .as_deref()
        .map(|u| {
            u.parse::<FrequencyUnit>()
                .map_err(|_| PlanImportError::InvalidUnit {
                    plan: entry.code.clone(),
                    value: u.to_string(),
                })
        })
        .transpose()?;

    match (entry.frequency, frequency_unit) {
        (Some(value), Some(_)) if value <= 0 => {
            return Err(PlanImportError::InvalidFrequency {
                plan: entry.code.clone(),
                value,
            });
        }
        (Some(_), None) | (None, Some(_)) => {
            return Err(PlanImportError::IncompleteFrequency(entry.code.clone()));
        }
        _ => {}
    }

    let next_due = entry
        .next_due
        .as_deref()
        .map(|raw| {
            parse_due(raw, offset).ok_or_else(|| PlanImportError::InvalidDate {
                plan: entry.code.clone(),
                value: raw.to_string(),
            })
        })
        .transpose()?;

    Ok(PlanDraft {
        code: entry.code.clone(),
        name: entry.name.clone(),
        asset_code: entry.asset.clone(),
        status,
        frequency_value: entry.frequency,
        frequency_unit,
        next_due,
        auto_generate: entry.auto_generate,
        technician_id: entry.technician,
    })
}

/// `YYYY-MM-DD` (midnight at `offset`) or an RFC 3339 timestamp.
pub fn parse_due(raw: &str, offset: FixedOffset) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()?
        .and_hms_opt(0, 0, 0)?
        .and_local_timezone(offset)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}
