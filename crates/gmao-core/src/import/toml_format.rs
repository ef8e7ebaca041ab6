//! TOML format types for plan import files.
//!
//! A file holds one `[[plan]]` table per maintenance plan.

use serde::{Deserialize, Serialize};

/// Top-level structure of a plan import file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlanFile {
    #[serde(rename = "plan", default)]
    pub plans: Vec<PlanEntry>,
}

/// A single `[[plan]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanEntry {
    /// Unique plan code, also used in generated order numbers.
    pub code: String,
    pub name: String,
    /// Code of the maintained asset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,
    /// "active", "inactive" or "archived".
    #[serde(default = "default_status")]
    pub status: String,
    /// Interval length, paired with `unit`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<i32>,
    /// "days", "weeks", "months" or "years".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// First due date: `YYYY-MM-DD` (midnight in the site offset) or RFC 3339.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_due: Option<String>,
    #[serde(default)]
    pub auto_generate: bool,
    /// Pinned technician id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technician: Option<i64>,
}

fn default_status() -> String {
    "active".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_minimal_entry() {
        let file: PlanFile = toml::from_str(
            r#"
[[plan]]
code = "PM-001"
name = "Visual inspection"
"#,
        )
        .expect("should parse");
        assert_eq!(file.plans.len(), 1);
        let entry = &file.plans[0];
        assert_eq!(entry.status, "active");
        assert!(!entry.auto_generate);
        assert_eq!(entry.asset, None);
        assert_eq!(entry.frequency, None);
    }

    #[test]
    fn deserialize_full_entry() {
        let file: PlanFile = toml::from_str(
            r#"
[[plan]]
code = "PM-001"
name = "Compressor oil change"
asset = "CMP-01"
frequency = 30
unit = "days"
next_due = "2025-10-01"
auto_generate = true
technician = 3

[[plan]]
code = "PM-002"
name = "Boiler descaling"
asset = "BLR-01"
status = "inactive"
frequency = 6
unit = "months"
next_due = "2025-11-15T08:00:00+01:00"
"#,
        )
        .expect("should parse");
        assert_eq!(file.plans.len(), 2);
        assert_eq!(file.plans[0].technician, Some(3));
        assert_eq!(file.plans[0].frequency, Some(30));
        assert_eq!(file.plans[1].status, "inactive");
        assert_eq!(file.plans[1].unit.as_deref(), Some("months"));
    }

    #[test]
    fn empty_file_has_no_plans() {
        let file: PlanFile = toml::from_str("").expect("should parse");
        assert!(file.plans.is_empty());
    }
}
