//! Recurrence intervals and the calendar arithmetic used to reschedule a
//! plan after an order is generated.

use std::fmt;

use chrono::{DateTime, Days, Months, TimeZone};
use serde::Serialize;

use gmao_db::models::FrequencyUnit;

/// A positive recurrence interval such as "30 days" or "6 months".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Frequency {
    value: u32,
    unit: FrequencyUnit,
}

impl Frequency {
    /// Returns `None` unless `value` is strictly positive.
    pub fn new(value: i32, unit: FrequencyUnit) -> Option<Self> {
        let value = u32::try_from(value).ok().filter(|v| *v > 0)?;
        Some(Self { value, unit })
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn unit(&self) -> FrequencyUnit {
        self.unit
    }

    /// Add one interval to `from`, keeping its offset.
    ///
    /// Month and year steps clamp to the last day of the target month
    /// (Jan 31 + 1 month = Feb 28/29). Returns `None` on overflow.
    pub fn advance<Tz: TimeZone>(&self, from: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        let from = from.clone();
        let value = u64::from(self.value);
        match self.unit {
            FrequencyUnit::Days => from.checked_add_days(Days::new(value)),
            FrequencyUnit::Weeks => from.checked_add_days(Days::new(value.checked_mul(7)?)),
            FrequencyUnit::Months => from.checked_add_months(Months::new(self.value)),
            FrequencyUnit::Years => {
                from.checked_add_months(Months::new(self.value.checked_mul(12)?))
            }
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}
