//! Due dates and the overdue half of the lock rule.

use super::TaskDomainError;
use chrono::{
    DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc,
};
use serde::{Deserialize, Serialize};

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];
const TIME_FORMATS: [&str; 2] = ["%H:%M:%S", "%H:%M"];

/// How naive due dates are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockPolicy {
    default_due_time: NaiveTime,
    offset: FixedOffset,
}

impl LockPolicy {
    /// Creates a policy from the end-of-day default and the zone offset
    /// naive due values are read in.
    #[must_use]
    pub const fn new(default_due_time: NaiveTime, offset: FixedOffset) -> Self {
        Self {
            default_due_time,
            offset,
        }
    }

    /// Returns the time of day used when a task has no due time.
    #[must_use]
    pub const fn default_due_time(&self) -> NaiveTime {
        self.default_due_time
    }

    /// Returns the offset applied to naive due values.
    #[must_use]
    pub const fn offset(&self) -> FixedOffset {
        self.offset
    }
}

impl Default for LockPolicy {
    fn default() -> Self {
        Self {
            default_due_time: NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN),
            offset: Utc.fix(),
        }
    }
}

/// Raw due date and time as entered for a task.
///
/// Values are kept verbatim and parsed on every read so that malformed
/// input keeps locking the task instead of being silently dropped.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DueSchedule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    due_time: Option<String>,
}

impl DueSchedule {
    /// A schedule with no deadline.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            due_date: None,
            due_time: None,
        }
    }

    /// Creates a schedule from raw date and optional time strings.
    #[must_use]
    pub fn new(due_date: impl Into<String>, due_time: Option<String>) -> Self {
        Self {
            due_date: Some(due_date.into()).filter(|date| !date.trim().is_empty()),
            due_time: due_time.filter(|time| !time.trim().is_empty()),
        }
    }

    /// Returns the raw due date.
    #[must_use]
    pub fn due_date(&self) -> Option<&str> {
        self.due_date.as_deref()
    }

    /// Returns the raw due time.
    #[must_use]
    pub fn due_time(&self) -> Option<&str> {
        self.due_time.as_deref()
    }

    /// Resolves the deadline instant.
    ///
    /// Returns `Ok(None)` when no due date is set.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTimeOfDay`] when the date or time
    /// cannot be parsed.
    pub fn deadline(&self, policy: &LockPolicy) -> Result<Option<DateTime<Utc>>, TaskDomainError> {
        let Some(raw_date) = self.due_date.as_deref() else {
            return Ok(None);
        };
        let date = parse_date(raw_date)?;
        let time = match self.due_time.as_deref() {
            Some(raw_time) => parse_time_of_day(raw_time)?,
            None => policy.default_due_time,
        };
        policy
            .offset
            .from_local_datetime(&NaiveDateTime::new(date, time))
            .single()
            .map(|local| Some(local.with_timezone(&Utc)))
            .ok_or_else(|| TaskDomainError::InvalidTimeOfDay(raw_date.to_owned()))
    }

    /// Returns `true` when `now` is past the deadline.
    ///
    /// A deadline that fails to parse counts as passed.
    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>, policy: &LockPolicy) -> bool {
        match self.deadline(policy) {
            Ok(Some(deadline)) => now > deadline,
            Ok(None) => false,
            Err(_) => true,
        }
    }
}

/// Parses a time of day in `HH:MM:SS` or `HH:MM` form.
///
/// # Errors
///
/// Returns [`TaskDomainError::InvalidTimeOfDay`] when neither form matches.
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime, TaskDomainError> {
    let trimmed = value.trim();
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| TaskDomainError::InvalidTimeOfDay(value.to_owned()))
}

fn parse_date(value: &str) -> Result<NaiveDate, TaskDomainError> {
    let trimmed = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| TaskDomainError::InvalidTimeOfDay(value.to_owned()))
}
