//! Time tracking against an estimate.
//!
//! All quantities are whole minutes. `remaining` is derived as
//! `max(0, estimated - spent)` after every change, so overruns are recorded
//! but never produce negative remaining effort.

use super::{TaskDomainError, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single unit of logged work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TimeLogEntryDe")]
pub struct TimeLogEntry {
    duration_minutes: u64,
    description: String,
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
    logged_by: UserId,
}

#[derive(Debug, Deserialize)]
struct TimeLogEntryDe {
    duration_minutes: u64,
    description: String,
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
    logged_by: UserId,
}

impl TryFrom<TimeLogEntryDe> for TimeLogEntry {
    type Error = TaskDomainError;

    fn try_from(value: TimeLogEntryDe) -> Result<Self, Self::Error> {
        if value.ended_at < value.started_at {
            return Err(TaskDomainError::InvalidTimeRange);
        }
        Ok(Self {
            duration_minutes: value.duration_minutes,
            description: value.description,
            started_at: value.started_at,
            ended_at: value.ended_at,
            logged_by: value.logged_by,
        })
    }
}

/// Parameter object for [`TimeLogEntry::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeLogParams {
    /// Signed duration in minutes as received from the caller.
    pub duration_minutes: i64,
    /// What the time was spent on.
    pub description: String,
    /// Start of the logged interval.
    pub started_at: DateTime<Utc>,
    /// End of the logged interval.
    pub ended_at: DateTime<Utc>,
    /// User who performed the work.
    pub logged_by: UserId,
}

impl TimeLogEntry {
    /// Creates a validated log entry.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::NegativeDuration`] when the duration is
    /// below zero, or [`TaskDomainError::InvalidTimeRange`] when `ended_at`
    /// precedes `started_at`.
    pub fn new(params: TimeLogParams) -> Result<Self, TaskDomainError> {
        let duration_minutes = u64::try_from(params.duration_minutes)
            .map_err(|_| TaskDomainError::NegativeDuration(params.duration_minutes))?;
        if params.ended_at < params.started_at {
            return Err(TaskDomainError::InvalidTimeRange);
        }
        Ok(Self {
            duration_minutes,
            description: params.description,
            started_at: params.started_at,
            ended_at: params.ended_at,
            logged_by: params.logged_by,
        })
    }

    /// Returns the logged duration in minutes.
    #[must_use]
    pub const fn duration_minutes(&self) -> u64 {
        self.duration_minutes
    }

    /// Returns the work description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the start of the logged interval.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Returns the end of the logged interval.
    #[must_use]
    pub const fn ended_at(&self) -> DateTime<Utc> {
        self.ended_at
    }

    /// Returns the user who logged the work.
    #[must_use]
    pub const fn logged_by(&self) -> &UserId {
        &self.logged_by
    }
}

/// Estimate, spent and remaining effort plus the ordered work log.
///
/// Only the estimate and the logs are read back when deserialising; the
/// totals are recomputed from them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TimeTrackingDe")]
pub struct TimeTracking {
    estimated_minutes: u64,
    spent_minutes: u64,
    remaining_minutes: u64,
    logs: Vec<TimeLogEntry>,
}

#[derive(Debug, Deserialize)]
struct TimeTrackingDe {
    estimated_minutes: u64,
    #[serde(default)]
    logs: Vec<TimeLogEntry>,
}

impl From<TimeTrackingDe> for TimeTracking {
    fn from(value: TimeTrackingDe) -> Self {
        Self::from_persisted(value.estimated_minutes, value.logs)
    }
}

impl TimeTracking {
    /// Creates a fresh block with nothing spent.
    #[must_use]
    pub const fn initialize(estimated_minutes: u64) -> Self {
        Self {
            estimated_minutes,
            spent_minutes: 0,
            remaining_minutes: estimated_minutes,
            logs: Vec::new(),
        }
    }

    /// Reconstructs a block from persisted logs; `spent` is summed from the
    /// logs and `remaining` is recomputed.
    #[must_use]
    pub fn from_persisted(estimated_minutes: u64, logs: Vec<TimeLogEntry>) -> Self {
        let spent_minutes = logs
            .iter()
            .fold(0_u64, |total, entry| total.saturating_add(entry.duration_minutes));
        Self {
            estimated_minutes,
            spent_minutes,
            remaining_minutes: estimated_minutes.saturating_sub(spent_minutes),
            logs,
        }
    }

    /// Appends `entry` and updates `spent` and `remaining`.
    pub fn log(&mut self, entry: TimeLogEntry) {
        self.spent_minutes = self.spent_minutes.saturating_add(entry.duration_minutes);
        self.logs.push(entry);
        self.recompute_remaining();
    }

    /// Replaces the estimate and recomputes `remaining`.
    pub fn re_estimate(&mut self, estimated_minutes: u64) {
        self.estimated_minutes = estimated_minutes;
        self.recompute_remaining();
    }

    /// Returns the estimate in minutes.
    #[must_use]
    pub const fn estimated_minutes(&self) -> u64 {
        self.estimated_minutes
    }

    /// Returns the total logged minutes.
    #[must_use]
    pub const fn spent_minutes(&self) -> u64 {
        self.spent_minutes
    }

    /// Returns the remaining minutes, floored at zero.
    #[must_use]
    pub const fn remaining_minutes(&self) -> u64 {
        self.remaining_minutes
    }

    /// Returns `true` when more time was logged than estimated.
    #[must_use]
    pub const fn is_over_estimate(&self) -> bool {
        self.spent_minutes > self.estimated_minutes
    }

    /// Returns the work log in insertion order.
    #[must_use]
    pub fn logs(&self) -> &[TimeLogEntry] {
        &self.logs
    }

    const fn recompute_remaining(&mut self) {
        self.remaining_minutes = self.estimated_minutes.saturating_sub(self.spent_minutes);
    }
}
