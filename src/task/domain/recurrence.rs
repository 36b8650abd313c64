//! Recurrence configuration and cadence arithmetic.
//!
//! Built-in frequencies map onto a one-step [`IntervalPattern`]. Custom
//! frequencies delegate to a [`PatternEvaluator`]; the bundled
//! [`IntervalPatternEvaluator`] understands `every:<n><unit>` where `unit` is
//! `d` (days), `w` (weeks) or `m` (calendar months).

use super::TaskDomainError;
use chrono::{DateTime, Months, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How often a recurring task repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceFrequency {
    /// Every day.
    Daily,
    /// Every seven days.
    Weekly,
    /// Every calendar month, clamping the day to the month's last day.
    Monthly,
    /// Driven by a custom pattern.
    Custom,
}

impl RecurrenceFrequency {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Custom => "custom",
        }
    }

    const fn builtin_step(self) -> Option<IntervalPattern> {
        match self {
            Self::Daily => Some(IntervalPattern::new(1, IntervalUnit::Days)),
            Self::Weekly => Some(IntervalPattern::new(1, IntervalUnit::Weeks)),
            Self::Monthly => Some(IntervalPattern::new(1, IntervalUnit::Months)),
            Self::Custom => None,
        }
    }
}

impl fmt::Display for RecurrenceFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unit of an [`IntervalPattern`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalUnit {
    /// Calendar days.
    Days,
    /// Weeks of seven days.
    Weeks,
    /// Calendar months.
    Months,
}

/// A fixed step of `count` units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntervalPattern {
    count: u32,
    unit: IntervalUnit,
}

impl IntervalPattern {
    const PREFIX: &'static str = "every:";

    const fn new(count: u32, unit: IntervalUnit) -> Self {
        Self { count, unit }
    }

    /// Parses `every:<n><d|w|m>`, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidRecurrencePattern`] for anything
    /// else, including a zero count.
    pub fn parse(pattern: &str) -> Result<Self, TaskDomainError> {
        let invalid = || TaskDomainError::InvalidRecurrencePattern(pattern.to_owned());
        let normalized = pattern.trim().to_ascii_lowercase();
        let body = normalized
            .strip_prefix(Self::PREFIX)
            .map(str::trim)
            .ok_or_else(invalid)?;

        let (digits, unit) = if let Some(digits) = body.strip_suffix('d') {
            (digits, IntervalUnit::Days)
        } else if let Some(digits) = body.strip_suffix('w') {
            (digits, IntervalUnit::Weeks)
        } else if let Some(digits) = body.strip_suffix('m') {
            (digits, IntervalUnit::Months)
        } else {
            return Err(invalid());
        };

        if digits.is_empty() || !digits.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(invalid());
        }
        let count: u32 = digits.parse().map_err(|_| invalid())?;
        if count == 0 {
            return Err(invalid());
        }
        Ok(Self::new(count, unit))
    }

    /// Returns the number of units per step.
    #[must_use]
    pub const fn count(self) -> u32 {
        self.count
    }

    /// Returns the step unit.
    #[must_use]
    pub const fn unit(self) -> IntervalUnit {
        self.unit
    }

    /// Advances `from` by one step.
    ///
    /// Month steps keep the day of month when the target month has it and
    /// otherwise clamp to the target month's last day.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::RecurrenceOverflow`] when the result is not
    /// representable.
    pub fn advance(self, from: DateTime<Utc>) -> Result<DateTime<Utc>, TaskDomainError> {
        let count = i64::from(self.count);
        let next = match self.unit {
            IntervalUnit::Days => {
                TimeDelta::try_days(count).and_then(|delta| from.checked_add_signed(delta))
            }
            IntervalUnit::Weeks => {
                TimeDelta::try_weeks(count).and_then(|delta| from.checked_add_signed(delta))
            }
            IntervalUnit::Months => from.checked_add_months(Months::new(self.count)),
        };
        next.ok_or(TaskDomainError::RecurrenceOverflow)
    }
}

impl FromStr for IntervalPattern {
    type Err = TaskDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for IntervalPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.unit {
            IntervalUnit::Days => 'd',
            IntervalUnit::Weeks => 'w',
            IntervalUnit::Months => 'm',
        };
        write!(f, "{}{}{unit}", Self::PREFIX, self.count)
    }
}

/// Evaluates custom recurrence patterns.
pub trait PatternEvaluator: Send + Sync {
    /// Checks that `pattern` is understood by this evaluator.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidRecurrencePattern`] when it is not.
    fn validate(&self, pattern: &str) -> Result<(), TaskDomainError>;

    /// Computes the first occurrence strictly after `after`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed patterns or unrepresentable
    /// dates.
    fn next_after(
        &self,
        pattern: &str,
        after: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, TaskDomainError>;
}

/// Default evaluator for `every:<n><d|w|m>` patterns.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntervalPatternEvaluator;

impl PatternEvaluator for IntervalPatternEvaluator {
    fn validate(&self, pattern: &str) -> Result<(), TaskDomainError> {
        IntervalPattern::parse(pattern).map(|_| ())
    }

    fn next_after(
        &self,
        pattern: &str,
        after: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, TaskDomainError> {
        IntervalPattern::parse(pattern)?.advance(after)
    }
}

/// Parameter object for [`Recurrence::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceParams {
    /// Cadence of the series.
    pub frequency: RecurrenceFrequency,
    /// Pattern for [`RecurrenceFrequency::Custom`]; ignored otherwise.
    pub custom_pattern: Option<String>,
    /// Start of the recurrence window and base of the first occurrence.
    pub start_date: DateTime<Utc>,
    /// Exclusive end of the recurrence window.
    pub end_date: Option<DateTime<Utc>>,
}

/// Recurrence block carried by a recurring task template.
///
/// Deserialisation applies the same checks as [`Recurrence::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RecurrenceDe")]
pub struct Recurrence {
    is_recurring: bool,
    frequency: RecurrenceFrequency,
    custom_pattern: Option<String>,
    start_date: DateTime<Utc>,
    end_date: Option<DateTime<Utc>>,
    last_generated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct RecurrenceDe {
    is_recurring: bool,
    frequency: RecurrenceFrequency,
    custom_pattern: Option<String>,
    start_date: DateTime<Utc>,
    end_date: Option<DateTime<Utc>>,
    last_generated_at: Option<DateTime<Utc>>,
}

impl TryFrom<RecurrenceDe> for Recurrence {
    type Error = TaskDomainError;

    fn try_from(value: RecurrenceDe) -> Result<Self, Self::Error> {
        let recurrence = Self::new(RecurrenceParams {
            frequency: value.frequency,
            custom_pattern: value.custom_pattern,
            start_date: value.start_date,
            end_date: value.end_date,
        })?;
        Ok(Self {
            is_recurring: value.is_recurring,
            last_generated_at: value.last_generated_at,
            ..recurrence
        })
    }
}

impl Recurrence {
    /// Creates an active recurrence that has not generated anything yet.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidRecurrenceWindow`] when `end_date`
    /// precedes `start_date`, or
    /// [`TaskDomainError::MissingRecurrencePattern`] for a custom frequency
    /// without a non-blank pattern.
    pub fn new(params: RecurrenceParams) -> Result<Self, TaskDomainError> {
        if params
            .end_date
            .is_some_and(|end_date| end_date < params.start_date)
        {
            return Err(TaskDomainError::InvalidRecurrenceWindow);
        }

        let custom_pattern = match params.frequency {
            RecurrenceFrequency::Custom => {
                let pattern = params
                    .custom_pattern
                    .map(|pattern| pattern.trim().to_owned())
                    .filter(|pattern| !pattern.is_empty())
                    .ok_or(TaskDomainError::MissingRecurrencePattern)?;
                Some(pattern)
            }
            _ => None,
        };

        Ok(Self {
            is_recurring: true,
            frequency: params.frequency,
            custom_pattern,
            start_date: params.start_date,
            end_date: params.end_date,
            last_generated_at: None,
        })
    }

    /// Returns a copy with `last_generated_at` set, as loaded from storage.
    #[must_use]
    pub const fn with_last_generated_at(mut self, last_generated_at: DateTime<Utc>) -> Self {
        self.last_generated_at = Some(last_generated_at);
        self
    }

    /// Returns a copy that no longer produces occurrences.
    #[must_use]
    pub const fn stopped(mut self) -> Self {
        self.is_recurring = false;
        self
    }

    /// Returns whether the series is active.
    #[must_use]
    pub const fn is_recurring(&self) -> bool {
        self.is_recurring
    }

    /// Returns the cadence.
    #[must_use]
    pub const fn frequency(&self) -> RecurrenceFrequency {
        self.frequency
    }

    /// Returns the custom pattern, if any.
    #[must_use]
    pub fn custom_pattern(&self) -> Option<&str> {
        self.custom_pattern.as_deref()
    }

    /// Returns the start of the recurrence window.
    #[must_use]
    pub const fn start_date(&self) -> DateTime<Utc> {
        self.start_date
    }

    /// Returns the exclusive end of the recurrence window, if any.
    #[must_use]
    pub const fn end_date(&self) -> Option<DateTime<Utc>> {
        self.end_date
    }

    /// Returns the due date of the most recently generated occurrence.
    #[must_use]
    pub const fn last_generated_at(&self) -> Option<DateTime<Utc>> {
        self.last_generated_at
    }

    /// Computes the next due date.
    ///
    /// The base instant is `last_generated_at`, falling back to
    /// `start_date` before anything has been generated. Returns `None` when
    /// the series is inactive. The end window is not applied here; see
    /// [`Recurrence::admits`].
    ///
    /// # Errors
    ///
    /// Propagates pattern and overflow errors.
    pub fn next_due_date(
        &self,
        evaluator: &impl PatternEvaluator,
    ) -> Result<Option<DateTime<Utc>>, TaskDomainError> {
        if !self.is_recurring {
            return Ok(None);
        }
        let base = self.last_generated_at.unwrap_or(self.start_date);
        let next = match self.frequency.builtin_step() {
            Some(step) => step.advance(base)?,
            None => {
                let pattern = self
                    .custom_pattern
                    .as_deref()
                    .ok_or(TaskDomainError::MissingRecurrencePattern)?;
                evaluator.next_after(pattern, base)?
            }
        };
        Ok(Some(next))
    }

    /// Returns `false` when `due` falls on or after the configured end date.
    #[must_use]
    pub fn admits(&self, due: DateTime<Utc>) -> bool {
        self.end_date.is_none_or(|end_date| due < end_date)
    }

    pub(crate) const fn mark_generated(&mut self, due: DateTime<Utc>) {
        self.last_generated_at = Some(due);
    }
}
