//! Materialises the next occurrence of a recurring task.
//!
//! Generation is a pure transformation of a template snapshot. Deciding when
//! to invoke it (timer, completion hook, on demand) is left to the caller.

use super::{
    IntervalPatternEvaluator, PatternEvaluator, Recurrence, RecurrenceFrequency, TaskDomainError,
    TaskRecord, UserId,
};
use chrono::{DateTime, Utc};
use mockable::Clock;

/// Result of a successful generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedOccurrence {
    /// Template snapshot with `last_generated_at` advanced to `due_date`.
    pub template: TaskRecord,
    /// Newly materialised occurrence.
    pub successor: TaskRecord,
    /// Due date of the successor.
    pub due_date: DateTime<Utc>,
}

/// Computes next due dates and builds successor records.
#[derive(Debug, Clone)]
pub struct RecurrenceScheduler<P = IntervalPatternEvaluator> {
    evaluator: P,
    allow_custom: bool,
}

impl Default for RecurrenceScheduler<IntervalPatternEvaluator> {
    fn default() -> Self {
        Self::new(IntervalPatternEvaluator)
    }
}

impl<P> RecurrenceScheduler<P>
where
    P: PatternEvaluator,
{
    /// Creates a scheduler that evaluates custom patterns with `evaluator`.
    #[must_use]
    pub const fn new(evaluator: P) -> Self {
        Self {
            evaluator,
            allow_custom: true,
        }
    }

    /// Enables or disables custom recurrence patterns.
    #[must_use]
    pub const fn with_custom_patterns(mut self, allowed: bool) -> Self {
        self.allow_custom = allowed;
        self
    }

    /// Checks that `recurrence` can be evaluated by this scheduler.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::CustomRecurrenceDisabled`] when custom
    /// patterns are turned off, or the evaluator's validation error.
    pub fn validate(&self, recurrence: &Recurrence) -> Result<(), TaskDomainError> {
        if recurrence.frequency() != RecurrenceFrequency::Custom {
            return Ok(());
        }
        if !self.allow_custom {
            return Err(TaskDomainError::CustomRecurrenceDisabled);
        }
        let pattern = recurrence
            .custom_pattern()
            .ok_or(TaskDomainError::MissingRecurrencePattern)?;
        self.evaluator.validate(pattern)
    }

    /// Computes the next due date of `recurrence`, ignoring its end window.
    ///
    /// # Errors
    ///
    /// Returns a validation error for disabled or malformed custom patterns.
    pub fn next_due_date(
        &self,
        recurrence: &Recurrence,
    ) -> Result<Option<DateTime<Utc>>, TaskDomainError> {
        self.validate(recurrence)?;
        recurrence.next_due_date(&self.evaluator)
    }

    /// Generates the next occurrence of `template`.
    ///
    /// Returns `None` when the template does not recur, or when an end date
    /// is configured and the next due date falls on or after it. Calling this
    /// again with the same snapshot yields the same due date; only the
    /// returned template carries the advanced `last_generated_at`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for disabled or malformed custom patterns.
    pub fn generate_next_occurrence(
        &self,
        template: &TaskRecord,
        actor: &UserId,
        clock: &impl Clock,
    ) -> Result<Option<GeneratedOccurrence>, TaskDomainError> {
        let Some(recurrence) = template.recurrence() else {
            return Ok(None);
        };
        let Some(due_date) = self.next_due_date(recurrence)? else {
            return Ok(None);
        };
        if !recurrence.admits(due_date) {
            return Ok(None);
        }

        let successor = template.successor(due_date, clock);
        let mut advanced = template.clone();
        advanced.record_generation(due_date, successor.id(), actor, clock);
        Ok(Some(GeneratedOccurrence {
            template: advanced,
            successor,
            due_date,
        }))
    }
}
