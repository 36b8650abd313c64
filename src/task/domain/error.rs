//! Error types for task domain validation and parsing.

use super::{DependencyKind, TaskId, UserId};
use thiserror::Error;

/// Validation failures raised by task domain operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The user reference is empty after trimming.
    #[error("user reference must not be empty")]
    EmptyUserId,

    /// Progress is outside the `0..=100` range.
    #[error("progress {0} is out of range, expected 0 to 100")]
    ProgressOutOfRange(u8),

    /// A done task must report full progress.
    #[error("a done task must have progress 100, got {0}")]
    IncompleteProgressOnDone(u8),

    /// A task cannot depend on itself.
    #[error("task {0} cannot depend on itself")]
    SelfDependency(TaskId),

    /// Adding the edge would close a cycle in the dependency graph.
    #[error("dependency {dependent} -> {dependency} would create a cycle")]
    DependencyCycle {
        /// Task that would gain the dependency.
        dependent: TaskId,
        /// Task that would be depended upon.
        dependency: TaskId,
    },

    /// The dependency edge is already present.
    #[error("task {dependent} already depends on {dependency} ({kind})")]
    DuplicateDependency {
        /// Task that already holds the edge.
        dependent: TaskId,
        /// Existing dependency target.
        dependency: TaskId,
        /// Classification of the existing edge.
        kind: DependencyKind,
    },

    /// A time log carried a negative duration.
    #[error("time log duration must not be negative, got {0} minutes")]
    NegativeDuration(i64),

    /// A time log ends before it starts.
    #[error("time log ends before it starts")]
    InvalidTimeRange,

    /// The custom recurrence pattern could not be parsed.
    #[error("invalid recurrence pattern '{0}', expected every:<n><d|w|m>")]
    InvalidRecurrencePattern(String),

    /// A custom recurrence was configured without a pattern.
    #[error("custom recurrence requires a pattern")]
    MissingRecurrencePattern,

    /// Custom recurrences are disabled by configuration.
    #[error("custom recurrence patterns are disabled")]
    CustomRecurrenceDisabled,

    /// The recurrence window ends before it starts.
    #[error("recurrence window ends before it starts")]
    InvalidRecurrenceWindow,

    /// Cadence arithmetic left the representable date range.
    #[error("next occurrence falls outside the supported date range")]
    RecurrenceOverflow,

    /// The task is already done.
    #[error("task {0} is already completed")]
    TaskAlreadyCompleted(TaskId),

    /// Blocking dependencies must be done before completing the task.
    #[error("task {task} has incomplete blocking dependencies: {pending:?}")]
    BlockingDependenciesIncomplete {
        /// Task being completed.
        task: TaskId,
        /// Blocking dependencies that are not done.
        pending: Vec<TaskId>,
    },

    /// The user already holds an assignment on the task.
    #[error("user {user} is already assigned to task {task}")]
    AlreadyAssigned {
        /// Task carrying the assignment.
        task: TaskId,
        /// Assigned user.
        user: UserId,
    },

    /// The user holds no assignment on the task.
    #[error("user {user} is not assigned to task {task}")]
    NotAssigned {
        /// Task lacking the assignment.
        task: TaskId,
        /// User that was expected to be assigned.
        user: UserId,
    },

    /// The update request carried no field changes.
    #[error("update for task {0} changes nothing")]
    EmptyUpdate(TaskId),

    /// The batch request named no tasks.
    #[error("batch update must name at least one task")]
    EmptyBatch,

    /// The batch request exceeds the configured size limit.
    #[error("batch of {size} tasks exceeds the limit of {limit}")]
    BatchTooLarge {
        /// Requested batch size.
        size: usize,
        /// Configured limit.
        limit: usize,
    },
}

/// Error returned while parsing task statuses from persistence or requests.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);
