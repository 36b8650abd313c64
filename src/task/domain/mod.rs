//! Domain model for the task lifecycle engine.
//!
//! Tasks are handled as snapshots: operations take a record, compute the next
//! state and hand back a replacement. Nothing here touches storage or reads
//! the system clock directly.

mod audit;
mod dependency;
mod error;
mod events;
mod ids;
mod recurrence;
mod scheduler;
mod status;
mod task;
mod time_tracking;
mod update;

pub use audit::{AuditTrail, ChangeSet, HistoryEntry, describe_optional_date};
pub use dependency::{
    CycleSearch, DependencyGraph, DependencyKind, SearchStep, TaskDependency, would_create_cycle,
};
pub use error::{ParseTaskStatusError, TaskDomainError};
pub use events::TaskEvent;
pub use ids::{TaskId, UserId};
pub use recurrence::{
    IntervalPattern, IntervalPatternEvaluator, IntervalUnit, PatternEvaluator, Recurrence,
    RecurrenceFrequency, RecurrenceParams,
};
pub use scheduler::{GeneratedOccurrence, RecurrenceScheduler};
pub use status::{TaskPriority, TaskStatus};
pub use task::{
    Assignment, AssignmentRole, Completion, NewTask, PersistedTaskData, TaskComment, TaskRecord,
};
pub use time_tracking::{TimeLogEntry, TimeLogParams, TimeTracking};
pub use update::TaskUpdate;
