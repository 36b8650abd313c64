//! Domain events returned to callers for the notification collaborator.
//!
//! The engine never delivers these itself; every service call hands them
//! back alongside its result.

use super::{AssignmentRole, DependencyKind, TaskId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Something that happened to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskEvent {
    /// A task was created.
    TaskCreated {
        /// Created task.
        task: TaskId,
        /// Creating user.
        actor: UserId,
    },
    /// Fields of a task changed.
    TaskUpdated {
        /// Updated task.
        task: TaskId,
        /// Acting user.
        actor: UserId,
        /// Names of the changed fields.
        fields: Vec<String>,
    },
    /// A task moved into `done`.
    TaskCompleted {
        /// Completed task.
        task: TaskId,
        /// Completing user.
        completed_by: UserId,
        /// Completion time.
        completed_at: DateTime<Utc>,
    },
    /// Every blocking dependency of a task is now done.
    TaskUnblocked {
        /// Task that is no longer blocked.
        task: TaskId,
        /// Dependency whose completion unblocked it.
        unblocked_by: TaskId,
    },
    /// A dependency edge was added.
    DependencyAdded {
        /// Task that gained the dependency.
        dependent: TaskId,
        /// Task depended upon.
        dependency: TaskId,
        /// Edge classification.
        kind: DependencyKind,
        /// Acting user.
        actor: UserId,
    },
    /// A dependency edge was removed.
    DependencyRemoved {
        /// Task that lost the dependency.
        dependent: TaskId,
        /// Former dependency target.
        dependency: TaskId,
        /// Acting user.
        actor: UserId,
    },
    /// Work was logged against a task.
    TimeLogged {
        /// Task the time was logged against.
        task: TaskId,
        /// User who logged the time.
        logged_by: UserId,
        /// Logged duration in minutes.
        duration_minutes: u64,
        /// Total spent after the log.
        spent_minutes: u64,
        /// Remaining effort after the log.
        remaining_minutes: u64,
    },
    /// A user was assigned to a task.
    TaskAssigned {
        /// Task receiving the assignment.
        task: TaskId,
        /// Assigned user.
        user: UserId,
        /// Assigned role.
        role: AssignmentRole,
        /// Acting user.
        actor: UserId,
    },
    /// A user's assignment was removed.
    TaskUnassigned {
        /// Task losing the assignment.
        task: TaskId,
        /// Unassigned user.
        user: UserId,
        /// Acting user.
        actor: UserId,
    },
    /// A recurring template produced its next occurrence.
    RecurrenceGenerated {
        /// Recurring template.
        template: TaskId,
        /// New occurrence.
        occurrence: TaskId,
        /// Due date of the new occurrence.
        due_date: DateTime<Utc>,
    },
}

impl TaskEvent {
    /// Returns the task the event is primarily about.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        match self {
            Self::TaskCreated { task, .. }
            | Self::TaskUpdated { task, .. }
            | Self::TaskCompleted { task, .. }
            | Self::TaskUnblocked { task, .. }
            | Self::TimeLogged { task, .. }
            | Self::TaskAssigned { task, .. }
            | Self::TaskUnassigned { task, .. } => *task,
            Self::DependencyAdded { dependent, .. } | Self::DependencyRemoved { dependent, .. } => {
                *dependent
            }
            Self::RecurrenceGenerated { template, .. } => *template,
        }
    }

    /// Returns the event type name used on the wire.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::TaskCreated { .. } => "task_created",
            Self::TaskUpdated { .. } => "task_updated",
            Self::TaskCompleted { .. } => "task_completed",
            Self::TaskUnblocked { .. } => "task_unblocked",
            Self::DependencyAdded { .. } => "dependency_added",
            Self::DependencyRemoved { .. } => "dependency_removed",
            Self::TimeLogged { .. } => "time_logged",
            Self::TaskAssigned { .. } => "task_assigned",
            Self::TaskUnassigned { .. } => "task_unassigned",
            Self::RecurrenceGenerated { .. } => "recurrence_generated",
        }
    }

    /// Serialises the event into the JSON payload handed to the
    /// notification subsystem.
    ///
    /// # Errors
    ///
    /// Returns the serialiser error, which cannot occur for well-formed
    /// events but is surfaced rather than unwrapped.
    pub fn to_payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
