//! Request payloads accepted by the task lifecycle service.
//!
//! Actor and user references arrive as raw strings from the transport layer
//! and are validated by the service.

use crate::task::domain::{
    AssignmentRole, DependencyKind, RecurrenceFrequency, RecurrenceParams, TaskId, TaskPriority,
    TaskStatus, TaskUpdate,
};
use chrono::{DateTime, Utc};

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    pub(crate) title: String,
    pub(crate) creator: String,
    pub(crate) description: Option<String>,
    pub(crate) status: TaskStatus,
    pub(crate) priority: TaskPriority,
    pub(crate) due_date: Option<DateTime<Utc>>,
    pub(crate) estimated_minutes: Option<u64>,
}

impl CreateTaskRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(title: impl Into<String>, creator: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            creator: creator.into(),
            description: None,
            status: TaskStatus::default(),
            priority: TaskPriority::default(),
            due_date: None,
            estimated_minutes: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the initial status.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the due date.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Sets the estimate, initialising time tracking.
    #[must_use]
    pub const fn with_estimate(mut self, estimated_minutes: u64) -> Self {
        self.estimated_minutes = Some(estimated_minutes);
        self
    }
}

/// Request payload for updating fields of one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTaskRequest {
    pub(crate) task_id: TaskId,
    pub(crate) actor: String,
    pub(crate) update: TaskUpdate,
}

impl UpdateTaskRequest {
    /// Creates an update request.
    #[must_use]
    pub fn new(task_id: TaskId, actor: impl Into<String>, update: TaskUpdate) -> Self {
        Self {
            task_id,
            actor: actor.into(),
            update,
        }
    }
}

/// Request payload for completing a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteTaskRequest {
    pub(crate) task_id: TaskId,
    pub(crate) actor: String,
    pub(crate) note: Option<String>,
}

impl CompleteTaskRequest {
    /// Creates a completion request.
    #[must_use]
    pub fn new(task_id: TaskId, actor: impl Into<String>) -> Self {
        Self {
            task_id,
            actor: actor.into(),
            note: None,
        }
    }

    /// Attaches a completion note.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Request payload for adding a dependency edge `dependent → dependency`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddDependencyRequest {
    pub(crate) dependent: TaskId,
    pub(crate) dependency: TaskId,
    pub(crate) kind: DependencyKind,
    pub(crate) actor: String,
}

impl AddDependencyRequest {
    /// Creates a request for a [`DependencyKind::Blocks`] edge.
    #[must_use]
    pub fn new(dependent: TaskId, dependency: TaskId, actor: impl Into<String>) -> Self {
        Self {
            dependent,
            dependency,
            kind: DependencyKind::default(),
            actor: actor.into(),
        }
    }

    /// Sets the edge classification.
    #[must_use]
    pub const fn with_kind(mut self, kind: DependencyKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Request payload for removing a dependency edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveDependencyRequest {
    pub(crate) dependent: TaskId,
    pub(crate) dependency: TaskId,
    pub(crate) actor: String,
}

impl RemoveDependencyRequest {
    /// Creates a removal request.
    #[must_use]
    pub fn new(dependent: TaskId, dependency: TaskId, actor: impl Into<String>) -> Self {
        Self {
            dependent,
            dependency,
            actor: actor.into(),
        }
    }
}

/// Request payload for setting a task estimate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EstimateTimeRequest {
    pub(crate) task_id: TaskId,
    pub(crate) actor: String,
    pub(crate) estimated_minutes: u64,
}

impl EstimateTimeRequest {
    /// Creates an estimate request.
    #[must_use]
    pub fn new(task_id: TaskId, actor: impl Into<String>, estimated_minutes: u64) -> Self {
        Self {
            task_id,
            actor: actor.into(),
            estimated_minutes,
        }
    }
}

/// Request payload for logging work against a task.
///
/// Without an explicit interval the work is assumed to have ended at the
/// service clock's current time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTimeRequest {
    pub(crate) task_id: TaskId,
    pub(crate) logged_by: String,
    pub(crate) duration_minutes: i64,
    pub(crate) description: String,
    pub(crate) interval: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl LogTimeRequest {
    /// Creates a log request.
    #[must_use]
    pub fn new(
        task_id: TaskId,
        logged_by: impl Into<String>,
        duration_minutes: i64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            task_id,
            logged_by: logged_by.into(),
            duration_minutes,
            description: description.into(),
            interval: None,
        }
    }

    /// Sets the start and end of the logged interval.
    #[must_use]
    pub const fn with_interval(mut self, started_at: DateTime<Utc>, ended_at: DateTime<Utc>) -> Self {
        self.interval = Some((started_at, ended_at));
        self
    }
}

/// Request payload for assigning a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignUserRequest {
    pub(crate) task_id: TaskId,
    pub(crate) user: String,
    pub(crate) role: AssignmentRole,
    pub(crate) actor: String,
}

impl AssignUserRequest {
    /// Creates an assignment request with the [`AssignmentRole::Assignee`]
    /// role.
    #[must_use]
    pub fn new(task_id: TaskId, user: impl Into<String>, actor: impl Into<String>) -> Self {
        Self {
            task_id,
            user: user.into(),
            role: AssignmentRole::default(),
            actor: actor.into(),
        }
    }

    /// Sets the role.
    #[must_use]
    pub const fn with_role(mut self, role: AssignmentRole) -> Self {
        self.role = role;
        self
    }
}

/// Request payload for removing an assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnassignUserRequest {
    pub(crate) task_id: TaskId,
    pub(crate) user: String,
    pub(crate) actor: String,
}

impl UnassignUserRequest {
    /// Creates an unassignment request.
    #[must_use]
    pub fn new(task_id: TaskId, user: impl Into<String>, actor: impl Into<String>) -> Self {
        Self {
            task_id,
            user: user.into(),
            actor: actor.into(),
        }
    }
}

/// Request payload for configuring or clearing recurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigureRecurrenceRequest {
    pub(crate) task_id: TaskId,
    pub(crate) actor: String,
    pub(crate) recurrence: Option<RecurrenceParams>,
}

impl ConfigureRecurrenceRequest {
    /// Creates a request making the task recur from `start_date`.
    #[must_use]
    pub fn new(
        task_id: TaskId,
        actor: impl Into<String>,
        frequency: RecurrenceFrequency,
        start_date: DateTime<Utc>,
    ) -> Self {
        Self {
            task_id,
            actor: actor.into(),
            recurrence: Some(RecurrenceParams {
                frequency,
                custom_pattern: None,
                start_date,
                end_date: None,
            }),
        }
    }

    /// Creates a request removing the recurrence block.
    #[must_use]
    pub fn clear(task_id: TaskId, actor: impl Into<String>) -> Self {
        Self {
            task_id,
            actor: actor.into(),
            recurrence: None,
        }
    }

    /// Sets the custom pattern.
    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        if let Some(params) = &mut self.recurrence {
            params.custom_pattern = Some(pattern.into());
        }
        self
    }

    /// Sets the exclusive end of the recurrence window.
    #[must_use]
    pub fn with_end_date(mut self, end_date: DateTime<Utc>) -> Self {
        if let Some(params) = &mut self.recurrence {
            params.end_date = Some(end_date);
        }
        self
    }
}

/// Request payload for generating the next occurrence of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOccurrenceRequest {
    pub(crate) template_id: TaskId,
    pub(crate) actor: String,
}

impl GenerateOccurrenceRequest {
    /// Creates a generation request.
    #[must_use]
    pub fn new(template_id: TaskId, actor: impl Into<String>) -> Self {
        Self {
            template_id,
            actor: actor.into(),
        }
    }
}

/// Request payload for applying one update to many tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchUpdateRequest {
    pub(crate) task_ids: Vec<TaskId>,
    pub(crate) actor: String,
    pub(crate) update: TaskUpdate,
}

impl BatchUpdateRequest {
    /// Creates a batch request. Repeated identifiers are applied once.
    #[must_use]
    pub fn new(
        task_ids: impl IntoIterator<Item = TaskId>,
        actor: impl Into<String>,
        update: TaskUpdate,
    ) -> Self {
        Self {
            task_ids: task_ids.into_iter().collect(),
            actor: actor.into(),
            update,
        }
    }
}
