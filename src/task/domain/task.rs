//! Task aggregate root and its value types.
//!
//! Every mutating method appends exactly one entry to the task's
//! [`AuditTrail`] and refreshes `updated_at`; a method that fails leaves the
//! record untouched.

use super::{
    AuditTrail, ChangeSet, DependencyKind, Recurrence, TaskDependency, TaskDomainError, TaskId,
    TaskPriority, TaskStatus, TaskUpdate, TimeLogEntry, TimeTracking, UserId,
    audit::describe_optional_date,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role a user plays on a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentRole {
    /// Responsible for doing the work.
    #[default]
    Assignee,
    /// Reviews the work.
    Reviewer,
    /// Follows progress.
    Watcher,
}

impl AssignmentRole {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Assignee => "assignee",
            Self::Reviewer => "reviewer",
            Self::Watcher => "watcher",
        }
    }
}

impl fmt::Display for AssignmentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user assigned to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Assigned user.
    pub user: UserId,
    /// Role on the task.
    pub role: AssignmentRole,
    /// When the assignment was made.
    pub assigned_at: DateTime<Utc>,
}

/// Free-form comment attached to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskComment {
    /// Comment author.
    pub author: UserId,
    /// Comment text.
    pub body: String,
    /// When the comment was written.
    pub created_at: DateTime<Utc>,
}

/// Completion metadata recorded when a task moves into `done`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    /// When the task was completed.
    pub completed_at: DateTime<Utc>,
    /// Who completed the task.
    pub completed_by: UserId,
    /// Optional completion note.
    pub notes: Option<String>,
}

/// Parameter object for [`TaskRecord::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// Task title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Initial status.
    pub status: TaskStatus,
    /// Priority.
    pub priority: TaskPriority,
    /// Optional due date.
    pub due_date: Option<DateTime<Utc>>,
    /// Creating user.
    pub creator: UserId,
    /// Optional estimate, initialising time tracking when present.
    pub estimated_minutes: Option<u64>,
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    id: TaskId,
    title: String,
    description: Option<String>,
    status: TaskStatus,
    priority: TaskPriority,
    progress: u8,
    due_date: Option<DateTime<Utc>>,
    creator: UserId,
    assignees: Vec<Assignment>,
    dependencies: Vec<TaskDependency>,
    time_tracking: Option<TimeTracking>,
    recurrence: Option<Recurrence>,
    history: AuditTrail,
    comments: Vec<TaskComment>,
    completion: Option<Completion>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    revision: u64,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted title.
    pub title: String,
    /// Persisted description.
    pub description: Option<String>,
    /// Persisted status.
    pub status: TaskStatus,
    /// Persisted priority.
    pub priority: TaskPriority,
    /// Persisted progress percentage.
    pub progress: u8,
    /// Persisted due date.
    pub due_date: Option<DateTime<Utc>>,
    /// Persisted creator.
    pub creator: UserId,
    /// Persisted assignments.
    pub assignees: Vec<Assignment>,
    /// Persisted dependency edges.
    pub dependencies: Vec<TaskDependency>,
    /// Persisted time tracking block.
    pub time_tracking: Option<TimeTracking>,
    /// Persisted recurrence block.
    pub recurrence: Option<Recurrence>,
    /// Persisted audit trail.
    pub history: AuditTrail,
    /// Persisted comments.
    pub comments: Vec<TaskComment>,
    /// Persisted completion metadata.
    pub completion: Option<Completion>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest mutation timestamp.
    pub updated_at: DateTime<Utc>,
    /// Persisted revision.
    pub revision: u64,
}

impl TaskRecord {
    /// Creates a task with no dependencies and no recurrence. The history
    /// starts with a single creation entry; a task created as `done` is
    /// completed by its creator.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] when the title is blank.
    pub fn new(params: NewTask, clock: &impl Clock) -> Result<Self, TaskDomainError> {
        let title = normalize_title(&params.title)?;
        let timestamp = clock.utc();
        let mut history = AuditTrail::new();
        history.record(params.creator.clone(), "task created", clock);
        let mut task = Self {
            id: TaskId::new(),
            title,
            description: params.description,
            status: params.status,
            priority: params.priority,
            progress: 0,
            due_date: params.due_date,
            creator: params.creator,
            assignees: Vec::new(),
            dependencies: Vec::new(),
            time_tracking: params.estimated_minutes.map(TimeTracking::initialize),
            recurrence: None,
            history,
            comments: Vec::new(),
            completion: None,
            created_at: timestamp,
            updated_at: timestamp,
            revision: 0,
        };
        if task.status.is_done() {
            let creator = task.creator.clone();
            task.mark_completed(&creator, None, clock);
        }
        Ok(task)
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            description: data.description,
            status: data.status,
            priority: data.priority,
            progress: data.progress,
            due_date: data.due_date,
            creator: data.creator,
            assignees: data.assignees,
            dependencies: data.dependencies,
            time_tracking: data.time_tracking,
            recurrence: data.recurrence,
            history: data.history,
            comments: data.comments,
            completion: data.completion,
            created_at: data.created_at,
            updated_at: data.updated_at,
            revision: data.revision,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> TaskPriority {
        self.priority
    }

    /// Returns the progress percentage.
    #[must_use]
    pub const fn progress(&self) -> u8 {
        self.progress
    }

    /// Returns the due date, if any.
    #[must_use]
    pub const fn due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }

    /// Returns the creating user.
    #[must_use]
    pub const fn creator(&self) -> &UserId {
        &self.creator
    }

    /// Returns the assignments.
    #[must_use]
    pub fn assignees(&self) -> &[Assignment] {
        &self.assignees
    }

    /// Returns the outgoing dependency edges in insertion order.
    #[must_use]
    pub fn dependencies(&self) -> &[TaskDependency] {
        &self.dependencies
    }

    /// Returns the dependency targets in insertion order.
    #[must_use]
    pub fn dependency_ids(&self) -> Vec<TaskId> {
        self.dependencies.iter().map(|edge| edge.task).collect()
    }

    /// Returns `true` when the task has an edge to `task`.
    #[must_use]
    pub fn depends_on(&self, task: TaskId) -> bool {
        self.dependencies.iter().any(|edge| edge.task == task)
    }

    /// Returns the time tracking block, if initialised.
    #[must_use]
    pub const fn time_tracking(&self) -> Option<&TimeTracking> {
        self.time_tracking.as_ref()
    }

    /// Returns the recurrence block, if configured.
    #[must_use]
    pub const fn recurrence(&self) -> Option<&Recurrence> {
        self.recurrence.as_ref()
    }

    /// Returns the audit trail.
    #[must_use]
    pub const fn history(&self) -> &AuditTrail {
        &self.history
    }

    /// Returns the comments.
    #[must_use]
    pub fn comments(&self) -> &[TaskComment] {
        &self.comments
    }

    /// Returns completion metadata, if the task was ever completed.
    #[must_use]
    pub const fn completion(&self) -> Option<&Completion> {
        self.completion.as_ref()
    }

    /// Returns the completion timestamp, if any.
    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completion.as_ref().map(|completion| completion.completed_at)
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest mutation timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the optimistic concurrency revision.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Applies a sparse field update.
    ///
    /// Moving into [`TaskStatus::Done`] records completion metadata and sets
    /// progress to 100. Returns the change set that was recorded.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyUpdate`] when nothing would change,
    /// [`TaskDomainError::EmptyTitle`], [`TaskDomainError::ProgressOutOfRange`]
    /// or [`TaskDomainError::IncompleteProgressOnDone`] for invalid values.
    pub fn apply_update(
        &mut self,
        update: &TaskUpdate,
        actor: &UserId,
        clock: &impl Clock,
    ) -> Result<ChangeSet, TaskDomainError> {
        let mut next = self.clone();
        let mut changes = ChangeSet::new();

        if let Some(title) = &update.title {
            let normalized = normalize_title(title)?;
            changes.track("title", next.title.as_str(), normalized.as_str());
            next.title = normalized;
        }
        if let Some(description) = &update.description {
            if next.description != *description {
                changes.note("description", "description updated");
                next.description.clone_from(description);
            }
        }
        if let Some(priority) = update.priority {
            changes.track("priority", &next.priority, &priority);
            next.priority = priority;
        }
        if let Some(due_date) = update.due_date {
            changes.track(
                "due_date",
                &describe_optional_date(next.due_date),
                &describe_optional_date(due_date),
            );
            next.due_date = due_date;
        }
        if let Some(progress) = update.progress {
            validate_progress(progress)?;
            changes.track("progress", &next.progress, &progress);
            next.progress = progress;
        }
        if let Some(status) = update.status {
            if status.is_done() && !next.status.is_done() {
                if update.progress.is_some_and(|progress| progress != 100) {
                    return Err(TaskDomainError::IncompleteProgressOnDone(next.progress));
                }
                changes.track("progress", &next.progress, &100);
                next.mark_completed(actor, None, clock);
            }
            changes.track("status", &self.status, &status);
            next.status = status;
        }
        if next.status.is_done() && next.progress != 100 {
            return Err(TaskDomainError::IncompleteProgressOnDone(next.progress));
        }
        if changes.is_empty() {
            return Err(TaskDomainError::EmptyUpdate(self.id));
        }

        next.commit(actor, changes.describe(), clock);
        *self = next;
        Ok(changes)
    }

    /// Marks the task as done.
    ///
    /// Sets completion metadata and full progress. A note is stored as a
    /// [`TaskComment`], not as history.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::TaskAlreadyCompleted`] when the task is
    /// already done.
    pub fn complete(
        &mut self,
        actor: &UserId,
        note: Option<String>,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        if self.status.is_done() {
            return Err(TaskDomainError::TaskAlreadyCompleted(self.id));
        }
        let previous = self.status;
        self.mark_completed(actor, note.clone(), clock);
        self.status = TaskStatus::Done;
        if let Some(body) = note {
            self.comments.push(TaskComment {
                author: actor.clone(),
                body,
                created_at: clock.utc(),
            });
        }
        self.commit(
            actor,
            format!("status: {previous} → {}, completed", TaskStatus::Done),
            clock,
        );
        Ok(())
    }

    /// Adds a dependency edge.
    ///
    /// Acyclicity must be established by the caller beforehand; this method
    /// only rejects self edges and duplicates.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::SelfDependency`] or
    /// [`TaskDomainError::DuplicateDependency`].
    pub fn add_dependency(
        &mut self,
        dependency: TaskId,
        kind: DependencyKind,
        actor: &UserId,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        if dependency == self.id {
            return Err(TaskDomainError::SelfDependency(self.id));
        }
        if let Some(existing) = self.dependencies.iter().find(|edge| edge.task == dependency) {
            return Err(TaskDomainError::DuplicateDependency {
                dependent: self.id,
                dependency,
                kind: existing.kind,
            });
        }
        self.dependencies.push(TaskDependency::new(dependency, kind));
        self.commit(
            actor,
            format!("dependencies: added {dependency} ({kind})"),
            clock,
        );
        Ok(())
    }

    /// Removes the edge to `dependency`, returning whether one existed.
    ///
    /// Nothing is recorded when there was no such edge.
    pub fn remove_dependency(
        &mut self,
        dependency: TaskId,
        actor: &UserId,
        clock: &impl Clock,
    ) -> bool {
        let before = self.dependencies.len();
        self.dependencies.retain(|edge| edge.task != dependency);
        let removed = self.dependencies.len() != before;
        if removed {
            self.commit(actor, format!("dependencies: removed {dependency}"), clock);
        }
        removed
    }

    /// Sets the estimate, initialising time tracking when absent.
    pub fn set_estimate(&mut self, estimated_minutes: u64, actor: &UserId, clock: &impl Clock) {
        let previous = self
            .time_tracking
            .as_ref()
            .map(TimeTracking::estimated_minutes);
        self.time_tracking
            .get_or_insert_with(|| TimeTracking::initialize(estimated_minutes))
            .re_estimate(estimated_minutes);
        let action = previous.map_or_else(
            || format!("estimate: set to {estimated_minutes}m"),
            |before| format!("estimate: {before}m → {estimated_minutes}m"),
        );
        self.commit(actor, action, clock);
    }

    /// Logs work against the task, initialising time tracking with a zero
    /// estimate when absent.
    pub fn log_time(&mut self, entry: TimeLogEntry, clock: &impl Clock) {
        let actor = entry.logged_by().clone();
        let duration = entry.duration_minutes();
        let tracking = self
            .time_tracking
            .get_or_insert_with(|| TimeTracking::initialize(0));
        tracking.log(entry);
        let action = format!(
            "time: logged {duration}m (spent {}m, remaining {}m)",
            tracking.spent_minutes(),
            tracking.remaining_minutes()
        );
        self.commit(&actor, action, clock);
    }

    /// Assigns `user` with `role`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::AlreadyAssigned`] when the user already
    /// holds an assignment.
    pub fn assign(
        &mut self,
        user: UserId,
        role: AssignmentRole,
        actor: &UserId,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        if self.assignees.iter().any(|assignment| assignment.user == user) {
            return Err(TaskDomainError::AlreadyAssigned {
                task: self.id,
                user,
            });
        }
        let action = format!("assignees: added {user} as {role}");
        self.assignees.push(Assignment {
            user,
            role,
            assigned_at: clock.utc(),
        });
        self.commit(actor, action, clock);
        Ok(())
    }

    /// Removes the assignment held by `user`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::NotAssigned`] when the user holds none.
    pub fn unassign(
        &mut self,
        user: &UserId,
        actor: &UserId,
        clock: &impl Clock,
    ) -> Result<AssignmentRole, TaskDomainError> {
        let position = self
            .assignees
            .iter()
            .position(|assignment| assignment.user == *user)
            .ok_or_else(|| TaskDomainError::NotAssigned {
                task: self.id,
                user: user.clone(),
            })?;
        let removed = self.assignees.remove(position);
        self.commit(actor, format!("assignees: removed {user}"), clock);
        Ok(removed.role)
    }

    /// Replaces or clears the recurrence block.
    pub fn configure_recurrence(
        &mut self,
        recurrence: Option<Recurrence>,
        actor: &UserId,
        clock: &impl Clock,
    ) {
        let action = recurrence.as_ref().map_or_else(
            || "recurrence: cleared".to_owned(),
            |configured| format!("recurrence: {}", configured.frequency()),
        );
        self.recurrence = recurrence;
        self.commit(actor, action, clock);
    }

    /// Builds the next occurrence of this recurring template.
    ///
    /// The successor keeps the template's content, assignments, dependency
    /// edges, estimate and recurrence, and starts with a fresh identity, an
    /// empty history and no completion metadata.
    pub(crate) fn successor(&self, due: DateTime<Utc>, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        let recurrence = self.recurrence.clone().map(|mut recurrence| {
            recurrence.mark_generated(due);
            recurrence
        });
        Self {
            id: TaskId::new(),
            title: self.title.clone(),
            description: self.description.clone(),
            status: TaskStatus::Todo,
            priority: self.priority,
            progress: 0,
            due_date: Some(due),
            creator: self.creator.clone(),
            assignees: self.assignees.clone(),
            dependencies: self.dependencies.clone(),
            time_tracking: self
                .time_tracking
                .as_ref()
                .map(|tracking| TimeTracking::initialize(tracking.estimated_minutes())),
            recurrence,
            history: AuditTrail::new(),
            comments: Vec::new(),
            completion: None,
            created_at: timestamp,
            updated_at: timestamp,
            revision: 0,
        }
    }

    /// Advances the template's `last_generated_at` and records the
    /// generation.
    pub(crate) fn record_generation(
        &mut self,
        due: DateTime<Utc>,
        successor: TaskId,
        actor: &UserId,
        clock: &impl Clock,
    ) {
        if let Some(recurrence) = &mut self.recurrence {
            recurrence.mark_generated(due);
        }
        self.commit(
            actor,
            format!(
                "recurrence: generated occurrence {successor} due {}",
                due.to_rfc3339()
            ),
            clock,
        );
    }

    /// Moves to the next revision before a save.
    pub(crate) const fn advance_revision(&mut self) {
        self.revision = self.revision.saturating_add(1);
    }

    fn mark_completed(&mut self, actor: &UserId, notes: Option<String>, clock: &impl Clock) {
        self.progress = 100;
        self.completion = Some(Completion {
            completed_at: clock.utc(),
            completed_by: actor.clone(),
            notes,
        });
    }

    fn commit(&mut self, actor: &UserId, action: impl Into<String>, clock: &impl Clock) {
        self.history.record(actor.clone(), action, clock);
        self.updated_at = clock.utc();
    }
}

fn normalize_title(title: &str) -> Result<String, TaskDomainError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(TaskDomainError::EmptyTitle);
    }
    Ok(trimmed.to_owned())
}

const fn validate_progress(progress: u8) -> Result<(), TaskDomainError> {
    if progress > 100 {
        return Err(TaskDomainError::ProgressOutOfRange(progress));
    }
    Ok(())
}
