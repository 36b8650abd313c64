//! Service layer orchestrating task mutations against the repository port.
//!
//! Every mutation loads a snapshot, lets the domain compute the next state,
//! and writes it back guarded by the snapshot's revision. Events describing
//! what happened are returned to the caller instead of being dispatched.

use super::{
    LifecycleConfig,
    requests::{
        AddDependencyRequest, AssignUserRequest, BatchUpdateRequest, CompleteTaskRequest,
        ConfigureRecurrenceRequest, CreateTaskRequest, EstimateTimeRequest,
        GenerateOccurrenceRequest, LogTimeRequest, RemoveDependencyRequest, UnassignUserRequest,
        UpdateTaskRequest,
    },
};
use crate::task::{
    domain::{
        CycleSearch, DependencyKind, GeneratedOccurrence, IntervalPatternEvaluator, NewTask,
        PatternEvaluator, Recurrence, RecurrenceScheduler, SearchStep, TaskDomainError, TaskEvent,
        TaskId, TaskRecord, TaskStatus, TimeLogEntry, TimeLogParams, UserId,
    },
    ports::{TaskRepository, TaskRepositoryError},
};
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};
use thiserror::Error;
use tracing::{debug, warn};

/// Service-level errors for task lifecycle operations.
#[derive(Debug, Error)]
pub enum TaskLifecycleError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// A referenced task does not exist.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// Another writer saved the task after it was loaded.
    #[error("revision conflict on task {task}: expected {expected}, found {actual}")]
    Conflict {
        /// Task that lost the race.
        task: TaskId,
        /// Revision the operation started from.
        expected: u64,
        /// Revision currently stored.
        actual: u64,
    },

    /// A batch referenced tasks that do not exist; nothing was written.
    #[error("batch references {} unknown task(s)", missing.len())]
    PartialBatchFailure {
        /// Identifiers that did not resolve.
        missing: Vec<TaskId>,
    },

    /// Repository operation failed.
    #[error(transparent)]
    Repository(TaskRepositoryError),
}

impl TaskLifecycleError {
    /// Returns `true` when reloading and reapplying the request may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

impl From<TaskRepositoryError> for TaskLifecycleError {
    fn from(err: TaskRepositoryError) -> Self {
        match err {
            TaskRepositoryError::NotFound(task) => Self::NotFound(task),
            TaskRepositoryError::Conflict {
                task,
                expected,
                actual,
            } => Self::Conflict {
                task,
                expected,
                actual,
            },
            other => Self::Repository(other),
        }
    }
}

/// Result type for task lifecycle service operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;

/// Value produced by a mutation together with the events it raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleOutcome<T> {
    /// Operation result.
    pub value: T,
    /// Events in the order they happened.
    pub events: Vec<TaskEvent>,
}

impl<T> LifecycleOutcome<T> {
    /// Pairs a value with its events.
    #[must_use]
    pub const fn new(value: T, events: Vec<TaskEvent>) -> Self {
        Self { value, events }
    }
}

/// Task lifecycle orchestration service.
#[derive(Clone)]
pub struct TaskLifecycleService<R, C, P = IntervalPatternEvaluator>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
    P: PatternEvaluator,
{
    repository: Arc<R>,
    clock: Arc<C>,
    scheduler: RecurrenceScheduler<P>,
    config: LifecycleConfig,
}

impl<R, C> TaskLifecycleService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new task lifecycle service with the default configuration.
    #[must_use]
    pub fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self {
            repository,
            clock,
            scheduler: RecurrenceScheduler::default(),
            config: LifecycleConfig::default(),
        }
    }
}

impl<R, C, P> TaskLifecycleService<R, C, P>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
    P: PatternEvaluator,
{
    /// Replaces the service configuration.
    #[must_use]
    pub fn with_config(mut self, config: LifecycleConfig) -> Self {
        self.scheduler = self
            .scheduler
            .with_custom_patterns(config.allow_custom_recurrence);
        self.config = config;
        self
    }

    /// Replaces the evaluator used for `custom` recurrence patterns.
    #[must_use]
    pub fn with_pattern_evaluator<Q>(self, evaluator: Q) -> TaskLifecycleService<R, C, Q>
    where
        Q: PatternEvaluator,
    {
        TaskLifecycleService {
            repository: self.repository,
            clock: self.clock,
            scheduler: RecurrenceScheduler::new(evaluator)
                .with_custom_patterns(self.config.allow_custom_recurrence),
            config: self.config,
        }
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Creates and stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Domain`] for a blank title or creator,
    /// or a repository error when the store fails.
    pub async fn create_task(
        &self,
        request: CreateTaskRequest,
    ) -> TaskLifecycleResult<LifecycleOutcome<TaskRecord>> {
        let creator = UserId::new(request.creator)?;
        let task = TaskRecord::new(
            NewTask {
                title: request.title,
                description: request.description,
                status: request.status,
                priority: request.priority,
                due_date: request.due_date,
                creator: creator.clone(),
                estimated_minutes: request.estimated_minutes,
            },
            &*self.clock,
        )?;
        self.repository.store(&task).await?;
        debug!(task_id = %task.id(), operation = "create_task", "task stored");

        let events = vec![TaskEvent::TaskCreated {
            task: task.id(),
            actor: creator,
        }];
        Ok(LifecycleOutcome::new(task, events))
    }

    /// Loads a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] when the task does not exist.
    pub async fn find_task(&self, id: TaskId) -> TaskLifecycleResult<TaskRecord> {
        self.load_existing(id).await
    }

    /// Applies a sparse field update to one task.
    ///
    /// Moving the task into `done` also raises `TaskCompleted` and a
    /// `TaskUnblocked` event for every dependent it releases.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`], a domain validation error,
    /// or [`TaskLifecycleError::Conflict`] when the task changed concurrently.
    pub async fn update_task(
        &self,
        request: UpdateTaskRequest,
    ) -> TaskLifecycleResult<LifecycleOutcome<TaskRecord>> {
        let actor = UserId::new(request.actor)?;
        let mut task = self.load_existing(request.task_id).await?;
        let was_done = task.status().is_done();
        let changes = task.apply_update(&request.update, &actor, &*self.clock)?;

        let mut events = vec![TaskEvent::TaskUpdated {
            task: task.id(),
            actor,
            fields: changes.fields(),
        }];
        let mut unblocked = Vec::new();
        if !was_done && task.status().is_done() {
            let overrides = HashMap::from([(task.id(), TaskStatus::Done)]);
            if self.config.enforce_blocking_dependencies {
                self.ensure_unblocked(&task, &overrides).await?;
            }
            events.extend(completion_event(&task));
            unblocked = self.newly_unblocked(task.id(), &overrides).await?;
        }

        self.persist(&mut task, "update_task").await?;
        events.extend(unblocked);
        Ok(LifecycleOutcome::new(task, events))
    }

    /// Marks a task as done.
    ///
    /// Dependents whose blocking dependencies are now all done are reported
    /// through `TaskUnblocked` events.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::TaskAlreadyCompleted`] for a task that is
    /// already done, [`TaskDomainError::BlockingDependenciesIncomplete`] when
    /// enforcement is enabled and a blocker is unfinished, and
    /// [`TaskLifecycleError::NotFound`] for a missing task or a dangling edge.
    pub async fn complete_task(
        &self,
        request: CompleteTaskRequest,
    ) -> TaskLifecycleResult<LifecycleOutcome<TaskRecord>> {
        let actor = UserId::new(request.actor)?;
        let mut task = self.load_existing(request.task_id).await?;
        task.complete(&actor, request.note, &*self.clock)?;

        let overrides = HashMap::from([(task.id(), TaskStatus::Done)]);
        if self.config.enforce_blocking_dependencies {
            self.ensure_unblocked(&task, &overrides).await?;
        }
        let unblocked = self.newly_unblocked(task.id(), &overrides).await?;

        self.persist(&mut task, "complete_task").await?;
        let mut events: Vec<TaskEvent> = completion_event(&task).into_iter().collect();
        events.extend(unblocked);
        Ok(LifecycleOutcome::new(task, events))
    }

    /// Adds the edge `dependent → dependency`.
    ///
    /// The cycle check walks the stored graph starting at `dependency`; the
    /// dependent is only written once the check has passed.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::SelfDependency`],
    /// [`TaskDomainError::DependencyCycle`] or
    /// [`TaskDomainError::DuplicateDependency`] for rejected edges, and
    /// [`TaskLifecycleError::NotFound`] when either endpoint or a traversed
    /// task is missing.
    pub async fn add_dependency(
        &self,
        request: AddDependencyRequest,
    ) -> TaskLifecycleResult<LifecycleOutcome<TaskRecord>> {
        let actor = UserId::new(request.actor)?;
        if request.dependent == request.dependency {
            return Err(TaskDomainError::SelfDependency(request.dependent).into());
        }
        let mut dependent = self.load_existing(request.dependent).await?;
        self.load_existing(request.dependency).await?;

        if self
            .would_create_cycle(request.dependent, request.dependency)
            .await?
        {
            return Err(TaskDomainError::DependencyCycle {
                dependent: request.dependent,
                dependency: request.dependency,
            }
            .into());
        }
        dependent.add_dependency(request.dependency, request.kind, &actor, &*self.clock)?;
        self.persist(&mut dependent, "add_dependency").await?;

        let events = vec![TaskEvent::DependencyAdded {
            dependent: request.dependent,
            dependency: request.dependency,
            kind: request.kind,
            actor,
        }];
        Ok(LifecycleOutcome::new(dependent, events))
    }

    /// Removes the edge `dependent → dependency`.
    ///
    /// Removing an edge that does not exist succeeds without writing or
    /// raising events. The dependency itself need not exist, so dangling
    /// edges can be cleaned up.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] when the dependent is missing.
    pub async fn remove_dependency(
        &self,
        request: RemoveDependencyRequest,
    ) -> TaskLifecycleResult<LifecycleOutcome<TaskRecord>> {
        let actor = UserId::new(request.actor)?;
        let mut dependent = self.load_existing(request.dependent).await?;
        if !dependent.remove_dependency(request.dependency, &actor, &*self.clock) {
            return Ok(LifecycleOutcome::new(dependent, Vec::new()));
        }
        self.persist(&mut dependent, "remove_dependency").await?;

        let events = vec![TaskEvent::DependencyRemoved {
            dependent: request.dependent,
            dependency: request.dependency,
            actor,
        }];
        Ok(LifecycleOutcome::new(dependent, events))
    }

    /// Lists the tasks holding a dependency edge to `id`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] when `id` does not exist.
    pub async fn dependents_of(&self, id: TaskId) -> TaskLifecycleResult<Vec<TaskRecord>> {
        self.load_existing(id).await?;
        Ok(self.repository.list_dependents(id).await?)
    }

    /// Sets the estimate of a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] or a persistence error.
    pub async fn estimate_time(
        &self,
        request: EstimateTimeRequest,
    ) -> TaskLifecycleResult<LifecycleOutcome<TaskRecord>> {
        let actor = UserId::new(request.actor)?;
        let mut task = self.load_existing(request.task_id).await?;
        task.set_estimate(request.estimated_minutes, &actor, &*self.clock);
        self.persist(&mut task, "estimate_time").await?;

        let events = vec![TaskEvent::TaskUpdated {
            task: task.id(),
            actor,
            fields: vec!["estimate".to_owned()],
        }];
        Ok(LifecycleOutcome::new(task, events))
    }

    /// Logs work against a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::NegativeDuration`] or
    /// [`TaskDomainError::InvalidTimeRange`] for an invalid entry, and
    /// [`TaskLifecycleError::NotFound`] for a missing task.
    pub async fn log_time(
        &self,
        request: LogTimeRequest,
    ) -> TaskLifecycleResult<LifecycleOutcome<TaskRecord>> {
        let logged_by = UserId::new(request.logged_by)?;
        let (started_at, ended_at) = match request.interval {
            Some(interval) => interval,
            None => {
                let ended_at = self.clock.utc();
                let started_at = TimeDelta::try_minutes(request.duration_minutes.max(0))
                    .and_then(|elapsed| ended_at.checked_sub_signed(elapsed))
                    .unwrap_or(DateTime::<Utc>::MIN_UTC);
                (started_at, ended_at)
            }
        };
        let entry = TimeLogEntry::new(TimeLogParams {
            duration_minutes: request.duration_minutes,
            description: request.description,
            started_at,
            ended_at,
            logged_by: logged_by.clone(),
        })?;
        let duration_minutes = entry.duration_minutes();

        let mut task = self.load_existing(request.task_id).await?;
        task.log_time(entry, &*self.clock);
        self.persist(&mut task, "log_time").await?;

        let (spent_minutes, remaining_minutes) = task
            .time_tracking()
            .map_or((0, 0), |tracking| {
                (tracking.spent_minutes(), tracking.remaining_minutes())
            });
        let events = vec![TaskEvent::TimeLogged {
            task: task.id(),
            logged_by,
            duration_minutes,
            spent_minutes,
            remaining_minutes,
        }];
        Ok(LifecycleOutcome::new(task, events))
    }

    /// Assigns a user to a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::AlreadyAssigned`] when the user already
    /// holds an assignment.
    pub async fn assign_user(
        &self,
        request: AssignUserRequest,
    ) -> TaskLifecycleResult<LifecycleOutcome<TaskRecord>> {
        let actor = UserId::new(request.actor)?;
        let user = UserId::new(request.user)?;
        let mut task = self.load_existing(request.task_id).await?;
        task.assign(user.clone(), request.role, &actor, &*self.clock)?;
        self.persist(&mut task, "assign_user").await?;

        let events = vec![TaskEvent::TaskAssigned {
            task: task.id(),
            user,
            role: request.role,
            actor,
        }];
        Ok(LifecycleOutcome::new(task, events))
    }

    /// Removes a user's assignment.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::NotAssigned`] when the user holds none.
    pub async fn unassign_user(
        &self,
        request: UnassignUserRequest,
    ) -> TaskLifecycleResult<LifecycleOutcome<TaskRecord>> {
        let actor = UserId::new(request.actor)?;
        let user = UserId::new(request.user)?;
        let mut task = self.load_existing(request.task_id).await?;
        task.unassign(&user, &actor, &*self.clock)?;
        self.persist(&mut task, "unassign_user").await?;

        let events = vec![TaskEvent::TaskUnassigned {
            task: task.id(),
            user,
            actor,
        }];
        Ok(LifecycleOutcome::new(task, events))
    }

    /// Configures or clears the recurrence block of a task.
    ///
    /// # Errors
    ///
    /// Returns a domain error for an invalid window, a missing or malformed
    /// custom pattern, or custom patterns being disabled.
    pub async fn configure_recurrence(
        &self,
        request: ConfigureRecurrenceRequest,
    ) -> TaskLifecycleResult<LifecycleOutcome<TaskRecord>> {
        let actor = UserId::new(request.actor)?;
        let recurrence = request.recurrence.map(Recurrence::new).transpose()?;
        if let Some(configured) = &recurrence {
            self.scheduler.validate(configured)?;
        }

        let mut task = self.load_existing(request.task_id).await?;
        task.configure_recurrence(recurrence, &actor, &*self.clock);
        self.persist(&mut task, "configure_recurrence").await?;

        let events = vec![TaskEvent::TaskUpdated {
            task: task.id(),
            actor,
            fields: vec!["recurrence".to_owned()],
        }];
        Ok(LifecycleOutcome::new(task, events))
    }

    /// Materialises the next occurrence of a recurring template.
    ///
    /// The advanced template and the occurrence are written together under
    /// the template's revision, so a concurrent generation for the same
    /// template fails with a conflict instead of producing a duplicate, and
    /// a failed write leaves the template ready for a retry. Returns `None`
    /// without writing when the series has no further occurrence.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`], a recurrence validation
    /// error, or [`TaskLifecycleError::Conflict`].
    pub async fn generate_next_occurrence(
        &self,
        request: GenerateOccurrenceRequest,
    ) -> TaskLifecycleResult<LifecycleOutcome<Option<TaskRecord>>> {
        let actor = UserId::new(request.actor)?;
        let loaded = self.load_existing(request.template_id).await?;
        let Some(generated) =
            self.scheduler
                .generate_next_occurrence(&loaded, &actor, &*self.clock)?
        else {
            debug!(task_id = %loaded.id(), "no further occurrence");
            return Ok(LifecycleOutcome::new(None, Vec::new()));
        };

        let GeneratedOccurrence {
            mut template,
            successor,
            due_date,
        } = generated;
        let expected = template.revision();
        template.advance_revision();
        self.repository
            .save_generated(&template, expected, &successor)
            .await
            .map_err(|err| lift_write_error(err, "generate_next_occurrence"))?;
        debug!(
            task_id = %successor.id(),
            template_id = %template.id(),
            %due_date,
            "occurrence stored"
        );

        let events = vec![TaskEvent::RecurrenceGenerated {
            template: template.id(),
            occurrence: successor.id(),
            due_date,
        }];
        Ok(LifecycleOutcome::new(Some(successor), events))
    }

    /// Applies one update to many tasks atomically.
    ///
    /// Every identifier must resolve before anything is applied, and every
    /// task must accept the update; otherwise nothing is written.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyBatch`] or
    /// [`TaskDomainError::BatchTooLarge`] for an unusable id list,
    /// [`TaskLifecycleError::PartialBatchFailure`] naming every missing id,
    /// the first domain error raised by any task, or
    /// [`TaskLifecycleError::Conflict`] when any task changed concurrently.
    pub async fn batch_update(
        &self,
        request: BatchUpdateRequest,
    ) -> TaskLifecycleResult<LifecycleOutcome<Vec<TaskRecord>>> {
        let actor = UserId::new(request.actor)?;
        let ids = unique_ids(request.task_ids);
        if ids.is_empty() {
            return Err(TaskDomainError::EmptyBatch.into());
        }
        if ids.len() > self.config.max_batch_size {
            return Err(TaskDomainError::BatchTooLarge {
                size: ids.len(),
                limit: self.config.max_batch_size,
            }
            .into());
        }

        let mut loaded = Vec::with_capacity(ids.len());
        let mut missing = Vec::new();
        for id in ids {
            match self.repository.load(id).await? {
                Some(task) => loaded.push(task),
                None => missing.push(id),
            }
        }
        if !missing.is_empty() {
            return Err(TaskLifecycleError::PartialBatchFailure { missing });
        }

        let mut events = Vec::new();
        let mut completed = Vec::new();
        let mut overrides = HashMap::new();
        let mut writes = Vec::with_capacity(loaded.len());
        for mut task in loaded {
            let was_done = task.status().is_done();
            let changes = task.apply_update(&request.update, &actor, &*self.clock)?;
            events.push(TaskEvent::TaskUpdated {
                task: task.id(),
                actor: actor.clone(),
                fields: changes.fields(),
            });
            if !was_done && task.status().is_done() {
                events.extend(completion_event(&task));
                completed.push(task.id());
            }
            overrides.insert(task.id(), task.status());
            let expected = task.revision();
            task.advance_revision();
            writes.push((task, expected));
        }

        if self.config.enforce_blocking_dependencies {
            for (task, _) in writes.iter().filter(|(task, _)| completed.contains(&task.id())) {
                self.ensure_unblocked(task, &overrides).await?;
            }
        }
        let mut released = HashSet::new();
        for id in &completed {
            for event in self.newly_unblocked(*id, &overrides).await? {
                if released.insert(event.task_id()) {
                    events.push(event);
                }
            }
        }

        self.repository
            .save_all(&writes)
            .await
            .map_err(|err| lift_write_error(err, "batch_update"))?;
        debug!(
            tasks = writes.len(),
            completed = completed.len(),
            operation = "batch_update",
            "batch saved"
        );
        let tasks = writes.into_iter().map(|(task, _)| task).collect();
        Ok(LifecycleOutcome::new(tasks, events))
    }

    async fn load_existing(&self, id: TaskId) -> TaskLifecycleResult<TaskRecord> {
        self.repository
            .load(id)
            .await?
            .ok_or(TaskLifecycleError::NotFound(id))
    }

    async fn persist(
        &self,
        task: &mut TaskRecord,
        operation: &'static str,
    ) -> TaskLifecycleResult<()> {
        let expected = task.revision();
        task.advance_revision();
        self.repository
            .save(task, expected)
            .await
            .map_err(|err| lift_write_error(err, operation))?;
        debug!(
            task_id = %task.id(),
            revision = task.revision(),
            operation,
            "task saved"
        );
        Ok(())
    }

    async fn would_create_cycle(
        &self,
        dependent: TaskId,
        dependency: TaskId,
    ) -> TaskLifecycleResult<bool> {
        let mut search = CycleSearch::new(dependent, dependency);
        loop {
            match search.next_step() {
                SearchStep::Found => return Ok(true),
                SearchStep::Exhausted => return Ok(false),
                SearchStep::Expand(task) => {
                    let record = self.load_existing(task).await?;
                    search.expand(record.dependency_ids());
                }
            }
        }
    }

    /// Returns the status of every `blocks` dependency of `task`, `None`
    /// for a dependency that no longer exists.
    ///
    /// `overrides` holds statuses decided in this call but not yet saved.
    async fn blocker_statuses(
        &self,
        task: &TaskRecord,
        overrides: &HashMap<TaskId, TaskStatus>,
    ) -> TaskLifecycleResult<Vec<(TaskId, Option<TaskStatus>)>> {
        let mut statuses = Vec::new();
        for edge in task
            .dependencies()
            .iter()
            .filter(|edge| edge.kind == DependencyKind::Blocks)
        {
            if let Some(status) = overrides.get(&edge.task) {
                statuses.push((edge.task, Some(*status)));
                continue;
            }
            let loaded = self.repository.load(edge.task).await?;
            statuses.push((edge.task, loaded.map(|blocker| blocker.status())));
        }
        Ok(statuses)
    }

    /// Fails unless every `blocks` dependency of `task` is done.
    ///
    /// A missing blocker surfaces as [`TaskLifecycleError::NotFound`].
    async fn ensure_unblocked(
        &self,
        task: &TaskRecord,
        overrides: &HashMap<TaskId, TaskStatus>,
    ) -> TaskLifecycleResult<()> {
        let mut pending = Vec::new();
        for (blocker, status) in self.blocker_statuses(task, overrides).await? {
            if !status.ok_or(TaskLifecycleError::NotFound(blocker))?.is_done() {
                pending.push(blocker);
            }
        }
        if pending.is_empty() {
            return Ok(());
        }
        Err(TaskDomainError::BlockingDependenciesIncomplete {
            task: task.id(),
            pending,
        }
        .into())
    }

    /// Builds `TaskUnblocked` events for unfinished dependents that
    /// `completed` was the last open blocker of.
    async fn newly_unblocked(
        &self,
        completed: TaskId,
        overrides: &HashMap<TaskId, TaskStatus>,
    ) -> TaskLifecycleResult<Vec<TaskEvent>> {
        let mut events = Vec::new();
        for dependent in self.repository.list_dependents(completed).await? {
            let blocked_by_completed = dependent
                .dependencies()
                .iter()
                .any(|edge| edge.task == completed && edge.kind == DependencyKind::Blocks);
            let status = overrides
                .get(&dependent.id())
                .copied()
                .unwrap_or_else(|| dependent.status());
            if !blocked_by_completed || status.is_done() {
                continue;
            }
            // A dependent with a dangling blocker stays blocked.
            let ready = self
                .blocker_statuses(&dependent, overrides)
                .await?
                .into_iter()
                .all(|(_, blocker_status)| blocker_status.is_some_and(TaskStatus::is_done));
            if ready {
                events.push(TaskEvent::TaskUnblocked {
                    task: dependent.id(),
                    unblocked_by: completed,
                });
            }
        }
        Ok(events)
    }
}

fn completion_event(task: &TaskRecord) -> Option<TaskEvent> {
    task.completion().map(|completion| TaskEvent::TaskCompleted {
        task: task.id(),
        completed_by: completion.completed_by.clone(),
        completed_at: completion.completed_at,
    })
}

fn lift_write_error(err: TaskRepositoryError, operation: &'static str) -> TaskLifecycleError {
    if let TaskRepositoryError::Conflict {
        task,
        expected,
        actual,
    } = &err
    {
        warn!(task_id = %task, expected, actual, operation, "revision conflict");
    }
    err.into()
}

fn unique_ids(ids: Vec<TaskId>) -> Vec<TaskId> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}
