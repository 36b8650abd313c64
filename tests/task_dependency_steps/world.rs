//! Shared world state for task dependency BDD scenarios.

use std::{collections::HashMap, sync::Arc};

use mockable::DefaultClock;
use rstest::fixture;
use trellis::task::{
    adapters::memory::InMemoryTaskRepository,
    domain::{TaskEvent, TaskId, TaskRecord},
    services::{LifecycleConfig, TaskLifecycleError, TaskLifecycleService},
};

/// Service type used by the BDD world.
pub type TestTaskService = TaskLifecycleService<InMemoryTaskRepository, DefaultClock>;

/// Scenario world for dependency behaviour tests.
pub struct DependencyWorld {
    pub service: TestTaskService,
    pub tasks: HashMap<String, TaskRecord>,
    pub last_events: Vec<TaskEvent>,
    pub last_result: Option<Result<TaskRecord, TaskLifecycleError>>,
}

impl DependencyWorld {
    /// Creates a world with no tasks.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(LifecycleConfig::default())
    }

    /// Creates a world whose service uses `config`.
    #[must_use]
    pub fn with_config(config: LifecycleConfig) -> Self {
        let service = TaskLifecycleService::new(
            Arc::new(InMemoryTaskRepository::new()),
            Arc::new(DefaultClock),
        )
        .with_config(config);

        Self {
            service,
            tasks: HashMap::new(),
            last_events: Vec::new(),
            last_result: None,
        }
    }

    /// Resolves a task title to its identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if no task with `title` was created in this scenario.
    pub fn id_of(&self, title: &str) -> Result<TaskId, eyre::Report> {
        self.tasks
            .get(title)
            .map(TaskRecord::id)
            .ok_or_else(|| eyre::eyre!("no task titled {title} in scenario world"))
    }
}

impl Default for DependencyWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> DependencyWorld {
    DependencyWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
