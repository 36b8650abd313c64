//! Shared test helpers for in-memory repository integration tests.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use eyre::WrapErr;
use mockable::DefaultClock;
use rstest::fixture;
use trellis::task::{
    adapters::memory::InMemoryTaskRepository,
    domain::{TaskId, TaskRecord},
    services::{AddDependencyRequest, CreateTaskRequest, TaskLifecycleService},
};

/// Service type exercised by the integration tests.
pub type TestService = TaskLifecycleService<InMemoryTaskRepository, DefaultClock>;

/// Provides a service backed by a fresh in-memory repository.
#[fixture]
pub fn service() -> TestService {
    TaskLifecycleService::new(
        Arc::new(InMemoryTaskRepository::new()),
        Arc::new(DefaultClock),
    )
}

/// Builds a UTC timestamp at midnight.
///
/// # Errors
///
/// Returns an error if the date does not exist.
pub fn midnight(year: i32, month: u32, day: u32) -> Result<DateTime<Utc>, eyre::Report> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .ok_or_else(|| eyre::eyre!("invalid date {year}-{month}-{day}"))
}

/// Creates one task per title, in order.
///
/// # Errors
///
/// Returns an error if any creation fails.
pub async fn create_tasks(
    service: &TestService,
    titles: &[&str],
) -> Result<Vec<TaskRecord>, eyre::Report> {
    let mut created = Vec::with_capacity(titles.len());
    for title in titles {
        let outcome = service
            .create_task(CreateTaskRequest::new(*title, "integration"))
            .await
            .wrap_err_with(|| format!("create task {title}"))?;
        created.push(outcome.value);
    }
    Ok(created)
}

/// Adds a blocking edge `dependent → dependency`.
///
/// # Errors
///
/// Returns an error if the service rejects the edge.
pub async fn add_blocker(
    service: &TestService,
    dependent: TaskId,
    dependency: TaskId,
) -> Result<TaskRecord, eyre::Report> {
    let outcome = service
        .add_dependency(AddDependencyRequest::new(dependent, dependency, "integration"))
        .await
        .wrap_err("add dependency")?;
    Ok(outcome.value)
}

/// Returns the task at `index`, failing the test when absent.
///
/// # Errors
///
/// Returns an error if `index` is out of bounds.
pub fn nth(tasks: &[TaskRecord], index: usize) -> Result<&TaskRecord, eyre::Report> {
    tasks
        .get(index)
        .ok_or_else(|| eyre::eyre!("expected a task at position {index}"))
}
