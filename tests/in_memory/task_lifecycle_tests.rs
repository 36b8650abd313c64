//! In-memory integration tests for task lifecycle operations.

use super::helpers::{TestService, create_tasks, nth, service};
use rstest::rstest;
use trellis::task::{
    domain::{TaskEvent, TaskStatus, TaskUpdate},
    services::{
        CompleteTaskRequest, CreateTaskRequest, EstimateTimeRequest, LogTimeRequest,
        TaskLifecycleError, UpdateTaskRequest,
    },
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn task_moves_through_every_status(service: TestService) -> Result<(), eyre::Report> {
    let tasks = create_tasks(&service, &["Walk the board"]).await?;
    let task = nth(&tasks, 0)?;

    let mut history_len = task.history().len();
    for status in [
        TaskStatus::Backlog,
        TaskStatus::InProgress,
        TaskStatus::InReview,
        TaskStatus::Done,
    ] {
        let outcome = service
            .update_task(UpdateTaskRequest::new(
                task.id(),
                "integration",
                TaskUpdate::new().with_status(status),
            ))
            .await?;
        eyre::ensure!(outcome.value.status() == status, "status not applied");
        eyre::ensure!(
            outcome.value.history().len() == history_len + 1,
            "each update must add exactly one audit entry"
        );
        history_len = outcome.value.history().len();
    }

    let stored = service.find_task(task.id()).await?;
    eyre::ensure!(stored.progress() == 100, "done implies full progress");
    eyre::ensure!(stored.completed_at().is_some(), "done implies completed_at");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn completion_with_note_is_persisted(service: TestService) -> Result<(), eyre::Report> {
    let tasks = create_tasks(&service, &["Release 1.0"]).await?;
    let task = nth(&tasks, 0)?;

    let outcome = service
        .complete_task(CompleteTaskRequest::new(task.id(), "integration").with_note("tagged"))
        .await?;

    let stored = service.find_task(task.id()).await?;
    assert_eq!(stored, outcome.value);
    assert_eq!(stored.status(), TaskStatus::Done);
    assert_eq!(stored.comments().len(), 1);
    assert!(matches!(
        outcome.events.as_slice(),
        [TaskEvent::TaskCompleted { task: completed, .. }] if *completed == task.id()
    ));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn time_tracking_survives_round_trips(service: TestService) -> Result<(), eyre::Report> {
    let task = service
        .create_task(CreateTaskRequest::new("Timebox", "integration").with_estimate(60))
        .await?
        .value;

    for minutes in [25, 25, 25] {
        service
            .log_time(LogTimeRequest::new(task.id(), "integration", minutes, "pomodoro"))
            .await?;
    }
    service
        .estimate_time(EstimateTimeRequest::new(task.id(), "integration", 100))
        .await?;

    let stored = service.find_task(task.id()).await?;
    let tracking = stored
        .time_tracking()
        .ok_or_else(|| eyre::eyre!("time tracking should be initialised"))?;
    assert_eq!(tracking.logs().len(), 3);
    assert_eq!(tracking.spent_minutes(), 75);
    assert_eq!(tracking.remaining_minutes(), 25);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn updates_to_unknown_tasks_are_not_found(service: TestService) {
    let missing = trellis::task::domain::TaskId::new();

    let result = service
        .update_task(UpdateTaskRequest::new(
            missing,
            "integration",
            TaskUpdate::new().with_progress(10),
        ))
        .await;

    assert!(matches!(result, Err(TaskLifecycleError::NotFound(id)) if id == missing));
}
