//! In-memory integration tests for recurring tasks.

use super::helpers::{TestService, create_tasks, midnight, nth, service};
use rstest::rstest;
use trellis::task::{
    domain::{RecurrenceFrequency, TaskStatus},
    services::{CompleteTaskRequest, ConfigureRecurrenceRequest, GenerateOccurrenceRequest},
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn monthly_series_clamps_and_terminates(service: TestService) -> Result<(), eyre::Report> {
    let tasks = create_tasks(&service, &["Invoice run"]).await?;
    let template = nth(&tasks, 0)?;
    service
        .configure_recurrence(
            ConfigureRecurrenceRequest::new(
                template.id(),
                "integration",
                RecurrenceFrequency::Monthly,
                midnight(2024, 1, 31)?,
            )
            .with_end_date(midnight(2024, 4, 1)?),
        )
        .await?;

    let mut due_dates = Vec::new();
    loop {
        let outcome = service
            .generate_next_occurrence(GenerateOccurrenceRequest::new(template.id(), "cron"))
            .await?;
        let Some(successor) = outcome.value else {
            break;
        };
        eyre::ensure!(successor.status() == TaskStatus::Todo, "successor must be todo");
        due_dates.push(successor.due_date());
        eyre::ensure!(due_dates.len() <= 3, "series should have terminated");
    }

    assert_eq!(
        due_dates,
        vec![Some(midnight(2024, 2, 29)?), Some(midnight(2024, 3, 29)?)]
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn successors_have_independent_lifecycles(service: TestService) -> Result<(), eyre::Report> {
    let tasks = create_tasks(&service, &["Standup"]).await?;
    let template = nth(&tasks, 0)?;
    service
        .configure_recurrence(
            ConfigureRecurrenceRequest::new(
                template.id(),
                "integration",
                RecurrenceFrequency::Custom,
                midnight(2024, 1, 1)?,
            )
            .with_pattern("every:2d"),
        )
        .await?;

    let successor = service
        .generate_next_occurrence(GenerateOccurrenceRequest::new(template.id(), "cron"))
        .await?
        .value
        .ok_or_else(|| eyre::eyre!("an occurrence should be generated"))?;
    service
        .complete_task(CompleteTaskRequest::new(successor.id(), "integration"))
        .await?;

    let stored_template = service.find_task(template.id()).await?;
    assert_eq!(successor.due_date(), Some(midnight(2024, 1, 3)?));
    assert_eq!(stored_template.status(), TaskStatus::Todo);
    assert!(stored_template.completed_at().is_none());
    assert!(!stored_template.depends_on(successor.id()));
    Ok(())
}
