//! In-memory integration tests for dependency management.

use super::helpers::{TestService, add_blocker, create_tasks, nth, service};
use rstest::rstest;
use trellis::task::{
    domain::{DependencyGraph, TaskDomainError, TaskEvent},
    services::{CompleteTaskRequest, TaskLifecycleError},
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn chain_of_three_rejects_closing_edge(service: TestService) -> Result<(), eyre::Report> {
    let tasks = create_tasks(&service, &["A", "B", "C"]).await?;
    let (a, b, c) = (nth(&tasks, 0)?.id(), nth(&tasks, 1)?.id(), nth(&tasks, 2)?.id());

    add_blocker(&service, a, b).await?;
    add_blocker(&service, b, c).await?;
    let closing = add_blocker(&service, c, a).await;

    let err = closing.err().ok_or_else(|| eyre::eyre!("cycle must be rejected"))?;
    let cause = err
        .downcast_ref::<TaskLifecycleError>()
        .ok_or_else(|| eyre::eyre!("unexpected error: {err:?}"))?;
    assert!(matches!(
        cause,
        TaskLifecycleError::Domain(TaskDomainError::DependencyCycle { .. })
    ));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stored_edges_form_an_acyclic_graph(service: TestService) -> Result<(), eyre::Report> {
    let tasks = create_tasks(&service, &["T0", "T1", "T2", "T3", "T4"]).await?;
    let ids: Vec<_> = tasks.iter().map(|task| task.id()).collect();

    let mut accepted = 0_usize;
    for from in &ids {
        for to in &ids {
            if add_blocker(&service, *from, *to).await.is_ok() {
                accepted += 1;
            }
        }
    }
    // Every forward edge of the creation order fits without a cycle.
    assert_eq!(accepted, 10);

    let mut stored = Vec::with_capacity(ids.len());
    for id in &ids {
        stored.push(service.find_task(*id).await?);
    }
    let graph = DependencyGraph::from_records(&stored)?;
    assert_eq!(graph.topological_order(), ids.iter().rev().copied().collect::<Vec<_>>());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn finishing_last_blocker_unblocks_dependent(
    service: TestService,
) -> Result<(), eyre::Report> {
    let tasks = create_tasks(&service, &["Design", "Build", "Launch"]).await?;
    let (design, build, launch) = (nth(&tasks, 0)?.id(), nth(&tasks, 1)?.id(), nth(&tasks, 2)?.id());
    add_blocker(&service, launch, design).await?;
    add_blocker(&service, launch, build).await?;

    let first = service
        .complete_task(CompleteTaskRequest::new(design, "integration"))
        .await?;
    let second = service
        .complete_task(CompleteTaskRequest::new(build, "integration"))
        .await?;

    let unblocked = |events: &[TaskEvent]| {
        events
            .iter()
            .filter(|event| matches!(event, TaskEvent::TaskUnblocked { .. }))
            .count()
    };
    assert_eq!(unblocked(&first.events), 0);
    assert_eq!(unblocked(&second.events), 1);
    Ok(())
}
