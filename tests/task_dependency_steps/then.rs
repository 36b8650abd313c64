//! Then steps for task dependency BDD scenarios.

use super::world::{DependencyWorld, run_async};
use rstest_bdd_macros::then;
use trellis::task::{
    domain::{TaskDomainError, TaskEvent},
    services::TaskLifecycleError,
};

#[then("the dependency is rejected as a cycle")]
fn dependency_rejected_as_cycle(world: &DependencyWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing dependency result"))?;

    if !matches!(
        result,
        Err(TaskLifecycleError::Domain(TaskDomainError::DependencyCycle { .. }))
    ) {
        return Err(eyre::eyre!("expected DependencyCycle error, got {result:?}"));
    }

    Ok(())
}

#[then(r#"task "{title}" has no dependencies"#)]
fn task_has_no_dependencies(world: &DependencyWorld, title: String) -> Result<(), eyre::Report> {
    let stored = run_async(world.service.find_task(world.id_of(&title)?))?;
    if !stored.dependencies().is_empty() {
        return Err(eyre::eyre!(
            "expected no dependencies on {title}, found {:?}",
            stored.dependency_ids()
        ));
    }
    Ok(())
}

#[then(r#"task "{title}" is reported as unblocked"#)]
fn task_reported_unblocked(world: &DependencyWorld, title: String) -> Result<(), eyre::Report> {
    let expected = world.id_of(&title)?;
    let unblocked: Vec<_> = world
        .last_events
        .iter()
        .filter_map(|event| match event {
            TaskEvent::TaskUnblocked { task, .. } => Some(*task),
            _ => None,
        })
        .collect();

    if unblocked != vec![expected] {
        return Err(eyre::eyre!(
            "expected only {title} to be unblocked, got {unblocked:?}"
        ));
    }
    Ok(())
}

#[then(r#"completion is refused because task "{title}" is unfinished"#)]
fn completion_refused(world: &DependencyWorld, title: String) -> Result<(), eyre::Report> {
    let blocker = world.id_of(&title)?;
    let result = world
        .last_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing completion result"))?;

    match result {
        Err(TaskLifecycleError::Domain(TaskDomainError::BlockingDependenciesIncomplete {
            pending,
            ..
        })) if *pending == vec![blocker] => Ok(()),
        other => Err(eyre::eyre!(
            "expected BlockingDependenciesIncomplete on {title}, got {other:?}"
        )),
    }
}
