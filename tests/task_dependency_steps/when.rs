//! When steps for task dependency BDD scenarios.

use super::world::{DependencyWorld, run_async};
use rstest_bdd_macros::when;
use trellis::task::{
    domain::TaskRecord,
    services::{AddDependencyRequest, CompleteTaskRequest, LifecycleOutcome, TaskLifecycleError},
};

fn record(
    world: &mut DependencyWorld,
    title: String,
    result: Result<LifecycleOutcome<TaskRecord>, TaskLifecycleError>,
) {
    match result {
        Ok(outcome) => {
            world.last_events = outcome.events;
            world.tasks.insert(title, outcome.value.clone());
            world.last_result = Some(Ok(outcome.value));
        }
        Err(err) => {
            world.last_events.clear();
            world.last_result = Some(Err(err));
        }
    }
}

#[when(r#"task "{dependent}" is made to depend on task "{dependency}""#)]
fn make_dependency(
    world: &mut DependencyWorld,
    dependent: String,
    dependency: String,
) -> Result<(), eyre::Report> {
    let request = AddDependencyRequest::new(
        world.id_of(&dependent)?,
        world.id_of(&dependency)?,
        "scenario",
    );
    let result = run_async(world.service.add_dependency(request));
    record(world, dependent, result);
    Ok(())
}

#[when(r#"task "{title}" is completed"#)]
fn complete_task(world: &mut DependencyWorld, title: String) -> Result<(), eyre::Report> {
    let request = CompleteTaskRequest::new(world.id_of(&title)?, "scenario");
    let result = run_async(world.service.complete_task(request));
    record(world, title, result);
    Ok(())
}
