//! Given steps for task dependency BDD scenarios.

use super::world::{DependencyWorld, run_async};
use eyre::WrapErr;
use trellis::task::services::{
    AddDependencyRequest, CompleteTaskRequest, CreateTaskRequest, LifecycleConfig,
};
use rstest_bdd_macros::given;

#[given("dependency enforcement is enabled")]
fn enforcement_enabled(world: &mut DependencyWorld) {
    *world = DependencyWorld::with_config(LifecycleConfig {
        enforce_blocking_dependencies: true,
        ..LifecycleConfig::default()
    });
}

#[given(r#"tasks "{first}", "{second}" and "{third}" exist"#)]
fn tasks_exist(
    world: &mut DependencyWorld,
    first: String,
    second: String,
    third: String,
) -> Result<(), eyre::Report> {
    for title in [first, second, third] {
        let created = run_async(
            world
                .service
                .create_task(CreateTaskRequest::new(title.as_str(), "scenario")),
        )
        .wrap_err_with(|| format!("create task {title}"))?;
        world.tasks.insert(title, created.value);
    }
    Ok(())
}

#[given(r#"task "{dependent}" depends on task "{dependency}""#)]
fn task_depends_on(
    world: &mut DependencyWorld,
    dependent: String,
    dependency: String,
) -> Result<(), eyre::Report> {
    let request = AddDependencyRequest::new(
        world.id_of(&dependent)?,
        world.id_of(&dependency)?,
        "scenario",
    );
    let outcome = run_async(world.service.add_dependency(request))
        .wrap_err("add dependency in scenario setup")?;
    world.tasks.insert(dependent, outcome.value);
    Ok(())
}

#[given(r#"task "{title}" has been completed"#)]
fn task_has_been_completed(world: &mut DependencyWorld, title: String) -> Result<(), eyre::Report> {
    let request = CompleteTaskRequest::new(world.id_of(&title)?, "scenario");
    let outcome = run_async(world.service.complete_task(request))
        .wrap_err("complete task in scenario setup")?;
    world.tasks.insert(title, outcome.value);
    Ok(())
}
