//! Application services for task lifecycle orchestration.

mod config;
mod lifecycle;
mod requests;

pub use config::LifecycleConfig;
pub use lifecycle::{LifecycleOutcome, TaskLifecycleError, TaskLifecycleResult, TaskLifecycleService};
pub use requests::{
    AddDependencyRequest, AssignUserRequest, BatchUpdateRequest, CompleteTaskRequest,
    ConfigureRecurrenceRequest, CreateTaskRequest, EstimateTimeRequest, GenerateOccurrenceRequest,
    LogTimeRequest, RemoveDependencyRequest, UnassignUserRequest, UpdateTaskRequest,
};
