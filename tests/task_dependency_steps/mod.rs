//! Step definitions for task dependency scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
