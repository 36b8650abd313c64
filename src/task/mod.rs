//! Task lifecycle management for Trellis.
//!
//! Tasks move through `backlog → todo → in_progress → in_review → done`,
//! depend on each other through an acyclic graph, accumulate logged work
//! and may recur on a cadence. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
