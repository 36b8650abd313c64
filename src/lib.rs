//! Trellis: task lifecycle, dependency and recurrence engine.
//!
//! This crate decides whether task mutations are legal and computes their
//! results: status transitions with completion metadata, cycle-free
//! dependency edges, cumulative time tracking, and generation of recurring
//! task occurrences. Storage, authorization and notification delivery stay
//! with the caller.
//!
//! # Architecture
//!
//! Trellis follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for persistence
//! - **Adapters**: Concrete implementations of ports (in-memory store)
//!
//! # Modules
//!
//! - [`task`]: Task records, the dependency graph, recurrence and the
//!   lifecycle service

pub mod task;
