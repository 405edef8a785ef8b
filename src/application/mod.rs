//! Application layer - orchestration of domain logic.
//!
//! This layer coordinates the domain logic at runtime:
//! - Window store (shared per-host state)
//! - Admission controller (decision making and status reporting)
//! - Metrics (outcome counters)
//!
//! ## Ports
//!
//! The application layer defines ports (traits) that infrastructure
//! adapters implement, keeping it independent from clocks and maps.

pub mod controller;
pub mod metrics;
pub mod ports;
pub mod store;
