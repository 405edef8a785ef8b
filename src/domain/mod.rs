//! Domain layer - pure admission-control logic with no external dependencies.
//!
//! This layer contains the core concepts and invariants:
//! - Host identity and per-host limit configuration
//! - Sliding-window ring and fixed-window counter bookkeeping
//! - Admission rules turning a window advance into a verdict
//! - Status rows derived from snapshots
//!
//! All types in this layer are plain data and easily testable.

pub mod config;
pub mod host;
pub mod policy;
pub mod report;
pub mod window;
