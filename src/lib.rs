//! # vhost-throttle
//!
//! Per-virtual-host connection admission control for multi-tenant servers.
//!
//! Every incoming request to a virtual host is either admitted or rejected
//! (answered with 503 Service Unavailable) depending on how many requests
//! that host has seen recently. Each host is configured independently and
//! picks one of two limiting strategies.
//!
//! ## Quick Start
//!
//! ```rust
//! use vhost_throttle::{ConnectionLimitHandler, HookOutcome, RequestInfo, VirtualHostLimitConfig};
//!
//! // Two requests per 30 second window for this host
//! let handler = ConnectionLimitHandler::builder()
//!     .with_host("www.example.com", VirtualHostLimitConfig::fixed_window(2, 30).unwrap())
//!     .build()
//!     .unwrap();
//!
//! let request = RequestInfo::new("www.example.com").with_handler("php-script");
//! assert_eq!(handler.on_request(&request), HookOutcome::Continue);
//! assert_eq!(handler.on_request(&request), HookOutcome::Continue);
//! assert_eq!(handler.on_request(&request), HookOutcome::ServiceUnavailable);
//! ```
//!
//! ## Strategies
//!
//! ### Fixed window (default)
//! A counter per host that resets in bulk when its window ends. The first
//! request at or after the window end opens a new window of
//! `window_seconds` starting at that request. A request is rejected when
//! it is number `max_connections + 1` or later in its window.
//!
//! ### Sliding window
//! A ring of the last [`SLIDING_WINDOW_DEPTH`] (64) admission timestamps.
//! A request is rejected when the timestamp it pushes out of the ring is at
//! most `window_seconds` old, i.e. when 64 requests already happened within
//! the window. The effective rate is therefore `64 / window_seconds`,
//! independent of `max_connections`.
//!
//! ```rust
//! use std::sync::Arc;
//! use vhost_throttle::{
//!     AdmissionController, HostId, HostRecord, Metrics, ShardedStorage, SystemClock, Verdict,
//!     VirtualHostLimitConfig, WindowStore,
//! };
//!
//! let storage: Arc<ShardedStorage<HostId, HostRecord>> = Arc::new(ShardedStorage::new());
//! let store = WindowStore::new(storage);
//! store
//!     .create_host(HostId::new("s.example"), VirtualHostLimitConfig::sliding_window(10).unwrap())
//!     .unwrap();
//!
//! let controller = AdmissionController::new(store, Arc::new(SystemClock::new()), Metrics::new());
//! for _ in 0..64 {
//!     assert_eq!(controller.decide("s.example", 0), Verdict::Admit);
//! }
//! assert_eq!(controller.decide("s.example", 5), Verdict::Reject);
//! assert_eq!(controller.decide("s.example", 15), Verdict::Admit);
//! ```
//!
//! ## Configuration
//!
//! Hosts are configured with the server directives `ConnectionEnable`,
//! `ConnectionLimit`, `ConnectionUpdate` and `ConnectionStrategy` (see
//! [`VirtualHostLimitConfig::apply_directive`]), or, with the `config-file`
//! feature, from a TOML file of `[[host]]` tables (see
//! [`infrastructure::config_file`]). Invalid values are errors, never a
//! silent zero.
//!
//! ## Failure Behavior
//!
//! - Disabled hosts are always admitted and their state is never touched.
//! - A host with no registered state is admitted and a warning is logged.
//! - Status reporting never advances or resets a window.
//!
//! ## Thread Safety
//!
//! Each host's state sits behind its own lock. Requests for different hosts
//! never contend, and a fixed-window reset plus increment is a single step,
//! so no admission is lost or double counted under concurrency.
//!
//! ## Observability
//!
//! All logging goes through `tracing`: host registration at `info`, unknown
//! hosts at `warn`, rejections at `debug`. Outcome counters are available
//! through [`AdmissionController::metrics`]:
//!
//! ```rust
//! # use vhost_throttle::{ConnectionLimitHandler, RequestInfo};
//! # let handler = ConnectionLimitHandler::builder().build().unwrap();
//! handler.on_request(&RequestInfo::new("unregistered.example"));
//!
//! let snapshot = handler.metrics().snapshot();
//! assert_eq!(snapshot.requests_admitted, 1);
//! assert_eq!(snapshot.unknown_hosts, 1);
//! ```

// Domain layer - pure business logic
pub mod domain;

// Application layer - orchestration
pub mod application;

// Infrastructure layer - external adapters
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use domain::{
    config::{
        ConfigError, Strategy, VirtualHostLimitConfig, DEFAULT_MAX_CONNECTIONS,
        DEFAULT_WINDOW_SECONDS,
    },
    host::HostId,
    policy::{fixed_window_verdict, sliding_window_verdict, Verdict},
    report::{HostReport, ReportDetail},
    window::{
        FixedAdvance, FixedWindowState, SlidingWindowState, WindowSnapshot, WindowState,
        SLIDING_WINDOW_DEPTH,
    },
};

pub use application::{
    controller::AdmissionController,
    metrics::{Metrics, MetricsSnapshot},
    ports::{Clock, Storage},
    store::{HostRecord, StoreError, WindowStore},
};

pub use infrastructure::{
    clock::SystemClock,
    handler::{
        BuildError, ConnectionLimitHandler, ConnectionLimitHandlerBuilder, HookOutcome,
        RequestInfo, DEFAULT_ALWAYS_COUNTED_HANDLERS, DEFAULT_STATUS_HANDLER,
    },
    status::render_html,
    storage::ShardedStorage,
};

#[cfg(feature = "config-file")]
pub use infrastructure::config_file::{load_host_limits, parse_host_limits, ConfigFileError};
