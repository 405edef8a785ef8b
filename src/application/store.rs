//! Shared per-host window state.
//!
//! The [`WindowStore`] maps each virtual host to a [`HostRecord`] holding its
//! immutable configuration and its accounting state. Records are created
//! once at startup and live until the store is dropped. Each record sits
//! behind its own lock, so requests for different hosts never wait on each
//! other, and a fixed-window reset and increment happen as one step.

use crate::application::ports::Storage;
use crate::domain::config::{Strategy, VirtualHostLimitConfig};
use crate::domain::host::HostId;
use crate::domain::window::{FixedAdvance, WindowSnapshot, WindowState};
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use tracing::{error, info};

/// Error returned by window store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No record was created for this host
    UnknownHost(String),
    /// A record for this host already exists
    DuplicateHost(HostId),
    /// The operation targets the other strategy's state
    StrategyMismatch {
        /// Host the operation was aimed at
        host: HostId,
        /// Strategy the operation works on
        expected: Strategy,
        /// Strategy the host is configured with
        actual: Strategy,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::UnknownHost(host) => write!(f, "no window state for host {}", host),
            StoreError::DuplicateHost(host) => {
                write!(f, "window state for host {} already exists", host)
            }
            StoreError::StrategyMismatch {
                host,
                expected,
                actual,
            } => write!(
                f,
                "host {} uses the {} strategy, not {}",
                host, actual, expected
            ),
        }
    }
}

impl std::error::Error for StoreError {}

/// Strategy mismatch detected on a record, before the host name is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrongStrategy {
    /// Strategy the operation works on
    pub expected: Strategy,
    /// Strategy the record holds
    pub actual: Strategy,
}

/// State kept for one virtual host.
#[derive(Debug)]
pub struct HostRecord {
    host: HostId,
    config: VirtualHostLimitConfig,
    state: Mutex<WindowState>,
}

impl HostRecord {
    /// Zero-initialized record for `host` under `config`.
    pub fn new(host: HostId, config: VirtualHostLimitConfig) -> Self {
        Self {
            host,
            state: Mutex::new(WindowState::for_strategy(config.strategy())),
            config,
        }
    }

    /// The host this record belongs to.
    pub fn host(&self) -> &HostId {
        &self.host
    }

    /// Configuration the host was registered with.
    pub fn config(&self) -> &VirtualHostLimitConfig {
        &self.config
    }

    /// Copy of configuration and counters.
    pub fn snapshot(&self) -> WindowSnapshot {
        WindowSnapshot {
            config: self.config,
            state: self.lock().clone(),
        }
    }

    /// Advance the sliding-window ring, returning the evicted timestamp.
    pub fn advance_sliding_window(&self, now: u64) -> Result<Option<u64>, WrongStrategy> {
        match &mut *self.lock() {
            WindowState::Sliding(ring) => Ok(ring.advance(now)),
            other => Err(WrongStrategy {
                expected: Strategy::SlidingWindow,
                actual: other.strategy(),
            }),
        }
    }

    /// Advance the fixed-window counter by one request.
    pub fn advance_fixed_window(&self, now: u64) -> Result<FixedAdvance, WrongStrategy> {
        let window_seconds = self.config.window_seconds();
        match &mut *self.lock() {
            WindowState::Fixed(window) => Ok(window.advance(now, window_seconds)),
            other => Err(WrongStrategy {
                expected: Strategy::FixedWindow,
                actual: other.strategy(),
            }),
        }
    }

    // Every update leaves the state consistent, so a panic elsewhere while
    // holding the lock cannot leave a torn record behind.
    fn lock(&self) -> MutexGuard<'_, WindowState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            error!(host = %self.host, "window state lock poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

/// Process-wide registry of per-host window state.
///
/// Generic over the storage implementation. In production, use
/// `Arc<ShardedStorage<HostId, HostRecord>>`.
#[derive(Clone)]
pub struct WindowStore<S>
where
    S: Storage<HostId, HostRecord> + Clone,
{
    storage: S,
}

impl<S> WindowStore<S>
where
    S: Storage<HostId, HostRecord> + Clone,
{
    /// Create a store over empty storage.
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Allocate zero-initialized state for a host.
    ///
    /// Sliding-window hosts start with every ring slot unfilled and the
    /// cursor at 0; fixed-window hosts start with a window ending at 0, so
    /// the first request opens a fresh window.
    ///
    /// # Errors
    /// Returns `StoreError::DuplicateHost` if the host is already registered.
    /// The existing record is kept.
    pub fn create_host(
        &self,
        host: HostId,
        config: VirtualHostLimitConfig,
    ) -> Result<(), StoreError> {
        let record = HostRecord::new(host.clone(), config);
        if !self.storage.insert_if_absent(host.clone(), record) {
            return Err(StoreError::DuplicateHost(host));
        }

        info!(
            host = %host,
            enabled = config.is_enabled(),
            strategy = %config.strategy(),
            window_seconds = config.window_seconds(),
            max_connections = config.max_connections(),
            "registered virtual host"
        );
        Ok(())
    }

    /// Run `f` against a host's record.
    ///
    /// # Errors
    /// Returns `StoreError::UnknownHost` if the host has no record.
    pub fn with_record<F, R>(&self, host: &str, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&HostRecord) -> R,
    {
        self.storage
            .with_entry(host, f)
            .ok_or_else(|| StoreError::UnknownHost(host.to_string()))
    }

    /// Copy of a host's configuration and counters.
    ///
    /// Holds the host's lock only for the duration of the copy.
    ///
    /// # Errors
    /// Returns `StoreError::UnknownHost` if the host has no record.
    pub fn read(&self, host: &str) -> Result<WindowSnapshot, StoreError> {
        self.with_record(host, HostRecord::snapshot)
    }

    /// Configuration a host was registered with.
    pub fn config(&self, host: &str) -> Option<VirtualHostLimitConfig> {
        self.storage.with_entry(host, |record| *record.config())
    }

    /// Write `now` into the ring slot at the cursor, advance the cursor, and
    /// return the timestamp that slot held (`None` if it was never filled).
    ///
    /// # Errors
    /// `UnknownHost` for unregistered hosts, `StrategyMismatch` for
    /// fixed-window hosts.
    pub fn advance_sliding_window(&self, host: &str, now: u64) -> Result<Option<u64>, StoreError> {
        self.with_record(host, |record| {
            record
                .advance_sliding_window(now)
                .map_err(|wrong| mismatch(record, wrong))
        })?
    }

    /// Count one request in the fixed window, resetting the window first if
    /// `now` has reached its end.
    ///
    /// # Errors
    /// `UnknownHost` for unregistered hosts, `StrategyMismatch` for
    /// sliding-window hosts.
    pub fn advance_fixed_window(&self, host: &str, now: u64) -> Result<FixedAdvance, StoreError> {
        self.with_record(host, |record| {
            record
                .advance_fixed_window(now)
                .map_err(|wrong| mismatch(record, wrong))
        })?
    }

    /// Iterate over all host records.
    pub fn for_each<F>(&self, f: F)
    where
        F: FnMut(&HostId, &HostRecord),
    {
        self.storage.for_each(f);
    }

    /// Get the number of registered hosts.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Check if no host is registered.
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

fn mismatch(record: &HostRecord, wrong: WrongStrategy) -> StoreError {
    StoreError::StrategyMismatch {
        host: record.host().clone(),
        expected: wrong.expected,
        actual: wrong.actual,
    }
}
