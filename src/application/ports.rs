//! Ports (interfaces) for the application layer.
//!
//! The application layer depends on these traits only; infrastructure
//! provides the adapters (`SystemClock`, `ShardedStorage`, `MockClock`).

use std::borrow::Borrow;
use std::fmt::Debug;
use std::hash::Hash;

/// Port for obtaining the current time.
///
/// Admission decisions work in whole seconds since the Unix epoch.
pub trait Clock: Send + Sync + Debug {
    /// Current time in seconds since the Unix epoch.
    fn now(&self) -> u64;
}

/// Port for the concurrent host-to-record map.
///
/// Entries are added once at startup and are never removed or replaced
/// while serving, so values are only handed out by shared reference. Any
/// mutation goes through interior synchronization in the value itself.
pub trait Storage<K, V>: Send + Sync + Debug
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Send + Sync,
{
    /// Insert `value` under `key` unless the key is already present.
    ///
    /// # Returns
    /// `true` if the value was inserted, `false` if the key existed (the
    /// existing value is kept).
    fn insert_if_absent(&self, key: K, value: V) -> bool;

    /// Run `accessor` against the value stored under `key`.
    ///
    /// # Returns
    /// `None` if the key is absent, otherwise the accessor's result.
    fn with_entry<Q, F, R>(&self, key: &Q, accessor: F) -> Option<R>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        F: FnOnce(&V) -> R;

    /// Get the number of entries.
    fn len(&self) -> usize;

    /// Check if the storage is empty.
    fn is_empty(&self) -> bool;

    /// Iterate over all entries.
    fn for_each<F>(&self, f: F)
    where
        F: FnMut(&K, &V);
}
