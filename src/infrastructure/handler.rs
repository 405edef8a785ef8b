//! Request hook for embedding the controller in a server.
//!
//! [`ConnectionLimitHandler`] is what a server calls once per request. It
//! serves the status page, skips requests that should not be counted, and
//! otherwise asks the [`AdmissionController`] for a verdict.

use crate::application::controller::AdmissionController;
use crate::application::metrics::Metrics;
use crate::application::ports::Clock;
use crate::application::store::{HostRecord, StoreError, WindowStore};
use crate::domain::config::VirtualHostLimitConfig;
use crate::domain::host::HostId;
use crate::domain::policy::Verdict;
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::status::{render_html, STATUS_CONTENT_TYPE};
use crate::infrastructure::storage::ShardedStorage;

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Handler name that serves the status page.
pub const DEFAULT_STATUS_HANDLER: &str = "connection_limit";

/// Handlers whose requests are counted even when they serve their own
/// content type.
pub const DEFAULT_ALWAYS_COUNTED_HANDLERS: [&str; 2] =
    ["application/x-httpd-php5", "application/x-httpd-php4"];

/// Storage used by the handler.
pub type SharedStorage = Arc<ShardedStorage<HostId, HostRecord>>;

/// Error returned when building a `ConnectionLimitHandler` fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// Host registration failed (a host configured twice)
    Store(StoreError),
    /// Status handler name must not be empty
    EmptyStatusHandler,
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::Store(e) => write!(f, "host registration failed: {}", e),
            BuildError::EmptyStatusHandler => write!(f, "status handler name must not be empty"),
        }
    }
}

impl std::error::Error for BuildError {}

impl From<StoreError> for BuildError {
    fn from(e: StoreError) -> Self {
        BuildError::Store(e)
    }
}

/// What the server needs to know about a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestInfo<'a> {
    /// Virtual host the request was routed to
    pub host: &'a str,
    /// Name of the handler selected for the request, if any
    pub handler: Option<&'a str>,
    /// Content type of the response, if already known
    pub content_type: Option<&'a str>,
}

impl<'a> RequestInfo<'a> {
    /// Request to `host` with no handler or content type.
    pub fn new(host: &'a str) -> Self {
        Self {
            host,
            handler: None,
            content_type: None,
        }
    }

    /// Same request with a handler name.
    pub fn with_handler(mut self, handler: &'a str) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Same request with a content type.
    pub fn with_content_type(mut self, content_type: &'a str) -> Self {
        self.content_type = Some(content_type);
        self
    }
}

/// What the server should do with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    /// Carry on with normal processing
    Continue,
    /// Refuse the request with 503 Service Unavailable
    ServiceUnavailable,
    /// Answer with this HTML status page
    StatusPage(String),
}

impl HookOutcome {
    /// HTTP status code to answer with, `None` to carry on.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            HookOutcome::Continue => None,
            HookOutcome::ServiceUnavailable => Some(503),
            HookOutcome::StatusPage(_) => Some(200),
        }
    }

    /// Content type of the response body this outcome carries, if any.
    pub fn content_type(&self) -> Option<&'static str> {
        match self {
            HookOutcome::StatusPage(_) => Some(STATUS_CONTENT_TYPE),
            HookOutcome::Continue | HookOutcome::ServiceUnavailable => None,
        }
    }
}

/// Builder for constructing a `ConnectionLimitHandler`.
#[derive(Debug)]
pub struct ConnectionLimitHandlerBuilder {
    hosts: Vec<(HostId, VirtualHostLimitConfig)>,
    clock: Option<Arc<dyn Clock>>,
    status_handler: String,
    always_counted: BTreeSet<String>,
}

impl ConnectionLimitHandlerBuilder {
    /// Register limits for one virtual host.
    pub fn with_host(mut self, host: impl Into<HostId>, config: VirtualHostLimitConfig) -> Self {
        self.hosts.push((host.into(), config));
        self
    }

    /// Register limits for several virtual hosts.
    ///
    /// Pairs with [`load_host_limits`](crate::infrastructure::config_file::load_host_limits)
    /// when the `config-file` feature is enabled.
    pub fn with_hosts<I>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = (HostId, VirtualHostLimitConfig)>,
    {
        self.hosts.extend(hosts);
        self
    }

    /// Set a custom clock (for testing).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Set the handler name that serves the status page.
    pub fn with_status_handler(mut self, name: impl Into<String>) -> Self {
        self.status_handler = name.into();
        self
    }

    /// Replace the handlers that are counted even when serving their own
    /// content type.
    pub fn with_always_counted_handlers<I, T>(mut self, handlers: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.always_counted = handlers
            .into_iter()
            .map(Into::into)
            .filter(|h: &String| !h.is_empty())
            .collect();
        self
    }

    /// Build the handler, registering every host.
    ///
    /// # Errors
    /// Returns `BuildError` if a host is configured twice or the status
    /// handler name is empty.
    pub fn build(self) -> Result<ConnectionLimitHandler, BuildError> {
        if self.status_handler.is_empty() {
            return Err(BuildError::EmptyStatusHandler);
        }

        let store = WindowStore::new(Arc::new(ShardedStorage::with_capacity(self.hosts.len())));
        for (host, config) in self.hosts {
            store.create_host(host, config)?;
        }

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock::new()));
        Ok(ConnectionLimitHandler {
            controller: AdmissionController::new(store, clock, Metrics::new()),
            status_handler: self.status_handler,
            always_counted: self.always_counted,
        })
    }
}

/// Per-request entry point.
///
/// Cheap to clone; clones share host state and metrics, so one handler can
/// be handed to every worker thread.
#[derive(Clone)]
pub struct ConnectionLimitHandler {
    controller: AdmissionController<SharedStorage>,
    status_handler: String,
    always_counted: BTreeSet<String>,
}

impl ConnectionLimitHandler {
    /// Create a builder with no hosts, the system clock, the
    /// `connection_limit` status handler and the PHP handlers always counted.
    pub fn builder() -> ConnectionLimitHandlerBuilder {
        ConnectionLimitHandlerBuilder {
            hosts: Vec::new(),
            clock: None,
            status_handler: DEFAULT_STATUS_HANDLER.to_string(),
            always_counted: DEFAULT_ALWAYS_COUNTED_HANDLERS
                .iter()
                .map(|h| h.to_string())
                .collect(),
        }
    }

    /// Handle one request.
    ///
    /// - The status handler gets the status page, and is not counted.
    /// - A request whose handler equals its content type is static content
    ///   and is not counted, unless the handler is always counted.
    /// - Everything else is counted against the host's limit.
    pub fn on_request(&self, request: &RequestInfo<'_>) -> HookOutcome {
        if request.handler == Some(self.status_handler.as_str()) {
            return HookOutcome::StatusPage(render_html(&self.controller.status_now()));
        }

        if self.is_uncounted(request) {
            debug!(host = request.host, "skipping uncounted request");
            return HookOutcome::Continue;
        }

        match self.controller.check(request.host) {
            Verdict::Admit => HookOutcome::Continue,
            Verdict::Reject => HookOutcome::ServiceUnavailable,
        }
    }

    fn is_uncounted(&self, request: &RequestInfo<'_>) -> bool {
        match (request.handler, request.content_type) {
            (Some(handler), Some(content_type)) => {
                handler == content_type && !self.always_counted.contains(handler)
            }
            _ => false,
        }
    }

    /// Get a reference to the admission controller.
    pub fn controller(&self) -> &AdmissionController<SharedStorage> {
        &self.controller
    }

    /// Get a reference to the metrics.
    pub fn metrics(&self) -> &Metrics {
        self.controller.metrics()
    }

    /// Name of the handler serving the status page.
    pub fn status_handler(&self) -> &str {
        &self.status_handler
    }
}

impl fmt::Debug for ConnectionLimitHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionLimitHandler")
            .field("hosts", &self.controller.store().len())
            .field("status_handler", &self.status_handler)
            .field("always_counted", &self.always_counted)
            .finish()
    }
}
