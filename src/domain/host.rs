//! Virtual host identity.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Identifies one virtual host served by this process.
///
/// Host names are compared exactly; callers normalize case (if they need to)
/// before registering or deciding. Cloning is cheap since the name is shared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostId(Arc<str>);

impl HostId {
    /// Create a host identifier from its server name.
    pub fn new(name: impl AsRef<str>) -> Self {
        HostId(Arc::from(name.as_ref()))
    }

    /// The host name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for HostId {
    fn from(name: &str) -> Self {
        HostId::new(name)
    }
}

impl From<String> for HostId {
    fn from(name: String) -> Self {
        HostId(Arc::from(name))
    }
}

impl Borrow<str> for HostId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for HostId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
