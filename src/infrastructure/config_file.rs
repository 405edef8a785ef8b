//! Host limits loaded from a TOML file.
//!
//! ```toml
//! [[host]]
//! name = "www.example.com"
//! enable = true
//! limit = 200
//! update_period = 30
//! strategy = "fixed"
//!
//! [[host]]
//! name = "static.example.com"
//! enable = true
//! strategy = "sliding"
//! update_period = 10
//! ```
//!
//! Every key except `name` is optional and falls back to the directive
//! defaults (disabled, limit 100, period 30s, fixed window).

use crate::domain::config::{ConfigError, Strategy, VirtualHostLimitConfig};
use crate::domain::host::HostId;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

/// Error raised while loading a host limit file.
#[derive(Debug)]
pub enum ConfigFileError {
    /// The file could not be read
    Io(std::io::Error),
    /// The document is not valid TOML or has the wrong shape
    Toml(toml::de::Error),
    /// A host table holds an invalid value
    Config {
        /// Host the table describes
        host: String,
        /// What was wrong with it
        source: ConfigError,
    },
    /// Two tables describe the same host
    DuplicateHost(String),
}

impl fmt::Display for ConfigFileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigFileError::Io(e) => write!(f, "failed to read host limit file: {}", e),
            ConfigFileError::Toml(e) => write!(f, "failed to parse host limit file: {}", e),
            ConfigFileError::Config { host, source } => {
                write!(f, "invalid limits for host {}: {}", host, source)
            }
            ConfigFileError::DuplicateHost(host) => {
                write!(f, "host {} is configured more than once", host)
            }
        }
    }
}

impl std::error::Error for ConfigFileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigFileError::Io(e) => Some(e),
            ConfigFileError::Toml(e) => Some(e),
            ConfigFileError::Config { source, .. } => Some(source),
            ConfigFileError::DuplicateHost(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigFileError {
    fn from(e: std::io::Error) -> Self {
        ConfigFileError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigFileError {
    fn from(e: toml::de::Error) -> Self {
        ConfigFileError::Toml(e)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LimitFile {
    #[serde(default, rename = "host")]
    hosts: Vec<RawHostLimits>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawHostLimits {
    name: String,
    #[serde(default)]
    enable: bool,
    limit: Option<u64>,
    update_period: Option<u64>,
    strategy: Option<String>,
}

impl RawHostLimits {
    fn into_config(self) -> Result<(HostId, VirtualHostLimitConfig), ConfigFileError> {
        let invalid = |source| ConfigFileError::Config {
            host: self.name.clone(),
            source,
        };

        let mut config = VirtualHostLimitConfig::default().with_enabled(self.enable);
        if let Some(strategy) = &self.strategy {
            config = config.with_strategy(strategy.parse::<Strategy>().map_err(invalid)?);
        }
        if let Some(limit) = self.limit {
            config = config.with_max_connections(limit);
        }
        if let Some(period) = self.update_period {
            config = config.with_window_seconds(period).map_err(invalid)?;
        }

        Ok((HostId::new(&self.name), config))
    }
}

/// Parse host limits from a TOML document, in file order.
///
/// # Errors
/// Fails on malformed TOML, unknown keys, invalid values (a zero update
/// period, a negative limit, an unknown strategy) and duplicate host names.
pub fn parse_host_limits(
    document: &str,
) -> Result<Vec<(HostId, VirtualHostLimitConfig)>, ConfigFileError> {
    let file: LimitFile = toml::from_str(document)?;

    let mut seen = HashSet::with_capacity(file.hosts.len());
    let mut hosts = Vec::with_capacity(file.hosts.len());
    for raw in file.hosts {
        if !seen.insert(raw.name.clone()) {
            return Err(ConfigFileError::DuplicateHost(raw.name));
        }
        hosts.push(raw.into_config()?);
    }
    Ok(hosts)
}

/// Read and parse a host limit file.
///
/// # Errors
/// See [`parse_host_limits`]; additionally fails if the file cannot be read.
pub fn load_host_limits<P: AsRef<Path>>(
    path: P,
) -> Result<Vec<(HostId, VirtualHostLimitConfig)>, ConfigFileError> {
    let document = fs::read_to_string(path.as_ref())?;
    parse_host_limits(&document)
}
