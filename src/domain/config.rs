//! Per-virtual-host limit configuration.
//!
//! A [`VirtualHostLimitConfig`] is built once at configuration load time and
//! never changes afterwards. Values arrive either programmatically or as
//! server directives (`ConnectionEnable`, `ConnectionLimit`,
//! `ConnectionUpdate`, `ConnectionStrategy`), which are validated strictly:
//! a malformed number is an error, never a silent zero.

use std::fmt;
use std::str::FromStr;

/// Capacity per window used when `ConnectionLimit` is not set.
pub const DEFAULT_MAX_CONNECTIONS: u64 = 100;

/// Accounting period used when `ConnectionUpdate` is not set.
pub const DEFAULT_WINDOW_SECONDS: u64 = 30;

/// Limiting strategy applied to a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Strategy {
    /// Ring of the last 64 admission timestamps.
    ///
    /// Rejects when the admission 64 calls ago is younger than the window,
    /// so the effective limit is `64 / window_seconds` regardless of
    /// `max_connections`.
    SlidingWindow,
    /// Counter reset at fixed window boundaries, capped by `max_connections`.
    #[default]
    FixedWindow,
}

impl Strategy {
    /// Short lowercase name, as accepted by `ConnectionStrategy`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::SlidingWindow => "sliding",
            Strategy::FixedWindow => "fixed",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sliding" | "sliding_window" | "sliding-window" | "ring" => Ok(Strategy::SlidingWindow),
            "fixed" | "fixed_window" | "fixed-window" | "counter" => Ok(Strategy::FixedWindow),
            _ => Err(ConfigError::InvalidStrategy(s.to_string())),
        }
    }
}

/// Error raised while building a host configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A numeric directive did not parse as a non-negative integer.
    InvalidInteger {
        /// Directive name as written
        directive: String,
        /// Offending value
        value: String,
    },
    /// A boolean directive had an unrecognized value.
    InvalidBoolean {
        /// Directive name as written
        directive: String,
        /// Offending value
        value: String,
    },
    /// The accounting period must be at least one second.
    ZeroWindow,
    /// Unrecognized strategy name.
    InvalidStrategy(String),
    /// Directive name not handled by this module.
    UnknownDirective(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidInteger { directive, value } => {
                write!(
                    f,
                    "{} expects a non-negative integer, got {:?}",
                    directive, value
                )
            }
            ConfigError::InvalidBoolean { directive, value } => {
                write!(f, "{} expects on/off, got {:?}", directive, value)
            }
            ConfigError::ZeroWindow => write!(f, "update period must be at least 1 second"),
            ConfigError::InvalidStrategy(s) => {
                write!(f, "unknown strategy {:?} (expected sliding or fixed)", s)
            }
            ConfigError::UnknownDirective(d) => write!(f, "unknown directive {:?}", d),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Limit settings for one virtual host.
///
/// # Example
/// ```
/// use vhost_throttle::{Strategy, VirtualHostLimitConfig};
///
/// let mut config = VirtualHostLimitConfig::default();
/// config.apply_directive("ConnectionEnable", "on").unwrap();
/// config.apply_directive("ConnectionLimit", "2").unwrap();
/// config.apply_directive("ConnectionUpdate", "10").unwrap();
///
/// assert!(config.is_enabled());
/// assert_eq!(config.strategy(), Strategy::FixedWindow);
/// assert_eq!(config.max_connections(), 2);
/// assert_eq!(config.window_seconds(), 10);
///
/// assert!(config.apply_directive("ConnectionLimit", "lots").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualHostLimitConfig {
    enabled: bool,
    strategy: Strategy,
    window_seconds: u64,
    max_connections: u64,
}

impl Default for VirtualHostLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            strategy: Strategy::default(),
            window_seconds: DEFAULT_WINDOW_SECONDS,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl VirtualHostLimitConfig {
    /// Enabled fixed-window limit of `max_connections` per `window_seconds`.
    ///
    /// # Errors
    /// Returns `ConfigError::ZeroWindow` if `window_seconds` is zero.
    pub fn fixed_window(max_connections: u64, window_seconds: u64) -> Result<Self, ConfigError> {
        Ok(Self {
            enabled: true,
            strategy: Strategy::FixedWindow,
            window_seconds: validate_window(window_seconds)?,
            max_connections,
        })
    }

    /// Enabled sliding-window limit over `window_seconds`.
    ///
    /// # Errors
    /// Returns `ConfigError::ZeroWindow` if `window_seconds` is zero.
    pub fn sliding_window(window_seconds: u64) -> Result<Self, ConfigError> {
        Ok(Self {
            enabled: true,
            strategy: Strategy::SlidingWindow,
            window_seconds: validate_window(window_seconds)?,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        })
    }

    /// Same settings with limiting switched on or off.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Same settings under another strategy.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Same settings with another capacity per window.
    pub fn with_max_connections(mut self, max_connections: u64) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Same settings with another accounting period.
    ///
    /// # Errors
    /// Returns `ConfigError::ZeroWindow` if `window_seconds` is zero.
    pub fn with_window_seconds(mut self, window_seconds: u64) -> Result<Self, ConfigError> {
        self.window_seconds = validate_window(window_seconds)?;
        Ok(self)
    }

    /// Whether limiting applies to this host.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The limiting strategy.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Accounting period in seconds, always at least 1.
    pub fn window_seconds(&self) -> u64 {
        self.window_seconds
    }

    /// Capacity per window. Only the fixed-window strategy reads it.
    pub fn max_connections(&self) -> u64 {
        self.max_connections
    }

    /// Apply one server directive.
    ///
    /// Directive names are matched case-insensitively. On error the
    /// configuration is left unchanged.
    ///
    /// # Errors
    /// Returns a `ConfigError` describing the rejected name or value.
    pub fn apply_directive(&mut self, name: &str, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match name.trim().to_ascii_lowercase().as_str() {
            "connectionenable" => self.enabled = parse_bool(name, value)?,
            "connectionlimit" => self.max_connections = parse_u64(name, value)?,
            "connectionupdate" => {
                self.window_seconds = validate_window(parse_u64(name, value)?)?;
            }
            "connectionstrategy" => self.strategy = value.parse()?,
            _ => return Err(ConfigError::UnknownDirective(name.to_string())),
        }
        Ok(())
    }

    /// Build a configuration from `(name, value)` directive pairs, starting
    /// from the defaults. Later directives override earlier ones.
    ///
    /// # Errors
    /// Fails on the first rejected directive.
    pub fn from_directives<'a, I>(directives: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut config = Self::default();
        for (name, value) in directives {
            config.apply_directive(name, value)?;
        }
        Ok(config)
    }
}

fn validate_window(window_seconds: u64) -> Result<u64, ConfigError> {
    if window_seconds == 0 {
        Err(ConfigError::ZeroWindow)
    } else {
        Ok(window_seconds)
    }
}

fn parse_u64(directive: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidInteger {
        directive: directive.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(directive: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" => Ok(true),
        "off" | "false" | "no" => Ok(false),
        other => other
            .parse::<i64>()
            .map(|n| n != 0)
            .map_err(|_| ConfigError::InvalidBoolean {
                directive: directive.to_string(),
                value: value.to_string(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = VirtualHostLimitConfig::default();
        assert!(!config.is_enabled());
        assert_eq!(config.strategy(), Strategy::FixedWindow);
        assert_eq!(config.max_connections(), 100);
        assert_eq!(config.window_seconds(), 30);
    }

    #[test]
    fn test_constructors_reject_zero_window() {
        assert_eq!(
            VirtualHostLimitConfig::fixed_window(10, 0),
            Err(ConfigError::ZeroWindow)
        );
        assert_eq!(
            VirtualHostLimitConfig::sliding_window(0),
            Err(ConfigError::ZeroWindow)
        );
    }

    #[test]
    fn test_zero_limit_is_allowed() {
        let config = VirtualHostLimitConfig::fixed_window(0, 5).unwrap();
        assert_eq!(config.max_connections(), 0);
    }

    #[test]
    fn test_directives_case_insensitive() {
        let config = VirtualHostLimitConfig::from_directives([
            ("connectionenable", "1"),
            ("CONNECTIONLIMIT", "7"),
            ("ConnectionUpdate", " 12 "),
            ("ConnectionStrategy", "Sliding"),
        ])
        .unwrap();

        assert!(config.is_enabled());
        assert_eq!(config.max_connections(), 7);
        assert_eq!(config.window_seconds(), 12);
        assert_eq!(config.strategy(), Strategy::SlidingWindow);
    }

    #[test]
    fn test_bool_forms() {
        for (value, expected) in [
            ("on", true),
            ("Off", false),
            ("true", true),
            ("no", false),
            ("0", false),
            ("2", true),
        ] {
            let mut config = VirtualHostLimitConfig::default();
            config.apply_directive("ConnectionEnable", value).unwrap();
            assert_eq!(config.is_enabled(), expected, "value {:?}", value);
        }
    }

    #[test]
    fn test_non_numeric_limit_fails_loudly() {
        let mut config = VirtualHostLimitConfig::default();
        let err = config.apply_directive("ConnectionLimit", "ten").unwrap_err();

        assert_eq!(
            err,
            ConfigError::InvalidInteger {
                directive: "ConnectionLimit".to_string(),
                value: "ten".to_string(),
            }
        );
        // Previous value kept
        assert_eq!(config.max_connections(), DEFAULT_MAX_CONNECTIONS);
    }

    #[test]
    fn test_negative_values_rejected() {
        let mut config = VirtualHostLimitConfig::default();
        assert!(config.apply_directive("ConnectionLimit", "-1").is_err());
        assert!(config.apply_directive("ConnectionUpdate", "-30").is_err());
    }

    #[test]
    fn test_zero_update_period_rejected() {
        let mut config = VirtualHostLimitConfig::default();
        assert_eq!(
            config.apply_directive("ConnectionUpdate", "0"),
            Err(ConfigError::ZeroWindow)
        );
        assert_eq!(config.window_seconds(), DEFAULT_WINDOW_SECONDS);
    }

    #[test]
    fn test_unknown_directive() {
        let mut config = VirtualHostLimitConfig::default();
        assert_eq!(
            config.apply_directive("ConnectionBurst", "5"),
            Err(ConfigError::UnknownDirective("ConnectionBurst".to_string()))
        );
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!("fixed".parse::<Strategy>(), Ok(Strategy::FixedWindow));
        assert_eq!("ring".parse::<Strategy>(), Ok(Strategy::SlidingWindow));
        assert!("leaky".parse::<Strategy>().is_err());
    }

    #[test]
    fn test_error_display() {
        let err = ConfigError::InvalidInteger {
            directive: "ConnectionLimit".to_string(),
            value: "x".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "ConnectionLimit expects a non-negative integer, got \"x\""
        );
    }
}
