//! Resolved policy configuration
//!
//! One `PepConfig` exists per policy attachment and is immutable for its
//! lifetime. Parsing the declarative host configuration into this form is the
//! gateway's job.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Decision TTL used when the configured expiry is `0`
pub const DEFAULT_EXPIRY: Duration = Duration::from_secs(60);

/// Error type for configuration values that cannot be resolved
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("decision cache expiry must be -1, 0 or positive, got {0}")]
    InvalidExpiry(i64),
}

/// Remote policy backend queried for decisions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendType {
    Keyrock,
    /// Any other configured value. Requests are always denied.
    Unrecognized(String),
}

impl BackendType {
    pub fn parse(value: &str) -> Self {
        match value {
            "Keyrock" => BackendType::Keyrock,
            other => BackendType::Unrecognized(other.to_string()),
        }
    }
}

impl fmt::Display for BackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendType::Keyrock => f.write_str("Keyrock"),
            BackendType::Unrecognized(s) => f.write_str(s),
        }
    }
}

/// Lifetime of cached permit decisions
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CacheExpiry {
    /// 60 seconds
    #[default]
    Default,
    Seconds(u64),
    /// No decision is ever cached
    Disabled,
}

impl CacheExpiry {
    /// Resolve the declarative integer form: `0` is the default, `-1` disables caching.
    pub fn from_seconds(value: i64) -> Result<Self, ConfigError> {
        match value {
            -1 => Ok(CacheExpiry::Disabled),
            0 => Ok(CacheExpiry::Default),
            v if v > 0 => Ok(CacheExpiry::Seconds(v as u64)),
            v => Err(ConfigError::InvalidExpiry(v)),
        }
    }

    /// Effective TTL, or `None` when caching is disabled
    pub fn ttl(&self) -> Option<Duration> {
        match self {
            CacheExpiry::Default => Some(DEFAULT_EXPIRY),
            CacheExpiry::Seconds(s) => Some(Duration::from_secs(*s)),
            CacheExpiry::Disabled => None,
        }
    }
}

/// Configuration for a single policy instance
#[derive(Clone, Debug)]
pub struct PepConfig {
    pub backend: BackendType,
    /// Base URL of the decision point
    pub endpoint_address: String,
    /// Sent as `app-id` with every decision query
    pub application_id: String,
    pub cache_expiry: CacheExpiry,
    /// Per-request timeout for the decision call. `None` leaves it to the transport.
    pub request_timeout: Option<Duration>,
}

impl PepConfig {
    pub fn keyrock(endpoint_address: impl Into<String>, application_id: impl Into<String>) -> Self {
        Self {
            backend: BackendType::Keyrock,
            endpoint_address: endpoint_address.into(),
            application_id: application_id.into(),
            cache_expiry: CacheExpiry::Default,
            request_timeout: None,
        }
    }

    pub fn with_cache_expiry(mut self, cache_expiry: CacheExpiry) -> Self {
        self.cache_expiry = cache_expiry;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_resolution() {
        assert_eq!(CacheExpiry::from_seconds(0), Ok(CacheExpiry::Default));
        assert_eq!(CacheExpiry::from_seconds(-1), Ok(CacheExpiry::Disabled));
        assert_eq!(CacheExpiry::from_seconds(300), Ok(CacheExpiry::Seconds(300)));
        assert_eq!(
            CacheExpiry::from_seconds(-5),
            Err(ConfigError::InvalidExpiry(-5))
        );
    }

    #[test]
    fn test_expiry_ttl() {
        assert_eq!(CacheExpiry::Default.ttl(), Some(Duration::from_secs(60)));
        assert_eq!(CacheExpiry::Seconds(5).ttl(), Some(Duration::from_secs(5)));
        assert_eq!(CacheExpiry::Disabled.ttl(), None);
    }

    #[test]
    fn test_backend_type_exact_match() {
        assert_eq!(BackendType::parse("Keyrock"), BackendType::Keyrock);
        assert_eq!(
            BackendType::parse("keyrock"),
            BackendType::Unrecognized("keyrock".to_string())
        );
        assert_eq!(BackendType::parse("OPA").to_string(), "OPA");
    }
}
