//! Declarative plugin configuration
//!
//! Keys follow the gateway's plugin schema (`AuthorizationEndpointType`, ...).
//! A few values can be overridden from the environment.

use anyhow::{Context, Result};
use pep_core::{BackendType, CacheExpiry, PepConfig};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Raw plugin configuration, one per policy attachment
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct Config {
    /// Decision point type; only "Keyrock" is supported
    pub authorization_endpoint_type: String,

    /// Base URL of the decision point
    #[serde(default)]
    pub authorization_endpoint_address: String,

    /// Application id sent as `app-id`
    #[serde(default)]
    pub keyrock_app_id: String,

    /// Decision TTL in seconds: 0 = default (60s), -1 = caching disabled
    #[serde(default)]
    pub decision_cache_expiry_in_s: i64,

    /// Timeout for the decision call (unset: transport default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_request_timeout_in_ms: Option<u64>,
}

impl Config {
    /// Load configuration from a YAML file, then apply environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        Self::from_yaml(&contents)?.with_env_overrides()
    }

    /// Parse configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config =
            serde_yaml::from_str(yaml).with_context(|| "Failed to parse plugin config YAML")?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `PEP_*` environment variables on top of the file values
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Some(address) = parse::<String>("PEP_AUTHORIZATION_ENDPOINT_ADDRESS")? {
            self.authorization_endpoint_address = address;
        }
        if let Some(app_id) = parse::<String>("PEP_KEYROCK_APP_ID")? {
            self.keyrock_app_id = app_id;
        }
        if let Some(expiry) = parse::<i64>("PEP_DECISION_CACHE_EXPIRY_IN_S")? {
            self.decision_cache_expiry_in_s = expiry;
        }
        self.validate()?;
        Ok(self)
    }

    /// Reject values that can never work
    ///
    /// An unknown endpoint type is accepted here; requests under it are denied.
    pub fn validate(&self) -> Result<()> {
        CacheExpiry::from_seconds(self.decision_cache_expiry_in_s)?;
        if BackendType::parse(&self.authorization_endpoint_type) == BackendType::Keyrock {
            validate_uri(&self.authorization_endpoint_address)
                .context("AuthorizationEndpointAddress is invalid")?;
        }
        Ok(())
    }

    /// Resolve into the form the access controller runs with
    pub fn resolve(&self) -> Result<PepConfig> {
        Ok(PepConfig {
            backend: BackendType::parse(&self.authorization_endpoint_type),
            endpoint_address: self.authorization_endpoint_address.clone(),
            application_id: self.keyrock_app_id.clone(),
            cache_expiry: CacheExpiry::from_seconds(self.decision_cache_expiry_in_s)?,
            request_timeout: self.decision_request_timeout_in_ms.map(Duration::from_millis),
        })
    }
}

fn parse<T: FromStr>(env: &str) -> Result<Option<T>>
where
    <T as FromStr>::Err: ToString,
{
    match env::var(env) {
        Ok(val) => val.parse().map(Some).map_err(|e: <T as FromStr>::Err| {
            anyhow::anyhow!("invalid env var {}={} ({})", env, val, e.to_string())
        }),
        Err(_) => Ok(None),
    }
}

// tries to parse the URI so we can fail early
fn validate_uri(uri_str: &str) -> Result<()> {
    if uri_str.is_empty() {
        anyhow::bail!("address is required");
    }
    let uri = http::Uri::try_from(uri_str)?;
    if uri.scheme().is_none() {
        anyhow::bail!("address {uri_str} has no scheme");
    }
    Ok(())
}
