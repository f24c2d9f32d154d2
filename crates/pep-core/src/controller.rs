//! Access controller
//!
//! Runs once per request: fingerprint -> cache -> decision point -> cache
//! write on permit. Anything short of an explicit permit ends in a 403.

use crate::cache::DecisionCache;
use crate::client::{DecisionTransport, KeyrockClient, RemoteDecision};
use crate::config::{BackendType, CacheExpiry, PepConfig};
use crate::fingerprint::AuthorizationQuery;
use crate::header::clean_auth_header;
use crate::host::{Host, HostError};
use crate::metrics::{DecisionMetrics, NoopMetrics};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tracing::{debug, error, info};

/// Header carrying the bearer token
pub const AUTHORIZATION_HEADER: &str = "authorization";

/// Status returned to the client on every denial
pub const FORBIDDEN: u16 = 403;

/// Where an allow decision came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionSource {
    Cache,
    Remote,
}

/// Why a request was denied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// Configured backend type is not supported
    UnrecognizedBackend,
    /// Method, path or authorization header could not be read
    InvalidRequest,
    /// The decision point answered with something other than a permit
    Policy,
    /// The decision point could not be asked or gave no usable answer
    Indeterminate,
}

/// Final outcome of the access phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// Forward the request unmodified
    Allow { source: DecisionSource },
    /// Short-circuit with `status` and `message` as the body
    Deny {
        status: u16,
        message: String,
        reason: DenyReason,
    },
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allow { .. })
    }

    pub fn source(&self) -> Option<DecisionSource> {
        match self {
            AccessDecision::Allow { source } => Some(*source),
            AccessDecision::Deny { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<DenyReason> {
        match self {
            AccessDecision::Allow { .. } => None,
            AccessDecision::Deny { reason, .. } => Some(*reason),
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum ExtractError {
    #[error(transparent)]
    Host(#[from] HostError),
    #[error("no authorization header was provided")]
    MissingHeader,
}

struct RequestFacts {
    method: String,
    path: String,
    header: String,
}

fn extract<H: Host + ?Sized>(host: &H) -> Result<RequestFacts, ExtractError> {
    let method = host.method()?;
    let path = host.path()?;
    let header = host
        .header(AUTHORIZATION_HEADER)?
        .ok_or(ExtractError::MissingHeader)?;
    Ok(RequestFacts {
        method,
        path,
        header,
    })
}

/// Policy enforcement for one configuration attachment
///
/// Owns the decision cache of that attachment; it is created on first use
/// and never re-created.
pub struct AccessController {
    config: PepConfig,
    client: KeyrockClient,
    cache: OnceLock<DecisionCache>,
    metrics: Arc<dyn DecisionMetrics>,
}

impl AccessController {
    pub fn new(config: PepConfig, transport: Arc<dyn DecisionTransport>) -> Self {
        let client = KeyrockClient::new(
            config.endpoint_address.clone(),
            config.application_id.clone(),
            transport,
        );
        Self {
            config,
            client,
            cache: OnceLock::new(),
            metrics: Arc::new(NoopMetrics),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn DecisionMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Use `cache` instead of building one from the configured expiry on first use
    pub fn with_cache(self, cache: DecisionCache) -> Self {
        // a fresh OnceLock cannot be occupied yet
        let _ = self.cache.set(cache);
        self
    }

    pub fn config(&self) -> &PepConfig {
        &self.config
    }

    /// The decision cache, created on first access
    pub fn cache(&self) -> &DecisionCache {
        self.cache.get_or_init(|| {
            match self.config.cache_expiry {
                CacheExpiry::Disabled => info!("[Keyrock] decision caching is disabled"),
                CacheExpiry::Default => info!(
                    expiry_s = crate::config::DEFAULT_EXPIRY.as_secs(),
                    "[Keyrock] using default decision expiry"
                ),
                CacheExpiry::Seconds(s) => debug!(expiry_s = s, "[Keyrock] decision cache created"),
            }
            DecisionCache::new(self.config.cache_expiry)
        })
    }

    /// Body of the 403 response
    pub fn forbidden_message(&self) -> String {
        format!(
            "Request forbidden by authorization service {}.",
            self.config.backend
        )
    }

    /// Run the access phase against `host`
    ///
    /// On denial the host is told to exit with 403; on allow it is left alone.
    pub async fn access<H: Host + ?Sized>(&self, host: &mut H) -> AccessDecision {
        let decision = self.decide(host).await;
        match &decision {
            AccessDecision::Deny {
                status,
                message,
                reason,
            } => {
                info!(backend = %self.config.backend, ?reason, "request was not allowed");
                host.exit(*status, message.clone(), HashMap::new());
            }
            AccessDecision::Allow { source } => debug!(?source, "request was allowed"),
        }
        decision
    }

    /// Decide without touching the response
    pub async fn decide<H: Host + ?Sized>(&self, host: &H) -> AccessDecision {
        let start = Instant::now();
        let decision = match &self.config.backend {
            BackendType::Keyrock => self.authorize_at_keyrock(host).await,
            BackendType::Unrecognized(name) => {
                error!(backend = %name, "unrecognized authorization endpoint type");
                self.metrics.record_decision("deny_backend");
                self.deny(DenyReason::UnrecognizedBackend)
            }
        };
        self.metrics.record_latency(start.elapsed().as_secs_f64());
        decision
    }

    async fn authorize_at_keyrock<H: Host + ?Sized>(&self, host: &H) -> AccessDecision {
        let facts = match extract(host) {
            Ok(facts) => facts,
            Err(e) => {
                error!(error = %e, "[Keyrock] unable to read request");
                self.metrics.record_decision("deny_request");
                return self.deny(DenyReason::InvalidRequest);
            }
        };
        let token = clean_auth_header(&facts.header);
        if token.is_empty() {
            error!("[Keyrock] authorization header carries no token");
            self.metrics.record_decision("deny_request");
            return self.deny(DenyReason::InvalidRequest);
        }

        let key = AuthorizationQuery::new(&facts.method, &facts.path, token).fingerprint();
        let cache = self.cache();
        if cache.lookup(&key) {
            info!(fingerprint = %key, "[Keyrock] found cached decision");
            self.metrics.record_decision("allow_cache");
            return AccessDecision::Allow {
                source: DecisionSource::Cache,
            };
        }

        let remote_start = Instant::now();
        let remote = self.client.authorize(&facts.method, &facts.path, token).await;
        self.metrics
            .record_remote_rtt(remote_start.elapsed().as_secs_f64());

        match remote {
            RemoteDecision::Permit => {
                cache.store(&key);
                debug!(fingerprint = %key, "[Keyrock] successfully authorized the request");
                self.metrics.record_decision("allow_remote");
                AccessDecision::Allow {
                    source: DecisionSource::Remote,
                }
            }
            RemoteDecision::Deny { decision } => {
                info!(fingerprint = %key, %decision, "[Keyrock] request was not allowed");
                self.metrics.record_decision("deny_remote");
                self.deny(DenyReason::Policy)
            }
            RemoteDecision::Indeterminate(e) => {
                error!(
                    fingerprint = %key,
                    endpoint = %self.client.endpoint_address(),
                    error = %e,
                    "[Keyrock] no usable authorization decision"
                );
                self.metrics.record_decision("deny_error");
                self.deny(DenyReason::Indeterminate)
            }
        }
    }

    fn deny(&self, reason: DenyReason) -> AccessDecision {
        AccessDecision::Deny {
            status: FORBIDDEN,
            message: self.forbidden_message(),
            reason,
        }
    }
}
