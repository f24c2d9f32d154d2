//! Runtime state for one policy attachment

use crate::config::Config;
use crate::http_host::HttpHost;
use anyhow::Result;
use http::{Request, Response};
use pep_core::{
    AccessController, AccessDecision, DecisionMetrics, DecisionTransport, PepConfig,
    ReqwestTransport,
};
use std::sync::Arc;
use tracing::info;

/// Access phase handler for one configuration attachment
///
/// Each instance owns its controller and therefore its own decision cache,
/// so attachments with different backends or TTLs never share entries.
pub struct PolicyInstance {
    controller: AccessController,
}

impl PolicyInstance {
    /// Build from the raw plugin config with the production transport
    pub fn from_config(config: &Config) -> Result<Self> {
        let resolved = config.resolve()?;
        info!(
            backend = %resolved.backend,
            endpoint = %resolved.endpoint_address,
            cache_expiry = ?resolved.cache_expiry,
            timeout = ?resolved.request_timeout,
            "policy instance created"
        );
        let transport = ReqwestTransport::default().with_timeout(resolved.request_timeout);
        Ok(Self::new(resolved, Arc::new(transport)))
    }

    /// Build with an explicit transport
    pub fn new(config: PepConfig, transport: Arc<dyn DecisionTransport>) -> Self {
        Self {
            controller: AccessController::new(config, transport),
        }
    }

    pub fn with_metrics(self, metrics: Arc<dyn DecisionMetrics>) -> Self {
        Self {
            controller: self.controller.with_metrics(metrics),
        }
    }

    pub fn controller(&self) -> &AccessController {
        &self.controller
    }

    /// Run the access phase for `req`
    ///
    /// `None` means forward the request unmodified; `Some` is the 403 to
    /// return instead.
    pub async fn handle<B>(&self, req: &Request<B>) -> Option<Response<String>> {
        self.check(req).await.1
    }

    /// Like `handle`, also returning the decision
    pub async fn check<B>(&self, req: &Request<B>) -> (AccessDecision, Option<Response<String>>) {
        let mut host = HttpHost::new(req);
        let decision = self.controller.access(&mut host).await;
        (decision, host.into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pep_core::{BackendType, CacheExpiry};
    use std::time::Duration;

    #[tokio::test]
    async fn test_from_config_resolves_settings() {
        let yaml = "\
AuthorizationEndpointType: Keyrock
AuthorizationEndpointAddress: \"http://keyrock.local/user\"
KeyrockAppId: app-1
DecisionCacheExpiryInS: 30
DecisionRequestTimeoutInMs: 250
";
        let policy = PolicyInstance::from_config(&Config::from_yaml(yaml).unwrap()).unwrap();
        let config = policy.controller().config();

        assert_eq!(config.backend, BackendType::Keyrock);
        assert_eq!(config.cache_expiry, CacheExpiry::Seconds(30));
        assert_eq!(config.request_timeout, Some(Duration::from_millis(250)));
        assert_eq!(policy.controller().cache().ttl(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_from_config_rejects_invalid_expiry() {
        let yaml = "\
AuthorizationEndpointType: Keyrock
AuthorizationEndpointAddress: \"http://keyrock.local/user\"
DecisionCacheExpiryInS: -5
";
        assert!(Config::from_yaml(yaml)
            .and_then(|c| PolicyInstance::from_config(&c))
            .is_err());
    }
}
