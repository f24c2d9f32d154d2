//! pep-core: authorization decision pipeline for a policy enforcement point
//!
//! For every inbound request the access controller decides whether to
//! forward it or answer 403, asking a remote policy decision point (Keyrock)
//! and caching permits to bound the added latency.
//!
//! # Features
//!
//! - **Decision cache**: in-memory TTL cache of permit decisions only
//! - **Fingerprints**: SHA-256 keys over (method, path, token); raw tokens are never stored
//! - **Remote client**: single GET per decision, no retries
//! - **Fail-closed**: anything short of an explicit `Permit` is a denial
//!
//! # Example
//!
//! ```rust,ignore
//! use pep_core::{AccessController, PepConfig, ReqwestTransport};
//! use std::sync::Arc;
//!
//! let config = PepConfig::keyrock("http://keyrock:3000/user", "my-app-id");
//! let transport = Arc::new(ReqwestTransport::new(reqwest::Client::new()));
//! let pep = AccessController::new(config, transport);
//!
//! // `host` implements pep_core::Host for the gateway's request type
//! let decision = pep.access(&mut host).await;
//! if !decision.is_allowed() {
//!     // host.exit(403, ...) has already been called
//! }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod controller;
pub mod fingerprint;
pub mod header;
pub mod host;
pub mod metrics;

#[cfg(test)]
mod testing;

// Re-export public types
pub use cache::DecisionCache;
pub use client::{
    DecisionTransport, KeyrockClient, RemoteDecision, ReqwestTransport, TransportResponse,
};
pub use config::{BackendType, CacheExpiry, ConfigError, PepConfig, DEFAULT_EXPIRY};
pub use controller::{
    AccessController, AccessDecision, DecisionSource, DenyReason, AUTHORIZATION_HEADER, FORBIDDEN,
};
pub use fingerprint::{AuthorizationQuery, Fingerprint};
pub use header::clean_auth_header;
pub use host::{Host, HostError};
pub use metrics::{DecisionMetrics, NoopMetrics};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::controller::{AccessController, AccessDecision, DecisionSource};
    pub use crate::config::{BackendType, CacheExpiry, PepConfig};
    pub use crate::host::{Host, HostError};
    pub use crate::metrics::{DecisionMetrics, NoopMetrics};
}
