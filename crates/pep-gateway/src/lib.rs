//! pep-gateway: gateway integration for the Keyrock policy enforcement point
//!
//! Loads the declarative plugin configuration, declares where the access
//! check sits in the plugin chain, and adapts `http::Request` to the
//! `pep_core::Host` seam.
//!
//! # Example
//!
//! ```rust,ignore
//! use pep_gateway::{Config, PolicyInstance};
//!
//! let config = Config::load(Path::new("keyrock-pep.yaml"))?;
//! let policy = PolicyInstance::from_config(&config)?;
//!
//! if let Some(forbidden) = policy.handle(&req).await {
//!     return forbidden;
//! }
//! // forward `req` upstream
//! ```

pub mod config;
pub mod http_host;
pub mod registration;
pub mod runtime;
pub mod telemetry;

pub use config::Config;
pub use http_host::HttpHost;
pub use registration::{registration, PluginRegistration, Stage, PLUGIN_NAME, PRIORITY, VERSION};
pub use runtime::PolicyInstance;
