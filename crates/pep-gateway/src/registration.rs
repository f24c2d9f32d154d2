//! Plugin registration and execution ordering
//!
//! The access check must see the bearer token after token-verifying plugins
//! have accepted it, and before any plugin rewrites or strips the request.

use std::cmp::Reverse;

pub const PLUGIN_NAME: &str = "keyrock-pep";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Runs after `jwt` (1005) and `oauth2` (1004), before `request-transformer` (801)
pub const PRIORITY: u32 = 805;

/// Pipeline stage a plugin belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Verifies token presence and validity
    TokenVerification,
    /// Allow/deny enforcement
    Authorization,
    /// Rewrites or strips headers and payload
    PayloadTransformation,
}

/// What the host needs to schedule a plugin's access phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginRegistration {
    pub name: &'static str,
    pub version: &'static str,
    /// Higher runs earlier
    pub priority: u32,
    pub stage: Stage,
}

/// Registration record for this plugin
pub fn registration() -> PluginRegistration {
    PluginRegistration {
        name: PLUGIN_NAME,
        version: VERSION,
        priority: PRIORITY,
        stage: Stage::Authorization,
    }
}

/// Well-known gateway plugins this one is ordered against
pub fn neighbours() -> Vec<PluginRegistration> {
    vec![
        PluginRegistration {
            name: "jwt",
            version: "",
            priority: 1005,
            stage: Stage::TokenVerification,
        },
        PluginRegistration {
            name: "oauth2",
            version: "",
            priority: 1004,
            stage: Stage::TokenVerification,
        },
        PluginRegistration {
            name: "request-transformer",
            version: "",
            priority: 801,
            stage: Stage::PayloadTransformation,
        },
    ]
}

/// Sort registrations into execution order (highest priority first)
pub fn execution_order(plugins: &mut [PluginRegistration]) {
    plugins.sort_by_key(|p| Reverse(p.priority));
}
