//! Logging setup for standalone use of the plugin

use tracing_subscriber::EnvFilter;

/// Install a global `tracing` subscriber
///
/// Filtering follows `RUST_LOG`, defaulting to `info`. Returns an error if a
/// subscriber is already installed, e.g. by the host.
pub fn init_logging(json: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    if json {
        builder
            .json()
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to install logger: {e}"))
    } else {
        builder
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to install logger: {e}"))
    }
}
