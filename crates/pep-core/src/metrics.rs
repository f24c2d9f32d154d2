/// Hook for counting access decisions
///
/// `record_decision` receives one outcome label per request: `allow_cache`,
/// `allow_remote`, `deny_remote`, `deny_error`, `deny_request` or
/// `deny_backend`.
pub trait DecisionMetrics: Send + Sync {
    fn record_decision(&self, outcome: &str);
    /// Seconds spent in the whole access phase
    fn record_latency(&self, seconds: f64);
    /// Seconds spent waiting on the decision point; not called on cache hits
    fn record_remote_rtt(&self, seconds: f64);
}

/// Discards everything; the controller's default
pub struct NoopMetrics;

impl DecisionMetrics for NoopMetrics {
    fn record_decision(&self, _outcome: &str) {}
    fn record_latency(&self, _seconds: f64) {}
    fn record_remote_rtt(&self, _seconds: f64) {}
}
