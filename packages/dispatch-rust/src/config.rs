use std::time::Duration;

/// Mediator-level configuration.
///
/// Selects which built-in behaviors wrap every registered handler and tunes
/// the performance behavior.
#[derive(Debug, Clone)]
pub struct MediatorConfig {
    /// Install the logging behavior.
    pub enable_logging: bool,
    /// Install the performance behavior.
    pub enable_performance: bool,
    /// Install the validation behavior for request types that have validators.
    pub enable_validation: bool,
    /// Requests slower than this are reported as long running.
    pub slow_request_threshold_ms: u64,
}

impl MediatorConfig {
    #[must_use]
    pub fn slow_request_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_request_threshold_ms)
    }
}

impl Default for MediatorConfig {
    fn default() -> Self {
        Self {
            enable_logging: true,
            enable_performance: true,
            enable_validation: true,
            slow_request_threshold_ms: 500,
        }
    }
}
