use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

const FALLBACK_REQUEST_TIMEOUT_MS: u64 = 1_000;

static DEFAULT_REQUEST_TIMEOUT_MS: AtomicU64 = AtomicU64::new(FALLBACK_REQUEST_TIMEOUT_MS);

/// Overrides the request timeout that [`BridgeConfig::default`] picks up.
///
/// Controllers that were already constructed keep their own value.
pub fn set_default_request_timeout(timeout: Duration) {
    let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
    DEFAULT_REQUEST_TIMEOUT_MS.store(millis, Ordering::Relaxed);
}

pub fn default_request_timeout() -> Duration {
    Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS.load(Ordering::Relaxed))
}

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// How long a requester waits for each two-way request.
    pub request_timeout: Duration,
    /// How long teardown waits for the worker thread before detaching it.
    pub worker_join_timeout: Duration,
    /// Bound on [`crate::WorkerContext::owner_status`] round trips.
    pub status_timeout: Duration,
    pub worker_thread_name: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            request_timeout: default_request_timeout(),
            worker_join_timeout: Duration::from_secs(2),
            status_timeout: Duration::from_secs(1),
            worker_thread_name: "mlplot-worker".to_string(),
        }
    }
}

impl BridgeConfig {
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_worker_join_timeout(mut self, timeout: Duration) -> Self {
        self.worker_join_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{BridgeConfig, default_request_timeout, set_default_request_timeout};

    #[test]
    fn default_timeout_override_reaches_new_configs() {
        let before = default_request_timeout();
        set_default_request_timeout(Duration::from_millis(250));
        assert_eq!(BridgeConfig::default().request_timeout, Duration::from_millis(250));
        set_default_request_timeout(before);
        assert_eq!(BridgeConfig::default().request_timeout, before);
    }
}
