//! Application configuration.

use crate::relay::poller::PollConfig;
use crate::relay::scanner::ScanConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the vanswitch core.
///
/// Every tuned constant (scan range, poll interval, eviction threshold,
/// request timeout) lives here rather than in the code; the defaults are the
/// values the original deployment ran with.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Board discovery range
    pub scan: ScanConfig,
    /// Status polling cadence and liveness threshold
    pub poll: PollConfig,
    /// Per-request HTTP timeout override in milliseconds
    pub request_timeout_ms: Option<u64>,
    /// Persistence root override (platform config dir when unset)
    pub storage_dir: Option<PathBuf>,
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the subnet prefix probed by scans (e.g. `192.168.10.`).
    pub fn with_subnet_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.scan.subnet_prefix = prefix.into();
        self
    }

    /// Set the default host-octet range probed when no boards are known.
    pub fn with_scan_range(mut self, start: u8, end: u8) -> Self {
        self.scan.range_start = start;
        self.scan.range_end = end;
        self
    }

    /// Set the poll interval in milliseconds.
    pub fn with_poll_interval_ms(mut self, interval_ms: u64) -> Self {
        self.poll.interval_ms = interval_ms;
        self
    }

    /// Set the consecutive-miss threshold beyond which boards are evicted.
    pub fn with_eviction_threshold(mut self, threshold: u32) -> Self {
        self.poll.eviction_threshold = threshold;
        self
    }

    /// Set the per-request HTTP timeout in milliseconds.
    pub fn with_request_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = Some(timeout_ms);
        self
    }

    /// Set the persistence root directory.
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_original_deployment() {
        let config = AppConfig::default();
        assert_eq!(config.scan.subnet_prefix, "192.168.10.");
        assert_eq!(config.scan.range_start, 11);
        assert_eq!(config.scan.range_end, 25);
        assert_eq!(config.poll.interval_ms, 1000);
        assert_eq!(config.poll.eviction_threshold, 14);
    }

    #[test]
    fn test_builder_overrides() {
        let config = AppConfig::new()
            .with_subnet_prefix("10.0.0.")
            .with_scan_range(1, 100)
            .with_poll_interval_ms(250)
            .with_eviction_threshold(3)
            .with_request_timeout_ms(200);
        assert_eq!(config.scan.subnet_prefix, "10.0.0.");
        assert_eq!(config.scan.range_end, 100);
        assert_eq!(config.poll.interval_ms, 250);
        assert_eq!(config.poll.eviction_threshold, 3);
        assert_eq!(config.request_timeout_ms, Some(200));
    }
}
