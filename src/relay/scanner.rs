//! Board discovery over a bounded candidate address range.
//!
//! A scan probes each candidate address once, sequentially, for the `/status`
//! endpoint. Anything that answers 200 with a parseable status map is a
//! board; everything else is recorded as a miss. A full /24 sweep takes too
//! long on a phone-grade network stack, so the candidate set is a small
//! neighborhood: a configured default range when nothing is known yet, or a
//! margin around the lowest/highest known host once boards have been seen.

use crate::relay::client::BoardClient;
use crate::relay::data::StatusMap;
use tracing::{debug, info};

/// Scan range configuration.
///
/// The defaults are the original deployment's tuning (hosts .11 through .25
/// of the van's subnet); override them for other installations.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ScanConfig {
    /// Subnet prefix including the trailing dot, e.g. `192.168.10.`
    pub subnet_prefix: String,
    /// First host octet probed when no boards are known
    pub range_start: u8,
    /// Last host octet probed when no boards are known
    pub range_end: u8,
    /// Neighborhood radius around known low/high host octets
    pub margin: u8,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            subnet_prefix: "192.168.10.".to_string(),
            range_start: 11,
            range_end: 25,
            margin: 5,
        }
    }
}

impl ScanConfig {
    /// Build the candidate address list for one scan.
    ///
    /// With known boards on this subnet the range is
    /// `[min_known - margin, max_known + margin]`, clamped to valid host
    /// octets; otherwise the configured default range.
    pub fn candidates(&self, known_addresses: &[String]) -> Vec<String> {
        let known_octets: Vec<u8> = known_addresses
            .iter()
            .filter_map(|addr| addr.strip_prefix(self.subnet_prefix.as_str()))
            .filter_map(|host| host.parse::<u8>().ok())
            .collect();

        let (lo, hi) = match (known_octets.iter().min(), known_octets.iter().max()) {
            (Some(&min), Some(&max)) => (
                min.saturating_sub(self.margin).max(1),
                max.saturating_add(self.margin).min(254),
            ),
            _ => (self.range_start.max(1), self.range_end.min(254)),
        };

        (lo..=hi)
            .map(|octet| format!("{}{}", self.subnet_prefix, octet))
            .collect()
    }
}

/// Result of one completed scan.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Addresses that answered with a valid status map, with that map
    pub discovered: Vec<(String, StatusMap)>,
    /// How many candidates failed to answer
    pub failed: usize,
    /// Total candidates attempted
    pub attempted: usize,
}

/// Probes candidate addresses for relay boards.
#[derive(Debug, Clone)]
pub struct Scanner {
    client: BoardClient,
    config: ScanConfig,
}

impl Scanner {
    pub fn new(client: BoardClient, config: ScanConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Run one scan over the configured candidate range.
    pub async fn scan(
        &self,
        known_addresses: &[String],
        on_progress: impl FnMut(u8),
    ) -> ScanOutcome {
        let candidates = self.config.candidates(known_addresses);
        self.probe(&candidates, on_progress).await
    }

    /// Probe an explicit candidate list.
    ///
    /// `on_progress` receives a monotonic percentage of candidates processed
    /// and is guaranteed to see 100 only after the last candidate has been
    /// attempted. Candidates are probed one at a time; a board with unknown
    /// actuation hardware should never see a burst of parallel probes.
    pub async fn probe(
        &self,
        candidates: &[String],
        mut on_progress: impl FnMut(u8),
    ) -> ScanOutcome {
        let total = candidates.len();
        info!("Scanning {} candidate addresses", total);

        let mut outcome = ScanOutcome {
            attempted: total,
            ..Default::default()
        };

        for (index, address) in candidates.iter().enumerate() {
            match self.client.fetch_status(address).await {
                Ok(statuses) => {
                    info!("Board found at {}", address);
                    outcome.discovered.push((address.clone(), statuses));
                }
                Err(e) => {
                    debug!("No board at {}: {}", address, e);
                    outcome.failed += 1;
                }
            }

            let progress = ((index + 1) * 100 / total.max(1)) as u8;
            on_progress(progress);
        }

        info!(
            "Scan complete: {} boards, {} of {} candidates silent",
            outcome.discovered.len(),
            outcome.failed,
            total
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_range_when_nothing_known() {
        let config = ScanConfig::default();
        let candidates = config.candidates(&[]);
        assert_eq!(candidates.first().unwrap(), "192.168.10.11");
        assert_eq!(candidates.last().unwrap(), "192.168.10.25");
        assert_eq!(candidates.len(), 15);
    }

    #[test]
    fn test_neighborhood_around_known_bounds() {
        let config = ScanConfig::default();
        let known = vec!["192.168.10.14".to_string(), "192.168.10.20".to_string()];
        let candidates = config.candidates(&known);
        assert_eq!(candidates.first().unwrap(), "192.168.10.9");
        assert_eq!(candidates.last().unwrap(), "192.168.10.25");
    }

    #[test]
    fn test_neighborhood_clamps_to_valid_octets() {
        let config = ScanConfig {
            margin: 10,
            ..Default::default()
        };
        let known = vec!["192.168.10.3".to_string(), "192.168.10.250".to_string()];
        let candidates = config.candidates(&known);
        assert_eq!(candidates.first().unwrap(), "192.168.10.1");
        assert_eq!(candidates.last().unwrap(), "192.168.10.254");
    }

    #[test]
    fn test_known_addresses_off_subnet_are_ignored() {
        let config = ScanConfig::default();
        let known = vec!["10.0.0.5".to_string()];
        let candidates = config.candidates(&known);
        assert_eq!(candidates.len(), 15);
        assert_eq!(candidates.first().unwrap(), "192.168.10.11");
    }
}
