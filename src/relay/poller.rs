//! Status synchronization for known boards.
//!
//! Each pass queries every known board for its relay states. Successes feed
//! reconciliation and reset that board's liveness counter; failures increment
//! it. A board that misses more consecutive checks than the threshold is
//! evicted from the known set (its buttons stay behind, stale, until the user
//! hides them or a later scan rediscovers the board).
//!
//! Network I/O and state mutation are split: `fetch_all` runs the requests
//! without any lock held, `apply` is a pure transformation of the board list.
//! The controller drives passes from its ticker task and decides what to do
//! with the resulting events.

use crate::error::Result;
use crate::relay::client::BoardClient;
use crate::relay::data::{Board, StatusMap};
use futures_util::future::join_all;
use tracing::debug;

/// Polling configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PollConfig {
    /// Interval between poll passes in milliseconds
    pub interval_ms: u64,
    /// Consecutive missed checks beyond which a board is evicted
    pub eviction_threshold: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: crate::DEFAULT_POLL_INTERVAL_MS,
            eviction_threshold: crate::DEFAULT_EVICTION_THRESHOLD,
        }
    }
}

/// What one poll pass observed, per board.
#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    /// Board answered; `statuses` should be reconciled into the button list
    Status { address: String, statuses: StatusMap },
    /// Board missed a check; carries the updated consecutive-miss count
    Missed { address: String, missed_checks: u32 },
    /// Board exceeded the miss threshold and was dropped from the known set
    Evicted { address: String },
}

/// Queries known boards and folds the results into liveness state.
#[derive(Debug, Clone)]
pub struct Poller {
    client: BoardClient,
    config: PollConfig,
}

impl Poller {
    pub fn new(client: BoardClient, config: PollConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Fetch the status of every address concurrently.
    ///
    /// Each board resolves independently; one unreachable board never aborts
    /// the rest of the pass.
    pub async fn fetch_all(&self, addresses: &[String]) -> Vec<(String, Result<StatusMap>)> {
        let fetches = addresses.iter().map(|address| {
            let client = self.client.clone();
            let address = address.clone();
            async move {
                let result = client.fetch_status(&address).await;
                (address, result)
            }
        });
        join_all(fetches).await
    }

    /// Fold fetch results into the board list, returning per-board events.
    ///
    /// Pure with respect to I/O so tests can drive liveness transitions
    /// directly. A board absent from `results` (e.g. added by a concurrent
    /// scan between snapshot and apply) is left untouched.
    pub fn apply(
        &self,
        boards: &mut Vec<Board>,
        results: Vec<(String, Result<StatusMap>)>,
    ) -> Vec<PollEvent> {
        let mut events = Vec::new();

        for (address, result) in results {
            let Some(index) = boards.iter().position(|b| b.address == address) else {
                // evicted or forgotten while the fetch was in flight
                continue;
            };

            match result {
                Ok(statuses) => {
                    boards[index].missed_checks = 0;
                    events.push(PollEvent::Status { address, statuses });
                }
                Err(e) => {
                    debug!("Poll miss for {}: {}", address, e);
                    boards[index].missed_checks += 1;
                    let missed = boards[index].missed_checks;
                    if missed > self.config.eviction_threshold {
                        boards.remove(index);
                        events.push(PollEvent::Evicted { address });
                    } else {
                        events.push(PollEvent::Missed {
                            address,
                            missed_checks: missed,
                        });
                    }
                }
            }
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SwitchError;

    fn poller() -> Poller {
        Poller::new(BoardClient::new().unwrap(), PollConfig::default())
    }

    fn miss(address: &str) -> (String, Result<StatusMap>) {
        (
            address.to_string(),
            Err(SwitchError::bad_status(address, 500)),
        )
    }

    fn ok(address: &str) -> (String, Result<StatusMap>) {
        let mut statuses = StatusMap::new();
        statuses.insert("relay_1".to_string(), serde_json::json!(1));
        (address.to_string(), Ok(statuses))
    }

    #[test]
    fn test_eviction_on_fifteenth_consecutive_failure() {
        let p = poller();
        let mut boards = vec![Board::new("192.168.10.12")];

        for i in 1..=14 {
            let events = p.apply(&mut boards, vec![miss("192.168.10.12")]);
            assert_eq!(
                events,
                vec![PollEvent::Missed {
                    address: "192.168.10.12".to_string(),
                    missed_checks: i
                }]
            );
            assert_eq!(boards.len(), 1);
        }

        let events = p.apply(&mut boards, vec![miss("192.168.10.12")]);
        assert_eq!(
            events,
            vec![PollEvent::Evicted {
                address: "192.168.10.12".to_string()
            }]
        );
        assert!(boards.is_empty());
    }

    #[test]
    fn test_success_resets_counter() {
        let p = poller();
        let mut boards = vec![Board::new("192.168.10.12")];

        for _ in 0..13 {
            p.apply(&mut boards, vec![miss("192.168.10.12")]);
        }
        assert_eq!(boards[0].missed_checks, 13);

        let events = p.apply(&mut boards, vec![ok("192.168.10.12")]);
        assert!(matches!(events[0], PollEvent::Status { .. }));
        assert_eq!(boards[0].missed_checks, 0);
    }

    #[test]
    fn test_one_failure_does_not_abort_the_pass() {
        let p = poller();
        let mut boards = vec![Board::new("192.168.10.12"), Board::new("192.168.10.13")];

        let events = p.apply(&mut boards, vec![miss("192.168.10.12"), ok("192.168.10.13")]);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], PollEvent::Missed { .. }));
        assert!(matches!(events[1], PollEvent::Status { .. }));
    }

    #[test]
    fn test_result_for_unknown_board_is_dropped() {
        let p = poller();
        let mut boards = vec![Board::new("192.168.10.12")];

        let events = p.apply(&mut boards, vec![ok("192.168.10.99")]);
        assert!(events.is_empty());
        assert_eq!(boards.len(), 1);
    }
}
