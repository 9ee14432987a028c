//! HTTP client for the board-side relay interface.
//!
//! Boards expose two endpoints: `GET /status` returning a JSON object of
//! relay id to truthy state, and `GET /toggleRelay?<relayId>=toggle` which
//! actuates one relay and answers with the post-toggle status map.

use crate::error::{Result, SwitchError};
use crate::relay::data::StatusMap;
use std::time::Duration;

/// Default per-request timeout. Probing a dead address during a scan should
/// fail fast; boards on the local subnet answer in tens of milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 1500;

/// Client for talking to relay boards over plain HTTP.
#[derive(Debug, Clone)]
pub struct BoardClient {
    http: reqwest::Client,
}

impl BoardClient {
    /// Create a client with the default request timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS))
    }

    /// Create a client with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(SwitchError::Unreachable)?;
        Ok(Self { http })
    }

    /// Query a board for its current relay states.
    pub async fn fetch_status(&self, address: &str) -> Result<StatusMap> {
        let url = format!("http://{}/status", address.trim_end_matches('/'));
        self.get_status_map(address, &url).await
    }

    /// Ask a board to toggle one relay. The board answers with the full
    /// post-toggle status map, which callers feed back into reconciliation.
    pub async fn send_toggle(&self, address: &str, relay_id: &str) -> Result<StatusMap> {
        let url = format!(
            "http://{}/toggleRelay?{}=toggle",
            address.trim_end_matches('/'),
            urlencode(relay_id)
        );
        self.get_status_map(address, &url).await
    }

    async fn get_status_map(&self, address: &str, url: &str) -> Result<StatusMap> {
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SwitchError::bad_status(address, status.as_u16()));
        }

        response
            .json::<StatusMap>()
            .await
            .map_err(|e| SwitchError::malformed(address, e.to_string()))
    }
}

/// Percent-encode a relay id for use as a query-string key.
fn urlencode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}
