//! Endpoint connectivity probe.
//!
//! Used by the endpoint settings flow to test a candidate base URL before it
//! is saved as an override. The probe sends a throwaway chat request: a 4xx
//! still proves the backend answered, which is all the probe asks.

use reqwest::Client;
use serde_json::json;
use solace_core::endpoint::EndpointConfig;
use std::time::Duration;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of probing a candidate endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointHealth {
    /// The backend answered (success, or a 400/401 proving it is alive).
    Reachable,
    /// The backend is temporarily unavailable (gateway statuses).
    Degraded(u16),
    /// No usable answer.
    Unreachable(String),
}

/// Classifies a probe's HTTP status.
pub fn classify_probe_status(status: u16) -> EndpointHealth {
    match status {
        200..=299 | 400 | 401 => EndpointHealth::Reachable,
        502 | 503 => EndpointHealth::Degraded(status),
        other => EndpointHealth::Unreachable(format!("HTTP {other}")),
    }
}

/// Probes candidate endpoints with a trivial chat request.
pub struct EndpointProbe {
    client: Client,
}

impl EndpointProbe {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Probes `base_url` and classifies the outcome.
    pub async fn probe(&self, base_url: &str) -> EndpointHealth {
        let endpoint = EndpointConfig::new(base_url);
        let result = self
            .client
            .post(endpoint.chat_url())
            .timeout(PROBE_TIMEOUT)
            .json(&json!({ "message": "test", "userId": "probe" }))
            .send()
            .await;

        match result {
            Ok(response) => classify_probe_status(response.status().as_u16()),
            Err(err) => EndpointHealth::Unreachable(err.to_string()),
        }
    }
}

impl Default for EndpointProbe {
    fn default() -> Self {
        Self::new()
    }
}
