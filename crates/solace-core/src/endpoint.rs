//! Backend endpoint resolution.
//!
//! The client can learn its backend base URL from several competing sources:
//! a value injected by the hosting environment, a query-string override, a
//! durably saved user override, a loopback heuristic for local development,
//! and finally the hosted default. Resolution is pure and total; derived
//! endpoint URLs are recomputed from the base rather than stored, so an
//! override can never leave a stale concatenated URL behind.

use serde::{Deserialize, Serialize};

/// Well-known local development endpoint, used when the client runs on a
/// loopback host.
pub const LOCAL_DEV_ENDPOINT: &str = "http://localhost:7860";

/// Hosted default endpoint, used when no other source applies.
pub const HOSTED_ENDPOINT: &str = "https://solace-companion.fly.dev/api";

/// Hostnames treated as "running locally" by the loopback heuristic.
const LOOPBACK_HOSTS: &[&str] = &["localhost", "127.0.0.1", "0.0.0.0"];

/// The configuration sources consulted when resolving the backend base URL.
///
/// Empty-string values are treated as absent everywhere: a saved override
/// that was cleared back to `""` falls through to the heuristic, it is never
/// used as a literal target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointSources {
    /// Value injected by a trusted host environment before the engine runs
    /// (used when the client is served co-located with its backend).
    pub injected: Option<String>,
    /// Explicit query-string override.
    pub query_override: Option<String>,
    /// Previously saved user override from the durable store.
    pub saved_override: Option<String>,
    /// Hostname the client is running on, for the loopback heuristic.
    pub hostname: String,
}

impl EndpointSources {
    /// Resolves the base URL. First match wins:
    /// injected > query override > saved override > loopback heuristic >
    /// hosted default.
    pub fn resolve(&self) -> EndpointConfig {
        if let Some(url) = non_empty(&self.injected) {
            tracing::debug!(target: "endpoint", "using host-injected endpoint: {url}");
            return EndpointConfig::new(url);
        }
        if let Some(url) = non_empty(&self.query_override) {
            tracing::debug!(target: "endpoint", "using query-string endpoint: {url}");
            return EndpointConfig::new(url);
        }
        if let Some(url) = non_empty(&self.saved_override) {
            tracing::debug!(target: "endpoint", "using saved endpoint override: {url}");
            return EndpointConfig::new(url);
        }
        if LOOPBACK_HOSTS.contains(&self.hostname.as_str()) {
            tracing::debug!(target: "endpoint", "loopback host, using local dev endpoint");
            return EndpointConfig::new(LOCAL_DEV_ENDPOINT);
        }
        tracing::debug!(target: "endpoint", "using hosted endpoint");
        EndpointConfig::new(HOSTED_ENDPOINT)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// A resolved backend base URL.
///
/// Immutable once resolved; an explicit user override produces a fresh
/// config. All endpoint URLs are derived on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    base: String,
}

impl EndpointConfig {
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn login_url(&self) -> String {
        format!("{}/login", self.base)
    }

    pub fn register_url(&self) -> String {
        format!("{}/register", self.base)
    }

    /// Authoritative consent record for one user.
    pub fn consent_record_url(&self, user_id: &str) -> String {
        format!("{}/consent/{}", self.base, urlencoding::encode(user_id))
    }

    /// Best-effort consent write-back.
    pub fn consent_sync_url(&self) -> String {
        format!("{}/consent", self.base)
    }

    pub fn survey_url(&self) -> String {
        format!("{}/survey", self.base)
    }

    pub fn chat_url(&self) -> String {
        format!("{}/chat", self.base)
    }

    pub fn statistics_url(&self, user_id: &str) -> String {
        format!(
            "{}/user/statistics/{}",
            self.base,
            urlencoding::encode(user_id)
        )
    }

    pub fn history_url(&self, user_id: &str, days: u32) -> String {
        format!(
            "{}/user/emotion-history/{}?days={}",
            self.base,
            urlencoding::encode(user_id),
            days
        )
    }
}
