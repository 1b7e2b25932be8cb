//! Per-user consent cache over the durable local store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use solace_core::consent::{ConsentCache, ConsentDecision, ConsentRecord};
use solace_core::error::Result;
use solace_core::storage::{LocalStore, StateKey};
use std::sync::Arc;

/// Consent cache that mirrors each user's decision into a per-user key pair
/// (flag + decision date).
///
/// The cache is a non-authoritative mirror: the reconciler overwrites it
/// whenever the backend reports a decision, and reads it when the backend is
/// unreachable.
pub struct LocalConsentCache {
    store: Arc<dyn LocalStore>,
}

impl LocalConsentCache {
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ConsentCache for LocalConsentCache {
    async fn read(&self, user_id: &str) -> Result<ConsentRecord> {
        let flag = self.store.get(&StateKey::consent(user_id)).await?;
        let decision = match flag.as_deref() {
            Some("true") => ConsentDecision::Granted,
            Some("false") => ConsentDecision::Declined,
            Some(other) => {
                tracing::warn!(target: "consent", "unrecognized cached flag {other:?} for {user_id}, treating as unset");
                ConsentDecision::Unset
            }
            None => ConsentDecision::Unset,
        };

        let decided_at = match decision {
            ConsentDecision::Unset => None,
            _ => self
                .store
                .get(&StateKey::consent_date(user_id))
                .await?
                .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
                .map(|dt| dt.with_timezone(&Utc)),
        };

        Ok(ConsentRecord {
            user_id: user_id.to_string(),
            decision,
            decided_at,
        })
    }

    async fn write(
        &self,
        user_id: &str,
        decision: ConsentDecision,
        decided_at: DateTime<Utc>,
    ) -> Result<()> {
        let Some(flag) = decision.as_flag() else {
            // Unset is represented by key absence, never written explicitly.
            self.store.remove(&StateKey::consent(user_id)).await?;
            self.store.remove(&StateKey::consent_date(user_id)).await?;
            return Ok(());
        };

        self.store
            .put(&StateKey::consent(user_id), if flag { "true" } else { "false" })
            .await?;
        self.store
            .put(&StateKey::consent_date(user_id), &decided_at.to_rfc3339())
            .await?;
        tracing::debug!(target: "consent", "cached decision {decision:?} for {user_id}");
        Ok(())
    }
}
