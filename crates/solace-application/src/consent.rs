//! Consent reconciliation and gating.
//!
//! The backend owns the consent decision; the local cache is a per-user
//! mirror of it. Reconciliation pulls the authoritative record, lets it
//! overwrite the mirror, and then gates initialization on what the mirror
//! says. When the backend is unreachable the mirror alone decides — a failed
//! fetch never blocks a user who already consented, and never grants access
//! to one who has not.

use crate::surface::PresentationSurface;
use chrono::Utc;
use solace_core::consent::{ConsentCache, ConsentDecision, ConsentRecord};
use solace_core::error::Result;
use solace_core::remote::RemoteService;
use std::sync::Arc;

/// Notice shown when the client is torn down after a decline.
const DECLINE_NOTICE: &str =
    "You have declined data collection. The application has been closed to protect your choice.";

/// Whether initialization may proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Consent is granted; initialization continues.
    Open,
    /// No granted decision on record; the blocking prompt is showing and the
    /// application is disabled until the user decides.
    Closed,
}

/// Reconciles backend-authoritative consent state with the local mirror and
/// applies the gate.
pub struct ConsentReconciler {
    remote: Arc<dyn RemoteService>,
    cache: Arc<dyn ConsentCache>,
    surface: Arc<dyn PresentationSurface>,
}

impl ConsentReconciler {
    pub fn new(
        remote: Arc<dyn RemoteService>,
        cache: Arc<dyn ConsentCache>,
        surface: Arc<dyn PresentationSurface>,
    ) -> Self {
        Self {
            remote,
            cache,
            surface,
        }
    }

    /// Pulls the authoritative record for `user_id` and overwrites the local
    /// mirror when the backend reports a decision.
    ///
    /// Degrades gracefully: a failed fetch leaves the mirror untouched and
    /// the gate evaluation falls back to it.
    pub async fn sync_authoritative(&self, user_id: &str) {
        match self.remote.fetch_consent(user_id).await {
            Ok(authoritative) => {
                let Some(flag) = authoritative.decision else {
                    tracing::debug!(target: "consent", "no authoritative record for {user_id}");
                    return;
                };
                let decided_at = authoritative.decided_at.unwrap_or_else(Utc::now);
                let decision = ConsentDecision::from_flag(Some(flag));
                if let Err(e) = self.cache.write(user_id, decision, decided_at).await {
                    tracing::warn!(target: "consent", "failed to mirror authoritative decision: {e}");
                }
            }
            Err(e) => {
                tracing::warn!(
                    target: "consent",
                    "authoritative consent fetch failed for {user_id}, falling back to local cache: {e}"
                );
            }
        }
    }

    /// Reads the (possibly just-synchronized) mirror and applies the gate.
    ///
    /// A closed gate disables the application and opens the blocking prompt
    /// before this returns, so no later initialization step can race with
    /// user interaction.
    pub async fn evaluate_gate(&self, user_id: &str) -> Gate {
        let record = self
            .cache
            .read(user_id)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(target: "consent", "failed to read consent cache: {e}");
                ConsentRecord::unset(user_id)
            });

        if record.decision.is_granted() {
            self.surface.close_consent_prompt();
            self.surface.set_application_enabled(true);
            Gate::Open
        } else {
            self.surface.set_application_enabled(false);
            self.surface.open_consent_prompt();
            Gate::Closed
        }
    }

    /// Full reconciliation: authoritative sync followed by gate evaluation.
    /// Runs once per transition into the authenticated state.
    pub async fn reconcile(&self, user_id: &str) -> Gate {
        self.sync_authoritative(user_id).await;
        self.evaluate_gate(user_id).await
    }

    /// Records the user's explicit grant.
    ///
    /// The local decision is durable before anything else happens; the
    /// backend notification is best-effort and its failure neither surfaces
    /// nor reverses the grant.
    pub async fn accept(&self, user_id: &str) -> Result<()> {
        let now = Utc::now();
        self.cache
            .write(user_id, ConsentDecision::Granted, now)
            .await?;

        self.surface.close_consent_prompt();
        self.surface.set_application_enabled(true);

        if let Err(e) = self.remote.push_consent(user_id, true, now).await {
            tracing::warn!(target: "consent", "best-effort consent sync failed: {e}");
        }
        Ok(())
    }

    /// Records the user's explicit decline and tears the client down.
    ///
    /// The teardown happens regardless of whether the cache write or the
    /// backend notification succeed: declining is a local, immediate effect.
    pub async fn decline(&self, user_id: &str) {
        let now = Utc::now();
        if let Err(e) = self
            .cache
            .write(user_id, ConsentDecision::Declined, now)
            .await
        {
            tracing::warn!(target: "consent", "failed to cache declined decision: {e}");
        }

        if let Err(e) = self.remote.push_consent(user_id, false, now).await {
            tracing::warn!(target: "consent", "best-effort decline sync failed: {e}");
        }

        tracing::info!(target: "consent", "consent declined by {user_id}, tearing down");
        self.surface.tear_down(DECLINE_NOTICE);
    }
}
