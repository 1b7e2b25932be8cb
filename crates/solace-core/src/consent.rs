//! Consent domain model and local cache seam.
//!
//! The remote service owns the authoritative consent record; the local cache
//! is a per-user read-through mirror of it. A `Declined` decision is terminal
//! for the session: no further application initialization may happen for that
//! user.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user's informed-consent decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsentDecision {
    /// No decision has been recorded for this user.
    Unset,
    /// The user accepted data collection.
    Granted,
    /// The user declined. Terminal for the session.
    Declined,
}

impl ConsentDecision {
    /// The boolean flag stored durably and sent on the wire, `None` for
    /// `Unset`.
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            ConsentDecision::Unset => None,
            ConsentDecision::Granted => Some(true),
            ConsentDecision::Declined => Some(false),
        }
    }

    /// Builds a decision from an optional wire/storage flag.
    pub fn from_flag(flag: Option<bool>) -> Self {
        match flag {
            None => ConsentDecision::Unset,
            Some(true) => ConsentDecision::Granted,
            Some(false) => ConsentDecision::Declined,
        }
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, ConsentDecision::Granted)
    }

    pub fn is_declined(&self) -> bool {
        matches!(self, ConsentDecision::Declined)
    }
}

/// A consent record as held in the local cache for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentRecord {
    pub user_id: String,
    pub decision: ConsentDecision,
    /// When the decision was made; `None` while the decision is `Unset`.
    pub decided_at: Option<DateTime<Utc>>,
}

impl ConsentRecord {
    /// An empty record for a user with no cached decision.
    pub fn unset(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            decision: ConsentDecision::Unset,
            decided_at: None,
        }
    }
}

/// The authoritative consent state as reported by the remote service.
///
/// `decision == None` means the backend holds no record for this user yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthoritativeConsent {
    pub decision: Option<bool>,
    pub decided_at: Option<DateTime<Utc>>,
}

/// Per-user local mirror of the backend-owned consent state.
///
/// Keys are scoped by user id; implementations must never fall back to a
/// global flag that could grant access for a different user.
#[async_trait]
pub trait ConsentCache: Send + Sync {
    /// Reads the cached record for `user_id`; an absent entry reads as
    /// `Unset`.
    async fn read(&self, user_id: &str) -> Result<ConsentRecord>;

    /// Writes a decision (and its timestamp) for `user_id`, replacing any
    /// prior entry.
    async fn write(
        &self,
        user_id: &str,
        decision: ConsentDecision,
        decided_at: DateTime<Utc>,
    ) -> Result<()>;
}
