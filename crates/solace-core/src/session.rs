//! Session domain model and store seam.
//!
//! A session is the authenticated identity plus its credential token. The
//! durable mirror is non-authoritative: it exists so a page reload can
//! restore the session without a fresh login, and it is wiped on logout.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The authenticated identity for the current client.
///
/// Exclusively owned by the session store; mutated only through auth flow
/// transitions and destroyed on logout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque user id assigned by the backend.
    pub user_id: String,
    /// Display name.
    pub user_name: String,
    /// Opaque credential token, sent as a bearer token on authorized calls.
    pub token: String,
}

impl Session {
    pub fn new(
        user_id: impl Into<String>,
        user_name: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            user_name: user_name.into(),
            token: token.into(),
        }
    }
}

/// An abstract store for the authenticated session.
///
/// Implementations persist the session as three durable keys (id, name,
/// token) and must treat partial state as absent: a mirror with any of the
/// three missing restores to nothing rather than to a broken session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Restores the persisted session, if all of its parts are present.
    ///
    /// Fail-closed: partial or unreadable state yields `None`, never an
    /// error. Called once at startup, before any network activity.
    async fn restore(&self) -> Option<Session>;

    /// Persists the session and makes it the current one.
    ///
    /// If any durable write fails the session must not be considered
    /// established and the error is returned to the caller.
    async fn establish(&self, session: &Session) -> Result<()>;

    /// Removes the session from memory and from the durable mirror.
    ///
    /// Idempotent: clearing an absent session succeeds.
    async fn clear(&self) -> Result<()>;

    /// Returns the currently established session, if any.
    async fn current(&self) -> Option<Session>;
}
