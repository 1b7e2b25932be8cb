//! Typed key schema for the durable local store.
//!
//! The engine mirrors a handful of values into durable local storage: the
//! session triple, per-user consent flags, the survey schedule, and the
//! user-chosen endpoint override. Modelling the keys as an enum (instead of
//! ad-hoc strings) makes the per-user namespace explicit and rules out key
//! collisions between users.

use crate::error::Result;
use async_trait::async_trait;

/// A key in the durable local store.
///
/// `Consent` and `ConsentDate` are scoped per user: switching users must not
/// leak a prior user's decision, so the user id is part of the key itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StateKey {
    /// Credential token for the authenticated session.
    Token,
    /// User id of the authenticated session.
    UserId,
    /// Display name of the authenticated session.
    UserName,
    /// Consent flag for one specific user ("true"/"false").
    Consent { user_id: String },
    /// Timestamp of that user's consent decision (RFC 3339).
    ConsentDate { user_id: String },
    /// Timestamp of the last successful survey submission (RFC 3339).
    LastSurveyAt,
    /// User-chosen backend endpoint override.
    EndpointOverride,
}

impl StateKey {
    /// Renders the key as the flat string used by the storage backend.
    pub fn storage_key(&self) -> String {
        match self {
            StateKey::Token => "token".to_string(),
            StateKey::UserId => "user_id".to_string(),
            StateKey::UserName => "user_name".to_string(),
            StateKey::Consent { user_id } => format!("consent_agreed_{user_id}"),
            StateKey::ConsentDate { user_id } => format!("consent_agreed_{user_id}_date"),
            StateKey::LastSurveyAt => "last_survey_date".to_string(),
            StateKey::EndpointOverride => "custom_backend_url".to_string(),
        }
    }

    /// Convenience constructor for a user's consent flag key.
    pub fn consent(user_id: impl Into<String>) -> Self {
        StateKey::Consent {
            user_id: user_id.into(),
        }
    }

    /// Convenience constructor for a user's consent date key.
    pub fn consent_date(user_id: impl Into<String>) -> Self {
        StateKey::ConsentDate {
            user_id: user_id.into(),
        }
    }
}

/// An abstract durable key-value store.
///
/// This trait decouples the engine from the concrete storage mechanism
/// (a TOML file on desktop, browser local storage behind a bridge, an
/// in-memory map in tests). Values are plain strings; the typed layers
/// above are responsible for encoding.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Reads a value, `None` when the key is absent.
    async fn get(&self, key: &StateKey) -> Result<Option<String>>;

    /// Writes a value, creating or replacing the entry.
    async fn put(&self, key: &StateKey, value: &str) -> Result<()>;

    /// Removes an entry; removing an absent key is not an error.
    async fn remove(&self, key: &StateKey) -> Result<()>;
}
