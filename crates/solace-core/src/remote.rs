//! Remote service seam.
//!
//! The backend is reached exclusively through this trait so the application
//! layer can be exercised against scripted in-memory implementations. The
//! error type distinguishes transport failures (no response at all) from
//! service statuses, because the retry policy differs between the two.

use crate::chat::{ChatReply, MoodPoint, UserKind, UserStatistics};
use crate::consent::AuthoritativeConsent;
use crate::endpoint::EndpointConfig;
use crate::session::Session;
use crate::survey::SurveySubmission;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// A failure talking to the remote service.
#[derive(Error, Debug, Clone)]
pub enum RemoteError {
    /// The request never produced a response (connect failure, timeout).
    #[error("no response from {endpoint}: {message}")]
    Transport { endpoint: String, message: String },

    /// The service answered with a non-success HTTP status.
    #[error("service returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The service answered, but the body did not parse.
    #[error("malformed response from {endpoint}: {message}")]
    Malformed { endpoint: String, message: String },
}

impl RemoteError {
    /// Statuses worth an automatic retry: the gateway family the backend
    /// emits while it is briefly unavailable.
    pub fn is_retryable_status(&self) -> bool {
        matches!(
            self,
            RemoteError::Status {
                status: 502 | 503 | 504,
                ..
            }
        )
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, RemoteError::Transport { .. })
    }
}

/// Outcome of a login or register call that reached the service.
///
/// The service reports business-level rejection (bad credentials, taken
/// username) inside a well-formed response; that is not a `RemoteError`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthReply {
    /// Credentials accepted; the returned session is ready to establish.
    Accepted(Session),
    /// Credentials rejected with an optional server-supplied message.
    Rejected { message: Option<String> },
}

/// Client view of the companion backend.
#[async_trait]
pub trait RemoteService: Send + Sync {
    /// Repoints the client at a different resolved endpoint. Used after an
    /// explicit user override; all later calls derive their URLs from the
    /// new base.
    async fn set_endpoint(&self, endpoint: EndpointConfig);

    async fn login(&self, username: &str, password: &str) -> Result<AuthReply, RemoteError>;

    async fn register(&self, username: &str, password: &str) -> Result<AuthReply, RemoteError>;

    /// Reads the authoritative consent record for `user_id`.
    async fn fetch_consent(&self, user_id: &str) -> Result<AuthoritativeConsent, RemoteError>;

    /// Best-effort write-back of a consent decision. Callers log failures
    /// and move on; nothing is retried.
    async fn push_consent(
        &self,
        user_id: &str,
        granted: bool,
        decided_at: DateTime<Utc>,
    ) -> Result<(), RemoteError>;

    async fn submit_survey(
        &self,
        submission: &SurveySubmission,
        token: &str,
    ) -> Result<(), RemoteError>;

    async fn send_chat(
        &self,
        message: &str,
        user_id: &str,
        kind: UserKind,
        token: &str,
    ) -> Result<ChatReply, RemoteError>;

    async fn fetch_statistics(
        &self,
        user_id: &str,
        token: &str,
    ) -> Result<UserStatistics, RemoteError>;

    async fn fetch_mood_history(
        &self,
        user_id: &str,
        days: u32,
        token: &str,
    ) -> Result<Vec<MoodPoint>, RemoteError>;
}
