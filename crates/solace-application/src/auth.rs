//! Login/register flow.
//!
//! Validation happens locally first; a request only goes out once the form
//! passes. Business-level rejection (bad credentials, taken username) keeps
//! the user on the form with the server's message; transport failures get a
//! connectivity diagnostic naming the endpoint that was attempted, and are
//! never retried automatically.

use crate::surface::{AuthField, PresentationSurface};
use solace_core::error::Result;
use solace_core::remote::{AuthReply, RemoteError, RemoteService};
use solace_core::session::{Session, SessionStore};
use std::sync::Arc;

const MIN_USERNAME_CHARS: usize = 3;
const MIN_PASSWORD_CHARS: usize = 6;

/// Whether the form submits to `/login` or `/register`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Register,
}

/// Lifecycle of the client, from anonymous to fully initialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    /// No session; the auth view is showing.
    Anonymous,
    /// A credential request is in flight.
    Authenticating,
    /// A session exists; consent has not been reconciled yet.
    Authenticated,
    /// The consent gate is closed and the blocking prompt is showing.
    ConsentPending,
    /// The gate is open and initialization has completed.
    Ready,
    /// Consent was declined; the client is unusable for this session.
    Terminated,
}

/// Result of one submit: either the form stays put, or a session exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Local validation failed; nothing reached the network.
    Invalid,
    /// The service rejected the credentials, or the request failed.
    Rejected,
    /// Credentials accepted and the session is established.
    Authenticated(Session),
}

/// Login/register state transitions.
pub struct AuthFlow {
    remote: Arc<dyn RemoteService>,
    sessions: Arc<dyn SessionStore>,
    surface: Arc<dyn PresentationSurface>,
}

impl AuthFlow {
    pub fn new(
        remote: Arc<dyn RemoteService>,
        sessions: Arc<dyn SessionStore>,
        surface: Arc<dyn PresentationSurface>,
    ) -> Self {
        Self {
            remote,
            sessions,
            surface,
        }
    }

    /// Validates and submits the auth form.
    ///
    /// On acceptance the session is established in the session store before
    /// this returns, so the caller can hand off to consent reconciliation
    /// immediately.
    pub async fn submit(
        &self,
        mode: AuthMode,
        username: &str,
        password: &str,
        confirm: Option<&str>,
    ) -> Result<SubmitOutcome> {
        self.surface.clear_auth_errors();

        let username = username.trim();
        if !self.validate(mode, username, password, confirm) {
            return Ok(SubmitOutcome::Invalid);
        }

        let reply = match mode {
            AuthMode::Login => self.remote.login(username, password).await,
            AuthMode::Register => self.remote.register(username, password).await,
        };

        match reply {
            Ok(AuthReply::Accepted(session)) => {
                self.sessions.establish(&session).await?;
                tracing::info!(target: "auth", "authenticated as {}", session.user_id);
                Ok(SubmitOutcome::Authenticated(session))
            }
            Ok(AuthReply::Rejected { message }) => {
                let default = match mode {
                    AuthMode::Login => "Login failed",
                    AuthMode::Register => "Registration failed",
                };
                self.surface
                    .show_auth_error(AuthField::General, message.as_deref().unwrap_or(default));
                Ok(SubmitOutcome::Rejected)
            }
            Err(err) => {
                self.surface
                    .show_auth_error(AuthField::General, &connectivity_message(&err));
                Ok(SubmitOutcome::Rejected)
            }
        }
    }

    /// Local form validation; failures never reach the network.
    fn validate(
        &self,
        mode: AuthMode,
        username: &str,
        password: &str,
        confirm: Option<&str>,
    ) -> bool {
        if username.chars().count() < MIN_USERNAME_CHARS {
            self.surface.show_auth_error(
                AuthField::Username,
                "Username must be at least 3 characters",
            );
            return false;
        }
        if password.chars().count() < MIN_PASSWORD_CHARS {
            self.surface.show_auth_error(
                AuthField::Password,
                "Password must be at least 6 characters",
            );
            return false;
        }
        if mode == AuthMode::Register && confirm != Some(password) {
            self.surface
                .show_auth_error(AuthField::Confirm, "Passwords do not match");
            return false;
        }
        true
    }
}

/// Connectivity diagnostic for auth failures that never produced a usable
/// response. Always names the endpoint that was attempted.
fn connectivity_message(err: &RemoteError) -> String {
    match err {
        RemoteError::Transport { endpoint, .. } | RemoteError::Malformed { endpoint, .. } => {
            format!(
                "Could not reach the companion service. Check that the backend is running:\n{endpoint}"
            )
        }
        RemoteError::Status { status, .. } => {
            format!("The companion service returned an error (HTTP {status}). Try again later.")
        }
    }
}
