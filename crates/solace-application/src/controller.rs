//! Top-level application controller.
//!
//! Owns the application state as an explicit value and sequences the
//! startup path: session restore, then consent reconciliation, and only
//! after the gate opens the survey check, statistics and history loads.
//! Completions of superseded requests (say, a logout racing an in-flight
//! fetch) are guarded by re-checking the active session before their effects
//! are applied.

use crate::auth::{AuthFlow, AuthMode, AuthPhase, SubmitOutcome};
use crate::consent::{ConsentReconciler, Gate};
use crate::surface::{AuthField, PresentationSurface, Speaker};
use crate::survey::{SurveyOutcome, SurveyScheduler};
use chrono::Utc;
use solace_core::chat::{self, AlertFlag, MoodPoint, UserKind};
use solace_core::consent::ConsentCache;
use solace_core::endpoint::EndpointConfig;
use solace_core::error::{Result, SolaceError};
use solace_core::remote::{RemoteError, RemoteService};
use solace_core::session::{Session, SessionStore};
use solace_core::storage::{LocalStore, StateKey};
use solace_core::survey::{ScheduleStore, SurveyAnswer};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Days of mood history loaded for the panel.
const HISTORY_DAYS: u32 = 7;

/// Mutable application state, owned by the controller.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The resolved backend endpoint for this run.
    pub endpoint: EndpointConfig,
    pub phase: AuthPhase,
    /// True while the auth form is in login mode (false = register).
    pub login_mode: bool,
    pub user_kind: UserKind,
    pub conversation_count: u64,
    pub mood_history: Vec<MoodPoint>,
}

impl AppState {
    fn new(endpoint: EndpointConfig) -> Self {
        Self {
            endpoint,
            phase: AuthPhase::Anonymous,
            login_mode: true,
            user_kind: UserKind::default(),
            conversation_count: 0,
            mood_history: Vec::new(),
        }
    }
}

/// Orchestrates the engine's components against the presentation surface.
pub struct AppController {
    remote: Arc<dyn RemoteService>,
    sessions: Arc<dyn SessionStore>,
    store: Arc<dyn LocalStore>,
    surface: Arc<dyn PresentationSurface>,
    auth: AuthFlow,
    reconciler: ConsentReconciler,
    scheduler: SurveyScheduler,
    state: RwLock<AppState>,
}

impl AppController {
    pub fn new(
        remote: Arc<dyn RemoteService>,
        sessions: Arc<dyn SessionStore>,
        consent: Arc<dyn ConsentCache>,
        schedule: Arc<dyn ScheduleStore>,
        store: Arc<dyn LocalStore>,
        surface: Arc<dyn PresentationSurface>,
        endpoint: EndpointConfig,
    ) -> Self {
        let auth = AuthFlow::new(remote.clone(), sessions.clone(), surface.clone());
        let reconciler =
            ConsentReconciler::new(remote.clone(), consent.clone(), surface.clone());
        let scheduler = SurveyScheduler::new(
            remote.clone(),
            sessions.clone(),
            consent,
            schedule,
            surface.clone(),
        );
        Self {
            remote,
            sessions,
            store,
            surface,
            auth,
            reconciler,
            scheduler,
            state: RwLock::new(AppState::new(endpoint)),
        }
    }

    /// Replaces the survey scheduler (tests pin jitter and retry delays).
    pub fn with_scheduler(mut self, scheduler: SurveyScheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Entry point, run once at startup: restores the session (before any
    /// network activity) and either resumes it or shows the auth view.
    pub async fn start(&self) {
        match self.sessions.restore().await {
            Some(session) => self.enter_authenticated(session).await,
            None => {
                self.state.write().await.phase = AuthPhase::Anonymous;
                self.surface.show_auth_view();
            }
        }
    }

    /// Submits the auth form in the current mode.
    pub async fn submit_auth(&self, username: &str, password: &str, confirm: Option<&str>) {
        let mode = if self.state.read().await.login_mode {
            AuthMode::Login
        } else {
            AuthMode::Register
        };

        self.state.write().await.phase = AuthPhase::Authenticating;
        match self.auth.submit(mode, username, password, confirm).await {
            Ok(SubmitOutcome::Authenticated(session)) => {
                self.enter_authenticated(session).await;
            }
            Ok(_) => {
                // Validation or rejection: the form stays, nothing changed.
                self.state.write().await.phase = AuthPhase::Anonymous;
            }
            Err(e) => {
                tracing::error!(target: "auth", "failed to establish session: {e}");
                self.surface.show_auth_error(
                    AuthField::General,
                    "Could not save your session. Please try again.",
                );
                self.state.write().await.phase = AuthPhase::Anonymous;
            }
        }
    }

    /// Flips the auth form between login and register modes.
    pub async fn toggle_auth_mode(&self) {
        let mut state = self.state.write().await;
        state.login_mode = !state.login_mode;
        self.surface.clear_auth_errors();
    }

    /// Logs out after an explicit confirmation, resetting UI mode toggles.
    pub async fn logout(&self) {
        if !self.surface.confirm_logout() {
            return;
        }
        if let Err(e) = self.sessions.clear().await {
            tracing::warn!(target: "session", "failed to clear session mirror: {e}");
        }
        {
            let mut state = self.state.write().await;
            state.phase = AuthPhase::Anonymous;
            state.login_mode = true;
            state.user_kind = UserKind::default();
            state.conversation_count = 0;
            state.mood_history.clear();
        }
        self.surface.clear_auth_errors();
        self.surface.show_auth_view();
    }

    /// Records the user's consent grant and resumes initialization.
    pub async fn accept_consent(&self) {
        let Some(session) = self.sessions.current().await else {
            return;
        };
        if let Err(e) = self.reconciler.accept(&session.user_id).await {
            // The grant did not become durable; the gate stays closed.
            tracing::error!(target: "consent", "failed to record grant: {e}");
            return;
        }
        self.finish_init(&session).await;
        self.state.write().await.phase = AuthPhase::Ready;
    }

    /// Records the user's consent decline and terminates the client.
    pub async fn decline_consent(&self) {
        let Some(session) = self.sessions.current().await else {
            return;
        };
        self.reconciler.decline(&session.user_id).await;
        self.state.write().await.phase = AuthPhase::Terminated;
    }

    /// Relays a chat message and applies the reply to the panels.
    pub async fn send_message(&self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if self.state.read().await.phase != AuthPhase::Ready {
            return;
        }
        let Some(session) = self.sessions.current().await else {
            return;
        };

        self.surface
            .append_message(Speaker::User, text, AlertFlag::None);

        let kind = self.state.read().await.user_kind;
        match self
            .remote
            .send_chat(text, &session.user_id, kind, &session.token)
            .await
        {
            Ok(reply) => {
                if !self.still_active(&session.user_id).await {
                    return;
                }
                self.surface
                    .append_message(Speaker::Companion, &reply.response, reply.alert);
                if let Some(mood) = reply.mood_index {
                    self.surface.update_mood(mood);
                }
                if let Some(stage) = reply.stage_info.as_deref() {
                    self.surface.update_stage(stage);
                }
                self.surface.set_status("active");
                self.state.write().await.conversation_count += 1;
                self.load_statistics(&session).await;
            }
            Err(RemoteError::Malformed { .. }) => {
                self.surface.append_message(
                    Speaker::Companion,
                    "Sorry, something went wrong. Please try again shortly.",
                    AlertFlag::None,
                );
            }
            Err(err) => {
                tracing::warn!(target: "chat", "chat relay failed: {err}");
                let endpoint = self.state.read().await.endpoint.chat_url();
                self.surface.append_message(
                    Speaker::Companion,
                    &format!(
                        "Could not reach the companion service.\n\n\
                         Possible causes:\n\
                         1. The backend is not running\n\
                         2. Backend endpoint: {endpoint}"
                    ),
                    AlertFlag::None,
                );
            }
        }
    }

    /// Submits a survey response set.
    pub async fn submit_survey(&self, responses: Vec<SurveyAnswer>) -> SurveyOutcome {
        self.scheduler.submit(Utc::now(), responses).await
    }

    /// Closes the survey prompt without submitting.
    pub async fn dismiss_survey(&self) {
        self.surface.close_survey_prompt();
    }

    /// Selects the companion persona sent with chat messages.
    pub async fn set_user_kind(&self, kind: UserKind) {
        self.state.write().await.user_kind = kind;
    }

    /// Persists a user-chosen endpoint override and repoints the client.
    ///
    /// Derived endpoint URLs are pure functions of the base, so the new
    /// value takes effect on the next request.
    pub async fn override_endpoint(&self, url: &str) -> Result<()> {
        let url = url.trim();
        if url.is_empty() {
            return Err(SolaceError::config("endpoint override must not be empty"));
        }
        self.store.put(&StateKey::EndpointOverride, url).await?;
        let endpoint = EndpointConfig::new(url);
        self.remote.set_endpoint(endpoint.clone()).await;
        self.state.write().await.endpoint = endpoint;
        Ok(())
    }

    pub async fn phase(&self) -> AuthPhase {
        self.state.read().await.phase
    }

    pub async fn endpoint(&self) -> EndpointConfig {
        self.state.read().await.endpoint.clone()
    }

    pub async fn login_mode(&self) -> bool {
        self.state.read().await.login_mode
    }

    pub async fn conversation_count(&self) -> u64 {
        self.state.read().await.conversation_count
    }

    pub async fn mood_history(&self) -> Vec<MoodPoint> {
        self.state.read().await.mood_history.clone()
    }

    /// Transition into the authenticated state: mirror the authoritative
    /// consent record, show the authenticated view, then gate.
    async fn enter_authenticated(&self, session: Session) {
        self.state.write().await.phase = AuthPhase::Authenticated;

        self.reconciler.sync_authoritative(&session.user_id).await;
        if !self.still_active(&session.user_id).await {
            return;
        }

        self.surface.show_authenticated_view(&session.user_name);

        match self.reconciler.evaluate_gate(&session.user_id).await {
            Gate::Open => {
                self.finish_init(&session).await;
                self.state.write().await.phase = AuthPhase::Ready;
            }
            Gate::Closed => {
                // Initialization halts here until the user decides.
                self.state.write().await.phase = AuthPhase::ConsentPending;
            }
        }
    }

    /// The post-gate initialization sequence: survey check, statistics,
    /// mood history.
    async fn finish_init(&self, session: &Session) {
        self.check_survey_schedule(session).await;
        self.load_statistics(session).await;
        self.load_mood_history(session).await;
    }

    async fn check_survey_schedule(&self, session: &Session) {
        let Some(delay) = self.scheduler.prompt_delay(Utc::now()).await else {
            return;
        };
        let surface = self.surface.clone();
        let sessions = self.sessions.clone();
        let user_id = session.user_id.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // The prompt may have been superseded by a logout in the
            // meantime.
            if sessions
                .current()
                .await
                .is_some_and(|s| s.user_id == user_id)
            {
                surface.open_survey_prompt();
            }
        });
    }

    async fn load_statistics(&self, session: &Session) {
        match self
            .remote
            .fetch_statistics(&session.user_id, &session.token)
            .await
        {
            Ok(stats) => {
                if !self.still_active(&session.user_id).await {
                    return;
                }
                let stability = round_display(chat::stability_score(stats.average_emotion));
                self.surface
                    .update_statistics(stats.total_interactions, stability);
            }
            Err(e) => {
                // Panels keep their last values; a failed load is not
                // surfaced.
                tracing::debug!(target: "stats", "statistics load failed: {e}");
            }
        }
    }

    async fn load_mood_history(&self, session: &Session) {
        match self
            .remote
            .fetch_mood_history(&session.user_id, HISTORY_DAYS, &session.token)
            .await
        {
            Ok(history) => {
                if !self.still_active(&session.user_id).await {
                    return;
                }
                self.state.write().await.mood_history = history;
            }
            Err(e) => {
                tracing::debug!(target: "stats", "mood history load failed: {e}");
            }
        }
    }

    /// True while the given user is still the active session; used to guard
    /// effects of requests that may have been superseded.
    async fn still_active(&self, user_id: &str) -> bool {
        self.sessions
            .current()
            .await
            .is_some_and(|s| s.user_id == user_id)
    }
}

/// Rounds a score for display, one decimal place.
fn round_display(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
