//! Shared test doubles: a scripted remote service, a recording surface and
//! an in-memory durable store. The storage-trait implementations from
//! `solace-infrastructure` run for real on top of the in-memory store.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use solace_application::controller::AppController;
use solace_application::surface::{AuthField, PresentationSurface, Speaker};
use solace_core::chat::{AlertFlag, ChatReply, MoodPoint, UserKind, UserStatistics};
use solace_core::consent::AuthoritativeConsent;
use solace_core::endpoint::EndpointConfig;
use solace_core::remote::{AuthReply, RemoteError, RemoteService};
use solace_core::session::Session;
use solace_core::storage::{LocalStore, StateKey};
use solace_core::survey::SurveySubmission;
use solace_infrastructure::{LocalConsentCache, LocalScheduleStore, LocalSessionStore};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const TEST_ENDPOINT: &str = "http://localhost:7860";

pub fn bob_session() -> Session {
    Session::new("u-bob", "bob", "tok-1")
}

/// One recorded call against the fake remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    Login,
    Register,
    FetchConsent(String),
    PushConsent { user_id: String, granted: bool },
    SubmitSurvey,
    SendChat(String),
    FetchStatistics(String),
    FetchHistory(String),
}

/// Scripted remote service. Each method pops its script queue and falls back
/// to a benign default when the queue is empty. Every call is recorded.
#[derive(Default)]
pub struct FakeRemote {
    calls: Mutex<Vec<RemoteCall>>,
    pub login_script: Mutex<VecDeque<Result<AuthReply, RemoteError>>>,
    pub consent_script: Mutex<VecDeque<Result<AuthoritativeConsent, RemoteError>>>,
    pub push_script: Mutex<VecDeque<Result<(), RemoteError>>>,
    pub survey_script: Mutex<VecDeque<Result<(), RemoteError>>>,
    pub chat_script: Mutex<VecDeque<Result<ChatReply, RemoteError>>>,
    pub stats_script: Mutex<VecDeque<Result<UserStatistics, RemoteError>>>,
    pub history_script: Mutex<VecDeque<Result<Vec<MoodPoint>, RemoteError>>>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_calls(&self, matching: impl Fn(&RemoteCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| matching(c)).count()
    }

    pub fn script_consent(&self, result: Result<AuthoritativeConsent, RemoteError>) {
        self.consent_script.lock().unwrap().push_back(result);
    }

    pub fn script_login(&self, result: Result<AuthReply, RemoteError>) {
        self.login_script.lock().unwrap().push_back(result);
    }

    pub fn script_push(&self, result: Result<(), RemoteError>) {
        self.push_script.lock().unwrap().push_back(result);
    }

    pub fn script_survey(&self, result: Result<(), RemoteError>) {
        self.survey_script.lock().unwrap().push_back(result);
    }

    pub fn script_chat(&self, result: Result<ChatReply, RemoteError>) {
        self.chat_script.lock().unwrap().push_back(result);
    }

    fn record(&self, call: RemoteCall) {
        self.calls.lock().unwrap().push(call);
    }
}

pub fn transport_error() -> RemoteError {
    RemoteError::Transport {
        endpoint: TEST_ENDPOINT.to_string(),
        message: "connection refused".to_string(),
    }
}

pub fn status_error(status: u16) -> RemoteError {
    RemoteError::Status {
        status,
        message: String::new(),
    }
}

pub fn consent_of(decision: Option<bool>) -> AuthoritativeConsent {
    AuthoritativeConsent {
        decision,
        decided_at: None,
    }
}

#[async_trait]
impl RemoteService for FakeRemote {
    async fn set_endpoint(&self, _endpoint: EndpointConfig) {}

    async fn login(&self, _username: &str, _password: &str) -> Result<AuthReply, RemoteError> {
        self.record(RemoteCall::Login);
        self.login_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(AuthReply::Accepted(bob_session())))
    }

    async fn register(&self, _username: &str, _password: &str) -> Result<AuthReply, RemoteError> {
        self.record(RemoteCall::Register);
        self.login_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(AuthReply::Accepted(bob_session())))
    }

    async fn fetch_consent(&self, user_id: &str) -> Result<AuthoritativeConsent, RemoteError> {
        self.record(RemoteCall::FetchConsent(user_id.to_string()));
        self.consent_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(consent_of(None)))
    }

    async fn push_consent(
        &self,
        user_id: &str,
        granted: bool,
        _decided_at: DateTime<Utc>,
    ) -> Result<(), RemoteError> {
        self.record(RemoteCall::PushConsent {
            user_id: user_id.to_string(),
            granted,
        });
        self.push_script.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }

    async fn submit_survey(
        &self,
        _submission: &SurveySubmission,
        _token: &str,
    ) -> Result<(), RemoteError> {
        self.record(RemoteCall::SubmitSurvey);
        self.survey_script.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }

    async fn send_chat(
        &self,
        message: &str,
        _user_id: &str,
        _kind: UserKind,
        _token: &str,
    ) -> Result<ChatReply, RemoteError> {
        self.record(RemoteCall::SendChat(message.to_string()));
        self.chat_script.lock().unwrap().pop_front().unwrap_or(Ok(ChatReply {
            response: "I'm here with you.".to_string(),
            alert: AlertFlag::None,
            mood_index: Some(42.0),
            stage_info: None,
        }))
    }

    async fn fetch_statistics(
        &self,
        user_id: &str,
        _token: &str,
    ) -> Result<UserStatistics, RemoteError> {
        self.record(RemoteCall::FetchStatistics(user_id.to_string()));
        self.stats_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(UserStatistics {
                total_interactions: 3,
                average_emotion: 0.6,
            }))
    }

    async fn fetch_mood_history(
        &self,
        user_id: &str,
        _days: u32,
        _token: &str,
    ) -> Result<Vec<MoodPoint>, RemoteError> {
        self.record(RemoteCall::FetchHistory(user_id.to_string()));
        self.history_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(Vec::new()))
    }
}

/// One recorded presentation effect.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    AuthView,
    AuthenticatedView(String),
    AuthError(String),
    ClearAuthErrors,
    ConsentOpened,
    ConsentClosed,
    Enabled(bool),
    SurveyOpened,
    SurveyClosed,
    SurveyFailure(String),
    Message {
        speaker: Speaker,
        text: String,
        crisis: bool,
    },
    Mood(f64),
    Stage(String),
    Statistics(u64, f64),
    Status(String),
    TornDown(String),
}

/// Surface that records every effect in order.
pub struct RecordingSurface {
    events: Mutex<Vec<SurfaceEvent>>,
    pub allow_logout: AtomicBool,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            allow_logout: AtomicBool::new(true),
        }
    }

    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn contains(&self, event: &SurfaceEvent) -> bool {
        self.events.lock().unwrap().contains(event)
    }

    pub fn position(&self, matching: impl Fn(&SurfaceEvent) -> bool) -> Option<usize> {
        self.events.lock().unwrap().iter().position(|e| matching(e))
    }

    fn record(&self, event: SurfaceEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl PresentationSurface for RecordingSurface {
    fn show_auth_view(&self) {
        self.record(SurfaceEvent::AuthView);
    }

    fn show_authenticated_view(&self, user_name: &str) {
        self.record(SurfaceEvent::AuthenticatedView(user_name.to_string()));
    }

    fn show_auth_error(&self, _field: AuthField, message: &str) {
        self.record(SurfaceEvent::AuthError(message.to_string()));
    }

    fn clear_auth_errors(&self) {
        self.record(SurfaceEvent::ClearAuthErrors);
    }

    fn confirm_logout(&self) -> bool {
        self.allow_logout.load(Ordering::SeqCst)
    }

    fn open_consent_prompt(&self) {
        self.record(SurfaceEvent::ConsentOpened);
    }

    fn close_consent_prompt(&self) {
        self.record(SurfaceEvent::ConsentClosed);
    }

    fn set_application_enabled(&self, enabled: bool) {
        self.record(SurfaceEvent::Enabled(enabled));
    }

    fn open_survey_prompt(&self) {
        self.record(SurfaceEvent::SurveyOpened);
    }

    fn close_survey_prompt(&self) {
        self.record(SurfaceEvent::SurveyClosed);
    }

    fn show_survey_failure(&self, message: &str) {
        self.record(SurfaceEvent::SurveyFailure(message.to_string()));
    }

    fn append_message(&self, speaker: Speaker, text: &str, alert: AlertFlag) {
        self.record(SurfaceEvent::Message {
            speaker,
            text: text.to_string(),
            crisis: alert.is_crisis(),
        });
    }

    fn update_mood(&self, mood: f64) {
        self.record(SurfaceEvent::Mood(mood));
    }

    fn update_stage(&self, stage: &str) {
        self.record(SurfaceEvent::Stage(stage.to_string()));
    }

    fn update_statistics(&self, total_interactions: u64, stability: f64) {
        self.record(SurfaceEvent::Statistics(total_interactions, stability));
    }

    fn set_status(&self, status: &str) {
        self.record(SurfaceEvent::Status(status.to_string()));
    }

    fn tear_down(&self, notice: &str) {
        self.record(SurfaceEvent::TornDown(notice.to_string()));
    }
}

/// In-memory durable store.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LocalStore for MemoryStore {
    async fn get(&self, key: &StateKey) -> solace_core::error::Result<Option<String>> {
        Ok(self.entries.lock().unwrap().get(&key.storage_key()).cloned())
    }

    async fn put(&self, key: &StateKey, value: &str) -> solace_core::error::Result<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.storage_key(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &StateKey) -> solace_core::error::Result<()> {
        self.entries.lock().unwrap().remove(&key.storage_key());
        Ok(())
    }
}

/// A fully wired controller over the fakes, with the real storage layers on
/// top of the in-memory store.
pub struct Harness {
    pub remote: Arc<FakeRemote>,
    pub surface: Arc<RecordingSurface>,
    pub store: Arc<MemoryStore>,
    pub sessions: Arc<LocalSessionStore>,
    pub consent: Arc<LocalConsentCache>,
    pub schedule: Arc<LocalScheduleStore>,
    pub controller: AppController,
}

pub fn harness() -> Harness {
    let remote = Arc::new(FakeRemote::new());
    let surface = Arc::new(RecordingSurface::new());
    let store = Arc::new(MemoryStore::new());
    let sessions = Arc::new(LocalSessionStore::new(store.clone() as Arc<dyn LocalStore>));
    let consent = Arc::new(LocalConsentCache::new(store.clone() as Arc<dyn LocalStore>));
    let schedule = Arc::new(LocalScheduleStore::new(store.clone() as Arc<dyn LocalStore>));

    let controller = AppController::new(
        remote.clone(),
        sessions.clone(),
        consent.clone(),
        schedule.clone(),
        store.clone(),
        surface.clone(),
        EndpointConfig::new(TEST_ENDPOINT),
    );

    Harness {
        remote,
        surface,
        store,
        sessions,
        consent,
        schedule,
        controller,
    }
}
