//! HTTP implementation of the remote service seam.
//!
//! All requests derive their URL from the currently resolved endpoint, so an
//! explicit override takes effect on the next call without any cached URL
//! bookkeeping. Timeouts are declared per request: the chat relay tolerates a
//! slow model, the survey upload does not.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use solace_core::chat::{self, AlertFlag, ChatReply, MoodPoint, UserKind, UserStatistics};
use solace_core::consent::AuthoritativeConsent;
use solace_core::endpoint::EndpointConfig;
use solace_core::remote::{AuthReply, RemoteError, RemoteService};
use solace_core::session::Session;
use solace_core::survey::SurveySubmission;
use std::time::Duration;
use tokio::sync::RwLock;

/// Default timeout for auth, consent, statistics and history calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Survey uploads are small; fail fast so the retry policy can take over.
const SURVEY_TIMEOUT: Duration = Duration::from_secs(10);
/// Chat replies wait on model inference and may legitimately take a while.
const CHAT_TIMEOUT: Duration = Duration::from_secs(30);

/// Remote service client over HTTP.
pub struct HttpRemoteService {
    client: Client,
    endpoint: RwLock<EndpointConfig>,
}

impl HttpRemoteService {
    pub fn new(endpoint: EndpointConfig) -> Self {
        Self {
            client: Client::new(),
            endpoint: RwLock::new(endpoint),
        }
    }

    async fn endpoint(&self) -> EndpointConfig {
        self.endpoint.read().await.clone()
    }

    /// Sends a request, folding reqwest failures into the transport class
    /// and non-success statuses into the status class.
    async fn send(
        &self,
        request: RequestBuilder,
        endpoint: &str,
    ) -> Result<reqwest::Response, RemoteError> {
        let response = request
            .send()
            .await
            .map_err(|err| transport_error(endpoint, &err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, body));
        }
        Ok(response)
    }

    async fn authenticate(
        &self,
        url: String,
        username: &str,
        password: &str,
    ) -> Result<AuthReply, RemoteError> {
        let endpoint = self.endpoint().await;
        let response = self
            .client
            .post(&url)
            .timeout(DEFAULT_TIMEOUT)
            .json(&CredentialsBody { username, password })
            .send()
            .await
            .map_err(|err| transport_error(endpoint.base(), &err))?;

        // The service reports credential rejection inside a well-formed
        // body, sometimes alongside a 4xx status; parse the body first and
        // only fall back to the raw status when there is no body to read.
        let status = response.status();
        let body: AuthResponseBody = match response.json().await {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                return Err(status_error(status, String::new()));
            }
            Err(err) => {
                return Err(malformed(endpoint.base(), &err.to_string()));
            }
        };

        if !body.success {
            return Ok(AuthReply::Rejected {
                message: body.error,
            });
        }

        match (body.user_id, body.user_name, body.token) {
            (Some(user_id), Some(user_name), Some(token)) => Ok(AuthReply::Accepted(
                Session::new(user_id, user_name, token),
            )),
            _ => Err(malformed(
                endpoint.base(),
                "auth success without a complete session",
            )),
        }
    }
}

#[async_trait]
impl RemoteService for HttpRemoteService {
    async fn set_endpoint(&self, endpoint: EndpointConfig) {
        tracing::info!(target: "remote", "endpoint repointed to {}", endpoint.base());
        *self.endpoint.write().await = endpoint;
    }

    async fn login(&self, username: &str, password: &str) -> Result<AuthReply, RemoteError> {
        let url = self.endpoint().await.login_url();
        self.authenticate(url, username, password).await
    }

    async fn register(&self, username: &str, password: &str) -> Result<AuthReply, RemoteError> {
        let url = self.endpoint().await.register_url();
        self.authenticate(url, username, password).await
    }

    async fn fetch_consent(&self, user_id: &str) -> Result<AuthoritativeConsent, RemoteError> {
        let endpoint = self.endpoint().await;
        let request = self
            .client
            .get(endpoint.consent_record_url(user_id))
            .timeout(DEFAULT_TIMEOUT);
        let response = self.send(request, endpoint.base()).await?;

        let body: ConsentResponseBody = response
            .json()
            .await
            .map_err(|err| malformed(endpoint.base(), &err.to_string()))?;

        let decided_at = body
            .date
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Ok(AuthoritativeConsent {
            decision: body.consent,
            decided_at,
        })
    }

    async fn push_consent(
        &self,
        user_id: &str,
        granted: bool,
        decided_at: DateTime<Utc>,
    ) -> Result<(), RemoteError> {
        let endpoint = self.endpoint().await;
        let request = self
            .client
            .post(endpoint.consent_sync_url())
            .timeout(DEFAULT_TIMEOUT)
            .json(&ConsentSyncBody {
                user_id,
                consent: granted,
                date: decided_at.to_rfc3339(),
            });
        self.send(request, endpoint.base()).await?;
        Ok(())
    }

    async fn submit_survey(
        &self,
        submission: &SurveySubmission,
        token: &str,
    ) -> Result<(), RemoteError> {
        let endpoint = self.endpoint().await;
        let request = self
            .client
            .post(endpoint.survey_url())
            .timeout(SURVEY_TIMEOUT)
            .bearer_auth(token)
            .json(submission);
        self.send(request, endpoint.base()).await?;
        Ok(())
    }

    async fn send_chat(
        &self,
        message: &str,
        user_id: &str,
        kind: UserKind,
        token: &str,
    ) -> Result<ChatReply, RemoteError> {
        let endpoint = self.endpoint().await;
        let request = self
            .client
            .post(endpoint.chat_url())
            .timeout(CHAT_TIMEOUT)
            .bearer_auth(token)
            .json(&ChatBody {
                message,
                user_id,
                user_type: kind.as_wire(),
            });
        let response = self.send(request, endpoint.base()).await?;

        let body: ChatResponseBody = response
            .json()
            .await
            .map_err(|err| malformed(endpoint.base(), &err.to_string()))?;

        let Some(text) = body.response else {
            return Err(malformed(endpoint.base(), "chat reply without response text"));
        };

        Ok(ChatReply {
            response: text,
            alert: AlertFlag::parse(body.alert_flag.as_deref()),
            mood_index: chat::parse_mood_index(body.mood_index.as_deref()),
            stage_info: body.stage_info,
        })
    }

    async fn fetch_statistics(
        &self,
        user_id: &str,
        token: &str,
    ) -> Result<UserStatistics, RemoteError> {
        let endpoint = self.endpoint().await;
        let request = self
            .client
            .get(endpoint.statistics_url(user_id))
            .timeout(DEFAULT_TIMEOUT)
            .bearer_auth(token);
        let response = self.send(request, endpoint.base()).await?;
        response
            .json()
            .await
            .map_err(|err| malformed(endpoint.base(), &err.to_string()))
    }

    async fn fetch_mood_history(
        &self,
        user_id: &str,
        days: u32,
        token: &str,
    ) -> Result<Vec<MoodPoint>, RemoteError> {
        let endpoint = self.endpoint().await;
        let request = self
            .client
            .get(endpoint.history_url(user_id, days))
            .timeout(DEFAULT_TIMEOUT)
            .bearer_auth(token);
        let response = self.send(request, endpoint.base()).await?;
        let body: HistoryResponseBody = response
            .json()
            .await
            .map_err(|err| malformed(endpoint.base(), &err.to_string()))?;
        Ok(body.history)
    }
}

fn transport_error(endpoint: &str, err: &reqwest::Error) -> RemoteError {
    RemoteError::Transport {
        endpoint: endpoint.to_string(),
        message: err.to_string(),
    }
}

/// Maps an HTTP error status, preferring the service's own `{"error": ...}`
/// message over the raw body.
fn status_error(status: StatusCode, body: String) -> RemoteError {
    let message = serde_json::from_str::<ErrorResponseBody>(&body)
        .map(|wrapper| wrapper.error)
        .unwrap_or(body);
    RemoteError::Status {
        status: status.as_u16(),
        message,
    }
}

fn malformed(endpoint: &str, message: &str) -> RemoteError {
    RemoteError::Malformed {
        endpoint: endpoint.to_string(),
        message: message.to_string(),
    }
}

#[derive(Serialize)]
struct CredentialsBody<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct AuthResponseBody {
    #[serde(default)]
    success: bool,
    #[serde(rename = "userId")]
    user_id: Option<String>,
    #[serde(rename = "userName")]
    user_name: Option<String>,
    token: Option<String>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct ConsentResponseBody {
    consent: Option<bool>,
    date: Option<String>,
}

#[derive(Serialize)]
struct ConsentSyncBody<'a> {
    #[serde(rename = "userId")]
    user_id: &'a str,
    consent: bool,
    date: String,
}

#[derive(Serialize)]
struct ChatBody<'a> {
    message: &'a str,
    #[serde(rename = "userId")]
    user_id: &'a str,
    #[serde(rename = "userType")]
    user_type: &'a str,
}

#[derive(Deserialize)]
struct ChatResponseBody {
    response: Option<String>,
    #[serde(rename = "alertFlag")]
    alert_flag: Option<String>,
    #[serde(rename = "moodIndex")]
    mood_index: Option<String>,
    #[serde(rename = "stageInfo")]
    stage_info: Option<String>,
}

#[derive(Deserialize)]
struct HistoryResponseBody {
    #[serde(default)]
    history: Vec<MoodPoint>,
}

#[derive(Deserialize)]
struct ErrorResponseBody {
    error: String,
}
