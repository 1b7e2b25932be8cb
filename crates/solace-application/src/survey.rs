//! Survey scheduling and submission.
//!
//! The prompt cadence is deliberately unpredictable: once a submission
//! exists, the next prompt fires after a threshold drawn uniformly from
//! [5, 7) days, re-drawn on every evaluation, so the cadence cannot be
//! gamed. Submission runs under the bounded retry policies and records the
//! schedule state only after a confirmed success.

use crate::retry::{RetryPolicies, send_with_retry};
use crate::surface::{PresentationSurface, Speaker};
use chrono::{DateTime, Utc};
use rand::Rng;
use solace_core::chat::AlertFlag;
use solace_core::consent::ConsentCache;
use solace_core::remote::{RemoteError, RemoteService};
use solace_core::session::SessionStore;
use solace_core::survey::{self, ScheduleStore, SurveyAnswer, SurveySubmission};
use std::sync::Arc;
use std::time::Duration;

/// Delay before the very first prompt after initialization.
pub const FIRST_PROMPT_DELAY: Duration = Duration::from_secs(3);
/// Delay before a periodic prompt once the threshold has elapsed.
pub const PERIODIC_PROMPT_DELAY: Duration = Duration::from_secs(2);

/// Lower bound of the prompt threshold, in days.
const THRESHOLD_FLOOR_DAYS: f64 = 5.0;
/// Upper bound (exclusive) of the prompt threshold, in days.
const THRESHOLD_CEILING_DAYS: f64 = 7.0;

const CONFIRMATION_MESSAGE: &str = "Thank you for completing the survey! Your feedback has \
     been recorded and helps us understand how you are doing.";

/// Draws the day threshold for one evaluation.
pub type ThresholdDraw = Box<dyn Fn() -> f64 + Send + Sync>;

/// Outcome of a submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurveyOutcome {
    /// At least one question is unanswered; nothing reached the network.
    Incomplete,
    /// No session exists; nothing reached the network.
    NotSignedIn,
    /// The service confirmed the submission.
    Accepted,
    /// Every retry failed; a diagnostic was surfaced.
    Failed,
}

/// Decides when to prompt for the periodic survey and submits results.
pub struct SurveyScheduler {
    remote: Arc<dyn RemoteService>,
    sessions: Arc<dyn SessionStore>,
    consent: Arc<dyn ConsentCache>,
    schedule: Arc<dyn ScheduleStore>,
    surface: Arc<dyn PresentationSurface>,
    policies: RetryPolicies,
    threshold_days: ThresholdDraw,
}

impl SurveyScheduler {
    pub fn new(
        remote: Arc<dyn RemoteService>,
        sessions: Arc<dyn SessionStore>,
        consent: Arc<dyn ConsentCache>,
        schedule: Arc<dyn ScheduleStore>,
        surface: Arc<dyn PresentationSurface>,
    ) -> Self {
        Self {
            remote,
            sessions,
            consent,
            schedule,
            surface,
            policies: RetryPolicies::default(),
            threshold_days: Box::new(|| {
                rand::thread_rng().gen_range(THRESHOLD_FLOOR_DAYS..THRESHOLD_CEILING_DAYS)
            }),
        }
    }

    /// Overrides the retry policies (tests use zero delays).
    pub fn with_policies(mut self, policies: RetryPolicies) -> Self {
        self.policies = policies;
        self
    }

    /// Overrides the threshold draw (tests pin the jitter).
    pub fn with_threshold_draw(mut self, draw: ThresholdDraw) -> Self {
        self.threshold_days = draw;
        self
    }

    /// Decides whether to prompt, and after what delay.
    ///
    /// With no prior submission the prompt only fires for a user whose
    /// consent is granted, after a short settling delay. Otherwise elapsed
    /// whole days are compared against a freshly drawn threshold.
    pub async fn prompt_delay(&self, now: DateTime<Utc>) -> Option<Duration> {
        let session = self.sessions.current().await?;

        match self.schedule.last_survey_at().await {
            None => {
                let record = self.consent.read(&session.user_id).await.ok()?;
                if record.decision.is_granted() {
                    tracing::debug!(target: "survey", "first prompt scheduled for {}", session.user_id);
                    Some(FIRST_PROMPT_DELAY)
                } else {
                    None
                }
            }
            Some(last) => {
                let elapsed_days = (now - last).num_days();
                let threshold = (self.threshold_days)();
                if elapsed_days as f64 >= threshold {
                    tracing::debug!(
                        target: "survey",
                        "{elapsed_days} days since last survey (threshold {threshold:.2}), prompting"
                    );
                    Some(PERIODIC_PROMPT_DELAY)
                } else {
                    None
                }
            }
        }
    }

    /// Validates and submits a response set.
    ///
    /// Incomplete responses and missing sessions are rejected locally.
    /// Transient failures retry under the configured policies; the schedule
    /// state advances only once the service has confirmed the submission.
    pub async fn submit(
        &self,
        now: DateTime<Utc>,
        responses: Vec<SurveyAnswer>,
    ) -> SurveyOutcome {
        if !survey::is_complete(&responses) {
            self.surface
                .show_survey_failure("Please answer every question before submitting.");
            return SurveyOutcome::Incomplete;
        }

        let Some(session) = self.sessions.current().await else {
            self.surface
                .show_survey_failure("Sign in before submitting the survey.");
            return SurveyOutcome::NotSignedIn;
        };

        let submission = SurveySubmission {
            user_id: session.user_id.clone(),
            timestamp: now,
            responses,
        };

        let result = send_with_retry(self.policies, |attempt| {
            if attempt > 0 {
                tracing::info!(target: "survey", "resubmitting survey (attempt {})", attempt + 1);
            }
            self.remote.submit_survey(&submission, &session.token)
        })
        .await;

        match result {
            Ok(()) => {
                if let Err(e) = self.schedule.record_submission(now).await {
                    tracing::warn!(target: "survey", "failed to record submission time: {e}");
                }
                self.surface.close_survey_prompt();
                self.surface
                    .append_message(Speaker::Companion, CONFIRMATION_MESSAGE, AlertFlag::None);
                SurveyOutcome::Accepted
            }
            Err(err) => {
                self.surface.show_survey_failure(&failure_message(&err));
                SurveyOutcome::Failed
            }
        }
    }
}

/// Diagnostic guidance after the retry budget is exhausted.
fn failure_message(err: &RemoteError) -> String {
    match err {
        RemoteError::Transport { endpoint, .. } => format!(
            "Could not reach the companion service.\n\n\
             Possible causes:\n\
             1. The backend is not running (start it locally, or check your deployment)\n\
             2. Your network connection is unstable\n\n\
             Backend endpoint: {endpoint}"
        ),
        RemoteError::Status { status, .. } => format!(
            "Survey submission failed (error {status}).\n\n\
             The service may be temporarily offline; please try again later."
        ),
        RemoteError::Malformed { endpoint, .. } => format!(
            "The companion service answered unexpectedly. Backend endpoint: {endpoint}"
        ),
    }
}
