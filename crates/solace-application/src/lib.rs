//! Application layer for Solace.
//!
//! This crate provides the auth flow, consent reconciliation, survey
//! scheduling and the top-level controller that sequences them against the
//! presentation surface.

pub mod auth;
pub mod bootstrap;
pub mod consent;
pub mod controller;
pub mod retry;
pub mod surface;
pub mod survey;

pub use auth::{AuthFlow, AuthMode, AuthPhase, SubmitOutcome};
pub use consent::{ConsentReconciler, Gate};
pub use controller::{AppController, AppState};
pub use retry::{RetryPolicies, send_with_retry};
pub use surface::{AuthField, PresentationSurface, Speaker};
pub use survey::{SurveyOutcome, SurveyScheduler};
