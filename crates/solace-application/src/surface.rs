//! Presentation surface seam.
//!
//! The engine never touches rendering; it drives the UI host through this
//! trait and treats every call as an opaque effect. A desktop shell, web
//! view or test recorder can all sit behind it.

use solace_core::chat::AlertFlag;

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Companion,
}

/// Which auth-form slot an error message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthField {
    Username,
    Password,
    Confirm,
    /// The form-level error slot (server rejections, connectivity).
    General,
}

/// Named hooks the engine calls on the UI host.
///
/// Hooks are synchronous: the host applies each effect before returning, so
/// ordering guarantees (in particular disabling the application the moment a
/// closed consent gate is detected) hold without further coordination.
pub trait PresentationSurface: Send + Sync {
    /// Shows the login/register view.
    fn show_auth_view(&self);

    /// Shows the authenticated application view.
    fn show_authenticated_view(&self, user_name: &str);

    /// Displays a validation or auth failure message in the given slot.
    fn show_auth_error(&self, field: AuthField, message: &str);

    /// Clears all auth error slots.
    fn clear_auth_errors(&self);

    /// Asks the user to confirm logging out.
    fn confirm_logout(&self) -> bool;

    /// Opens the blocking consent prompt.
    fn open_consent_prompt(&self);

    /// Closes the consent prompt.
    fn close_consent_prompt(&self);

    /// Enables or disables interaction with the application as a whole
    /// (both visually and functionally).
    fn set_application_enabled(&self, enabled: bool);

    /// Opens the periodic survey prompt.
    fn open_survey_prompt(&self);

    /// Closes the survey prompt.
    fn close_survey_prompt(&self);

    /// Surfaces a survey submission failure with diagnostic guidance.
    fn show_survey_failure(&self, message: &str);

    /// Appends a chat message; a crisis alert selects distinct styling.
    fn append_message(&self, speaker: Speaker, text: &str, alert: AlertFlag);

    /// Updates the mood panel.
    fn update_mood(&self, mood: f64);

    /// Updates the stage panel.
    fn update_stage(&self, stage: &str);

    /// Updates the statistics panel. `stability` is already rounded for
    /// display.
    fn update_statistics(&self, total_interactions: u64, stability: f64);

    /// Updates the status line.
    fn set_status(&self, status: &str);

    /// Tears the application down; the client becomes unusable.
    fn tear_down(&self, notice: &str);
}
