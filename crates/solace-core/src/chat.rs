//! Chat relay and companion-panel domain types.

use serde::{Deserialize, Serialize};

/// Mood value shown when the backend reports a mood it cannot quantify.
pub const DEFAULT_MOOD: f64 = 50.0;

/// The relationship persona the companion speaks as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserKind {
    #[default]
    Partner,
    Parent,
    Pet,
}

impl UserKind {
    /// Wire representation expected by the backend.
    pub fn as_wire(&self) -> &'static str {
        match self {
            UserKind::Partner => "Partner",
            UserKind::Parent => "Parent",
            UserKind::Pet => "Pet",
        }
    }
}

/// Safety flag attached to a companion reply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AlertFlag {
    #[default]
    None,
    Warning,
    Crisis,
}

impl AlertFlag {
    /// Parses the backend's string flag; unknown or empty values read as
    /// `None`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("crisis") => AlertFlag::Crisis,
            Some("warning") => AlertFlag::Warning,
            _ => AlertFlag::None,
        }
    }

    pub fn is_crisis(&self) -> bool {
        matches!(self, AlertFlag::Crisis)
    }
}

/// A companion reply, after wire-level parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub response: String,
    pub alert: AlertFlag,
    /// Mood index in [0, 100]; `None` when the backend sent nothing.
    pub mood_index: Option<f64>,
    pub stage_info: Option<String>,
}

/// Parses the backend's mood index, which arrives as a formatted string.
///
/// A present but non-numeric value (the backend sends placeholders such as
/// "--" in degraded mode) reads as [`DEFAULT_MOOD`]; an absent or empty
/// value reads as `None`.
pub fn parse_mood_index(raw: Option<&str>) -> Option<f64> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    Some(raw.parse::<f64>().unwrap_or(DEFAULT_MOOD))
}

/// Aggregate interaction statistics for one user.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UserStatistics {
    #[serde(rename = "totalInteractions", default)]
    pub total_interactions: u64,
    #[serde(rename = "averageEmotion", default = "default_average_emotion")]
    pub average_emotion: f64,
}

fn default_average_emotion() -> f64 {
    0.5
}

/// Emotional stability score derived from the average emotion.
///
/// An average of 0.5 is perfectly stable (100); the score falls linearly as
/// the average drifts toward either extreme. Displayed to one decimal.
pub fn stability_score(average_emotion: f64) -> f64 {
    100.0 - (average_emotion - 0.5).abs() * 200.0
}

/// One point of a user's mood history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodPoint {
    pub timestamp: String,
    pub mood: f64,
}
