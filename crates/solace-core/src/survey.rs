//! Periodic wellbeing survey: question set, responses, schedule state.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Version of the question set; bumped whenever the questions change so the
/// backend can interpret stored answer indices.
pub const QUESTION_SET_VERSION: u32 = 1;

/// One question of the fixed survey.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurveyQuestion {
    pub id: u32,
    pub text: &'static str,
    pub options: [&'static str; 4],
}

static QUESTIONS: Lazy<Vec<SurveyQuestion>> = Lazy::new(|| {
    vec![
        SurveyQuestion {
            id: 1,
            text: "Over the past week, have you felt sad or down?",
            options: ["Not at all", "Occasionally", "Often", "Almost always"],
        },
        SurveyQuestion {
            id: 2,
            text: "Are you able to find joy in your daily activities?",
            options: ["Yes", "Sometimes", "Rarely", "Not at all"],
        },
        SurveyQuestion {
            id: 3,
            text: "Do you feel your life has lost purpose or meaning?",
            options: ["Not at all", "Somewhat", "Considerably", "Strongly agree"],
        },
        SurveyQuestion {
            id: 4,
            text: "Do you feel hopeful about the future?",
            options: [
                "Very hopeful",
                "Somewhat hopeful",
                "Not very hopeful",
                "No hope at all",
            ],
        },
        SurveyQuestion {
            id: 5,
            text: "Have you experienced trouble sleeping, or slept far more than usual?",
            options: ["No", "Sometimes", "Often", "Severely"],
        },
    ]
});

/// The fixed, versioned question set presented on every survey.
pub fn question_set() -> &'static [SurveyQuestion] {
    &QUESTIONS
}

/// One answer in a survey response set.
///
/// `answer_index`/`answer_text` stay `None` while the question is
/// unanswered; a submission with any unanswered question is rejected before
/// it reaches the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyAnswer {
    pub question_id: u32,
    pub question_text: String,
    pub answer_index: Option<u32>,
    pub answer_text: Option<String>,
}

impl SurveyAnswer {
    /// An unanswered slot for the given question.
    pub fn blank(question: &SurveyQuestion) -> Self {
        Self {
            question_id: question.id,
            question_text: question.text.to_string(),
            answer_index: None,
            answer_text: None,
        }
    }

    /// An answered slot: `index` selects one of the question's options.
    pub fn selected(question: &SurveyQuestion, index: u32) -> Self {
        let text = question
            .options
            .get(index as usize)
            .map(|opt| (*opt).to_string());
        Self {
            question_id: question.id,
            question_text: question.text.to_string(),
            answer_index: Some(index),
            answer_text: text,
        }
    }

    pub fn is_answered(&self) -> bool {
        self.answer_index.is_some()
    }
}

/// Returns true when every question in the set has a non-null answer.
pub fn is_complete(responses: &[SurveyAnswer]) -> bool {
    responses.len() == question_set().len() && responses.iter().all(SurveyAnswer::is_answered)
}

/// The survey payload sent to the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveySubmission {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    pub responses: Vec<SurveyAnswer>,
}

/// Schedule state driving the periodic survey prompt.
///
/// `last_survey_at` is updated only on a confirmed successful submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyScheduleState {
    pub last_survey_at: Option<DateTime<Utc>>,
}

/// Durable store for the survey schedule state.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// Timestamp of the last confirmed submission, if any.
    async fn last_survey_at(&self) -> Option<DateTime<Utc>>;

    /// Records a confirmed submission.
    async fn record_submission(&self, at: DateTime<Utc>) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_set_is_fixed() {
        let questions = question_set();
        assert_eq!(questions.len(), 5);
        assert_eq!(questions[0].id, 1);
        assert_eq!(questions[4].id, 5);
        for q in questions {
            assert_eq!(q.options.len(), 4);
        }
    }

    #[test]
    fn test_selected_answer_carries_option_text() {
        let q = &question_set()[0];
        let answer = SurveyAnswer::selected(q, 1);
        assert_eq!(answer.answer_index, Some(1));
        assert_eq!(answer.answer_text.as_deref(), Some("Occasionally"));
        assert!(answer.is_answered());
    }

    #[test]
    fn test_out_of_range_selection_keeps_index_but_no_text() {
        let q = &question_set()[0];
        let answer = SurveyAnswer::selected(q, 9);
        assert_eq!(answer.answer_index, Some(9));
        assert!(answer.answer_text.is_none());
    }

    #[test]
    fn test_completeness_requires_every_question_answered() {
        let questions = question_set();
        let mut responses: Vec<SurveyAnswer> = questions
            .iter()
            .map(|q| SurveyAnswer::selected(q, 0))
            .collect();
        assert!(is_complete(&responses));

        responses[2] = SurveyAnswer::blank(&questions[2]);
        assert!(!is_complete(&responses));

        // A short response set is never complete.
        responses.pop();
        assert!(!is_complete(&responses));
    }

    #[test]
    fn test_submission_wire_shape() {
        let questions = question_set();
        let submission = SurveySubmission {
            user_id: "bob".to_string(),
            timestamp: Utc::now(),
            responses: vec![SurveyAnswer::selected(&questions[0], 2)],
        };
        let json = serde_json::to_value(&submission).unwrap();
        assert!(json.get("userId").is_some());
        assert_eq!(json["responses"][0]["question_id"], 1);
        assert_eq!(json["responses"][0]["answer_index"], 2);
    }
}
