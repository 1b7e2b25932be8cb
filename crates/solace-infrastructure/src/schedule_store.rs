//! Survey schedule persistence over the durable local store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use solace_core::error::Result;
use solace_core::storage::{LocalStore, StateKey};
use solace_core::survey::ScheduleStore;
use std::sync::Arc;

/// Schedule store persisting the last-submission timestamp as RFC 3339.
pub struct LocalScheduleStore {
    store: Arc<dyn LocalStore>,
}

impl LocalScheduleStore {
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ScheduleStore for LocalScheduleStore {
    async fn last_survey_at(&self) -> Option<DateTime<Utc>> {
        let raw = match self.store.get(&StateKey::LastSurveyAt).await {
            Ok(value) => value?,
            Err(e) => {
                tracing::warn!(target: "survey", "failed to read schedule state: {e}");
                return None;
            }
        };
        match DateTime::parse_from_rfc3339(&raw) {
            Ok(dt) => Some(dt.with_timezone(&Utc)),
            Err(e) => {
                tracing::warn!(target: "survey", "unparseable last-survey timestamp {raw:?}: {e}");
                None
            }
        }
    }

    async fn record_submission(&self, at: DateTime<Utc>) -> Result<()> {
        self.store
            .put(&StateKey::LastSurveyAt, &at.to_rfc3339())
            .await
    }
}
