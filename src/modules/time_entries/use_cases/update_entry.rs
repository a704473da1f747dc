use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::modules::time_entries::domain::{
    TimeEntry, derived_duration_minutes, validate_entry,
};
use crate::shared::core::auth::Actor;
use crate::shared::core::errors::CoreError;
use crate::shared::core::patch::clearable;
use crate::shared::infrastructure::store::{LedgerStore, StoreError};

/// Explicit patch: every field independently settable, absent fields left
/// untouched. Nullable entity fields use the double `Option` so an explicit
/// JSON `null` clears them instead of being dropped.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimeEntryPatch {
    pub project_id: Option<String>,
    #[serde(default, deserialize_with = "clearable")]
    pub task_id: Option<Option<String>>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "clearable")]
    pub start_time: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "clearable")]
    pub end_time: Option<Option<DateTime<Utc>>>,
    pub duration_minutes: Option<i64>,
    pub is_billable: Option<bool>,
    #[serde(default, deserialize_with = "clearable")]
    pub hourly_rate: Option<Option<Decimal>>,
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "clearable")]
    pub notes: Option<Option<String>>,
}

impl TimeEntryPatch {
    pub fn is_empty(&self) -> bool {
        self.project_id.is_none()
            && self.task_id.is_none()
            && self.description.is_none()
            && self.date.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
            && self.duration_minutes.is_none()
            && self.is_billable.is_none()
            && self.hourly_rate.is_none()
            && self.tags.is_none()
            && self.notes.is_none()
    }

    fn touches_interval(&self) -> bool {
        self.start_time.is_some() || self.end_time.is_some()
    }
}

pub struct UpdateEntryHandler {
    store: Arc<dyn LedgerStore>,
}

impl UpdateEntryHandler {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub async fn handle(
        &self,
        actor: &Actor,
        entry_id: &str,
        patch: TimeEntryPatch,
    ) -> Result<TimeEntry, CoreError> {
        if patch.is_empty() {
            return Err(CoreError::invalid_state(
                "NO_VALID_UPDATES",
                "no recognized field present in the patch",
            ));
        }

        let mut entry = self.store.get_entry(entry_id).await.map_err(|err| match err {
            StoreError::NotFound => CoreError::not_found("time_entry", entry_id),
            other => CoreError::from(other),
        })?;

        if !actor.owns(&entry.user_id) && !actor.role.can_manage() {
            return Err(CoreError::Forbidden(
                "only the owner or a manager may edit this entry".to_string(),
            ));
        }
        if !entry.status.is_mutable() {
            return Err(CoreError::invalid_state(
                "ALREADY_SUBMITTED",
                format!("entry is {} and can no longer be edited", entry.status.as_str()),
            ));
        }

        let recompute = patch.touches_interval();
        if let Some(project_id) = patch.project_id {
            entry.project_id = project_id;
        }
        if let Some(task_id) = patch.task_id {
            entry.task_id = task_id;
        }
        if let Some(description) = patch.description {
            entry.description = description;
        }
        if let Some(date) = patch.date {
            entry.date = date;
        }
        if let Some(start_time) = patch.start_time {
            entry.start_time = start_time;
        }
        if let Some(end_time) = patch.end_time {
            entry.end_time = end_time;
        }
        if let Some(duration_minutes) = patch.duration_minutes {
            entry.duration_minutes = duration_minutes;
        }
        if let Some(is_billable) = patch.is_billable {
            entry.is_billable = is_billable;
        }
        if let Some(hourly_rate) = patch.hourly_rate {
            entry.hourly_rate = hourly_rate;
        }
        if let Some(tags) = patch.tags {
            entry.tags = tags;
        }
        if let Some(notes) = patch.notes {
            entry.notes = notes;
        }

        // A changed interval always wins over a stored or patched duration.
        if recompute {
            if let (Some(start), Some(end)) = (entry.start_time, entry.end_time) {
                entry.duration_minutes = derived_duration_minutes(start, end);
            }
        }

        CoreError::violations(validate_entry(&entry))?;
        entry.updated_at = Utc::now();

        self.store.put_entry(entry.clone()).await.map_err(|err| {
            tracing::error!(entry_id = %entry.id, operation = "update_entry", %err, "store write failed");
            CoreError::from(err)
        })?;
        Ok(entry)
    }
}
