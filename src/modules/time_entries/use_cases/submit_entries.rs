use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::modules::time_entries::domain::{
    MAX_BULK_ITEMS, SubmissionBlocker, TimeEntryStatus, submission_blocker,
};
use crate::shared::core::auth::Actor;
use crate::shared::core::bulk::BulkOutcome;
use crate::shared::core::errors::{CoreError, ItemError};
use crate::shared::infrastructure::store::LedgerStore;

/// Caller-imposed timeout per item; an elapsed item fails alone, never the
/// whole batch.
pub(crate) const BULK_ITEM_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) fn check_bulk_cap(ids: &[String]) -> Result<(), CoreError> {
    if ids.is_empty() {
        return Err(CoreError::Validation(vec![
            "at least one entry id is required".to_string(),
        ]));
    }
    if ids.len() > MAX_BULK_ITEMS {
        return Err(CoreError::Validation(vec![format!(
            "bulk operations accept at most {MAX_BULK_ITEMS} ids, got {}",
            ids.len()
        )]));
    }
    Ok(())
}

pub struct SubmitEntriesHandler {
    store: Arc<dyn LedgerStore>,
}

impl SubmitEntriesHandler {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, actor: &Actor, ids: Vec<String>) -> Result<BulkOutcome, CoreError> {
        check_bulk_cap(&ids)?;
        let now = Utc::now();
        let mut outcome = BulkOutcome::default();
        for id in ids {
            let result = match tokio::time::timeout(
                BULK_ITEM_TIMEOUT,
                self.submit_one(actor, &id, now),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(ItemError::Store("store call timed out".to_string())),
            };
            if let Err(err) = &result {
                tracing::warn!(entry_id = %id, operation = "submit", code = err.code(), "bulk item failed");
            }
            outcome.record(id, result);
        }
        Ok(outcome)
    }

    async fn submit_one(
        &self,
        actor: &Actor,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), ItemError> {
        let mut entry = self.store.get_entry(id).await.map_err(ItemError::from)?;

        if !entry.status.is_mutable() {
            return Err(ItemError::AlreadySubmitted);
        }
        if !actor.owns(&entry.user_id) && !actor.role.can_manage() {
            return Err(ItemError::Unauthorized);
        }
        match submission_blocker(&entry) {
            Some(SubmissionBlocker::MissingDescription) => {
                return Err(ItemError::MissingDescription);
            }
            Some(SubmissionBlocker::InvalidDuration) => return Err(ItemError::InvalidDuration),
            None => {}
        }

        entry.status = TimeEntryStatus::Submitted;
        entry.submitted_at = Some(now);
        // A resubmission after rejection starts a fresh review round.
        entry.rejected_at = None;
        entry.rejection_reason = None;
        entry.updated_at = now;

        self.store.put_entry(entry).await.map_err(ItemError::from)
    }
}
