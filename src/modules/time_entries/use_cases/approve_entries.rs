use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::modules::time_entries::domain::TimeEntryStatus;
use crate::modules::time_entries::use_cases::submit_entries::{BULK_ITEM_TIMEOUT, check_bulk_cap};
use crate::shared::core::auth::Actor;
use crate::shared::core::bulk::BulkOutcome;
use crate::shared::core::errors::{CoreError, ItemError};
use crate::shared::infrastructure::store::LedgerStore;

pub struct ApproveEntriesHandler {
    store: Arc<dyn LedgerStore>,
}

impl ApproveEntriesHandler {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// `allow_self_approval` is decided by the caller: true exactly when the
    /// actor is manager or admin, since no higher authority exists.
    pub async fn handle(
        &self,
        actor: &Actor,
        ids: Vec<String>,
        allow_self_approval: bool,
    ) -> Result<BulkOutcome, CoreError> {
        if !actor.role.can_manage() {
            return Err(CoreError::Forbidden(
                "only managers and admins may approve time entries".to_string(),
            ));
        }
        check_bulk_cap(&ids)?;

        let now = Utc::now();
        let mut outcome = BulkOutcome::default();
        for id in ids {
            let result = match tokio::time::timeout(
                BULK_ITEM_TIMEOUT,
                self.approve_one(actor, &id, allow_self_approval, now),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(ItemError::Store("store call timed out".to_string())),
            };
            if let Err(err) = &result {
                tracing::warn!(entry_id = %id, operation = "approve", code = err.code(), "bulk item failed");
            }
            outcome.record(id, result);
        }
        Ok(outcome)
    }

    async fn approve_one(
        &self,
        actor: &Actor,
        id: &str,
        allow_self_approval: bool,
        now: DateTime<Utc>,
    ) -> Result<(), ItemError> {
        let mut entry = self.store.get_entry(id).await.map_err(ItemError::from)?;

        if entry.status != TimeEntryStatus::Submitted {
            return Err(ItemError::AlreadySubmitted);
        }
        if actor.owns(&entry.user_id) && !allow_self_approval {
            return Err(ItemError::Unauthorized);
        }

        entry.status = TimeEntryStatus::Approved;
        entry.approved_at = Some(now);
        entry.approved_by = Some(actor.user_id.clone());
        entry.updated_at = now;

        self.store.put_entry(entry).await.map_err(ItemError::from)
    }
}
