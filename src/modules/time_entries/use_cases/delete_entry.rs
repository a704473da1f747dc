use std::sync::Arc;

use crate::shared::core::auth::Actor;
use crate::shared::core::errors::CoreError;
use crate::shared::infrastructure::store::{LedgerStore, StoreError};

pub struct DeleteEntryHandler {
    store: Arc<dyn LedgerStore>,
}

impl DeleteEntryHandler {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Hard delete, allowed only while the entry is draft or rejected.
    pub async fn handle(&self, actor: &Actor, entry_id: &str) -> Result<(), CoreError> {
        let entry = self.store.get_entry(entry_id).await.map_err(|err| match err {
            StoreError::NotFound => CoreError::not_found("time_entry", entry_id),
            other => CoreError::from(other),
        })?;

        if !actor.owns(&entry.user_id) && !actor.role.can_manage() {
            return Err(CoreError::Forbidden(
                "only the owner or a manager may delete this entry".to_string(),
            ));
        }
        if !entry.status.is_mutable() {
            return Err(CoreError::invalid_state(
                "ALREADY_SUBMITTED",
                format!(
                    "entry is {} and can no longer be deleted",
                    entry.status.as_str()
                ),
            ));
        }

        self.store.delete_entry(entry_id).await.map_err(|err| {
            tracing::error!(entry_id, operation = "delete_entry", %err, "store delete failed");
            CoreError::from(err)
        })?;
        tracing::info!(entry_id, "time entry deleted");
        Ok(())
    }
}
