use std::sync::Arc;

use crate::modules::time_entries::domain::{TimeEntry, TimeEntryStatus};
use crate::shared::core::auth::Actor;
use crate::shared::core::errors::CoreError;
use crate::shared::infrastructure::store::{DateRange, LedgerStore};

pub struct ListEntriesHandler {
    store: Arc<dyn LedgerStore>,
}

impl ListEntriesHandler {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    fn check_range(range: &DateRange) -> Result<(), CoreError> {
        if range.from > range.to {
            return Err(CoreError::Validation(vec![
                "range start must not be after range end".to_string(),
            ]));
        }
        Ok(())
    }

    pub async fn for_user(
        &self,
        actor: &Actor,
        user_id: &str,
        range: DateRange,
    ) -> Result<Vec<TimeEntry>, CoreError> {
        Self::check_range(&range)?;
        if !actor.owns(user_id) && !actor.role.can_manage() {
            return Err(CoreError::Forbidden(
                "only the owner or a manager may list these entries".to_string(),
            ));
        }
        Ok(self.store.entries_by_user(user_id, range).await?)
    }

    pub async fn for_project(
        &self,
        actor: &Actor,
        project_id: &str,
        range: DateRange,
    ) -> Result<Vec<TimeEntry>, CoreError> {
        Self::check_range(&range)?;
        if !actor.role.can_manage() {
            return Err(CoreError::Forbidden(
                "project listings require a manager role".to_string(),
            ));
        }
        Ok(self.store.entries_by_project(project_id, range).await?)
    }

    pub async fn for_status(
        &self,
        actor: &Actor,
        status: TimeEntryStatus,
        range: DateRange,
    ) -> Result<Vec<TimeEntry>, CoreError> {
        Self::check_range(&range)?;
        if !actor.role.can_manage() {
            return Err(CoreError::Forbidden(
                "status listings require a manager role".to_string(),
            ));
        }
        Ok(self.store.entries_by_status(status, range).await?)
    }
}
