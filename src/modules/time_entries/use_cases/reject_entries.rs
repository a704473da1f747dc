use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::modules::time_entries::domain::{MAX_REJECTION_REASON_CHARS, TimeEntryStatus};
use crate::modules::time_entries::use_cases::submit_entries::{BULK_ITEM_TIMEOUT, check_bulk_cap};
use crate::shared::core::auth::Actor;
use crate::shared::core::bulk::BulkOutcome;
use crate::shared::core::errors::{CoreError, ItemError};
use crate::shared::infrastructure::store::LedgerStore;

pub struct RejectEntriesHandler {
    store: Arc<dyn LedgerStore>,
}

impl RejectEntriesHandler {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub async fn handle(
        &self,
        actor: &Actor,
        ids: Vec<String>,
        reason: &str,
        allow_self_rejection: bool,
    ) -> Result<BulkOutcome, CoreError> {
        if !actor.role.can_manage() {
            return Err(CoreError::Forbidden(
                "only managers and admins may reject time entries".to_string(),
            ));
        }

        let reason = reason.trim();
        let mut violations = Vec::new();
        if reason.is_empty() {
            violations.push("a rejection reason is required".to_string());
        }
        if reason.chars().count() > MAX_REJECTION_REASON_CHARS {
            violations.push(format!(
                "rejection reason must be at most {MAX_REJECTION_REASON_CHARS} characters"
            ));
        }
        CoreError::violations(violations)?;
        check_bulk_cap(&ids)?;

        let now = Utc::now();
        let mut outcome = BulkOutcome::default();
        for id in ids {
            let result = match tokio::time::timeout(
                BULK_ITEM_TIMEOUT,
                self.reject_one(actor, &id, reason, allow_self_rejection, now),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(ItemError::Store("store call timed out".to_string())),
            };
            if let Err(err) = &result {
                tracing::warn!(entry_id = %id, operation = "reject", code = err.code(), "bulk item failed");
            }
            outcome.record(id, result);
        }
        Ok(outcome)
    }

    async fn reject_one(
        &self,
        actor: &Actor,
        id: &str,
        reason: &str,
        allow_self_rejection: bool,
        now: DateTime<Utc>,
    ) -> Result<(), ItemError> {
        let mut entry = self.store.get_entry(id).await.map_err(ItemError::from)?;

        if entry.status != TimeEntryStatus::Submitted {
            return Err(ItemError::AlreadySubmitted);
        }
        if actor.owns(&entry.user_id) && !allow_self_rejection {
            return Err(ItemError::Unauthorized);
        }

        entry.status = TimeEntryStatus::Rejected;
        entry.rejected_at = Some(now);
        entry.rejection_reason = Some(reason.to_string());
        entry.updated_at = now;

        self.store.put_entry(entry).await.map_err(ItemError::from)
    }
}

#[cfg(test)]
mod reject_entries_tests {
    use super::*;
    use crate::modules::time_entries::domain::fixtures;
    use crate::shared::core::auth::Role;
    use crate::shared::infrastructure::store::in_memory::InMemoryLedgerStore;
    use rstest::rstest;

    fn ids(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_reject_with_reason_and_stamp() {
        let store = Arc::new(InMemoryLedgerStore::new());
        let mut entry = fixtures::entry("te-1", "user-1");
        entry.status = TimeEntryStatus::Submitted;
        store.insert_entry(entry).await.unwrap();

        let handler = RejectEntriesHandler::new(store.clone());
        let actor = Actor::new("manager-1", Role::Manager);
        let outcome = handler
            .handle(&actor, ids(&["te-1"]), "missing ticket reference", true)
            .await
            .unwrap();
        assert_eq!(outcome.successful, vec!["te-1"]);

        let entry = store.get_entry("te-1").await.unwrap();
        assert_eq!(entry.status, TimeEntryStatus::Rejected);
        assert_eq!(
            entry.rejection_reason.as_deref(),
            Some("missing ticket reference")
        );
        assert!(entry.rejected_at.is_some());
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[tokio::test]
    async fn it_should_require_a_reason_upfront(#[case] reason: &str) {
        let handler = RejectEntriesHandler::new(Arc::new(InMemoryLedgerStore::new()));
        let actor = Actor::new("manager-1", Role::Manager);
        let result = handler.handle(&actor, ids(&["te-1"]), reason, true).await;
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_cap_the_reason_length() {
        let handler = RejectEntriesHandler::new(Arc::new(InMemoryLedgerStore::new()));
        let actor = Actor::new("manager-1", Role::Manager);
        let long_reason = "x".repeat(501);
        let result = handler
            .handle(&actor, ids(&["te-1"]), &long_reason, true)
            .await;
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_forbid_employees() {
        let handler = RejectEntriesHandler::new(Arc::new(InMemoryLedgerStore::new()));
        let actor = Actor::new("user-1", Role::Employee);
        let result = handler
            .handle(&actor, ids(&["te-1"]), "reason", false)
            .await;
        assert!(matches!(result, Err(CoreError::Forbidden(_))));
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_fail_items_that_are_not_awaiting_review() {
        let store = Arc::new(InMemoryLedgerStore::new());
        store
            .insert_entry(fixtures::entry("te-draft", "user-1"))
            .await
            .unwrap();
        let handler = RejectEntriesHandler::new(store);
        let actor = Actor::new("manager-1", Role::Manager);
        let outcome = handler
            .handle(&actor, ids(&["te-draft"]), "needs review first", true)
            .await
            .unwrap();
        assert_eq!(outcome.failed[0].error, "ALREADY_SUBMITTED");
    }
}
