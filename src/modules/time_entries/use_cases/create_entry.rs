use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::modules::time_entries::domain::{
    TimeEntry, TimeEntryStatus, derived_duration_minutes, validate_entry,
};
use crate::shared::core::auth::Actor;
use crate::shared::core::errors::CoreError;
use crate::shared::infrastructure::store::LedgerStore;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTimeEntry {
    /// Defaults to the acting user; only managers may create for others.
    pub user_id: Option<String>,
    pub project_id: String,
    pub task_id: Option<String>,
    pub description: String,
    pub date: NaiveDate,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i64>,
    #[serde(default = "default_billable")]
    pub is_billable: bool,
    pub hourly_rate: Option<Decimal>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub notes: Option<String>,
}

fn default_billable() -> bool {
    true
}

pub struct CreateEntryHandler {
    store: Arc<dyn LedgerStore>,
}

impl CreateEntryHandler {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub async fn handle(
        &self,
        actor: &Actor,
        command: CreateTimeEntry,
    ) -> Result<TimeEntry, CoreError> {
        let owner = command
            .user_id
            .clone()
            .unwrap_or_else(|| actor.user_id.clone());
        if !actor.owns(&owner) && !actor.role.can_manage() {
            return Err(CoreError::Forbidden(
                "only managers may create entries for other users".to_string(),
            ));
        }

        let duration_minutes = match (command.start_time, command.end_time) {
            (Some(start), Some(end)) => derived_duration_minutes(start, end),
            _ => match command.duration_minutes {
                Some(minutes) => minutes,
                None => {
                    return Err(CoreError::Validation(vec![
                        "either duration or both start and end times are required".to_string(),
                    ]));
                }
            },
        };

        let now = Utc::now();
        let entry = TimeEntry {
            id: Uuid::now_v7().to_string(),
            user_id: owner,
            project_id: command.project_id,
            task_id: command.task_id,
            description: command.description,
            date: command.date,
            start_time: command.start_time,
            end_time: command.end_time,
            duration_minutes,
            is_billable: command.is_billable,
            hourly_rate: command.hourly_rate,
            status: TimeEntryStatus::Draft,
            tags: command.tags,
            notes: command.notes,
            submitted_at: None,
            approved_at: None,
            rejected_at: None,
            approved_by: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        };

        CoreError::violations(validate_entry(&entry))?;

        self.store.insert_entry(entry.clone()).await.map_err(|err| {
            tracing::error!(entry_id = %entry.id, operation = "create_entry", %err, "store write failed");
            CoreError::from(err)
        })?;
        tracing::info!(entry_id = %entry.id, user_id = %entry.user_id, "time entry created");
        Ok(entry)
    }
}

#[cfg(test)]
mod create_entry_tests {
    use super::*;
    use crate::shared::core::auth::Role;
    use crate::shared::infrastructure::store::in_memory::InMemoryLedgerStore;
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    #[fixture]
    fn handler() -> CreateEntryHandler {
        CreateEntryHandler::new(Arc::new(InMemoryLedgerStore::new()))
    }

    fn command() -> CreateTimeEntry {
        CreateTimeEntry {
            user_id: None,
            project_id: "proj-1".to_string(),
            task_id: None,
            description: "Sprint work".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            start_time: None,
            end_time: None,
            duration_minutes: Some(90),
            is_billable: true,
            hourly_rate: None,
            tags: vec!["dev".to_string()],
            notes: None,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_create_a_draft_entry_owned_by_the_actor(handler: CreateEntryHandler) {
        let actor = Actor::new("user-1", Role::Employee);
        let entry = handler.handle(&actor, command()).await.unwrap();
        assert_eq!(entry.status, TimeEntryStatus::Draft);
        assert_eq!(entry.user_id, "user-1");
        assert_eq!(entry.duration_minutes, 90);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_derive_duration_from_start_and_end(handler: CreateEntryHandler) {
        let actor = Actor::new("user-1", Role::Employee);
        let mut cmd = command();
        cmd.duration_minutes = None;
        cmd.start_time = Some(Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap());
        cmd.end_time = Some(Utc.with_ymd_and_hms(2026, 3, 2, 11, 15, 0).unwrap());
        let entry = handler.handle(&actor, cmd).await.unwrap();
        assert_eq!(entry.duration_minutes, 135);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_require_duration_or_interval(handler: CreateEntryHandler) {
        let actor = Actor::new("user-1", Role::Employee);
        let mut cmd = command();
        cmd.duration_minutes = None;
        let result = handler.handle(&actor, cmd).await;
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_forbid_employees_creating_for_other_users(handler: CreateEntryHandler) {
        let actor = Actor::new("user-1", Role::Employee);
        let mut cmd = command();
        cmd.user_id = Some("user-2".to_string());
        let result = handler.handle(&actor, cmd).await;
        assert!(matches!(result, Err(CoreError::Forbidden(_))));
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_let_managers_create_for_their_reports(handler: CreateEntryHandler) {
        let actor = Actor::new("manager-1", Role::Manager);
        let mut cmd = command();
        cmd.user_id = Some("user-2".to_string());
        let entry = handler.handle(&actor, cmd).await.unwrap();
        assert_eq!(entry.user_id, "user-2");
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_collect_validation_violations(handler: CreateEntryHandler) {
        let actor = Actor::new("user-1", Role::Employee);
        let mut cmd = command();
        cmd.description = "  ".to_string();
        cmd.duration_minutes = Some(2000);
        match handler.handle(&actor, cmd).await {
            Err(CoreError::Validation(violations)) => assert_eq!(violations.len(), 2),
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
