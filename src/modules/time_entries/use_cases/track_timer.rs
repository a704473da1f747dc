use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::modules::time_entries::domain::{
    MAX_DURATION_MINUTES, MAX_TAGS, TimeEntry, TimeEntryStatus, TimerSession,
    derived_duration_minutes, validate_entry,
};
use crate::shared::core::auth::Actor;
use crate::shared::core::errors::CoreError;
use crate::shared::infrastructure::store::{LedgerStore, StoreError};

#[derive(Debug, Clone, Deserialize)]
pub struct StartTimer {
    pub project_id: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StopTimer {
    pub description: String,
    pub task_id: Option<String>,
    #[serde(default = "default_billable")]
    pub is_billable: bool,
    pub hourly_rate: Option<Decimal>,
}

fn default_billable() -> bool {
    true
}

pub struct StartTimerHandler {
    store: Arc<dyn LedgerStore>,
}

impl StartTimerHandler {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// One active session per user, enforced by the store's unique key.
    /// Tags are capped here already; a session that cannot pass entry
    /// validation at stop time must never be created.
    pub async fn handle(
        &self,
        actor: &Actor,
        command: StartTimer,
    ) -> Result<TimerSession, CoreError> {
        if command.tags.len() > MAX_TAGS {
            return Err(CoreError::Validation(vec![format!(
                "at most {MAX_TAGS} tags are allowed"
            )]));
        }

        let session = TimerSession {
            user_id: actor.user_id.clone(),
            project_id: command.project_id,
            start_time: Utc::now(),
            tags: command.tags,
            notes: command.notes,
        };
        match self.store.insert_session(session.clone()).await {
            Ok(()) => {
                tracing::info!(user_id = %session.user_id, project_id = %session.project_id, "timer started");
                Ok(session)
            }
            Err(StoreError::AlreadyExists) => Err(CoreError::Conflict(
                "a timer is already running for this user".to_string(),
            )),
            Err(err) => {
                tracing::error!(user_id = %session.user_id, operation = "start_timer", %err, "store write failed");
                Err(CoreError::from(err))
            }
        }
    }
}

pub struct StopTimerHandler {
    store: Arc<dyn LedgerStore>,
}

impl StopTimerHandler {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Consumes the session and produces a draft entry for the elapsed time.
    pub async fn handle(&self, actor: &Actor, command: StopTimer) -> Result<TimeEntry, CoreError> {
        let session = self
            .store
            .get_session(&actor.user_id)
            .await
            .map_err(|err| match err {
                StoreError::NotFound => CoreError::not_found("timer_session", &actor.user_id),
                other => CoreError::from(other),
            })?;

        let now = Utc::now();
        // Zero-length stops still yield a valid one-minute entry; sessions
        // left running past a day are clamped and lose the exact interval.
        let elapsed = derived_duration_minutes(session.start_time, now).max(1);
        let (start_time, end_time, duration_minutes) = if elapsed > MAX_DURATION_MINUTES {
            (None, None, MAX_DURATION_MINUTES)
        } else {
            (Some(session.start_time), Some(now), elapsed)
        };

        let entry = TimeEntry {
            id: Uuid::now_v7().to_string(),
            user_id: actor.user_id.clone(),
            project_id: session.project_id.clone(),
            task_id: command.task_id,
            description: command.description,
            date: now.date_naive(),
            start_time,
            end_time,
            duration_minutes,
            is_billable: command.is_billable,
            hourly_rate: command.hourly_rate,
            status: TimeEntryStatus::Draft,
            tags: session.tags.clone(),
            notes: session.notes.clone(),
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
            tracing::error!(entry_id = %entry.id, operation = "stop_timer", %err, "store write failed");
            CoreError::from(err)
        })?;
        self.store
            .delete_session(&actor.user_id)
            .await
            .map_err(|err| {
                tracing::error!(user_id = %actor.user_id, operation = "stop_timer", %err, "session cleanup failed");
                CoreError::from(err)
            })?;
        tracing::info!(entry_id = %entry.id, user_id = %actor.user_id, minutes = duration_minutes, "timer stopped");
        Ok(entry)
    }
}

#[cfg(test)]
mod track_timer_tests {
    use super::*;
    use crate::shared::core::auth::Role;
    use crate::shared::infrastructure::store::in_memory::InMemoryLedgerStore;
    use rstest::rstest;

    fn start_command() -> StartTimer {
        StartTimer {
            project_id: "proj-1".to_string(),
            tags: vec!["focus".to_string()],
            notes: None,
        }
    }

    fn stop_command() -> StopTimer {
        StopTimer {
            description: "Pairing session".to_string(),
            task_id: None,
            is_billable: true,
            hourly_rate: None,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_start_a_timer_once_per_user() {
        let store = Arc::new(InMemoryLedgerStore::new());
        let handler = StartTimerHandler::new(store);
        let actor = Actor::new("user-1", Role::Employee);

        handler.handle(&actor, start_command()).await.unwrap();
        let result = handler.handle(&actor, start_command()).await;
        assert!(matches!(result, Err(CoreError::Conflict(_))));
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_refuse_to_start_with_too_many_tags() {
        let store = Arc::new(InMemoryLedgerStore::new());
        let handler = StartTimerHandler::new(store);
        let actor = Actor::new("user-1", Role::Employee);

        let mut command = start_command();
        command.tags = (0..11).map(|i| format!("tag-{i}")).collect();
        let result = handler.handle(&actor, command).await;
        assert!(matches!(result, Err(CoreError::Validation(_))));

        // No session was created, so a valid start still goes through.
        handler.handle(&actor, start_command()).await.unwrap();
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_stop_the_timer_into_a_draft_entry() {
        let store = Arc::new(InMemoryLedgerStore::new());
        let actor = Actor::new("user-1", Role::Employee);
        StartTimerHandler::new(store.clone())
            .handle(&actor, start_command())
            .await
            .unwrap();

        let entry = StopTimerHandler::new(store.clone())
            .handle(&actor, stop_command())
            .await
            .unwrap();

        assert_eq!(entry.status, TimeEntryStatus::Draft);
        assert_eq!(entry.project_id, "proj-1");
        assert_eq!(entry.tags, vec!["focus"]);
        assert!(entry.duration_minutes >= 1);
        // session consumed: a new timer may start immediately
        assert!(store.get_session("user-1").await.is_err());
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_fail_stop_without_an_active_timer() {
        let store = Arc::new(InMemoryLedgerStore::new());
        let handler = StopTimerHandler::new(store);
        let actor = Actor::new("user-1", Role::Employee);
        let result = handler.handle(&actor, stop_command()).await;
        match result {
            Err(err) => assert_eq!(err.code(), "TIMER_SESSION_NOT_FOUND"),
            other => panic!("expected error, got {other:?}"),
        }
    }
}
