use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveTime;

/// Work-schedule defaults used when no explicit target is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkSchedule {
    pub target_minutes_per_day: i64,
    pub day_start: NaiveTime,
    pub day_end: NaiveTime,
}

impl Default for WorkSchedule {
    fn default() -> Self {
        Self {
            target_minutes_per_day: 480,
            day_start: NaiveTime::from_hms_opt(9, 0, 0).expect("valid time"),
            day_end: NaiveTime::from_hms_opt(17, 0, 0).expect("valid time"),
        }
    }
}

/// The only collaborator the aggregation side consumes: a user-record lookup
/// for schedule defaults.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn work_schedule(&self, user_id: &str) -> anyhow::Result<WorkSchedule>;
}

/// In-memory directory; unknown users fall back to the default schedule.
#[derive(Default)]
pub struct StaticUserDirectory {
    schedules: HashMap<String, WorkSchedule>,
}

impl StaticUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schedule(mut self, user_id: impl Into<String>, schedule: WorkSchedule) -> Self {
        self.schedules.insert(user_id.into(), schedule);
        self
    }
}

#[async_trait]
impl UserDirectory for StaticUserDirectory {
    async fn work_schedule(&self, user_id: &str) -> anyhow::Result<WorkSchedule> {
        Ok(self
            .schedules
            .get(user_id)
            .copied()
            .unwrap_or_default())
    }
}
