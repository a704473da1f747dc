use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Datelike, Days, NaiveDate, Utc};

use crate::modules::summaries::domain::{
    DaySummary, WeeklyOverview, summarize_day, week_over_week_delta,
};
use crate::modules::summaries::user_directory::UserDirectory;
use crate::modules::time_entries::domain::TimeEntry;
use crate::shared::core::auth::Actor;
use crate::shared::core::errors::CoreError;
use crate::shared::infrastructure::store::{DateRange, LedgerStore};

const WORK_DAYS: u64 = 5;

pub struct WeeklyOverviewHandler {
    store: Arc<dyn LedgerStore>,
    directory: Arc<dyn UserDirectory>,
}

impl WeeklyOverviewHandler {
    pub fn new(store: Arc<dyn LedgerStore>, directory: Arc<dyn UserDirectory>) -> Self {
        Self { store, directory }
    }

    /// Builds a Monday-to-Friday overview for the week containing
    /// `reference_date` (today when not given), compared against the week
    /// before it.
    pub async fn handle(
        &self,
        actor: &Actor,
        user_id: &str,
        reference_date: Option<NaiveDate>,
    ) -> Result<WeeklyOverview, CoreError> {
        if !actor.owns(user_id) && !actor.role.can_manage() {
            return Err(CoreError::Forbidden(
                "only the owner or a manager may view these summaries".to_string(),
            ));
        }

        let reference = reference_date.unwrap_or_else(|| Utc::now().date_naive());
        let week_start = monday_of(reference)?;
        let week_end = add_days(week_start, WORK_DAYS - 1)?;
        let previous_start = week_start
            .checked_sub_days(Days::new(7))
            .ok_or_else(|| CoreError::Internal("date underflow".to_string()))?;
        let previous_end = add_days(previous_start, WORK_DAYS - 1)?;

        let schedule = self
            .directory
            .work_schedule(user_id)
            .await
            .map_err(|err| CoreError::Internal(err.to_string()))?;

        let entries = self
            .store
            .entries_by_user(user_id, DateRange::new(previous_start, week_end))
            .await?;
        let mut by_date: HashMap<NaiveDate, Vec<TimeEntry>> = HashMap::new();
        for entry in entries {
            by_date.entry(entry.date).or_default().push(entry);
        }

        let mut days: Vec<DaySummary> = Vec::new();
        let mut cursor = week_start;
        while cursor <= week_end {
            let day_entries = by_date.remove(&cursor).unwrap_or_default();
            days.push(summarize_day(
                cursor,
                &day_entries,
                schedule.target_minutes_per_day,
                &schedule,
                false,
            ));
            cursor = add_days(cursor, 1)?;
        }

        let mut previous_week_minutes = 0i64;
        let mut previous_cursor = previous_start;
        while previous_cursor <= previous_end {
            if let Some(day_entries) = by_date.get(&previous_cursor) {
                previous_week_minutes += day_entries
                    .iter()
                    .map(|e| e.duration_minutes)
                    .sum::<i64>();
            }
            previous_cursor = add_days(previous_cursor, 1)?;
        }

        let total_minutes: i64 = days.iter().map(|d| d.total_minutes).sum();
        let billable_minutes: i64 = days.iter().map(|d| d.billable_minutes).sum();
        let (delta_minutes, delta_percent) =
            week_over_week_delta(total_minutes, previous_week_minutes);

        Ok(WeeklyOverview {
            user_id: user_id.to_string(),
            week_start,
            days,
            total_minutes,
            billable_minutes,
            previous_week_minutes,
            delta_minutes,
            delta_percent,
        })
    }
}

fn monday_of(date: NaiveDate) -> Result<NaiveDate, CoreError> {
    let back = date.weekday().num_days_from_monday() as u64;
    date.checked_sub_days(Days::new(back))
        .ok_or_else(|| CoreError::Internal("date underflow".to_string()))
}

fn add_days(date: NaiveDate, days: u64) -> Result<NaiveDate, CoreError> {
    date.checked_add_days(Days::new(days))
        .ok_or_else(|| CoreError::Internal("date overflow".to_string()))
}
