use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Days, NaiveDate, Utc};

use crate::modules::summaries::domain::{
    DailySummaryReport, DaySummary, MAX_RANGE_DAYS, summarize_day,
};
use crate::modules::summaries::user_directory::UserDirectory;
use crate::modules::time_entries::domain::TimeEntry;
use crate::shared::core::auth::Actor;
use crate::shared::core::errors::CoreError;
use crate::shared::infrastructure::store::{DateRange, LedgerStore};

pub struct DailySummaryHandler {
    store: Arc<dyn LedgerStore>,
    directory: Arc<dyn UserDirectory>,
}

impl DailySummaryHandler {
    pub fn new(store: Arc<dyn LedgerStore>, directory: Arc<dyn UserDirectory>) -> Self {
        Self { store, directory }
    }

    pub async fn handle(
        &self,
        actor: &Actor,
        user_id: &str,
        range: DateRange,
        target_minutes_override: Option<i64>,
        include_gaps: bool,
    ) -> Result<DailySummaryReport, CoreError> {
        if !actor.owns(user_id) && !actor.role.can_manage() {
            return Err(CoreError::Forbidden(
                "only the owner or a manager may view these summaries".to_string(),
            ));
        }

        let today = Utc::now().date_naive();
        let mut violations = Vec::new();
        if range.from > range.to {
            violations.push("range start must not be after range end".to_string());
        } else if (range.to - range.from).num_days() + 1 > MAX_RANGE_DAYS {
            violations.push(format!("range must cover at most {MAX_RANGE_DAYS} days"));
        }
        if range.to > today {
            violations.push("range must not include future dates".to_string());
        }
        CoreError::violations(violations)?;

        let schedule = self
            .directory
            .work_schedule(user_id)
            .await
            .map_err(|err| CoreError::Internal(err.to_string()))?;
        let target = target_minutes_override.unwrap_or(schedule.target_minutes_per_day);

        let entries = self.store.entries_by_user(user_id, range).await?;
        let mut by_date: HashMap<NaiveDate, Vec<TimeEntry>> = HashMap::new();
        for entry in entries {
            by_date.entry(entry.date).or_default().push(entry);
        }

        let mut days: Vec<DaySummary> = Vec::new();
        let mut cursor = range.from;
        while cursor <= range.to {
            let day_entries = by_date.remove(&cursor).unwrap_or_default();
            days.push(summarize_day(
                cursor,
                &day_entries,
                target,
                &schedule,
                include_gaps,
            ));
            cursor = cursor
                .checked_add_days(Days::new(1))
                .ok_or_else(|| CoreError::Internal("date overflow".to_string()))?;
        }

        let total_minutes = days.iter().map(|d| d.total_minutes).sum();
        let billable_minutes = days.iter().map(|d| d.billable_minutes).sum();
        Ok(DailySummaryReport {
            user_id: user_id.to_string(),
            from: range.from,
            to: range.to,
            days,
            total_minutes,
            billable_minutes,
        })
    }
}
