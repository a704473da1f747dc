// Pure read-side aggregation over time entries. Nothing here mutates state.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::modules::summaries::user_directory::WorkSchedule;
use crate::modules::time_entries::domain::TimeEntry;

pub const MAX_RANGE_DAYS: i64 = 31;
pub const MIN_GAP_MINUTES: i64 = 15;

#[derive(Debug, Clone, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub entry_count: usize,
    pub total_minutes: i64,
    pub billable_minutes: i64,
    pub non_billable_minutes: i64,
    pub target_minutes: i64,
    pub percent_of_target: f64,
    pub projects: Vec<ProjectBreakdown>,
    pub first_start: Option<DateTime<Utc>>,
    pub last_end: Option<DateTime<Utc>>,
    pub span_minutes: Option<i64>,
    pub gaps: Vec<Gap>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectBreakdown {
    pub project_id: String,
    pub minutes: i64,
    /// Share of the day's tracked minutes, 0..=100.
    pub percent_of_day: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Gap {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub minutes: i64,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Summarize one calendar day. Entries without start/end still count toward
/// the totals; they are skipped for first/last/span and gap analysis.
pub fn summarize_day(
    date: NaiveDate,
    entries: &[TimeEntry],
    target_minutes: i64,
    schedule: &WorkSchedule,
    include_gaps: bool,
) -> DaySummary {
    let total_minutes: i64 = entries.iter().map(|e| e.duration_minutes).sum();
    let billable_minutes: i64 = entries
        .iter()
        .filter(|e| e.is_billable)
        .map(|e| e.duration_minutes)
        .sum();

    let percent_of_target = if target_minutes > 0 {
        round1(total_minutes as f64 / target_minutes as f64 * 100.0)
    } else {
        0.0
    };

    let mut projects: Vec<ProjectBreakdown> = Vec::new();
    for entry in entries {
        match projects.iter_mut().find(|p| p.project_id == entry.project_id) {
            Some(breakdown) => breakdown.minutes += entry.duration_minutes,
            None => projects.push(ProjectBreakdown {
                project_id: entry.project_id.clone(),
                minutes: entry.duration_minutes,
                percent_of_day: 0.0,
            }),
        }
    }
    for breakdown in &mut projects {
        breakdown.percent_of_day = if total_minutes > 0 {
            round1(breakdown.minutes as f64 / total_minutes as f64 * 100.0)
        } else {
            0.0
        };
    }
    projects.sort_by(|a, b| b.minutes.cmp(&a.minutes).then(a.project_id.cmp(&b.project_id)));

    let mut timed: Vec<(DateTime<Utc>, DateTime<Utc>)> = entries
        .iter()
        .filter_map(|e| Some((e.start_time?, e.end_time?)))
        .collect();
    timed.sort_by_key(|(start, _)| *start);

    let first_start = timed.first().map(|(start, _)| *start);
    let last_end = timed.iter().map(|(_, end)| *end).max();
    let span_minutes = match (first_start, last_end) {
        (Some(first), Some(last)) => Some((last - first).num_minutes()),
        _ => None,
    };

    let gaps = if include_gaps {
        find_gaps(date, &timed, schedule)
    } else {
        Vec::new()
    };

    DaySummary {
        date,
        entry_count: entries.len(),
        total_minutes,
        billable_minutes,
        non_billable_minutes: total_minutes - billable_minutes,
        target_minutes,
        percent_of_target,
        projects,
        first_start,
        last_end,
        span_minutes,
        gaps,
    }
}

/// Untracked stretches of at least `MIN_GAP_MINUTES` inside the work-day
/// window: before the first entry, between consecutive entries, and after
/// the last one.
fn find_gaps(
    date: NaiveDate,
    timed: &[(DateTime<Utc>, DateTime<Utc>)],
    schedule: &WorkSchedule,
) -> Vec<Gap> {
    let window_start = date.and_time(schedule.day_start).and_utc();
    let window_end = date.and_time(schedule.day_end).and_utc();
    if timed.is_empty() || window_end <= window_start {
        return Vec::new();
    }

    let mut gaps = Vec::new();
    let mut cursor = window_start;
    for (start, end) in timed {
        let gap_end = (*start).min(window_end);
        if gap_end > cursor {
            let minutes = (gap_end - cursor).num_minutes();
            if minutes >= MIN_GAP_MINUTES {
                gaps.push(Gap {
                    start: cursor,
                    end: gap_end,
                    minutes,
                });
            }
        }
        cursor = cursor.max(*end);
    }
    if window_end > cursor {
        let minutes = (window_end - cursor).num_minutes();
        if minutes >= MIN_GAP_MINUTES {
            gaps.push(Gap {
                start: cursor,
                end: window_end,
                minutes,
            });
        }
    }
    gaps
}

#[derive(Debug, Clone, Serialize)]
pub struct DailySummaryReport {
    pub user_id: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub days: Vec<DaySummary>,
    pub total_minutes: i64,
    pub billable_minutes: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeeklyOverview {
    pub user_id: String,
    /// Monday of the requested week.
    pub week_start: NaiveDate,
    pub days: Vec<DaySummary>,
    pub total_minutes: i64,
    pub billable_minutes: i64,
    pub previous_week_minutes: i64,
    pub delta_minutes: i64,
    /// None when the previous week has no tracked time.
    pub delta_percent: Option<f64>,
}

pub fn week_over_week_delta(current: i64, previous: i64) -> (i64, Option<f64>) {
    let delta = current - previous;
    let percent = if previous > 0 {
        Some(round1(delta as f64 / previous as f64 * 100.0))
    } else {
        None
    };
    (delta, percent)
}
