// Time entry lifecycle domain. Framework-free; no input or output here.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const MAX_DURATION_MINUTES: i64 = 1440;
pub const MAX_TAGS: usize = 10;
pub const MAX_REJECTION_REASON_CHARS: usize = 500;
pub const MAX_BULK_ITEMS: usize = 50;

/// Duration derived from start/end may drift from the stored value by at most
/// this many minutes.
pub const DURATION_TOLERANCE_MINUTES: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeEntryStatus {
    Draft,
    Submitted,
    Approved,
    Rejected,
}

impl TimeEntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeEntryStatus::Draft => "draft",
            TimeEntryStatus::Submitted => "submitted",
            TimeEntryStatus::Approved => "approved",
            TimeEntryStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(TimeEntryStatus::Draft),
            "submitted" => Some(TimeEntryStatus::Submitted),
            "approved" => Some(TimeEntryStatus::Approved),
            "rejected" => Some(TimeEntryStatus::Rejected),
            _ => None,
        }
    }

    /// Only draft and rejected entries may be edited or deleted.
    pub fn is_mutable(&self) -> bool {
        matches!(self, TimeEntryStatus::Draft | TimeEntryStatus::Rejected)
    }

    /// draft/rejected -> submitted -> approved | rejected.
    pub fn can_transition_to(&self, next: TimeEntryStatus) -> bool {
        if *self == next {
            return true;
        }
        matches!(
            (self, next),
            (TimeEntryStatus::Draft, TimeEntryStatus::Submitted)
                | (TimeEntryStatus::Rejected, TimeEntryStatus::Submitted)
                | (TimeEntryStatus::Submitted, TimeEntryStatus::Approved)
                | (TimeEntryStatus::Submitted, TimeEntryStatus::Rejected)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: String,
    pub user_id: String,
    pub project_id: String,
    pub task_id: Option<String>,
    pub description: String,
    pub date: NaiveDate,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    /// Minutes, always populated; derived from start/end when both are given.
    pub duration_minutes: i64,
    pub is_billable: bool,
    pub hourly_rate: Option<Decimal>,
    pub status: TimeEntryStatus,
    pub tags: Vec<String>,
    pub notes: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub approved_by: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Minutes between two instants, rounded to the nearest minute.
pub fn derived_duration_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let seconds = (end - start).num_seconds();
    (seconds as f64 / 60.0).round() as i64
}

/// Collects every violation, not just the first.
pub fn validate_entry(entry: &TimeEntry) -> Vec<String> {
    let mut violations = Vec::new();

    if entry.description.trim().is_empty() {
        violations.push("description must not be empty".to_string());
    }
    if entry.duration_minutes <= 0 || entry.duration_minutes > MAX_DURATION_MINUTES {
        violations.push(format!(
            "duration must be between 1 and {MAX_DURATION_MINUTES} minutes"
        ));
    }
    if entry.tags.len() > MAX_TAGS {
        violations.push(format!("at most {MAX_TAGS} tags are allowed"));
    }
    if let (Some(start), Some(end)) = (entry.start_time, entry.end_time) {
        if end <= start {
            violations.push("end time must be after start time".to_string());
        } else {
            let derived = derived_duration_minutes(start, end);
            if (entry.duration_minutes - derived).abs() > DURATION_TOLERANCE_MINUTES {
                violations.push(format!(
                    "duration {} does not match start/end interval of {} minutes",
                    entry.duration_minutes, derived
                ));
            }
        }
    }
    violations
}

/// Data gate applied at submission time, reported per item.
pub fn submission_blocker(entry: &TimeEntry) -> Option<SubmissionBlocker> {
    if entry.description.trim().is_empty() {
        return Some(SubmissionBlocker::MissingDescription);
    }
    if entry.duration_minutes <= 0 || entry.duration_minutes > MAX_DURATION_MINUTES {
        return Some(SubmissionBlocker::InvalidDuration);
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionBlocker {
    MissingDescription,
    InvalidDuration,
}

/// At most one active session per user; stopping it produces a draft entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSession {
    pub user_id: String,
    pub project_id: String,
    pub start_time: DateTime<Utc>,
    pub tags: Vec<String>,
    pub notes: Option<String>,
}

#[cfg(test)]
pub mod fixtures {
    use super::*;
    use chrono::TimeZone;

    pub fn entry(id: &str, user_id: &str) -> TimeEntry {
        let created = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        TimeEntry {
            id: id.to_string(),
            user_id: user_id.to_string(),
            project_id: "proj-1".to_string(),
            task_id: None,
            description: "Sprint work".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            start_time: None,
            end_time: None,
            duration_minutes: 90,
            is_billable: true,
            hourly_rate: None,
            status: TimeEntryStatus::Draft,
            tags: vec!["dev".to_string()],
            notes: None,
            submitted_at: None,
            approved_at: None,
            rejected_at: None,
            approved_by: None,
            rejection_reason: None,
            created_at: created,
            updated_at: created,
        }
    }
}

#[cfg(test)]
mod time_entry_domain_tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[rstest]
    #[case(TimeEntryStatus::Draft, TimeEntryStatus::Submitted, true)]
    #[case(TimeEntryStatus::Rejected, TimeEntryStatus::Submitted, true)]
    #[case(TimeEntryStatus::Submitted, TimeEntryStatus::Approved, true)]
    #[case(TimeEntryStatus::Submitted, TimeEntryStatus::Rejected, true)]
    #[case(TimeEntryStatus::Draft, TimeEntryStatus::Approved, false)]
    #[case(TimeEntryStatus::Approved, TimeEntryStatus::Submitted, false)]
    #[case(TimeEntryStatus::Approved, TimeEntryStatus::Rejected, false)]
    fn it_should_enforce_the_transition_table(
        #[case] from: TimeEntryStatus,
        #[case] to: TimeEntryStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[rstest]
    fn it_should_treat_same_status_transition_as_allowed() {
        for status in [
            TimeEntryStatus::Draft,
            TimeEntryStatus::Submitted,
            TimeEntryStatus::Approved,
            TimeEntryStatus::Rejected,
        ] {
            assert!(status.can_transition_to(status));
        }
    }

    #[rstest]
    fn it_should_only_allow_edits_in_draft_and_rejected() {
        assert!(TimeEntryStatus::Draft.is_mutable());
        assert!(TimeEntryStatus::Rejected.is_mutable());
        assert!(!TimeEntryStatus::Submitted.is_mutable());
        assert!(!TimeEntryStatus::Approved.is_mutable());
    }

    #[rstest]
    #[case(0, false)]
    #[case(1, true)]
    #[case(1440, true)]
    #[case(1441, false)]
    fn it_should_bound_duration(#[case] minutes: i64, #[case] valid: bool) {
        let mut entry = fixtures::entry("te-1", "user-1");
        entry.duration_minutes = minutes;
        assert_eq!(validate_entry(&entry).is_empty(), valid);
    }

    #[rstest]
    fn it_should_accept_duration_within_one_minute_of_the_interval() {
        let mut entry = fixtures::entry("te-1", "user-1");
        entry.start_time = Some(Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap());
        entry.end_time = Some(Utc.with_ymd_and_hms(2026, 3, 2, 10, 30, 0).unwrap());
        entry.duration_minutes = 91;
        assert!(validate_entry(&entry).is_empty());

        entry.duration_minutes = 93;
        let violations = validate_entry(&entry);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("does not match"));
    }

    #[rstest]
    fn it_should_reject_inverted_intervals() {
        let mut entry = fixtures::entry("te-1", "user-1");
        entry.start_time = Some(Utc.with_ymd_and_hms(2026, 3, 2, 11, 0, 0).unwrap());
        entry.end_time = Some(Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap());
        assert!(
            validate_entry(&entry)
                .iter()
                .any(|v| v.contains("end time must be after"))
        );
    }

    #[rstest]
    fn it_should_report_every_violation_at_once() {
        let mut entry = fixtures::entry("te-1", "user-1");
        entry.description = "  ".to_string();
        entry.duration_minutes = 0;
        entry.tags = (0..11).map(|i| format!("tag-{i}")).collect();
        assert_eq!(validate_entry(&entry).len(), 3);
    }

    #[rstest]
    fn it_should_name_the_submission_blocker() {
        let mut entry = fixtures::entry("te-1", "user-1");
        assert_eq!(submission_blocker(&entry), None);

        entry.description = String::new();
        assert_eq!(
            submission_blocker(&entry),
            Some(SubmissionBlocker::MissingDescription)
        );

        entry.description = "work".to_string();
        entry.duration_minutes = 0;
        assert_eq!(
            submission_blocker(&entry),
            Some(SubmissionBlocker::InvalidDuration)
        );
    }

    #[rstest]
    fn it_should_round_derived_duration_to_the_nearest_minute() {
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 3, 2, 9, 30, 29).unwrap();
        assert_eq!(derived_duration_minutes(start, end), 30);
        let end = Utc.with_ymd_and_hms(2026, 3, 2, 9, 30, 31).unwrap();
        assert_eq!(derived_duration_minutes(start, end), 31);
    }
}
