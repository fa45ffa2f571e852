//! Per-issue rollups of tracked time.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entry::TimeEntry;
use crate::types::UserId;

/// Total tracked by one user on an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserTotal {
    pub user: UserId,
    pub total_seconds: i64,
    pub entry_count: usize,
}

/// Rollup of all time recorded against one issue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_seconds: i64,
    pub total_hours: f64,
    /// The issue's estimate, when the tracking collaborator has one.
    pub estimated_minutes: Option<i64>,
    /// Per-user totals, largest first.
    pub by_user: Vec<UserTotal>,
}

/// Hours rounded to two decimal places.
#[allow(clippy::cast_precision_loss)]
fn rounded_hours(seconds: i64) -> f64 {
    let hours = seconds as f64 / 3600.0;
    (hours * 100.0).round() / 100.0
}

/// Summarizes `entries`, all of which must belong to the same issue.
///
/// A running timer contributes its live elapsed time as of `now`, so two
/// calls a minute apart report different totals while a timer runs.
#[must_use]
pub fn summarize(
    entries: &[TimeEntry],
    estimated_minutes: Option<i64>,
    now: DateTime<Utc>,
) -> Summary {
    let mut per_user: BTreeMap<UserId, (i64, usize)> = BTreeMap::new();
    let mut total_seconds = 0;

    for entry in entries {
        let seconds = entry.tracked_seconds(now);
        total_seconds += seconds;
        let bucket = per_user.entry(entry.user.clone()).or_insert((0, 0));
        bucket.0 += seconds;
        bucket.1 += 1;
    }

    let mut by_user: Vec<UserTotal> = per_user
        .into_iter()
        .map(|(user, (total, count))| UserTotal {
            user,
            total_seconds: total,
            entry_count: count,
        })
        .collect();
    by_user.sort_by(|a, b| {
        b.total_seconds
            .cmp(&a.total_seconds)
            .then_with(|| a.user.cmp(&b.user))
    });

    Summary {
        total_seconds,
        total_hours: rounded_hours(total_seconds),
        estimated_minutes,
        by_user,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::entry::{closed_duration_seconds, EntrySource};
    use crate::types::{EntryId, IssueId, IssueRef, ProjectId, WorkspaceId};

    fn timestamp(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, hour, min, 0)
            .single()
            .expect("valid timestamp")
    }

    fn scope() -> IssueRef {
        IssueRef::new(
            WorkspaceId::new("acme").expect("workspace ID"),
            ProjectId::new("proj-1").expect("project ID"),
            IssueId::new("issue-1").expect("issue ID"),
        )
    }

    fn closed_timer(user: &str, started: DateTime<Utc>, ended: DateTime<Utc>) -> TimeEntry {
        let user = UserId::new(user).expect("user ID");
        TimeEntry {
            id: EntryId::generate(),
            scope: scope(),
            user: user.clone(),
            source: EntrySource::Timer,
            started_at: Some(started),
            ended_at: Some(ended),
            duration_seconds: closed_duration_seconds(started, ended),
            note: None,
            is_billable: false,
            created_at: started,
            updated_at: ended,
            created_by: user.clone(),
            updated_by: user,
        }
    }

    fn running_timer(user: &str, started: DateTime<Utc>) -> TimeEntry {
        TimeEntry {
            ended_at: None,
            duration_seconds: 0,
            ..closed_timer(user, started, started)
        }
    }

    fn manual(user: &str, duration: i64) -> TimeEntry {
        let created = timestamp(12, 0);
        let user = UserId::new(user).expect("user ID");
        TimeEntry {
            id: EntryId::generate(),
            scope: scope(),
            user: user.clone(),
            source: EntrySource::Manual,
            started_at: None,
            ended_at: None,
            duration_seconds: duration,
            note: None,
            is_billable: false,
            created_at: created,
            updated_at: created,
            created_by: user.clone(),
            updated_by: user,
        }
    }

    #[test]
    fn empty_issue_summarizes_to_zero() {
        let summary = summarize(&[], None, timestamp(12, 0));
        assert_eq!(summary.total_seconds, 0);
        assert!(summary.by_user.is_empty());
        assert!(summary.estimated_minutes.is_none());
        assert!(summary.total_hours.abs() < f64::EPSILON);
    }

    #[test]
    fn sums_closed_entries_per_user() {
        let entries = vec![
            closed_timer("ana", timestamp(9, 0), timestamp(10, 0)),
            manual("ana", 600),
            manual("bob", 900),
        ];
        let summary = summarize(&entries, Some(120), timestamp(12, 0));

        assert_eq!(summary.total_seconds, 3600 + 600 + 900);
        assert_eq!(summary.estimated_minutes, Some(120));
        assert_eq!(summary.by_user.len(), 2);
        assert_eq!(summary.by_user[0].user.as_str(), "ana");
        assert_eq!(summary.by_user[0].total_seconds, 4200);
        assert_eq!(summary.by_user[0].entry_count, 2);
        assert_eq!(summary.by_user[1].user.as_str(), "bob");
        assert_eq!(summary.by_user[1].total_seconds, 900);
    }

    #[test]
    fn running_timer_contributes_live_elapsed() {
        let entries = vec![manual("ana", 600), running_timer("ana", timestamp(11, 0))];
        let summary = summarize(&entries, None, timestamp(11, 30));

        assert_eq!(summary.total_seconds, 600 + 1800);
        assert_eq!(summary.by_user[0].total_seconds, 2400);
        assert_eq!(summary.by_user[0].entry_count, 2);

        // A later clock sees a larger total for the same entries.
        let later = summarize(&entries, None, timestamp(12, 0));
        assert_eq!(later.total_seconds, 600 + 3600);
    }

    #[test]
    fn ties_break_on_user_id() {
        let entries = vec![manual("zoe", 300), manual("ana", 300)];
        let summary = summarize(&entries, None, timestamp(12, 0));
        assert_eq!(summary.by_user[0].user.as_str(), "ana");
        assert_eq!(summary.by_user[1].user.as_str(), "zoe");
    }

    #[test]
    fn hours_are_rounded_to_two_places() {
        let entries = vec![manual("ana", 5000)];
        let summary = summarize(&entries, None, timestamp(12, 0));
        // 5000 / 3600 = 1.3888... rounds to 1.39
        assert!((summary.total_hours - 1.39).abs() < f64::EPSILON);
    }
}
