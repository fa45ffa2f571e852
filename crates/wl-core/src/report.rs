//! Historical reports over closed entries.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::entry::TimeEntry;
use crate::types::{IssueId, ModuleId, ProjectId, UserId, ValidationError};

/// Dimension a report is grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    User,
    Issue,
    Project,
    Module,
}

impl GroupBy {
    /// String representation for CLI args and display.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Issue => "issue",
            Self::Project => "project",
            Self::Module => "module",
        }
    }

    /// The grouping key of an entry, or `None` when the entry lacks the
    /// dimension (an issue with no module link).
    fn key_for(
        self,
        entry: &TimeEntry,
        module_links: &BTreeMap<IssueId, ModuleId>,
    ) -> Option<String> {
        match self {
            Self::User => Some(entry.user.to_string()),
            Self::Issue => Some(entry.scope.issue.to_string()),
            Self::Project => Some(entry.scope.project.to_string()),
            Self::Module => module_links
                .get(&entry.scope.issue)
                .map(ToString::to_string),
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for GroupBy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "issue" => Ok(Self::Issue),
            "project" => Ok(Self::Project),
            "module" => Ok(Self::Module),
            _ => Err(ValidationError::InvalidGroupBy {
                value: s.to_string(),
            }),
        }
    }
}

/// Filter applied to closed entries before grouping or export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub project: Option<ProjectId>,
    pub user: Option<UserId>,
}

/// A report request: which dimension to group by, and which entries count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportQuery {
    pub group_by: GroupBy,
    pub filter: EntryFilter,
}

/// One group's total in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub key: String,
    pub total_seconds: i64,
    pub entry_count: usize,
}

/// A grouped historical aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub group_by: GroupBy,
    /// Rows sorted by total descending, key ascending on ties.
    pub rows: Vec<ReportRow>,
    pub total_seconds: i64,
}

/// The date an entry falls on for range filtering.
///
/// Closed timers and manual entries with timestamps use the UTC date of
/// `ended_at`; manual entries without one fall back to the UTC date of
/// `created_at`.
#[must_use]
pub fn policy_date(entry: &TimeEntry) -> NaiveDate {
    entry
        .ended_at
        .map_or_else(|| entry.created_at.date_naive(), |ended| ended.date_naive())
}

/// Whether a closed entry passes the filter. Running timers never match;
/// reports are historical and a moving total would be double counted against
/// the live summary.
#[must_use]
pub fn matches(entry: &TimeEntry, filter: &EntryFilter) -> bool {
    if entry.is_active() {
        return false;
    }
    if let Some(project) = &filter.project {
        if entry.scope.project != *project {
            return false;
        }
    }
    if let Some(user) = &filter.user {
        if entry.user != *user {
            return false;
        }
    }
    let date = policy_date(entry);
    if let Some(from) = filter.from {
        if date < from {
            return false;
        }
    }
    if let Some(to) = filter.to {
        if date > to {
            return false;
        }
    }
    true
}

/// Groups the filtered closed entries and sums their stored durations.
///
/// Entries with no value for the grouping dimension are excluded from both
/// the rows and the report total.
#[must_use]
pub fn report(
    entries: &[TimeEntry],
    query: &ReportQuery,
    module_links: &BTreeMap<IssueId, ModuleId>,
) -> Report {
    let mut groups: BTreeMap<String, (i64, usize)> = BTreeMap::new();
    let mut total_seconds = 0;

    for entry in entries {
        if !matches(entry, &query.filter) {
            continue;
        }
        let Some(key) = query.group_by.key_for(entry, module_links) else {
            tracing::trace!(entry = %entry.id, group_by = %query.group_by, "skipping entry without grouping key");
            continue;
        };
        total_seconds += entry.duration_seconds;
        let bucket = groups.entry(key).or_insert((0, 0));
        bucket.0 += entry.duration_seconds;
        bucket.1 += 1;
    }

    let mut rows: Vec<ReportRow> = groups
        .into_iter()
        .map(|(key, (total, count))| ReportRow {
            key,
            total_seconds: total,
            entry_count: count,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.total_seconds
            .cmp(&a.total_seconds)
            .then_with(|| a.key.cmp(&b.key))
    });

    Report {
        group_by: query.group_by,
        rows,
        total_seconds,
    }
}
