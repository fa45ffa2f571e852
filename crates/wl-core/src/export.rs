//! Flat tabular export of filtered entries.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::entry::{EntrySource, TimeEntry};
use crate::report::{matches, policy_date, EntryFilter};
use crate::types::{IssueId, ModuleId, ProjectId, UserId};

/// One exported entry. The same filter drives [`crate::report::report`], so
/// summing `duration_seconds` over an export reproduces the report totals for
/// the same parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    pub date: NaiveDate,
    pub user: UserId,
    pub project: ProjectId,
    pub issue: IssueId,
    pub module: Option<ModuleId>,
    pub duration_seconds: i64,
    pub source: EntrySource,
    pub is_billable: bool,
    pub note: Option<String>,
}

/// Filters closed entries and flattens them into export rows, newest first.
#[must_use]
pub fn export_rows(
    entries: &[TimeEntry],
    filter: &EntryFilter,
    module_links: &BTreeMap<IssueId, ModuleId>,
) -> Vec<ExportRow> {
    let mut selected: Vec<&TimeEntry> = entries.iter().filter(|e| matches(e, filter)).collect();
    selected.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });

    selected
        .into_iter()
        .map(|entry| ExportRow {
            date: policy_date(entry),
            user: entry.user.clone(),
            project: entry.scope.project.clone(),
            issue: entry.scope.issue.clone(),
            module: module_links.get(&entry.scope.issue).cloned(),
            duration_seconds: entry.duration_seconds,
            source: entry.source,
            is_billable: entry.is_billable,
            note: entry.note.clone(),
        })
        .collect()
}

/// Quotes a CSV field when it contains a delimiter, quote, or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Renders export rows as CSV with a header line.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn to_csv(rows: &[ExportRow]) -> String {
    let mut out = String::from(
        "date,user,project,issue,module,duration_seconds,duration_hours,source,billable,note\n",
    );
    for row in rows {
        let hours = row.duration_seconds as f64 / 3600.0;
        let billable = if row.is_billable { "yes" } else { "no" };
        let _ = writeln!(
            out,
            "{},{},{},{},{},{},{hours:.2},{},{billable},{}",
            row.date,
            csv_field(row.user.as_str()),
            csv_field(row.project.as_str()),
            csv_field(row.issue.as_str()),
            csv_field(row.module.as_ref().map_or("", ModuleId::as_str)),
            row.duration_seconds,
            row.source,
            csv_field(row.note.as_deref().unwrap_or_default()),
        );
    }
    out
}
