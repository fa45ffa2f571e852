//! Implementation of the `wl summary` command.

use std::io::Write;

use anyhow::Result;
use chrono::Utc;

use wl_core::summarize;
use wl_db::Database;

use crate::Config;

use super::util::format_duration;

/// Total time tracked on an issue, with a per-user breakdown.
///
/// A running timer contributes its elapsed time as of now, so the total is
/// a snapshot rather than a stable value while anything runs.
pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    config: &Config,
    project: &str,
    issue: &str,
    json: bool,
) -> Result<()> {
    let scope = super::scope(config, project, issue)?;
    super::require_tracking_enabled(db, &scope.project)?;

    let entries = db.list_entries(&scope, None)?;
    let estimate = db.issue_estimate(&scope.issue)?;
    let summary = summarize(&entries, estimate, Utc::now());

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&summary)?)?;
        return Ok(());
    }

    writeln!(
        writer,
        "Tracked on {}: {}",
        scope.issue,
        format_duration(summary.total_seconds)
    )?;
    if let Some(minutes) = summary.estimated_minutes {
        writeln!(
            writer,
            "Estimate: {}",
            format_duration(minutes.saturating_mul(60))
        )?;
    }
    for user_total in &summary.by_user {
        let label = if user_total.entry_count == 1 {
            "entry"
        } else {
            "entries"
        };
        writeln!(
            writer,
            "- {}: {} ({} {})",
            user_total.user,
            format_duration(user_total.total_seconds),
            user_total.entry_count,
            label
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::PathBuf;

    use insta::assert_snapshot;

    use wl_core::{IssueId, ManualEntryInput, Role, UserId};

    fn test_config() -> Config {
        Config {
            database_path: PathBuf::from("unused.db"),
            workspace: "acme".to_string(),
            user: "ana".to_string(),
            role: Role::Member,
            poll_interval_secs: 30,
        }
    }

    fn add_manual(db: &mut Database, config: &Config, user: &str, minutes: i64) {
        let input = ManualEntryInput {
            scope: super::super::scope(config, "p1", "issue-1").unwrap(),
            user: UserId::new(user).unwrap(),
            duration_seconds: minutes * 60,
            started_at: None,
            ended_at: None,
            note: None,
            is_billable: false,
        };
        db.create_manual_entry(&input).unwrap();
    }

    #[test]
    fn summary_command_breaks_totals_down_by_user() {
        let mut db = Database::open_in_memory().unwrap();
        let config = test_config();
        add_manual(&mut db, &config, "ana", 30);
        add_manual(&mut db, &config, "ana", 30);
        add_manual(&mut db, &config, "bob", 30);
        db.set_estimate(&IssueId::new("issue-1").unwrap(), Some(120))
            .unwrap();

        let mut output = Vec::new();
        run(&mut output, &db, &config, "p1", "issue-1", false).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        Tracked on issue-1: 1h 30m
        Estimate: 2h 00m
        - ana: 1h 00m (2 entries)
        - bob: 30m (1 entry)
        ");
    }

    #[test]
    fn summary_of_untracked_issue_is_zero() {
        let db = Database::open_in_memory().unwrap();
        let config = test_config();

        let mut output = Vec::new();
        run(&mut output, &db, &config, "p1", "issue-1", false).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "Tracked on issue-1: 0s\n"
        );
    }

    #[test]
    fn summary_as_json_includes_the_estimate() {
        let mut db = Database::open_in_memory().unwrap();
        let config = test_config();
        add_manual(&mut db, &config, "ana", 45);
        db.set_estimate(&IssueId::new("issue-1").unwrap(), Some(60))
            .unwrap();

        let mut output = Vec::new();
        run(&mut output, &db, &config, "p1", "issue-1", true).unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(parsed["total_seconds"], 2700);
        assert_eq!(parsed["total_hours"], 0.75);
        assert_eq!(parsed["estimated_minutes"], 60);
        assert_eq!(parsed["by_user"].as_array().unwrap().len(), 1);
    }
}
