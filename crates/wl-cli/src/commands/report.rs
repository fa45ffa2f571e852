//! Implementation of the `wl report` command.

use std::io::Write;

use anyhow::Result;

use wl_core::{report, GroupBy, ReportQuery};
use wl_db::Database;

use crate::Config;

use super::util::{entry_filter, format_duration};

/// Filters for a report or export, raw as parsed from the command line.
#[derive(Debug, Default)]
pub struct FilterArgs<'a> {
    pub from: Option<&'a str>,
    pub to: Option<&'a str>,
    pub project: Option<&'a str>,
    pub user: Option<&'a str>,
}

/// Grouped totals over the workspace's closed entries.
///
/// Running timers are excluded; their time shows up in `summary` until the
/// timer stops and only then in reports.
pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    config: &Config,
    group_by: &str,
    filters: &FilterArgs<'_>,
    json: bool,
) -> Result<()> {
    let group_by: GroupBy = group_by.parse()?;
    let query = ReportQuery {
        group_by,
        filter: entry_filter(filters.from, filters.to, filters.project, filters.user)?,
    };

    let workspace = super::workspace_id(config)?;
    let entries = db.workspace_entries(&workspace)?;
    let links = db.module_links()?;
    let result = report(&entries, &query, &links);

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&result)?)?;
        return Ok(());
    }

    writeln!(
        writer,
        "Report by {} (total {})",
        result.group_by,
        format_duration(result.total_seconds)
    )?;
    if result.rows.is_empty() {
        writeln!(writer, "No matching entries.")?;
        return Ok(());
    }
    for row in &result.rows {
        let label = if row.entry_count == 1 {
            "entry"
        } else {
            "entries"
        };
        writeln!(
            writer,
            "- {}: {} ({} {})",
            row.key,
            format_duration(row.total_seconds),
            row.entry_count,
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

    use wl_core::{IssueId, ManualEntryInput, ModuleId, Role, UserId};

    fn test_config() -> Config {
        Config {
            database_path: PathBuf::from("unused.db"),
            workspace: "acme".to_string(),
            user: "ana".to_string(),
            role: Role::Member,
            poll_interval_secs: 30,
        }
    }

    fn add_manual(db: &mut Database, config: &Config, user: &str, issue: &str, minutes: i64) {
        let input = ManualEntryInput {
            scope: super::super::scope(config, "p1", issue).unwrap(),
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
    fn report_command_groups_by_user() {
        let mut db = Database::open_in_memory().unwrap();
        let config = test_config();
        add_manual(&mut db, &config, "ana", "issue-1", 30);
        add_manual(&mut db, &config, "ana", "issue-2", 15);
        add_manual(&mut db, &config, "bob", "issue-1", 30);

        let mut output = Vec::new();
        run(&mut output, &db, &config, "user", &FilterArgs::default(), false).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        Report by user (total 1h 15m)
        - ana: 45m (2 entries)
        - bob: 30m (1 entry)
        ");
    }

    #[test]
    fn report_command_without_entries_prints_placeholder() {
        let db = Database::open_in_memory().unwrap();
        let config = test_config();

        let mut output = Vec::new();
        run(&mut output, &db, &config, "project", &FilterArgs::default(), false).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        Report by project (total 0s)
        No matching entries.
        ");
    }

    #[test]
    fn report_command_rejects_unknown_group() {
        let db = Database::open_in_memory().unwrap();
        let config = test_config();

        let mut output = Vec::new();
        let err = run(&mut output, &db, &config, "sprint", &FilterArgs::default(), false)
            .unwrap_err();
        assert!(err.to_string().contains("sprint"), "{err}");
    }

    #[test]
    fn module_report_uses_issue_links() {
        let mut db = Database::open_in_memory().unwrap();
        let config = test_config();
        add_manual(&mut db, &config, "ana", "issue-1", 30);
        add_manual(&mut db, &config, "ana", "issue-2", 45);
        db.link_module(
            &IssueId::new("issue-1").unwrap(),
            Some(&ModuleId::new("auth").unwrap()),
        )
        .unwrap();

        let mut output = Vec::new();
        run(&mut output, &db, &config, "module", &FilterArgs::default(), true).unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(parsed["group_by"], "module");
        assert_eq!(parsed["total_seconds"], 1800);
        let rows = parsed["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["key"], "auth");
    }

    #[test]
    fn user_filter_narrows_the_report() {
        let mut db = Database::open_in_memory().unwrap();
        let config = test_config();
        add_manual(&mut db, &config, "ana", "issue-1", 30);
        add_manual(&mut db, &config, "bob", "issue-1", 45);

        let filters = FilterArgs {
            user: Some("bob"),
            ..FilterArgs::default()
        };
        let mut output = Vec::new();
        run(&mut output, &db, &config, "user", &filters, false).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("total 45m"), "{output}");
        assert!(!output.contains("ana"), "{output}");
    }
}
