//! Manual entry commands: add, list, update, and delete.

use std::io::Write;

use anyhow::{bail, Result};

use wl_core::{EntryId, EntryPatch, ManualEntryInput, TimeEntry, UserId};
use wl_db::Database;

use crate::Config;

use super::util::{format_duration, parse_datetime, parse_duration_seconds};

/// Arguments for `wl add`, raw as parsed from the command line.
#[derive(Debug, Default)]
pub struct AddArgs<'a> {
    pub duration: &'a str,
    pub started_at: Option<&'a str>,
    pub ended_at: Option<&'a str>,
    pub note: Option<String>,
    pub billable: bool,
}

/// Record a manual entry. The entry is closed from the start; a running
/// timer on the same issue is unaffected.
pub fn add(
    db: &mut Database,
    config: &Config,
    project: &str,
    issue: &str,
    args: AddArgs<'_>,
) -> Result<()> {
    let scope = super::scope(config, project, issue)?;
    super::require_tracking_enabled(db, &scope.project)?;
    let user = super::actor(config)?.user;

    let input = ManualEntryInput {
        scope,
        user,
        duration_seconds: parse_duration_seconds(args.duration)?,
        started_at: args.started_at.map(parse_datetime).transpose()?,
        ended_at: args.ended_at.map(parse_datetime).transpose()?,
        note: args.note,
        is_billable: args.billable,
    };
    let entry = db.create_manual_entry(&input)?;
    println!(
        "Recorded {} on {} (entry {})",
        format_duration(entry.duration_seconds),
        entry.scope.issue,
        entry.id
    );
    Ok(())
}

/// List the entries recorded against one issue, newest first, optionally
/// narrowed to one user.
pub fn list<W: Write>(
    writer: &mut W,
    db: &Database,
    config: &Config,
    project: &str,
    issue: &str,
    user: Option<&str>,
    json: bool,
) -> Result<()> {
    let scope = super::scope(config, project, issue)?;
    super::require_tracking_enabled(db, &scope.project)?;
    let user = user.map(UserId::new).transpose()?;
    let entries = db.list_entries(&scope, user.as_ref())?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&entries)?)?;
        return Ok(());
    }
    if entries.is_empty() {
        writeln!(writer, "No entries recorded.")?;
        return Ok(());
    }
    for entry in &entries {
        write_entry_line(writer, entry)?;
    }
    Ok(())
}

fn write_entry_line<W: Write>(writer: &mut W, entry: &TimeEntry) -> Result<()> {
    let duration = if entry.is_active() {
        "running".to_string()
    } else {
        format_duration(entry.duration_seconds)
    };
    let note = entry
        .note
        .as_deref()
        .map(|note| format!("  {note}"))
        .unwrap_or_default();
    writeln!(
        writer,
        "{}  {:<6}  {:>8}  {}{}",
        entry.id, entry.source, duration, entry.user, note
    )?;
    Ok(())
}

/// Arguments for `wl update`, raw as parsed from the command line.
#[derive(Debug, Default)]
pub struct UpdateArgs<'a> {
    pub duration: Option<&'a str>,
    pub started_at: Option<&'a str>,
    pub ended_at: Option<&'a str>,
    pub note: Option<String>,
    pub billable: Option<bool>,
}

/// Edit an entry. Ownership rules and the timer-field restrictions are
/// enforced by the store; this layer only parses the patch.
pub fn update(
    db: &mut Database,
    config: &Config,
    entry_id: &str,
    args: UpdateArgs<'_>,
) -> Result<()> {
    let id = EntryId::new(entry_id)?;
    let current = db.get_entry(&id)?;
    super::require_tracking_enabled(db, &current.scope.project)?;
    let actor = super::actor(config)?;

    let patch = EntryPatch {
        duration_seconds: args.duration.map(parse_duration_seconds).transpose()?,
        started_at: args.started_at.map(parse_datetime).transpose()?,
        ended_at: args.ended_at.map(parse_datetime).transpose()?,
        note: args.note,
        is_billable: args.billable,
    };
    if patch.is_empty() {
        bail!(
            "nothing to update; pass at least one of --duration, --started-at, --ended-at, --note, --billable"
        );
    }

    let updated = db.update_entry(&id, &patch, &actor)?;
    println!(
        "Updated entry {} ({} on {})",
        updated.id,
        format_duration(updated.duration_seconds),
        updated.scope.issue
    );
    Ok(())
}

/// Delete an entry, permitted to its owner or an admin.
pub fn delete(db: &mut Database, config: &Config, entry_id: &str) -> Result<()> {
    let id = EntryId::new(entry_id)?;
    let entry = db.get_entry(&id)?;
    super::require_tracking_enabled(db, &entry.scope.project)?;
    let actor = super::actor(config)?;

    db.delete_entry(&id, &actor)?;
    println!("Deleted entry {id}");
    Ok(())
}
