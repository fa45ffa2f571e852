//! Timer commands: start, stop, show active, and live watch.

use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;

use wl_core::{IssueRef, LocalTimer, TimeEntry, UserId, WorkspaceId};
use wl_db::Database;

use crate::Config;

use super::util::{format_clock, format_duration};

/// Start a timer on an issue.
///
/// Any timer the user has running on another issue is closed first; its
/// entry is reported before the new timer's start line.
pub fn start(
    db: &mut Database,
    config: &Config,
    project: &str,
    issue: &str,
    note: Option<String>,
    billable: bool,
) -> Result<()> {
    let scope = super::scope(config, project, issue)?;
    super::require_tracking_enabled(db, &scope.project)?;
    let user = super::actor(config)?.user;

    let outcome = db.start_timer(&scope, &user, note, billable)?;
    for stopped in &outcome.auto_stopped {
        println!(
            "Stopped timer on {} ({})",
            stopped.scope.issue,
            format_duration(stopped.duration_seconds)
        );
    }
    println!("Started timer on {}", outcome.entry.scope.issue);
    Ok(())
}

/// Stop the running timer on an issue, fixing its duration.
pub fn stop(db: &mut Database, config: &Config, project: &str, issue: &str) -> Result<()> {
    let scope = super::scope(config, project, issue)?;
    super::require_tracking_enabled(db, &scope.project)?;
    let user = super::actor(config)?.user;

    let entry = db.stop_timer(&scope, &user)?;
    println!(
        "Stopped timer on {} ({})",
        entry.scope.issue,
        format_duration(entry.duration_seconds)
    );
    Ok(())
}

/// Show the running timer: for one issue when a scope is given, otherwise
/// the user's running timer anywhere in the workspace.
pub fn active<W: Write>(
    writer: &mut W,
    db: &Database,
    config: &Config,
    scope: Option<(&str, &str)>,
    json: bool,
) -> Result<()> {
    let user = super::actor(config)?.user;
    let entry = match scope {
        Some((project, issue)) => {
            let scope = super::scope(config, project, issue)?;
            super::require_tracking_enabled(db, &scope.project)?;
            db.active_timer(&scope, &user)?
        }
        None => {
            let workspace = super::workspace_id(config)?;
            db.active_timer_for_user(&workspace, &user)?
        }
    };

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&entry)?)?;
        return Ok(());
    }
    match entry {
        Some(entry) => write_active_line(writer, &entry)?,
        None => writeln!(writer, "No active timer.")?,
    }
    Ok(())
}

fn write_active_line<W: Write>(writer: &mut W, entry: &TimeEntry) -> Result<()> {
    let elapsed = entry.tracked_seconds(Utc::now());
    let started = entry
        .started_at
        .map_or_else(|| "unknown".to_string(), |at| at.to_rfc3339());
    writeln!(
        writer,
        "Timer on {} running for {} (started {})",
        entry.scope.issue,
        format_duration(elapsed),
        started
    )?;
    Ok(())
}

/// Follow the running timer live until Ctrl-C: one issue's timer when a
/// scope is given, otherwise whichever timer the user has running.
///
/// The authoritative state is re-read from the store at the configured
/// interval; between reads a local one-second tick extrapolates the elapsed
/// display. Each re-read replaces the local state wholesale, so a timer
/// started or stopped elsewhere shows up within one interval.
pub fn watch(
    db: &Database,
    config: &Config,
    scope: Option<(&str, &str)>,
    interval: Option<u64>,
) -> Result<()> {
    let workspace = super::workspace_id(config)?;
    let user = super::actor(config)?.user;
    let scope = match scope {
        Some((project, issue)) => {
            let scope = super::scope(config, project, issue)?;
            super::require_tracking_enabled(db, &scope.project)?;
            Some(scope)
        }
        None => None,
    };
    let poll_interval_secs = interval.unwrap_or(config.poll_interval_secs);
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start watch runtime")?;
    runtime.block_on(watch_loop(
        db,
        &workspace,
        scope.as_ref(),
        &user,
        poll_interval_secs,
    ))
}

#[allow(clippy::future_not_send)] // Database uses RefCell internally
async fn watch_loop(
    db: &Database,
    workspace: &WorkspaceId,
    scope: Option<&IssueRef>,
    user: &UserId,
    poll_interval_secs: u64,
) -> Result<()> {
    let mut timer = LocalTimer::new();
    let mut resync = tokio::time::interval(Duration::from_secs(poll_interval_secs.max(1)));
    let mut tick = tokio::time::interval(Duration::from_secs(1));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut out = std::io::stdout();
    loop {
        tokio::select! {
            _ = resync.tick() => {
                let snapshot = match scope {
                    Some(scope) => db.active_timer(scope, user)?,
                    None => db.active_timer_for_user(workspace, user)?,
                };
                timer.resync(snapshot);
                tracing::debug!(running = timer.is_running(), "resynced timer state");
            }
            _ = tick.tick() => {
                let line = match timer.active() {
                    Some(entry) => format!(
                        "Tracking {}  {}",
                        entry.scope.issue,
                        format_clock(entry.tracked_seconds(Utc::now()))
                    ),
                    None => "No active timer".to_string(),
                };
                write!(out, "\r{line:<60}").context("failed to write watch line")?;
                out.flush().context("failed to flush watch line")?;
            }
            result = &mut ctrl_c => {
                result.context("failed to listen for Ctrl-C")?;
                writeln!(out).context("failed to write watch line")?;
                break;
            }
        }
    }
    Ok(())
}
