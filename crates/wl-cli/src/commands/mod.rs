//! CLI subcommand implementations.

pub mod entry;
pub mod export;
pub mod issue;
pub mod project;
pub mod report;
pub mod summary;
pub mod timer;
mod util;

use anyhow::{bail, Context, Result};

use wl_core::{Actor, IssueId, IssueRef, ProjectId, UserId, WorkspaceId};
use wl_db::Database;

use crate::Config;

/// The issue scope a command operates on, in the configured workspace.
pub(crate) fn scope(config: &Config, project: &str, issue: &str) -> Result<IssueRef> {
    let workspace = WorkspaceId::new(config.workspace.clone())
        .context("invalid workspace in configuration")?;
    Ok(IssueRef::new(
        workspace,
        ProjectId::new(project)?,
        IssueId::new(issue)?,
    ))
}

/// The identity mutating commands act as, from the configured user and role.
pub(crate) fn actor(config: &Config) -> Result<Actor> {
    let user = UserId::new(config.user.clone()).context("invalid user in configuration")?;
    Ok(Actor::new(user, config.role))
}

pub(crate) fn workspace_id(config: &Config) -> Result<WorkspaceId> {
    WorkspaceId::new(config.workspace.clone()).context("invalid workspace in configuration")
}

/// The per-project tracking gate. Checked before any timer or entry
/// operation reaches the engine, so its contracts hold unconditionally
/// once a command gets past this point.
pub(crate) fn require_tracking_enabled(db: &Database, project: &ProjectId) -> Result<()> {
    if db.time_tracking_enabled(project)? {
        return Ok(());
    }
    bail!("time tracking is disabled for project {project}");
}
