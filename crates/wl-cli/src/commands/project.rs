//! Per-project tracking gate commands.

use anyhow::Result;

use wl_core::ProjectId;
use wl_db::Database;

/// Enable or disable timer and entry operations for a project.
///
/// Disabling does not touch existing entries or running timers; it only
/// makes the project unreachable for further commands until re-enabled.
pub fn set(db: &mut Database, project: &str, enabled: bool) -> Result<()> {
    let project = ProjectId::new(project)?;
    db.set_time_tracking(&project, enabled)?;
    if enabled {
        println!("Time tracking enabled for {project}");
    } else {
        println!("Time tracking disabled for {project}");
    }
    Ok(())
}
