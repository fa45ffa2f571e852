//! Issue attribute commands: module links and estimates.

use anyhow::{bail, Result};

use wl_core::{IssueId, ModuleId};
use wl_db::Database;

use super::util::format_duration;

/// Link an issue to a module, or clear the link when `module` is `None`.
/// Module-grouped reports only count linked issues.
pub fn link_module(db: &mut Database, issue: &str, module: Option<&str>) -> Result<()> {
    let issue = IssueId::new(issue)?;
    let module = module.map(ModuleId::new).transpose()?;
    db.link_module(&issue, module.as_ref())?;
    match module {
        Some(module) => println!("Linked {issue} to module {module}"),
        None => println!("Cleared module link for {issue}"),
    }
    Ok(())
}

/// Set an issue's estimate in minutes, or clear it when `minutes` is `None`.
/// Summaries show the estimate next to the tracked total.
pub fn set_estimate(db: &mut Database, issue: &str, minutes: Option<i64>) -> Result<()> {
    let issue = IssueId::new(issue)?;
    if let Some(minutes) = minutes {
        if minutes <= 0 {
            bail!("estimate must be a positive number of minutes, got {minutes}");
        }
    }
    db.set_estimate(&issue, minutes)?;
    match minutes {
        Some(minutes) => println!(
            "Set estimate for {issue} to {}",
            format_duration(minutes.saturating_mul(60))
        ),
        None => println!("Cleared estimate for {issue}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimates_must_be_positive() {
        let mut db = Database::open_in_memory().unwrap();
        assert!(set_estimate(&mut db, "issue-1", Some(0)).is_err());
        assert!(set_estimate(&mut db, "issue-1", Some(-15)).is_err());
        assert!(set_estimate(&mut db, "issue-1", Some(90)).is_ok());
        assert!(set_estimate(&mut db, "issue-1", None).is_ok());
    }

    #[test]
    fn linking_and_clearing_updates_the_store() {
        let mut db = Database::open_in_memory().unwrap();
        link_module(&mut db, "issue-1", Some("auth")).unwrap();
        assert_eq!(db.module_links().unwrap().len(), 1);

        link_module(&mut db, "issue-1", None).unwrap();
        assert!(db.module_links().unwrap().is_empty());
    }
}
