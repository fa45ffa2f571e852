//! Implementation of the `wl export` command.
//!
//! Writes the filtered closed entries as CSV to stdout. The filter is the
//! one `report` uses, so the exported durations sum to the report totals
//! for identical parameters.

use std::io::{stdout, BufWriter, Write};

use anyhow::{Context, Result};

use wl_core::{export_rows, to_csv};
use wl_db::Database;

use crate::Config;

use super::report::FilterArgs;
use super::util::entry_filter;

pub fn run(db: &Database, config: &Config, filters: &FilterArgs<'_>) -> Result<()> {
    let filter = entry_filter(filters.from, filters.to, filters.project, filters.user)?;
    let workspace = super::workspace_id(config)?;
    let entries = db.workspace_entries(&workspace)?;
    let links = db.module_links()?;
    let rows = export_rows(&entries, &filter, &links);

    let stdout = stdout();
    let mut writer = BufWriter::new(stdout.lock());
    writer
        .write_all(to_csv(&rows).as_bytes())
        .context("failed to write CSV")?;
    writer.flush().context("failed to flush CSV")?;
    Ok(())
}
