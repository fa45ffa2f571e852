//! Core domain logic for the worklog time-entry engine.
//!
//! This crate contains the fundamental types and logic for:
//! - Time entries: timer-sourced and manual records with validation
//! - Summaries: live per-issue totals including running timers
//! - Reports and export: historical grouped aggregates over closed entries
//! - Polling: the client-side reconciliation contract for live timers

pub mod entry;
pub mod export;
pub mod poll;
pub mod report;
pub mod summary;
pub mod types;

pub use entry::{closed_duration_seconds, EntryPatch, EntrySource, ManualEntryInput, TimeEntry};
pub use export::{export_rows, to_csv, ExportRow};
pub use poll::LocalTimer;
pub use report::{
    matches, policy_date, report, EntryFilter, GroupBy, Report, ReportQuery, ReportRow,
};
pub use summary::{summarize, Summary, UserTotal};
pub use types::{
    Actor, EntryId, IssueId, IssueRef, ModuleId, ProjectId, Role, UserId, ValidationError,
    WorkspaceId,
};
