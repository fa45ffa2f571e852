//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Track time against work items.
///
/// Runs one start/stop timer per issue, records manual entries, and turns
/// closed entries into summaries, grouped reports, and CSV exports.
#[derive(Debug, Parser)]
#[command(name = "wl", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start a timer on an issue.
    ///
    /// A running timer on any other issue is stopped first; starting twice
    /// on the same issue is an error.
    Start {
        /// The project the issue belongs to.
        #[arg(long)]
        project: String,

        /// The issue to track time against.
        #[arg(long)]
        issue: String,

        /// Note to put on the entry the timer creates.
        #[arg(long)]
        note: Option<String>,

        /// Mark the entry billable.
        #[arg(long)]
        billable: bool,
    },

    /// Stop the running timer on an issue.
    Stop {
        /// The project the issue belongs to.
        #[arg(long)]
        project: String,

        /// The issue the timer is running on.
        #[arg(long)]
        issue: String,
    },

    /// Show the running timer, for one issue or anywhere in the workspace.
    Active {
        /// Limit to one project (requires --issue).
        #[arg(long, requires = "issue")]
        project: Option<String>,

        /// Limit to one issue (requires --project).
        #[arg(long, requires = "project")]
        issue: Option<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Follow the running timer live until interrupted.
    Watch {
        /// Watch one issue's timer instead of the user's current one.
        #[arg(long, requires = "issue")]
        project: Option<String>,

        /// The issue to watch (requires --project).
        #[arg(long, requires = "project")]
        issue: Option<String>,

        /// Seconds between authoritative re-reads of the timer state.
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Record a manual entry against an issue.
    Add {
        /// The project the issue belongs to.
        #[arg(long)]
        project: String,

        /// The issue to record time against.
        #[arg(long)]
        issue: String,

        /// Time spent, as "1h30m", "45m", "2h", or a plain number of minutes.
        #[arg(long)]
        duration: String,

        /// When the work started (RFC 3339 or e.g. "2 hours ago").
        #[arg(long)]
        started_at: Option<String>,

        /// When the work ended (RFC 3339 or e.g. "30 minutes ago").
        #[arg(long)]
        ended_at: Option<String>,

        /// Free-text note.
        #[arg(long)]
        note: Option<String>,

        /// Mark the entry billable.
        #[arg(long)]
        billable: bool,
    },

    /// List the entries recorded against an issue.
    Entries {
        /// The project the issue belongs to.
        #[arg(long)]
        project: String,

        /// The issue to list entries for.
        #[arg(long)]
        issue: String,

        /// Only list entries owned by this user.
        #[arg(long)]
        user: Option<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Edit an entry.
    ///
    /// Timer-sourced entries only accept --note and --billable; their
    /// timestamps and duration are fixed by the timer that produced them.
    Update {
        /// ID of the entry to edit.
        entry: String,

        /// New duration, as "1h30m", "45m", or a plain number of minutes.
        #[arg(long)]
        duration: Option<String>,

        /// New start timestamp (RFC 3339 or e.g. "2 hours ago").
        #[arg(long)]
        started_at: Option<String>,

        /// New end timestamp (RFC 3339 or e.g. "30 minutes ago").
        #[arg(long)]
        ended_at: Option<String>,

        /// New note.
        #[arg(long)]
        note: Option<String>,

        /// New billable flag.
        #[arg(long)]
        billable: Option<bool>,
    },

    /// Delete an entry.
    Delete {
        /// ID of the entry to delete.
        entry: String,
    },

    /// Total time tracked on an issue, with a per-user breakdown.
    ///
    /// Includes the live elapsed time of any running timer, so the total
    /// moves while a timer runs.
    Summary {
        /// The project the issue belongs to.
        #[arg(long)]
        project: String,

        /// The issue to summarize.
        #[arg(long)]
        issue: String,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Grouped totals over closed entries.
    Report {
        /// Dimension to group by: user, issue, project, or module.
        #[arg(long, default_value = "user")]
        group_by: String,

        /// Earliest date to include (YYYY-MM-DD, "today", or "yesterday").
        #[arg(long)]
        from: Option<String>,

        /// Latest date to include (YYYY-MM-DD, "today", or "yesterday").
        #[arg(long)]
        to: Option<String>,

        /// Only count entries in this project.
        #[arg(long)]
        project: Option<String>,

        /// Only count entries owned by this user.
        #[arg(long)]
        user: Option<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Export closed entries as CSV on stdout.
    ///
    /// Takes the same filters as `report`; the exported durations sum to the
    /// report totals for identical filters.
    Export {
        /// Earliest date to include (YYYY-MM-DD, "today", or "yesterday").
        #[arg(long)]
        from: Option<String>,

        /// Latest date to include (YYYY-MM-DD, "today", or "yesterday").
        #[arg(long)]
        to: Option<String>,

        /// Only export entries in this project.
        #[arg(long)]
        project: Option<String>,

        /// Only export entries owned by this user.
        #[arg(long)]
        user: Option<String>,
    },

    /// Manage the per-project time tracking gate.
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// Manage issue attributes used by summaries and reports.
    Issue {
        #[command(subcommand)]
        action: IssueAction,
    },
}

/// Per-project settings.
#[derive(Debug, Subcommand)]
pub enum ProjectAction {
    /// Allow timer and entry operations on a project.
    Enable {
        /// The project to enable tracking for.
        project: String,
    },

    /// Reject timer and entry operations on a project.
    Disable {
        /// The project to disable tracking for.
        project: String,
    },
}

/// Per-issue settings.
#[derive(Debug, Subcommand)]
pub enum IssueAction {
    /// Link an issue to a module, or clear the link.
    LinkModule {
        /// The issue to link.
        issue: String,

        /// The module to link it to; omit to clear an existing link.
        module: Option<String>,
    },

    /// Set an issue's time estimate in minutes, or clear it.
    SetEstimate {
        /// The issue to set the estimate on.
        issue: String,

        /// Estimate in minutes; omit to clear an existing estimate.
        minutes: Option<i64>,
    },
}
