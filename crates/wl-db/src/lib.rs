//! Storage layer for the worklog time-entry engine.
//!
//! Provides persistence for time entries using `rusqlite` and enforces the
//! single-active-timer invariant at the schema level.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but
//! not `Sync`. A `Database` can move between threads but cannot be shared
//! without external synchronization (a `Mutex<Database>`, a pool, or one
//! instance per thread).
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Timestamps are stored as TEXT in RFC 3339 format with millisecond
//! precision (e.g., `2024-01-15T10:30:00.000Z`), always UTC. Lexicographic
//! ordering therefore matches chronological ordering, which range queries
//! and `ORDER BY created_at` rely on.
//!
//! ## Active-Timer Uniqueness
//!
//! A partial unique index covers rows with `source = 'timer'` and
//! `ended_at IS NULL`, so at most one running timer can exist per
//! (workspace, project, issue, user). Concurrent starts race at the INSERT:
//! the loser receives a constraint violation, surfaced as
//! [`StoreError::TimerConflict`]. Application-level checks are a courtesy
//! only; the index is what holds the invariant.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;
use tracing::debug;

use wl_core::{
    closed_duration_seconds, Actor, EntryId, EntryPatch, EntrySource, IssueId, IssueRef,
    ManualEntryInput, ModuleId, ProjectId, TimeEntry, UserId, ValidationError, WorkspaceId,
};

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Input failed a domain validation rule.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// A timer is already running for this (user, issue).
    #[error("a timer is already running for {user} on issue {issue}")]
    TimerConflict { user: UserId, issue: IssueId },
    /// There is no running timer to stop.
    #[error("no active timer for {user} on issue {issue}")]
    NoActiveTimer { user: UserId, issue: IssueId },
    /// The entry does not exist (or was already deleted).
    #[error("time entry not found: {0}")]
    EntryNotFound(EntryId),
    /// The caller is neither the entry's owner nor an admin.
    #[error("{user} cannot modify a time entry owned by {owner}")]
    NotEntryOwner { user: UserId, owner: UserId },
    /// Failed to parse a stored timestamp.
    #[error("invalid timestamp for entry {entry_id}: {timestamp}")]
    TimestampParse {
        entry_id: String,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored row failed to convert back into a domain value.
    #[error("invalid data for entry {entry_id}: {message}")]
    InvalidEntryData { entry_id: String, message: String },
}

/// Coarse classification of a [`StoreError`], mirroring the failure kinds
/// callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    Authorization,
    Storage,
}

impl StoreError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::TimerConflict { .. } => ErrorKind::Conflict,
            Self::NoActiveTimer { .. } | Self::EntryNotFound(_) => ErrorKind::NotFound,
            Self::NotEntryOwner { .. } => ErrorKind::Authorization,
            Self::Sqlite(_) | Self::TimestampParse { .. } | Self::InvalidEntryData { .. } => {
                ErrorKind::Storage
            }
        }
    }
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// Result of starting a timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartOutcome {
    /// The newly opened entry.
    pub entry: TimeEntry,
    /// Timers on the user's other issues that this start closed.
    pub auto_stopped: Vec<TimeEntry>,
}

const ENTRY_COLUMNS: &str = "id, workspace_id, project_id, issue_id, user_id, source, \
     started_at, ended_at, duration_seconds, note, is_billable, \
     created_at, updated_at, created_by, updated_by";

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS time_entries (
                id TEXT PRIMARY KEY,
                workspace_id TEXT NOT NULL,
                project_id TEXT NOT NULL,
                issue_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                source TEXT NOT NULL,
                started_at TEXT,
                ended_at TEXT,
                duration_seconds INTEGER NOT NULL DEFAULT 0,
                note TEXT,
                is_billable INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                created_by TEXT NOT NULL,
                updated_by TEXT NOT NULL
            );

            -- At most one running timer per (workspace, project, issue, user).
            -- The partial index makes check-and-create atomic: the loser of a
            -- concurrent start hits a constraint violation instead of
            -- creating a second active row.
            CREATE UNIQUE INDEX IF NOT EXISTS idx_entries_active
                ON time_entries(workspace_id, project_id, issue_id, user_id)
                WHERE source = 'timer' AND ended_at IS NULL;

            CREATE INDEX IF NOT EXISTS idx_entries_issue ON time_entries(issue_id, user_id);
            CREATE INDEX IF NOT EXISTS idx_entries_workspace ON time_entries(workspace_id);
            CREATE INDEX IF NOT EXISTS idx_entries_created ON time_entries(created_at);

            -- Mirror of the project collaborator's per-project tracking gate.
            -- Absent rows mean tracking has never been configured.
            CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY,
                time_tracking_enabled INTEGER NOT NULL DEFAULT 1
            );

            -- Mirror of issue attributes owned by the tracking collaborator:
            -- module membership and the time estimate shown next to totals.
            CREATE TABLE IF NOT EXISTS issues (
                id TEXT PRIMARY KEY,
                module_id TEXT,
                estimated_minutes INTEGER
            );
            ",
        )?;
        Ok(())
    }

    /// Starts a timer for (user, issue), closing the user's running timers on
    /// other issues first. `note` and `is_billable` seed the new entry and
    /// stay editable afterwards.
    ///
    /// Fails with [`StoreError::TimerConflict`] if a timer is already running
    /// for the same (user, issue), including when a concurrent start wins the
    /// race at the schema constraint.
    pub fn start_timer(
        &mut self,
        scope: &IssueRef,
        user: &UserId,
        note: Option<String>,
        is_billable: bool,
    ) -> Result<StartOutcome, StoreError> {
        self.start_timer_at(scope, user, note, is_billable, Utc::now())
    }

    fn start_timer_at(
        &mut self,
        scope: &IssueRef,
        user: &UserId,
        note: Option<String>,
        is_billable: bool,
        now: DateTime<Utc>,
    ) -> Result<StartOutcome, StoreError> {
        let tx = self.conn.transaction()?;

        let already_running: i64 = tx.query_row(
            "
            SELECT COUNT(*) FROM time_entries
            WHERE workspace_id = ? AND project_id = ? AND issue_id = ? AND user_id = ?
              AND source = 'timer' AND ended_at IS NULL
            ",
            params![
                scope.workspace.as_str(),
                scope.project.as_str(),
                scope.issue.as_str(),
                user.as_str(),
            ],
            |row| row.get(0),
        )?;
        if already_running > 0 {
            return Err(StoreError::TimerConflict {
                user: user.clone(),
                issue: scope.issue.clone(),
            });
        }

        // Starting work on one issue ends work on any other: close the
        // user's running timers elsewhere in the workspace inside the same
        // transaction.
        let mut auto_stopped = Vec::new();
        {
            let mut stmt = tx.prepare(&format!(
                "
                SELECT {ENTRY_COLUMNS} FROM time_entries
                WHERE workspace_id = ? AND user_id = ?
                  AND source = 'timer' AND ended_at IS NULL AND issue_id != ?
                ORDER BY started_at ASC, id ASC
                "
            ))?;
            let rows = stmt.query_map(
                params![
                    scope.workspace.as_str(),
                    user.as_str(),
                    scope.issue.as_str(),
                ],
                read_entry_row,
            )?;
            for row in rows {
                auto_stopped.push(entry_from_row(row?)?);
            }
        }
        {
            let mut stmt = tx.prepare(
                "
                UPDATE time_entries
                SET ended_at = ?, duration_seconds = ?, updated_at = ?, updated_by = ?
                WHERE id = ?
                ",
            )?;
            for entry in &mut auto_stopped {
                let started = require_started_at(entry)?;
                entry.ended_at = Some(now);
                entry.duration_seconds = closed_duration_seconds(started, now);
                entry.updated_at = now;
                entry.updated_by = user.clone();
                stmt.execute(params![
                    format_timestamp(now),
                    entry.duration_seconds,
                    format_timestamp(now),
                    user.as_str(),
                    entry.id.as_str(),
                ])?;
            }
        }
        if !auto_stopped.is_empty() {
            debug!(
                user = %user,
                count = auto_stopped.len(),
                "closed running timers on other issues"
            );
        }

        let entry = TimeEntry {
            id: EntryId::generate(),
            scope: scope.clone(),
            user: user.clone(),
            source: EntrySource::Timer,
            started_at: Some(now),
            ended_at: None,
            duration_seconds: 0,
            note,
            is_billable,
            created_at: now,
            updated_at: now,
            created_by: user.clone(),
            updated_by: user.clone(),
        };
        match insert_entry(&tx, &entry) {
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                return Err(StoreError::TimerConflict {
                    user: user.clone(),
                    issue: scope.issue.clone(),
                });
            }
            other => {
                other?;
            }
        }
        tx.commit()?;

        Ok(StartOutcome {
            entry,
            auto_stopped,
        })
    }

    /// Stops the running timer for (user, issue), fixing its duration to the
    /// elapsed whole seconds.
    ///
    /// Fails with [`StoreError::NoActiveTimer`] when nothing is running,
    /// including on a repeated stop.
    pub fn stop_timer(&mut self, scope: &IssueRef, user: &UserId) -> Result<TimeEntry, StoreError> {
        self.stop_timer_at(scope, user, Utc::now())
    }

    fn stop_timer_at(
        &mut self,
        scope: &IssueRef,
        user: &UserId,
        now: DateTime<Utc>,
    ) -> Result<TimeEntry, StoreError> {
        let tx = self.conn.transaction()?;

        let row = tx
            .query_row(
                &format!(
                    "
                    SELECT {ENTRY_COLUMNS} FROM time_entries
                    WHERE workspace_id = ? AND project_id = ? AND issue_id = ? AND user_id = ?
                      AND source = 'timer' AND ended_at IS NULL
                    "
                ),
                params![
                    scope.workspace.as_str(),
                    scope.project.as_str(),
                    scope.issue.as_str(),
                    user.as_str(),
                ],
                read_entry_row,
            )
            .optional()?;
        let Some(row) = row else {
            return Err(StoreError::NoActiveTimer {
                user: user.clone(),
                issue: scope.issue.clone(),
            });
        };

        let mut entry = entry_from_row(row)?;
        let started = require_started_at(&entry)?;
        entry.ended_at = Some(now);
        entry.duration_seconds = closed_duration_seconds(started, now);
        entry.updated_at = now;
        entry.updated_by = user.clone();

        tx.execute(
            "
            UPDATE time_entries
            SET ended_at = ?, duration_seconds = ?, updated_at = ?, updated_by = ?
            WHERE id = ?
            ",
            params![
                format_timestamp(now),
                entry.duration_seconds,
                format_timestamp(now),
                user.as_str(),
                entry.id.as_str(),
            ],
        )?;
        tx.commit()?;
        Ok(entry)
    }

    /// The running timer for (user, issue), if any. Read-only.
    pub fn active_timer(
        &self,
        scope: &IssueRef,
        user: &UserId,
    ) -> Result<Option<TimeEntry>, StoreError> {
        let row = self
            .conn
            .query_row(
                &format!(
                    "
                    SELECT {ENTRY_COLUMNS} FROM time_entries
                    WHERE workspace_id = ? AND project_id = ? AND issue_id = ? AND user_id = ?
                      AND source = 'timer' AND ended_at IS NULL
                    "
                ),
                params![
                    scope.workspace.as_str(),
                    scope.project.as_str(),
                    scope.issue.as_str(),
                    user.as_str(),
                ],
                read_entry_row,
            )
            .optional()?;
        row.map(entry_from_row).transpose()
    }

    /// The user's running timer anywhere in the workspace, if any.
    ///
    /// Auto-stop on start keeps this to at most one row.
    pub fn active_timer_for_user(
        &self,
        workspace: &WorkspaceId,
        user: &UserId,
    ) -> Result<Option<TimeEntry>, StoreError> {
        let row = self
            .conn
            .query_row(
                &format!(
                    "
                    SELECT {ENTRY_COLUMNS} FROM time_entries
                    WHERE workspace_id = ? AND user_id = ?
                      AND source = 'timer' AND ended_at IS NULL
                    ORDER BY started_at DESC, id ASC
                    LIMIT 1
                    "
                ),
                params![workspace.as_str(), user.as_str()],
                read_entry_row,
            )
            .optional()?;
        row.map(entry_from_row).transpose()
    }

    /// Records a manual entry. The entry is closed from the moment it exists
    /// and does not interact with the active-timer invariant.
    pub fn create_manual_entry(
        &mut self,
        input: &ManualEntryInput,
    ) -> Result<TimeEntry, StoreError> {
        self.create_manual_entry_at(input, Utc::now())
    }

    fn create_manual_entry_at(
        &mut self,
        input: &ManualEntryInput,
        now: DateTime<Utc>,
    ) -> Result<TimeEntry, StoreError> {
        input.validate()?;
        let entry = TimeEntry {
            id: EntryId::generate(),
            scope: input.scope.clone(),
            user: input.user.clone(),
            source: EntrySource::Manual,
            started_at: input.started_at,
            ended_at: input.ended_at,
            duration_seconds: input.duration_seconds,
            note: input.note.clone(),
            is_billable: input.is_billable,
            created_at: now,
            updated_at: now,
            created_by: input.user.clone(),
            updated_by: input.user.clone(),
        };
        insert_entry(&self.conn, &entry)?;
        Ok(entry)
    }

    /// Fetches one entry by ID.
    pub fn get_entry(&self, id: &EntryId) -> Result<TimeEntry, StoreError> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {ENTRY_COLUMNS} FROM time_entries WHERE id = ?"),
                [id.as_str()],
                read_entry_row,
            )
            .optional()?;
        let Some(row) = row else {
            return Err(StoreError::EntryNotFound(id.clone()));
        };
        entry_from_row(row)
    }

    /// Applies a patch to an entry on behalf of `actor`.
    ///
    /// Only the owner or an admin may modify an entry; the patch itself is
    /// validated against the entry's source before anything is written.
    pub fn update_entry(
        &mut self,
        id: &EntryId,
        patch: &EntryPatch,
        actor: &Actor,
    ) -> Result<TimeEntry, StoreError> {
        self.update_entry_at(id, patch, actor, Utc::now())
    }

    fn update_entry_at(
        &mut self,
        id: &EntryId,
        patch: &EntryPatch,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<TimeEntry, StoreError> {
        let tx = self.conn.transaction()?;

        let row = tx
            .query_row(
                &format!("SELECT {ENTRY_COLUMNS} FROM time_entries WHERE id = ?"),
                [id.as_str()],
                read_entry_row,
            )
            .optional()?;
        let Some(row) = row else {
            return Err(StoreError::EntryNotFound(id.clone()));
        };
        let mut entry = entry_from_row(row)?;

        if !actor.can_modify(&entry.user) {
            return Err(StoreError::NotEntryOwner {
                user: actor.user.clone(),
                owner: entry.user.clone(),
            });
        }
        patch.validate(&entry)?;
        patch.apply(&mut entry, now);
        entry.updated_by = actor.user.clone();

        tx.execute(
            "
            UPDATE time_entries
            SET started_at = ?, ended_at = ?, duration_seconds = ?, note = ?,
                is_billable = ?, updated_at = ?, updated_by = ?
            WHERE id = ?
            ",
            params![
                entry.started_at.map(format_timestamp),
                entry.ended_at.map(format_timestamp),
                entry.duration_seconds,
                entry.note,
                entry.is_billable,
                format_timestamp(entry.updated_at),
                entry.updated_by.as_str(),
                entry.id.as_str(),
            ],
        )?;
        tx.commit()?;
        Ok(entry)
    }

    /// Deletes an entry on behalf of `actor`, under the same ownership rule
    /// as updates. A second delete of the same ID reports not-found.
    pub fn delete_entry(&mut self, id: &EntryId, actor: &Actor) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;

        let owner: Option<String> = tx
            .query_row(
                "SELECT user_id FROM time_entries WHERE id = ?",
                [id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(owner) = owner else {
            return Err(StoreError::EntryNotFound(id.clone()));
        };
        let owner = UserId::new(owner).map_err(|err| StoreError::InvalidEntryData {
            entry_id: id.to_string(),
            message: err.to_string(),
        })?;
        if !actor.can_modify(&owner) {
            return Err(StoreError::NotEntryOwner {
                user: actor.user.clone(),
                owner,
            });
        }

        tx.execute("DELETE FROM time_entries WHERE id = ?", [id.as_str()])?;
        tx.commit()?;
        Ok(())
    }

    /// All entries for one issue, newest first, optionally narrowed to one
    /// user.
    pub fn list_entries(
        &self,
        scope: &IssueRef,
        user: Option<&UserId>,
    ) -> Result<Vec<TimeEntry>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "
            SELECT {ENTRY_COLUMNS} FROM time_entries
            WHERE workspace_id = ?1 AND project_id = ?2 AND issue_id = ?3
              AND (?4 IS NULL OR user_id = ?4)
            ORDER BY created_at DESC, id ASC
            "
        ))?;
        let rows = stmt.query_map(
            params![
                scope.workspace.as_str(),
                scope.project.as_str(),
                scope.issue.as_str(),
                user.map(UserId::as_str),
            ],
            read_entry_row,
        )?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(entry_from_row(row?)?);
        }
        Ok(entries)
    }

    /// All entries in a workspace, oldest first. Reports and exports apply
    /// their own filtering on top.
    pub fn workspace_entries(&self, workspace: &WorkspaceId) -> Result<Vec<TimeEntry>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "
            SELECT {ENTRY_COLUMNS} FROM time_entries
            WHERE workspace_id = ?
            ORDER BY created_at ASC, id ASC
            "
        ))?;
        let rows = stmt.query_map([workspace.as_str()], read_entry_row)?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(entry_from_row(row?)?);
        }
        Ok(entries)
    }

    /// Sets the per-project tracking gate.
    pub fn set_time_tracking(
        &mut self,
        project: &ProjectId,
        enabled: bool,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "
            INSERT INTO projects (id, time_tracking_enabled) VALUES (?, ?)
            ON CONFLICT(id) DO UPDATE SET time_tracking_enabled = excluded.time_tracking_enabled
            ",
            params![project.as_str(), enabled],
        )?;
        Ok(())
    }

    /// Whether the project accepts timer and entry operations. Projects never
    /// configured default to enabled.
    pub fn time_tracking_enabled(&self, project: &ProjectId) -> Result<bool, StoreError> {
        let enabled: Option<bool> = self
            .conn
            .query_row(
                "SELECT time_tracking_enabled FROM projects WHERE id = ?",
                [project.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(enabled.unwrap_or(true))
    }

    /// Links an issue to a module, or clears the link with `None`.
    pub fn link_module(
        &mut self,
        issue: &IssueId,
        module: Option<&ModuleId>,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "
            INSERT INTO issues (id, module_id) VALUES (?, ?)
            ON CONFLICT(id) DO UPDATE SET module_id = excluded.module_id
            ",
            params![issue.as_str(), module.map(ModuleId::as_str)],
        )?;
        Ok(())
    }

    /// Sets or clears an issue's estimate in minutes.
    pub fn set_estimate(
        &mut self,
        issue: &IssueId,
        minutes: Option<i64>,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "
            INSERT INTO issues (id, estimated_minutes) VALUES (?, ?)
            ON CONFLICT(id) DO UPDATE SET estimated_minutes = excluded.estimated_minutes
            ",
            params![issue.as_str(), minutes],
        )?;
        Ok(())
    }

    /// An issue's estimate in minutes, if one has been recorded.
    pub fn issue_estimate(&self, issue: &IssueId) -> Result<Option<i64>, StoreError> {
        let minutes: Option<Option<i64>> = self
            .conn
            .query_row(
                "SELECT estimated_minutes FROM issues WHERE id = ?",
                [issue.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(minutes.flatten())
    }

    /// Issue-to-module links for module-grouped reports.
    pub fn module_links(&self) -> Result<BTreeMap<IssueId, ModuleId>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, module_id FROM issues WHERE module_id IS NOT NULL")?;
        let rows = stmt.query_map([], |row| {
            let issue: String = row.get(0)?;
            let module: String = row.get(1)?;
            Ok((issue, module))
        })?;
        let mut links = BTreeMap::new();
        for row in rows {
            let (issue, module) = row?;
            let issue_id = IssueId::new(&issue).map_err(|err| StoreError::InvalidEntryData {
                entry_id: issue.clone(),
                message: err.to_string(),
            })?;
            let module = ModuleId::new(module).map_err(|err| StoreError::InvalidEntryData {
                entry_id: issue,
                message: err.to_string(),
            })?;
            links.insert(issue_id, module);
        }
        Ok(links)
    }
}

/// A raw entry row as stored, before conversion into domain types.
#[derive(Debug)]
struct EntryRow {
    id: String,
    workspace_id: String,
    project_id: String,
    issue_id: String,
    user_id: String,
    source: String,
    started_at: Option<String>,
    ended_at: Option<String>,
    duration_seconds: i64,
    note: Option<String>,
    is_billable: bool,
    created_at: String,
    updated_at: String,
    created_by: String,
    updated_by: String,
}

fn read_entry_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EntryRow> {
    Ok(EntryRow {
        id: row.get(0)?,
        workspace_id: row.get(1)?,
        project_id: row.get(2)?,
        issue_id: row.get(3)?,
        user_id: row.get(4)?,
        source: row.get(5)?,
        started_at: row.get(6)?,
        ended_at: row.get(7)?,
        duration_seconds: row.get(8)?,
        note: row.get(9)?,
        is_billable: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
        created_by: row.get(13)?,
        updated_by: row.get(14)?,
    })
}

fn entry_from_row(row: EntryRow) -> Result<TimeEntry, StoreError> {
    let invalid = |message: String| StoreError::InvalidEntryData {
        entry_id: row.id.clone(),
        message,
    };
    let source = row
        .source
        .parse::<EntrySource>()
        .map_err(|err| invalid(err.to_string()))?;
    let scope = IssueRef::new(
        WorkspaceId::new(&row.workspace_id).map_err(|err| invalid(err.to_string()))?,
        ProjectId::new(&row.project_id).map_err(|err| invalid(err.to_string()))?,
        IssueId::new(&row.issue_id).map_err(|err| invalid(err.to_string()))?,
    );
    let user = UserId::new(&row.user_id).map_err(|err| invalid(err.to_string()))?;
    let created_by = UserId::new(&row.created_by).map_err(|err| invalid(err.to_string()))?;
    let updated_by = UserId::new(&row.updated_by).map_err(|err| invalid(err.to_string()))?;

    let started_at = row
        .started_at
        .as_deref()
        .map(|ts| parse_timestamp(ts, &row.id))
        .transpose()?;
    let ended_at = row
        .ended_at
        .as_deref()
        .map(|ts| parse_timestamp(ts, &row.id))
        .transpose()?;
    let created_at = parse_timestamp(&row.created_at, &row.id)?;
    let updated_at = parse_timestamp(&row.updated_at, &row.id)?;

    let id = EntryId::new(&row.id).map_err(|err| invalid(err.to_string()))?;
    Ok(TimeEntry {
        id,
        scope,
        user,
        source,
        started_at,
        ended_at,
        duration_seconds: row.duration_seconds,
        note: row.note,
        is_billable: row.is_billable,
        created_at,
        updated_at,
        created_by,
        updated_by,
    })
}

fn insert_entry(conn: &Connection, entry: &TimeEntry) -> rusqlite::Result<usize> {
    conn.execute(
        "
        INSERT INTO time_entries
        (id, workspace_id, project_id, issue_id, user_id, source,
         started_at, ended_at, duration_seconds, note, is_billable,
         created_at, updated_at, created_by, updated_by)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ",
        params![
            entry.id.as_str(),
            entry.scope.workspace.as_str(),
            entry.scope.project.as_str(),
            entry.scope.issue.as_str(),
            entry.user.as_str(),
            entry.source.as_str(),
            entry.started_at.map(format_timestamp),
            entry.ended_at.map(format_timestamp),
            entry.duration_seconds,
            entry.note,
            entry.is_billable,
            format_timestamp(entry.created_at),
            format_timestamp(entry.updated_at),
            entry.created_by.as_str(),
            entry.updated_by.as_str(),
        ],
    )
}

fn require_started_at(entry: &TimeEntry) -> Result<DateTime<Utc>, StoreError> {
    entry
        .started_at
        .ok_or_else(|| StoreError::InvalidEntryData {
            entry_id: entry.id.to_string(),
            message: "timer entry without started_at".to_string(),
        })
}

fn parse_timestamp(timestamp: &str, entry_id: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| StoreError::TimestampParse {
            entry_id: entry_id.to_string(),
            timestamp: timestamp.to_string(),
            source,
        })
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}
