//! Client-side reconciliation with the authoritative timer state.
//!
//! Clients render a ticking clock by extrapolating locally between polls, but
//! only the store knows the real state. Each poll replaces the local view
//! wholesale; the tick is cosmetic and never feeds back into stored durations.

use chrono::{DateTime, Utc};

use crate::entry::TimeEntry;

/// Locally extrapolated view of one (user, issue) timer.
#[derive(Debug, Clone, Default)]
pub struct LocalTimer {
    active: Option<TimeEntry>,
}

impl LocalTimer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the local view with an authoritative read.
    ///
    /// A resync is a full replacement, not a merge: if the server reports a
    /// different entry or an adjusted `started_at`, the previous local
    /// estimate is discarded.
    pub fn resync(&mut self, server_state: Option<TimeEntry>) {
        self.active = server_state;
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// The entry being extrapolated, if any.
    #[must_use]
    pub fn active(&self) -> Option<&TimeEntry> {
        self.active.as_ref()
    }

    /// Cosmetic elapsed seconds as of `now`, or `None` when idle.
    ///
    /// Derived from the last authoritative `started_at`; the store-computed
    /// duration at stop time always supersedes this estimate.
    #[must_use]
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> Option<i64> {
        self.active.as_ref().map(|entry| entry.tracked_seconds(now))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::entry::EntrySource;
    use crate::types::{EntryId, IssueId, IssueRef, ProjectId, UserId, WorkspaceId};

    fn timestamp(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, hour, min, 0)
            .single()
            .expect("valid timestamp")
    }

    fn running(issue: &str, started: DateTime<Utc>) -> TimeEntry {
        let user = UserId::new("ana").expect("user ID");
        TimeEntry {
            id: EntryId::generate(),
            scope: IssueRef::new(
                WorkspaceId::new("acme").expect("workspace ID"),
                ProjectId::new("p1").expect("project ID"),
                IssueId::new(issue).expect("issue ID"),
            ),
            user: user.clone(),
            source: EntrySource::Timer,
            started_at: Some(started),
            ended_at: None,
            duration_seconds: 0,
            note: None,
            is_billable: false,
            created_at: started,
            updated_at: started,
            created_by: user.clone(),
            updated_by: user,
        }
    }

    #[test]
    fn starts_idle() {
        let timer = LocalTimer::new();
        assert!(!timer.is_running());
        assert_eq!(timer.elapsed_seconds(timestamp(9, 0)), None);
    }

    #[test]
    fn elapsed_extrapolates_from_server_start() {
        let mut timer = LocalTimer::new();
        timer.resync(Some(running("i1", timestamp(9, 0))));

        assert!(timer.is_running());
        assert_eq!(timer.elapsed_seconds(timestamp(9, 0)), Some(0));
        assert_eq!(timer.elapsed_seconds(timestamp(9, 5)), Some(300));
        // Ticks between polls only move the clock argument forward.
        assert_eq!(timer.elapsed_seconds(timestamp(9, 6)), Some(360));
    }

    #[test]
    fn resync_replaces_rather_than_accumulates() {
        let mut timer = LocalTimer::new();
        timer.resync(Some(running("i1", timestamp(9, 0))));
        assert_eq!(timer.elapsed_seconds(timestamp(9, 30)), Some(1800));

        // The server moved to a different timer with a later start; the old
        // half hour must not leak into the new estimate.
        timer.resync(Some(running("i2", timestamp(9, 20))));
        assert_eq!(timer.elapsed_seconds(timestamp(9, 30)), Some(600));
        assert_eq!(
            timer.active().map(|e| e.scope.issue.as_str()),
            Some("i2")
        );
    }

    #[test]
    fn resync_to_none_clears_state() {
        let mut timer = LocalTimer::new();
        timer.resync(Some(running("i1", timestamp(9, 0))));
        timer.resync(None);

        assert!(!timer.is_running());
        assert_eq!(timer.elapsed_seconds(timestamp(10, 0)), None);
    }
}
