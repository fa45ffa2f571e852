//! Time entries and their validation rules.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{EntryId, IssueRef, UserId, ValidationError};

/// How a time entry came into being.
///
/// Timer entries are created by `start`/`stop` and own their timestamps;
/// manual entries are typed in after the fact and own their duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySource {
    Timer,
    Manual,
}

impl EntrySource {
    /// String representation for storage and display.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Timer => "timer",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for EntrySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EntrySource {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "timer" => Ok(Self::Timer),
            "manual" => Ok(Self::Manual),
            _ => Err(ValidationError::InvalidSource {
                value: s.to_string(),
            }),
        }
    }
}

/// A single unit of tracked work against an issue.
///
/// An entry with `source == Timer` and no `ended_at` is a running timer; its
/// `duration_seconds` stays zero until the timer stops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: EntryId,
    #[serde(flatten)]
    pub scope: IssueRef,
    pub user: UserId,
    pub source: EntrySource,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_seconds: i64,
    pub note: Option<String>,
    pub is_billable: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: UserId,
    pub updated_by: UserId,
}

impl TimeEntry {
    /// Whether this entry is a running timer.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.source == EntrySource::Timer && self.ended_at.is_none()
    }

    /// Seconds this entry contributes to totals as of `now`.
    ///
    /// Closed entries contribute their stored duration; a running timer
    /// contributes the elapsed wall-clock time since it started.
    #[must_use]
    pub fn tracked_seconds(&self, now: DateTime<Utc>) -> i64 {
        if self.is_active() {
            self.started_at
                .map_or(0, |started| (now - started).num_seconds().max(0))
        } else {
            self.duration_seconds
        }
    }
}

/// Duration of a closed interval, clamped at zero.
///
/// Clock skew between the machine that started a timer and the one that
/// stopped it can produce a negative delta; a negative duration is never
/// stored.
#[must_use]
pub fn closed_duration_seconds(started: DateTime<Utc>, ended: DateTime<Utc>) -> i64 {
    (ended - started).num_seconds().max(0)
}

/// Input for a manually recorded entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualEntryInput {
    pub scope: IssueRef,
    pub user: UserId,
    pub duration_seconds: i64,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub note: Option<String>,
    pub is_billable: bool,
}

impl ManualEntryInput {
    /// Validates the input before it is persisted.
    ///
    /// Manual entries require a positive duration. The timestamps are
    /// optional context; when both are given they must be ordered.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.duration_seconds <= 0 {
            return Err(ValidationError::NonPositiveDuration {
                got: self.duration_seconds,
            });
        }
        if let (Some(started), Some(ended)) = (self.started_at, self.ended_at) {
            if started > ended {
                return Err(ValidationError::StartAfterEnd);
            }
        }
        Ok(())
    }
}

/// A partial update to an existing entry. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPatch {
    pub duration_seconds: Option<i64>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub note: Option<String>,
    pub is_billable: Option<bool>,
}

impl EntryPatch {
    /// Whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.duration_seconds.is_none()
            && self.started_at.is_none()
            && self.ended_at.is_none()
            && self.note.is_none()
            && self.is_billable.is_none()
    }

    fn touches_timer_fields(&self) -> bool {
        self.duration_seconds.is_some() || self.started_at.is_some() || self.ended_at.is_some()
    }

    /// Validates this patch against the entry it would modify.
    ///
    /// Timer-sourced entries derive duration and timestamps from the timer
    /// itself, so only `note` and `is_billable` may change on them. The
    /// timestamps are checked as they would be after the patch applies.
    pub fn validate(&self, entry: &TimeEntry) -> Result<(), ValidationError> {
        if entry.source == EntrySource::Timer && self.touches_timer_fields() {
            let field = if self.duration_seconds.is_some() {
                "duration_seconds"
            } else if self.started_at.is_some() {
                "started_at"
            } else {
                "ended_at"
            };
            return Err(ValidationError::ImmutableField { field });
        }
        if let Some(duration) = self.duration_seconds {
            if duration <= 0 {
                return Err(ValidationError::NonPositiveDuration { got: duration });
            }
        }
        let started = self.started_at.or(entry.started_at);
        let ended = self.ended_at.or(entry.ended_at);
        if let (Some(started), Some(ended)) = (started, ended) {
            if started > ended {
                return Err(ValidationError::StartAfterEnd);
            }
        }
        Ok(())
    }

    /// Applies the patch to `entry`, bumping `updated_at` to `now`.
    ///
    /// Call [`EntryPatch::validate`] first; this does no checking of its own.
    pub fn apply(&self, entry: &mut TimeEntry, now: DateTime<Utc>) {
        if let Some(duration) = self.duration_seconds {
            entry.duration_seconds = duration;
        }
        if let Some(started) = self.started_at {
            entry.started_at = Some(started);
        }
        if let Some(ended) = self.ended_at {
            entry.ended_at = Some(ended);
        }
        if let Some(note) = &self.note {
            entry.note = Some(note.clone());
        }
        if let Some(billable) = self.is_billable {
            entry.is_billable = billable;
        }
        entry.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::types::{IssueId, ProjectId, WorkspaceId};

    fn scope() -> IssueRef {
        IssueRef::new(
            WorkspaceId::new("acme").expect("workspace ID"),
            ProjectId::new("proj-1").expect("project ID"),
            IssueId::new("issue-1").expect("issue ID"),
        )
    }

    fn timestamp(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, hour, min, 0)
            .single()
            .expect("valid timestamp")
    }

    fn timer_entry(started: DateTime<Utc>, ended: Option<DateTime<Utc>>) -> TimeEntry {
        let duration = ended.map_or(0, |e| closed_duration_seconds(started, e));
        let user = UserId::new("u-1").expect("user ID");
        TimeEntry {
            id: EntryId::generate(),
            scope: scope(),
            user: user.clone(),
            source: EntrySource::Timer,
            started_at: Some(started),
            ended_at: ended,
            duration_seconds: duration,
            note: None,
            is_billable: false,
            created_at: started,
            updated_at: ended.unwrap_or(started),
            created_by: user.clone(),
            updated_by: user,
        }
    }

    fn manual_entry(duration: i64) -> TimeEntry {
        let created = timestamp(12, 0);
        let user = UserId::new("u-1").expect("user ID");
        TimeEntry {
            id: EntryId::generate(),
            scope: scope(),
            user: user.clone(),
            source: EntrySource::Manual,
            started_at: None,
            ended_at: None,
            duration_seconds: duration,
            note: None,
            is_billable: false,
            created_at: created,
            updated_at: created,
            created_by: user.clone(),
            updated_by: user,
        }
    }

    #[test]
    fn source_parses_and_displays() {
        assert_eq!("timer".parse::<EntrySource>().unwrap(), EntrySource::Timer);
        assert_eq!(
            "manual".parse::<EntrySource>().unwrap(),
            EntrySource::Manual
        );
        assert!("imported".parse::<EntrySource>().is_err());
        assert_eq!(EntrySource::Timer.to_string(), "timer");
    }

    #[test]
    fn running_timer_is_active() {
        let running = timer_entry(timestamp(9, 0), None);
        let stopped = timer_entry(timestamp(9, 0), Some(timestamp(10, 0)));
        assert!(running.is_active());
        assert!(!stopped.is_active());
        assert!(!manual_entry(600).is_active());
    }

    #[test]
    fn tracked_seconds_uses_live_elapsed_for_running_timer() {
        let running = timer_entry(timestamp(9, 0), None);
        assert_eq!(running.tracked_seconds(timestamp(9, 30)), 1800);
    }

    #[test]
    fn tracked_seconds_uses_stored_duration_when_closed() {
        let stopped = timer_entry(timestamp(9, 0), Some(timestamp(10, 0)));
        // The clock argument is irrelevant once the entry is closed.
        assert_eq!(stopped.tracked_seconds(timestamp(23, 0)), 3600);
        assert_eq!(manual_entry(600).tracked_seconds(timestamp(23, 0)), 600);
    }

    #[test]
    fn tracked_seconds_clamps_clock_skew_to_zero() {
        let running = timer_entry(timestamp(10, 0), None);
        assert_eq!(running.tracked_seconds(timestamp(9, 0)), 0);
    }

    #[test]
    fn closed_duration_never_negative() {
        assert_eq!(
            closed_duration_seconds(timestamp(9, 0), timestamp(9, 1)),
            60
        );
        assert_eq!(
            closed_duration_seconds(timestamp(9, 1), timestamp(9, 0)),
            0
        );
    }

    #[test]
    fn manual_input_requires_positive_duration() {
        let mut input = ManualEntryInput {
            scope: scope(),
            user: UserId::new("u-1").expect("user ID"),
            duration_seconds: 600,
            started_at: None,
            ended_at: None,
            note: None,
            is_billable: false,
        };
        assert!(input.validate().is_ok());

        input.duration_seconds = 0;
        assert_eq!(
            input.validate(),
            Err(ValidationError::NonPositiveDuration { got: 0 })
        );

        input.duration_seconds = -30;
        assert!(input.validate().is_err());
    }

    #[test]
    fn manual_input_rejects_inverted_interval() {
        let input = ManualEntryInput {
            scope: scope(),
            user: UserId::new("u-1").expect("user ID"),
            duration_seconds: 600,
            started_at: Some(timestamp(10, 0)),
            ended_at: Some(timestamp(9, 0)),
            note: None,
            is_billable: false,
        };
        assert_eq!(input.validate(), Err(ValidationError::StartAfterEnd));
    }

    #[test]
    fn patch_rejects_timer_field_changes_on_timer_entries() {
        let entry = timer_entry(timestamp(9, 0), Some(timestamp(10, 0)));
        let patch = EntryPatch {
            duration_seconds: Some(1200),
            ..EntryPatch::default()
        };
        assert_eq!(
            patch.validate(&entry),
            Err(ValidationError::ImmutableField {
                field: "duration_seconds"
            })
        );

        let patch = EntryPatch {
            started_at: Some(timestamp(8, 0)),
            ..EntryPatch::default()
        };
        assert!(matches!(
            patch.validate(&entry),
            Err(ValidationError::ImmutableField { .. })
        ));
    }

    #[test]
    fn patch_allows_note_and_billable_on_timer_entries() {
        let entry = timer_entry(timestamp(9, 0), Some(timestamp(10, 0)));
        let patch = EntryPatch {
            note: Some("pairing session".to_string()),
            is_billable: Some(true),
            ..EntryPatch::default()
        };
        assert!(patch.validate(&entry).is_ok());
    }

    #[test]
    fn patch_validates_merged_interval() {
        let mut entry = manual_entry(600);
        entry.started_at = Some(timestamp(9, 0));
        entry.ended_at = Some(timestamp(10, 0));

        // Moving only the start past the existing end is caught.
        let patch = EntryPatch {
            started_at: Some(timestamp(11, 0)),
            ..EntryPatch::default()
        };
        assert_eq!(patch.validate(&entry), Err(ValidationError::StartAfterEnd));

        // Moving both together is fine.
        let patch = EntryPatch {
            started_at: Some(timestamp(11, 0)),
            ended_at: Some(timestamp(12, 0)),
            ..EntryPatch::default()
        };
        assert!(patch.validate(&entry).is_ok());
    }

    #[test]
    fn patch_rejects_non_positive_duration() {
        let entry = manual_entry(600);
        let patch = EntryPatch {
            duration_seconds: Some(0),
            ..EntryPatch::default()
        };
        assert_eq!(
            patch.validate(&entry),
            Err(ValidationError::NonPositiveDuration { got: 0 })
        );
    }

    #[test]
    fn patch_apply_updates_fields_and_timestamp() {
        let mut entry = manual_entry(600);
        let patch = EntryPatch {
            duration_seconds: Some(900),
            note: Some("standup overflow".to_string()),
            is_billable: Some(true),
            ..EntryPatch::default()
        };
        let now = timestamp(18, 0);
        patch.apply(&mut entry, now);

        assert_eq!(entry.duration_seconds, 900);
        assert_eq!(entry.note.as_deref(), Some("standup overflow"));
        assert!(entry.is_billable);
        assert_eq!(entry.updated_at, now);
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(EntryPatch::default().is_empty());
        let patch = EntryPatch {
            is_billable: Some(false),
            ..EntryPatch::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn entry_serializes_with_flat_scope() {
        let entry = timer_entry(timestamp(9, 0), None);
        let json = serde_json::to_value(&entry).expect("serialize entry");
        assert_eq!(json["workspace"], "acme");
        assert_eq!(json["project"], "proj-1");
        assert_eq!(json["issue"], "issue-1");
        assert_eq!(json["source"], "timer");
    }
}
