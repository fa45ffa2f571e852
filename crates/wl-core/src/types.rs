//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Validation errors for core types and entry input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// A manual duration must be a positive number of seconds.
    #[error("duration must be a positive number of seconds, got {got}")]
    NonPositiveDuration { got: i64 },

    /// `started_at` must not come after `ended_at`.
    #[error("started_at cannot be after ended_at")]
    StartAfterEnd,

    /// The field cannot be changed on a timer-sourced entry.
    #[error("{field} is immutable on timer-sourced entries")]
    ImmutableField { field: &'static str },

    /// Invalid entry source value.
    #[error("invalid entry source: {value}")]
    InvalidSource { value: String },

    /// Invalid role value.
    #[error("invalid role: {value}")]
    InvalidRole { value: String },

    /// Invalid report grouping dimension.
    #[error("invalid group-by dimension: {value} (expected user, issue, project, or module)")]
    InvalidGroupBy { value: String },
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(
    /// A validated workspace identifier.
    WorkspaceId, "workspace ID"
);

define_id!(
    /// A validated project identifier.
    ProjectId, "project ID"
);

define_id!(
    /// A validated issue (work item) identifier.
    IssueId, "issue ID"
);

define_id!(
    /// A validated module identifier. Modules group issues; the link is
    /// maintained by an external collaborator and consumed read-only here.
    ModuleId, "module ID"
);

define_id!(
    /// A validated user identifier.
    UserId, "user ID"
);

define_id!(
    /// A validated time-entry identifier.
    ///
    /// Entry IDs are UUIDs in practice, but any non-empty string is accepted
    /// when loading existing data.
    EntryId, "entry ID"
);

impl EntryId {
    /// Generates a fresh random entry ID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// The scope a time entry is recorded against: one issue within one project
/// within one workspace. Issue existence is a collaborator concern; the
/// engine treats the triple as opaque identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRef {
    pub workspace: WorkspaceId,
    pub project: ProjectId,
    pub issue: IssueId,
}

impl IssueRef {
    pub fn new(workspace: WorkspaceId, project: ProjectId, issue: IssueId) -> Self {
        Self {
            workspace,
            project,
            issue,
        }
    }
}

/// Workspace role, supplied by the external authorization collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
    Guest,
}

impl Role {
    /// String representation for config and display.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
            Self::Guest => "guest",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            "guest" => Ok(Self::Guest),
            _ => Err(ValidationError::InvalidRole {
                value: s.to_string(),
            }),
        }
    }
}

/// The identity performing a mutating operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user: UserId,
    pub role: Role,
}

impl Actor {
    pub fn new(user: UserId, role: Role) -> Self {
        Self { user, role }
    }

    /// Whether this actor may update or delete an entry owned by `owner`.
    ///
    /// The owner always may; admins may act on anyone's entries.
    #[must_use]
    pub fn can_modify(&self, owner: &UserId) -> bool {
        self.role == Role::Admin || self.user == *owner
    }
}
