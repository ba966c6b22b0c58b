//! Task lifecycle state machine.
//!
//! Discriminants match the seed data in the `task_statuses` lookup table.
//!
//! ```text
//! PENDING ──► PROCESSING ──► COMPLETED
//!    │            │
//!    │            ├────────► FAILED
//!    │            └────────► CANCELED
//!    ├──────────────────────► CANCELED   (expired before work, client cancel)
//!    └──────────────────────► FAILED     (queue dispatch failed)
//! ```

use serde::{Deserialize, Serialize};

/// Status ID type matching SMALLINT in the database.
pub type StatusId = i16;

#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending = 1,
    Processing = 2,
    Completed = 3,
    Failed = 4,
    Canceled = 5,
}

/// Every status, in discriminant order.
pub const ALL_STATUSES: [TaskStatus; 5] = [
    TaskStatus::Pending,
    TaskStatus::Processing,
    TaskStatus::Completed,
    TaskStatus::Failed,
    TaskStatus::Canceled,
];

impl TaskStatus {
    /// Return the database status ID.
    pub fn id(self) -> StatusId {
        self as StatusId
    }

    /// Look up a status by its database ID.
    pub fn from_id(id: StatusId) -> Option<Self> {
        ALL_STATUSES.into_iter().find(|s| s.id() == id)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Processing => "PROCESSING",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Failed => "FAILED",
            TaskStatus::Canceled => "CANCELED",
        }
    }

    /// `COMPLETED`, `FAILED` and `CANCELED` admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Canceled
        )
    }

    /// Whether `self -> next` is an edge of the lifecycle graph.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Canceled)
                | (Pending, Failed)
                | (Processing, Completed)
                | (Processing, Failed)
                | (Processing, Canceled)
        )
    }

    /// Restrict `from` to the statuses that may legally move to `self`.
    ///
    /// Stores use the result as the `WHERE status_id = ANY(..)` guard of a
    /// conditional update, so a caller can never push a task backwards.
    pub fn legal_sources(self, from: &[TaskStatus]) -> Vec<TaskStatus> {
        from.iter()
            .copied()
            .filter(|s| s.can_transition_to(self))
            .collect()
    }
}

impl From<TaskStatus> for StatusId {
    fn from(value: TaskStatus) -> Self {
        value as StatusId
    }
}

/// A status ID with no matching [`TaskStatus`] variant.
#[derive(Debug, thiserror::Error)]
#[error("Unknown task status id: {0}")]
pub struct UnknownStatusId(pub StatusId);

impl TryFrom<StatusId> for TaskStatus {
    type Error = UnknownStatusId;

    fn try_from(id: StatusId) -> Result<Self, Self::Error> {
        TaskStatus::from_id(id).ok_or(UnknownStatusId(id))
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
