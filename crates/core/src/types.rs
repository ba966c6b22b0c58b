/// Style and user primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// Tasks are keyed by a random UUID generated at submission.
pub type TaskId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
