/// All generated primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Revision numbers are allocated from the `revinfo` SERIAL column.
pub type RevisionNumber = i32;
