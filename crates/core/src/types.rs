/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Bandwidth figures are whole kilobytes per second.
pub type KiloBytesPerSec = i64;
