/// Server-assigned identifiers (Mongo-style object ids) travel as strings.
pub type EntityId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
