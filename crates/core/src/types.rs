/// Session identifiers are short, lowercase, alphanumeric strings
/// (6 characters by default). Inputs are lowercased at the boundary so
/// lookups are case-insensitive.
pub type SessionId = String;

/// Users are identified by a process-unique UUID v4, rendered as a string
/// on the wire.
pub type UserId = String;

/// Block identifiers are session-scoped, strictly increasing, and never
/// reused after deletion.
pub type BlockId = u64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
