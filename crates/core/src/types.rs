/// Backend record identifiers are opaque UUID strings.
pub type RecordId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Free-form per-role profile attributes (medical history, qualifications, ...).
pub type ProfileData = serde_json::Map<String, serde_json::Value>;
