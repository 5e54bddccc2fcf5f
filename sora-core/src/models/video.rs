use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One simulated generation result as it is persisted in the gallery.
///
/// The persisted field names (`url`, `timestamp`) are the storage format;
/// `timestamp` is milliseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: String,
    pub prompt: String,
    #[serde(rename = "url")]
    pub payload: String,
    #[serde(rename = "timestamp", with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl VideoRecord {
    /// The id as a millisecond timestamp, when it is one.
    pub fn id_millis(&self) -> Option<i64> {
        self.id.parse().ok()
    }
}
