use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One persisted focus session. Immutable once finalized; only sessions
/// with at least the minimum focused time are ever created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Unix milliseconds at finalize. Doubles as a monotonic id.
    pub id: i64,
    /// Local calendar day the session was finalized.
    pub date: NaiveDate,
    /// Focused time in whole minutes, rounded up from elapsed seconds.
    pub duration: u32,
    pub category: String,
    /// Foreground-to-background transitions observed while running.
    pub distraction_count: u32,
    /// True when the countdown reached zero on its own.
    pub is_completed: bool,
}

/// Payload of the post-finalize summary notification shown to the user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub duration: u32,
    pub category: String,
    pub distraction_count: u32,
    pub is_completed: bool,
}

impl From<&Session> for SessionSummary {
    fn from(session: &Session) -> Self {
        Self {
            duration: session.duration,
            category: session.category.clone(),
            distraction_count: session.distraction_count,
            is_completed: session.is_completed,
        }
    }
}
