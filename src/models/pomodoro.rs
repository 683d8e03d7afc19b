use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Session length used when a start request does not name one.
pub const DEFAULT_SESSION_MINUTES: u32 = 25;

/// A focused-work interval.
///
/// `end_time` and `completed` are set together, exactly once, when the
/// session is completed. Only completed sessions count towards statistics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PomodoroSession {
    pub id: Uuid,
    pub owner_id: Uuid,
    /// Cleared when the referenced project is deleted.
    pub project_id: Option<Uuid>,
    /// Planned length in minutes.
    pub duration: u32,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub completed: bool,
}

/// Input for starting a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct StartSessionInput {
    pub project_id: Option<Uuid>,
    /// Minutes, defaults to [`DEFAULT_SESSION_MINUTES`].
    #[validate(range(min = 1, max = 120))]
    pub duration: Option<u32>,
}
