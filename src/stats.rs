//! Pomodoro statistics: period windows and per-project roll-up.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bucket key for sessions that are not attributed to a project.
pub const NO_PROJECT_KEY: &str = "no-project";
/// Bucket label for sessions that are not attributed to a project.
pub const NO_PROJECT_TITLE: &str = "No Project";

/// The time window a stats request covers. Windows always end at "now".
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StatsPeriod {
    /// Since local midnight.
    #[default]
    Today,
    /// The trailing seven days.
    Week,
    /// Since the first day of the current local month.
    Month,
    /// Since the Unix epoch.
    All,
}

impl StatsPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Week => "week",
            Self::Month => "month",
            Self::All => "all",
        }
    }

    /// Parses a period name; anything unrecognized (or missing) means `Today`.
    pub fn parse_or_today(s: Option<&str>) -> Self {
        match s {
            Some("week") => Self::Week,
            Some("month") => Self::Month,
            Some("all") => Self::All,
            _ => Self::Today,
        }
    }

    /// Start of the window ending at `now`, where `now` carries the caller's
    /// UTC offset so calendar boundaries fall on the caller's local midnight.
    pub fn window_start(&self, now: DateTime<FixedOffset>) -> DateTime<Utc> {
        let today = now.date_naive();
        match self {
            Self::Today => local_midnight(now, today),
            Self::Week => (now - Duration::days(7)).with_timezone(&Utc),
            Self::Month => local_midnight(now, today.with_day(1).unwrap_or(today)),
            Self::All => DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

fn local_midnight(now: DateTime<FixedOffset>, day: NaiveDate) -> DateTime<Utc> {
    now.timezone()
        .from_local_datetime(&day.and_time(chrono::NaiveTime::MIN))
        .earliest()
        .map_or_else(|| now.with_timezone(&Utc), |t| t.with_timezone(&Utc))
}

/// A completed session as seen by the aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedSession {
    /// The attributed project's id and title, if any.
    pub project: Option<(Uuid, String)>,
    pub minutes: u32,
}

/// Session count and minutes for one project (or the no-project bucket).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectBucket {
    /// Project id, or [`NO_PROJECT_KEY`].
    pub project_id: String,
    pub project_title: String,
    pub count: u64,
    pub minutes: u64,
}

/// Roll-up of completed sessions over a period.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PomodoroStats {
    pub period: StatsPeriod,
    pub total_sessions: u64,
    pub total_minutes: u64,
    /// Buckets in order of first appearance in the input.
    pub by_project: Vec<ProjectBucket>,
}

/// Totals and per-project buckets for the given sessions.
pub fn aggregate<I>(period: StatsPeriod, sessions: I) -> PomodoroStats
where
    I: IntoIterator<Item = CompletedSession>,
{
    let mut stats = PomodoroStats {
        period,
        total_sessions: 0,
        total_minutes: 0,
        by_project: Vec::new(),
    };
    let mut index: HashMap<String, usize> = HashMap::new();

    for session in sessions {
        let minutes = u64::from(session.minutes);
        stats.total_sessions += 1;
        stats.total_minutes += minutes;

        let (key, title) = match session.project {
            Some((id, title)) => (id.to_string(), title),
            None => (NO_PROJECT_KEY.to_string(), NO_PROJECT_TITLE.to_string()),
        };

        match index.get(&key) {
            Some(&slot) => {
                let bucket = &mut stats.by_project[slot];
                bucket.count += 1;
                bucket.minutes += minutes;
            }
            None => {
                index.insert(key.clone(), stats.by_project.len());
                stats.by_project.push(ProjectBucket {
                    project_id: key,
                    project_title: title,
                    count: 1,
                    minutes,
                });
            }
        }
    }

    stats
}
