use chrono::{DateTime, FixedOffset, Utc};
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::projects::require_owned_project;
use super::{
    datetime_column, format_datetime, now, opt_datetime_column, opt_uuid_column, uuid_column,
    Database,
};
use crate::error::{Result, TrackerError};
use crate::models::*;
use crate::stats::{self, CompletedSession, PomodoroStats, StatsPeriod};

const SESSION_COLUMNS: &str =
    "s.id, s.owner_id, s.project_id, s.duration, s.start_time, s.end_time, s.completed";

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<PomodoroSession> {
    Ok(PomodoroSession {
        id: uuid_column(row, 0)?,
        owner_id: uuid_column(row, 1)?,
        project_id: opt_uuid_column(row, 2)?,
        duration: row.get(3)?,
        start_time: datetime_column(row, 4)?,
        end_time: opt_datetime_column(row, 5)?,
        completed: row.get(6)?,
    })
}

fn find_owned_session(
    conn: &Connection,
    owner_id: Uuid,
    id: Uuid,
) -> Result<Option<PomodoroSession>> {
    let session = conn
        .query_row(
            &format!(
                "SELECT {SESSION_COLUMNS} FROM pomodoro_sessions s WHERE s.id = ? AND s.owner_id = ?"
            ),
            (id.to_string(), owner_id.to_string()),
            session_from_row,
        )
        .optional()?;
    Ok(session)
}

impl Database {
    // ============================================================
    // Pomodoro sessions
    // ============================================================

    pub fn start_pomodoro(&self, owner_id: Uuid, input: StartSessionInput) -> Result<PomodoroSession> {
        self.start_pomodoro_at(owner_id, input, now())
    }

    /// Records a session that started at `start_time`, e.g. when a client
    /// syncs a timer that ran offline.
    pub fn start_pomodoro_at(
        &self,
        owner_id: Uuid,
        input: StartSessionInput,
        start_time: DateTime<Utc>,
    ) -> Result<PomodoroSession> {
        let conn = self.conn()?;
        if let Some(project_id) = input.project_id {
            require_owned_project(&conn, owner_id, project_id)?;
        }

        let id = Uuid::new_v4();
        let duration = input.duration.unwrap_or(DEFAULT_SESSION_MINUTES);

        conn.execute(
            "INSERT INTO pomodoro_sessions (id, owner_id, project_id, duration, start_time, completed)
             VALUES (?, ?, ?, ?, ?, 0)",
            (
                id.to_string(),
                owner_id.to_string(),
                input.project_id.map(|u| u.to_string()),
                duration,
                format_datetime(start_time),
            ),
        )?;

        Ok(PomodoroSession {
            id,
            owner_id,
            project_id: input.project_id,
            duration,
            start_time,
            end_time: None,
            completed: false,
        })
    }

    pub fn get_pomodoro(&self, owner_id: Uuid, id: Uuid) -> Result<PomodoroSession> {
        let conn = self.conn()?;
        find_owned_session(&conn, owner_id, id)?.ok_or(TrackerError::NotFound("Session"))
    }

    /// Marks the session completed. A session completes exactly once; a
    /// second attempt is a [`TrackerError::Conflict`].
    pub fn complete_pomodoro(&self, owner_id: Uuid, id: Uuid) -> Result<PomodoroSession> {
        let conn = self.conn()?;
        let session =
            find_owned_session(&conn, owner_id, id)?.ok_or(TrackerError::NotFound("Session"))?;
        if session.completed {
            return Err(TrackerError::Conflict("Session already completed".to_string()));
        }

        let end_time = now();
        let rows = conn.execute(
            "UPDATE pomodoro_sessions SET end_time = ?, completed = 1 WHERE id = ? AND completed = 0",
            (format_datetime(end_time), id.to_string()),
        )?;
        if rows == 0 {
            return Err(TrackerError::Conflict("Session already completed".to_string()));
        }

        tracing::debug!("Completed pomodoro {} ({} min)", id, session.duration);

        Ok(PomodoroSession {
            end_time: Some(end_time),
            completed: true,
            ..session
        })
    }

    // ============================================================
    // Statistics
    // ============================================================

    /// Rolls up the caller's completed sessions that started inside the
    /// period window ending at `now`.
    pub fn pomodoro_stats(
        &self,
        owner_id: Uuid,
        period: StatsPeriod,
        now: DateTime<FixedOffset>,
    ) -> Result<PomodoroStats> {
        let window_start = period.window_start(now);
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT s.duration, s.project_id, p.title
             FROM pomodoro_sessions s
             LEFT JOIN projects p ON p.id = s.project_id
             WHERE s.owner_id = ? AND s.completed = 1 AND s.start_time >= ?
             ORDER BY s.start_time, s.id",
        )?;

        let sessions = stmt
            .query_map((owner_id.to_string(), format_datetime(window_start)), |row| {
                let project = match (opt_uuid_column(row, 1)?, row.get::<_, Option<String>>(2)?) {
                    (Some(id), Some(title)) => Some((id, title)),
                    _ => None,
                };
                Ok(CompletedSession {
                    project,
                    minutes: row.get(0)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(stats::aggregate(period, sessions))
    }
}
