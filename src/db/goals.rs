use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::projects::require_owned_project;
use super::{
    datetime_column, format_datetime, format_opt_datetime, in_transaction, now,
    opt_datetime_column, uuid_column, Database,
};
use crate::error::{Result, TrackerError};
use crate::models::*;
use crate::ordering;

/// Goal columns, in the order [`goal_from_row`] reads them.
const GOAL_COLUMNS: &str = "g.id, g.project_id, g.title, g.description, g.is_completed, \
     g.completed_at, g.sort_order, g.created_at, g.updated_at";

fn goal_from_row(row: &Row<'_>) -> rusqlite::Result<Goal> {
    Ok(Goal {
        id: uuid_column(row, 0)?,
        project_id: uuid_column(row, 1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        is_completed: row.get(4)?,
        completed_at: opt_datetime_column(row, 5)?,
        order: row.get(6)?,
        created_at: datetime_column(row, 7)?,
        updated_at: datetime_column(row, 8)?,
    })
}

/// All goals of a project in display order. Ownership is the caller's concern.
pub(super) fn goals_for_project(conn: &Connection, project_id: Uuid) -> Result<Vec<Goal>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {GOAL_COLUMNS} FROM goals g WHERE g.project_id = ? ORDER BY g.sort_order, g.created_at"
    ))?;
    let mut goals = stmt
        .query_map([project_id.to_string()], goal_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    ordering::sort_for_display(&mut goals);
    Ok(goals)
}

/// Looks up a goal through its project's owner.
fn find_owned_goal(conn: &Connection, owner_id: Uuid, id: Uuid) -> Result<Option<Goal>> {
    let goal = conn
        .query_row(
            &format!(
                "SELECT {GOAL_COLUMNS} FROM goals g
                 JOIN projects p ON p.id = g.project_id
                 WHERE g.id = ? AND p.owner_id = ?"
            ),
            (id.to_string(), owner_id.to_string()),
            goal_from_row,
        )
        .optional()?;
    Ok(goal)
}

/// Highest position in the project's order domain, if it has any open goals.
fn max_open_position(conn: &Connection, project_id: Uuid) -> Result<Option<i64>> {
    let max = conn.query_row(
        "SELECT MAX(sort_order) FROM goals WHERE project_id = ? AND is_completed = 0",
        [project_id.to_string()],
        |row| row.get::<_, Option<i64>>(0),
    )?;
    Ok(max)
}

impl Database {
    // ============================================================
    // Goal lifecycle
    // ============================================================

    /// Lists a project's goals: open goals in rank order, then completed
    /// goals newest completion first.
    pub fn list_goals(&self, owner_id: Uuid, project_id: Uuid) -> Result<Vec<Goal>> {
        let conn = self.conn()?;
        require_owned_project(&conn, owner_id, project_id)?;
        goals_for_project(&conn, project_id)
    }

    /// Creates a goal at the end of the project's order domain.
    pub fn create_goal(
        &self,
        owner_id: Uuid,
        project_id: Uuid,
        input: CreateGoalInput,
    ) -> Result<Goal> {
        let conn = self.conn()?;
        require_owned_project(&conn, owner_id, project_id)?;

        let order = ordering::next_position(max_open_position(&conn, project_id)?);
        let id = Uuid::new_v4();
        let now = now();

        conn.execute(
            "INSERT INTO goals (id, project_id, title, description, is_completed, sort_order, created_at, updated_at)
             VALUES (?, ?, ?, ?, 0, ?, ?, ?)",
            (
                id.to_string(),
                project_id.to_string(),
                &input.title,
                &input.description,
                order,
                format_datetime(now),
                format_datetime(now),
            ),
        )?;

        Ok(Goal {
            id,
            project_id,
            title: input.title,
            description: input.description,
            is_completed: false,
            completed_at: None,
            order,
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies a partial update. The completion flag drives `completed_at`;
    /// see [`Goal::completed_at_after`]. `order` is never touched here, so a
    /// reopened goal re-enters the ranking at its old position.
    pub fn update_goal(&self, owner_id: Uuid, id: Uuid, input: UpdateGoalInput) -> Result<Goal> {
        let conn = self.conn()?;
        let existing = find_owned_goal(&conn, owner_id, id)?.ok_or(TrackerError::NotFound("Goal"))?;

        let now = now();
        let completed_at = existing.completed_at_after(input.is_completed, now);
        let is_completed = input.is_completed.unwrap_or(existing.is_completed);
        if is_completed != existing.is_completed {
            tracing::debug!("Goal {} completed: {}", id, is_completed);
        }

        let title = input.title.unwrap_or(existing.title);
        let description = input.description.or(existing.description);

        conn.execute(
            "UPDATE goals SET title = ?, description = ?, is_completed = ?, completed_at = ?, updated_at = ?
             WHERE id = ?",
            (
                &title,
                &description,
                is_completed,
                format_opt_datetime(completed_at),
                format_datetime(now),
                id.to_string(),
            ),
        )?;

        Ok(Goal {
            id,
            project_id: existing.project_id,
            title,
            description,
            is_completed,
            completed_at,
            order: existing.order,
            created_at: existing.created_at,
            updated_at: now,
        })
    }

    pub fn delete_goal(&self, owner_id: Uuid, id: Uuid) -> Result<()> {
        let conn = self.conn()?;
        find_owned_goal(&conn, owner_id, id)?.ok_or(TrackerError::NotFound("Goal"))?;
        conn.execute("DELETE FROM goals WHERE id = ?", [id.to_string()])?;
        Ok(())
    }

    /// Deletes every completed goal of the project and returns how many went.
    /// Open goals and their positions are untouched.
    pub fn clear_completed_goals(&self, owner_id: Uuid, project_id: Uuid) -> Result<ClearedGoals> {
        let mut conn = self.conn()?;
        require_owned_project(&conn, owner_id, project_id)?;

        let count = in_transaction(&mut conn, "clear_completed_goals", |tx| {
            let count = tx.execute(
                "DELETE FROM goals WHERE project_id = ? AND is_completed = 1",
                [project_id.to_string()],
            )?;
            Ok(count)
        })?;

        tracing::debug!("Cleared {} completed goals from project {}", count, project_id);
        Ok(ClearedGoals { count })
    }

    // ============================================================
    // Ordering
    // ============================================================

    /// Applies a batch of position assignments atomically.
    ///
    /// Only the project's ownership is checked up front. Clients are expected
    /// to send ids they read from this project, but the payload is not
    /// trusted: every item must name a goal of that project, and an item that
    /// does not (or any storage failure) aborts the batch and leaves every
    /// position as it was. Concurrent batches are not merged: the last one to
    /// commit wins.
    pub fn reorder_goals(
        &self,
        owner_id: Uuid,
        project_id: Uuid,
        items: &[GoalOrderItem],
    ) -> Result<()> {
        let mut conn = self.conn()?;
        require_owned_project(&conn, owner_id, project_id)?;

        let stamp = format_datetime(now());
        let project_key = project_id.to_string();
        in_transaction(&mut conn, "reorder_goals", |tx| {
            let mut stmt = tx.prepare(
                "UPDATE goals SET sort_order = ?, updated_at = ? WHERE id = ? AND project_id = ?",
            )?;
            for item in items {
                let rows = stmt.execute((item.order, &stamp, item.id.to_string(), &project_key))?;
                if rows == 0 {
                    return Err(TrackerError::Transaction(format!(
                        "goal {} is not part of project {}",
                        item.id, project_id
                    )));
                }
            }
            Ok(())
        })?;

        tracing::debug!("Reordered {} goals in project {}", items.len(), project_id);
        Ok(())
    }
}
