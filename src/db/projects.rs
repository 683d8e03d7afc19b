use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, ToSql};
use uuid::Uuid;

use super::goals::goals_for_project;
use super::{
    count_column, datetime_column, format_datetime, format_opt_datetime, in_transaction, now,
    opt_datetime_column, uuid_column, Database,
};
use crate::error::{Result, TrackerError};
use crate::models::*;

/// Project columns, in the order [`project_from_row`] reads them.
const PROJECT_COLUMNS: &str = "p.id, p.owner_id, p.title, p.description, p.color, p.status, \
     p.is_archived, p.completed_at, p.created_at, p.updated_at";

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    let status: String = row.get(5)?;
    let status = ProjectStatus::from_str(&status).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            Type::Text,
            format!("unknown project status {status:?}").into(),
        )
    })?;
    Ok(Project {
        id: uuid_column(row, 0)?,
        owner_id: uuid_column(row, 1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        color: row.get(4)?,
        status,
        is_archived: row.get(6)?,
        completed_at: opt_datetime_column(row, 7)?,
        created_at: datetime_column(row, 8)?,
        updated_at: datetime_column(row, 9)?,
    })
}

/// Looks up a project by id and owner. Wrong owner and missing row both give `None`.
pub(super) fn find_owned_project(
    conn: &Connection,
    owner_id: Uuid,
    id: Uuid,
) -> Result<Option<Project>> {
    let project = conn
        .query_row(
            &format!("SELECT {PROJECT_COLUMNS} FROM projects p WHERE p.id = ? AND p.owner_id = ?"),
            (id.to_string(), owner_id.to_string()),
            project_from_row,
        )
        .optional()?;
    Ok(project)
}

pub(super) fn require_owned_project(conn: &Connection, owner_id: Uuid, id: Uuid) -> Result<Project> {
    find_owned_project(conn, owner_id, id)?.ok_or(TrackerError::NotFound("Project"))
}

/// Escapes `LIKE` wildcards so the search term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl Database {
    // ============================================================
    // Project lifecycle
    // ============================================================

    pub fn create_project(&self, owner_id: Uuid, input: CreateProjectInput) -> Result<Project> {
        let conn = self.conn()?;
        let id = Uuid::new_v4();
        let now = now();

        conn.execute(
            "INSERT INTO projects (id, owner_id, title, description, color, status, is_archived, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?)",
            (
                id.to_string(),
                owner_id.to_string(),
                &input.title,
                &input.description,
                &input.color,
                ProjectStatus::Active.as_str(),
                format_datetime(now),
                format_datetime(now),
            ),
        )?;

        tracing::debug!("Created project {} for {}", id, owner_id);

        Ok(Project {
            id,
            owner_id,
            title: input.title,
            description: input.description,
            color: input.color,
            status: ProjectStatus::Active,
            is_archived: false,
            completed_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Returns the project with its goals in display order.
    pub fn get_project(&self, owner_id: Uuid, id: Uuid) -> Result<ProjectWithGoals> {
        let conn = self.conn()?;
        let project = require_owned_project(&conn, owner_id, id)?;
        let goals = goals_for_project(&conn, id)?;

        let goals_completed = goals.iter().filter(|g| g.is_completed).count();
        Ok(ProjectWithGoals {
            project,
            goals_total: goals.len() as u64,
            goals_completed: goals_completed as u64,
            goals,
        })
    }

    /// Applies a partial update. Status changes drive `completed_at`; see
    /// [`Project::completed_at_after`].
    pub fn update_project(
        &self,
        owner_id: Uuid,
        id: Uuid,
        input: UpdateProjectInput,
    ) -> Result<Project> {
        let conn = self.conn()?;
        let existing = require_owned_project(&conn, owner_id, id)?;

        let now = now();
        let completed_at = existing.completed_at_after(input.status, now);
        let status = input.status.unwrap_or(existing.status);
        if status != existing.status {
            tracing::debug!(
                "Project {} status {} -> {}",
                id,
                existing.status.as_str(),
                status.as_str()
            );
        }

        let title = input.title.unwrap_or(existing.title);
        let description = input.description.or(existing.description);
        let color = input.color.or(existing.color);
        let is_archived = input.is_archived.unwrap_or(existing.is_archived);

        conn.execute(
            "UPDATE projects
             SET title = ?, description = ?, color = ?, status = ?, is_archived = ?, completed_at = ?, updated_at = ?
             WHERE id = ?",
            (
                &title,
                &description,
                &color,
                status.as_str(),
                is_archived,
                format_opt_datetime(completed_at),
                format_datetime(now),
                id.to_string(),
            ),
        )?;

        Ok(Project {
            id,
            owner_id,
            title,
            description,
            color,
            status,
            is_archived,
            completed_at,
            created_at: existing.created_at,
            updated_at: now,
        })
    }

    /// Deletes the project and its goals in one transaction. Sessions that
    /// referenced it survive with no project.
    pub fn delete_project(&self, owner_id: Uuid, id: Uuid) -> Result<()> {
        let mut conn = self.conn()?;
        require_owned_project(&conn, owner_id, id)?;

        let removed_goals = in_transaction(&mut conn, "delete_project", |tx| {
            let key = id.to_string();
            let goals = tx.execute("DELETE FROM goals WHERE project_id = ?", [&key])?;
            tx.execute(
                "UPDATE pomodoro_sessions SET project_id = NULL WHERE project_id = ?",
                [&key],
            )?;
            tx.execute("DELETE FROM projects WHERE id = ?", [&key])?;
            Ok(goals)
        })?;

        tracing::debug!("Deleted project {} and {} goals", id, removed_goals);
        Ok(())
    }

    // ============================================================
    // Project query
    // ============================================================

    /// Lists the caller's projects, newest first, with goal counts.
    pub fn list_projects(&self, owner_id: Uuid, query: &ProjectListQuery) -> Result<ProjectPage> {
        let filter = query.normalize();
        let conn = self.conn()?;

        let mut clauses = vec!["p.owner_id = ?", "p.is_archived = ?"];
        let mut params: Vec<Box<dyn ToSql>> =
            vec![Box::new(owner_id.to_string()), Box::new(filter.archived)];

        if let Some(status) = filter.status {
            clauses.push("p.status = ?");
            params.push(Box::new(status.as_str()));
        }
        if let Some(search) = &filter.search {
            clauses.push("unicode_lower(p.title) LIKE ? ESCAPE '\\'");
            params.push(Box::new(format!("%{}%", escape_like(&search.to_lowercase()))));
        }
        let where_sql = clauses.join(" AND ");

        let limit = i64::from(filter.limit);
        let offset = i64::try_from(filter.offset())
            .map_err(|e| TrackerError::Internal(format!("page offset out of range: {e}")))?;

        let mut params_ref: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let total = conn.query_row(
            &format!("SELECT COUNT(*) FROM projects p WHERE {where_sql}"),
            params_ref.as_slice(),
            |row| count_column(row, 0),
        )?;

        params_ref.push(&limit);
        params_ref.push(&offset);

        let mut stmt = conn.prepare(&format!(
            "SELECT {PROJECT_COLUMNS}, COUNT(g.id), COALESCE(SUM(g.is_completed), 0)
             FROM projects p
             LEFT JOIN goals g ON g.project_id = p.id
             WHERE {where_sql}
             GROUP BY p.id
             ORDER BY p.created_at DESC, p.id
             LIMIT ? OFFSET ?"
        ))?;

        let projects = stmt
            .query_map(params_ref.as_slice(), |row| {
                Ok(ProjectWithCounts {
                    project: project_from_row(row)?,
                    goals_total: count_column(row, 10)?,
                    goals_completed: count_column(row, 11)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(ProjectPage {
            projects,
            pagination: Pagination::new(&filter, total),
        })
    }
}
