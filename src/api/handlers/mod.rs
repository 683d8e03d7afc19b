use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, FixedOffset, Local, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::middleware::Caller;
use crate::db::Database;
use crate::error::TrackerError;
use crate::models::*;
use crate::stats::{PomodoroStats, StatsPeriod};

// ============================================================
// Error Handling
// ============================================================

impl IntoResponse for TrackerError {
    fn into_response(self) -> Response {
        match self {
            TrackerError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()).into_response(),
            TrackerError::Conflict(msg) => (StatusCode::CONFLICT, msg).into_response(),
            TrackerError::Validation(errors) => {
                tracing::warn!("Validation error: {}", errors);
                (StatusCode::BAD_REQUEST, Json(errors)).into_response()
            }
            TrackerError::Unauthorized(msg) => {
                tracing::warn!("Rejected caller: {}", msg);
                (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()).into_response()
            }
            TrackerError::Transaction(_) | TrackerError::Storage(_) | TrackerError::Internal(_) => {
                internal_error(self).into_response()
            }
        }
    }
}

/// Log a server-side error and return a sanitized response to the client.
/// The full error is logged for debugging; clients only see a generic message.
fn internal_error(e: impl std::fmt::Display) -> (StatusCode, String) {
    tracing::error!("Internal error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

/// Runs field validation on a request body.
fn validated<T: Validate>(input: T) -> Result<T, TrackerError> {
    input.validate()?;
    Ok(input)
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Projects
// ============================================================

pub async fn list_projects(
    State(db): State<Database>,
    Caller(owner_id): Caller,
    Query(query): Query<ProjectListQuery>,
) -> Result<Json<ProjectPage>, TrackerError> {
    db.list_projects(owner_id, &query).map(Json)
}

pub async fn create_project(
    State(db): State<Database>,
    Caller(owner_id): Caller,
    Json(input): Json<CreateProjectInput>,
) -> Result<(StatusCode, Json<Project>), TrackerError> {
    db.create_project(owner_id, validated(input.trimmed())?)
        .map(|p| (StatusCode::CREATED, Json(p)))
}

pub async fn get_project(
    State(db): State<Database>,
    Caller(owner_id): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<ProjectWithGoals>, TrackerError> {
    db.get_project(owner_id, id).map(Json)
}

pub async fn update_project(
    State(db): State<Database>,
    Caller(owner_id): Caller,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateProjectInput>,
) -> Result<Json<Project>, TrackerError> {
    db.update_project(owner_id, id, validated(input.trimmed())?).map(Json)
}

pub async fn delete_project(
    State(db): State<Database>,
    Caller(owner_id): Caller,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, TrackerError> {
    db.delete_project(owner_id, id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================
// Goals
// ============================================================

pub async fn list_goals(
    State(db): State<Database>,
    Caller(owner_id): Caller,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<Goal>>, TrackerError> {
    db.list_goals(owner_id, project_id).map(Json)
}

pub async fn create_goal(
    State(db): State<Database>,
    Caller(owner_id): Caller,
    Path(project_id): Path<Uuid>,
    Json(input): Json<CreateGoalInput>,
) -> Result<(StatusCode, Json<Goal>), TrackerError> {
    db.create_goal(owner_id, project_id, validated(input.trimmed())?)
        .map(|g| (StatusCode::CREATED, Json(g)))
}

pub async fn reorder_goals(
    State(db): State<Database>,
    Caller(owner_id): Caller,
    Path(project_id): Path<Uuid>,
    Json(input): Json<ReorderGoalsInput>,
) -> Result<StatusCode, TrackerError> {
    let input = validated(input)?;
    db.reorder_goals(owner_id, project_id, &input.items)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn clear_completed_goals(
    State(db): State<Database>,
    Caller(owner_id): Caller,
    Path(project_id): Path<Uuid>,
) -> Result<Json<ClearedGoals>, TrackerError> {
    db.clear_completed_goals(owner_id, project_id).map(Json)
}

pub async fn update_goal(
    State(db): State<Database>,
    Caller(owner_id): Caller,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateGoalInput>,
) -> Result<Json<Goal>, TrackerError> {
    db.update_goal(owner_id, id, validated(input.trimmed())?).map(Json)
}

pub async fn delete_goal(
    State(db): State<Database>,
    Caller(owner_id): Caller,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, TrackerError> {
    db.delete_goal(owner_id, id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================
// Pomodoro
// ============================================================

pub async fn start_pomodoro(
    State(db): State<Database>,
    Caller(owner_id): Caller,
    Json(input): Json<StartSessionInput>,
) -> Result<(StatusCode, Json<PomodoroSession>), TrackerError> {
    db.start_pomodoro(owner_id, validated(input)?)
        .map(|s| (StatusCode::CREATED, Json(s)))
}

pub async fn get_pomodoro(
    State(db): State<Database>,
    Caller(owner_id): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<PomodoroSession>, TrackerError> {
    db.get_pomodoro(owner_id, id).map(Json)
}

pub async fn complete_pomodoro(
    State(db): State<Database>,
    Caller(owner_id): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<PomodoroSession>, TrackerError> {
    db.complete_pomodoro(owner_id, id).map(Json)
}

/// Query parameters for pomodoro statistics.
#[derive(Debug, Deserialize, Validate)]
pub struct StatsQuery {
    /// `today`, `week`, `month` or `all`. Anything else means `today`.
    pub period: Option<String>,
    /// Caller's UTC offset in minutes east. Defaults to the server's zone.
    #[validate(range(min = -720, max = 840))]
    pub tz_offset_minutes: Option<i32>,
}

pub async fn pomodoro_stats(
    State(db): State<Database>,
    Caller(owner_id): Caller,
    Query(query): Query<StatsQuery>,
) -> Result<Json<PomodoroStats>, TrackerError> {
    let query = validated(query)?;
    let period = StatsPeriod::parse_or_today(query.period.as_deref());
    let now = caller_now(query.tz_offset_minutes)?;
    db.pomodoro_stats(owner_id, period, now).map(Json)
}

fn caller_now(tz_offset_minutes: Option<i32>) -> Result<DateTime<FixedOffset>, TrackerError> {
    match tz_offset_minutes {
        Some(minutes) => {
            let offset = FixedOffset::east_opt(minutes * 60).ok_or_else(|| {
                TrackerError::Internal(format!("unrepresentable offset {minutes}"))
            })?;
            Ok(Utc::now().with_timezone(&offset))
        }
        None => Ok(Local::now().fixed_offset()),
    }
}
