use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::goal::Goal;
use super::validation::{trim_opt_text, trim_text, validate_hex_color, validate_not_blank};

/// Page size used when a listing request does not name one.
pub const PROJECTS_PAGE_DEFAULT_LIMIT: u32 = 20;
/// Upper bound on the page size a listing request may ask for.
pub const PROJECTS_PAGE_MAX_LIMIT: u32 = 100;

/// A container for goals, owned by a single user.
///
/// `completed_at` is set if and only if `status` is [`ProjectStatus::Completed`].
/// Archival is orthogonal to status: an archived project keeps whatever status
/// it had and is only hidden from the default listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// Display color as `#RRGGBB`.
    pub color: Option<String>,
    pub status: ProjectStatus,
    pub is_archived: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Resolves `completed_at` for a requested status change.
    ///
    /// Entering `Completed` stamps `now`, leaving it clears the stamp, and
    /// anything else (including re-sending the current status) keeps the
    /// existing value. Every status is reachable from every other status.
    pub fn completed_at_after(
        &self,
        requested: Option<ProjectStatus>,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        match requested {
            Some(ProjectStatus::Completed) if self.status != ProjectStatus::Completed => Some(now),
            Some(status)
                if status != ProjectStatus::Completed
                    && self.status == ProjectStatus::Completed =>
            {
                None
            }
            _ => self.completed_at,
        }
    }
}

/// The lifecycle status of a project.
///
/// The state machine is permissive: there are no forbidden transitions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    #[default]
    Active,
    Completed,
    OnHold,
    Cancelled,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Completed => "COMPLETED",
            Self::OnHold => "ON_HOLD",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(Self::Active),
            "COMPLETED" => Some(Self::Completed),
            "ON_HOLD" => Some(Self::OnHold),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// Input for creating a new project. New projects start `Active` and unarchived.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateProjectInput {
    #[validate(length(min = 1, max = 100), custom(function = "validate_not_blank"))]
    pub title: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[validate(custom(function = "validate_hex_color"))]
    pub color: Option<String>,
}

/// Input for updating an existing project. All fields are optional for partial updates.
impl CreateProjectInput {
    /// Trims the free-text fields.
    pub fn trimmed(self) -> Self {
        Self {
            title: trim_text(self.title),
            description: trim_opt_text(self.description),
            ..self
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateProjectInput {
    #[validate(length(min = 1, max = 100), custom(function = "validate_not_blank"))]
    pub title: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[validate(custom(function = "validate_hex_color"))]
    pub color: Option<String>,
    pub status: Option<ProjectStatus>,
    pub is_archived: Option<bool>,
}

/// Raw listing parameters as they arrive from a query string.
///
/// `status` stays a string so that unknown values can be ignored instead of
/// rejected; see [`ProjectListQuery::normalize`].
impl UpdateProjectInput {
    /// Trims the free-text fields.
    pub fn trimmed(self) -> Self {
        Self {
            title: trim_opt_text(self.title),
            description: trim_opt_text(self.description),
            ..self
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectListQuery {
    pub archived: Option<bool>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<String>,
    pub search: Option<String>,
}

impl ProjectListQuery {
    /// Applies defaults and clamps paging values into range.
    pub fn normalize(&self) -> ProjectFilter {
        ProjectFilter {
            archived: self.archived.unwrap_or(false),
            page: self.page.unwrap_or(1).max(1),
            limit: self
                .limit
                .unwrap_or(PROJECTS_PAGE_DEFAULT_LIMIT)
                .clamp(1, PROJECTS_PAGE_MAX_LIMIT),
            status: self.status.as_deref().and_then(ProjectStatus::from_str),
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }
}

/// A fully resolved project listing filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFilter {
    pub archived: bool,
    pub page: u32,
    pub limit: u32,
    pub status: Option<ProjectStatus>,
    /// Trimmed, non-empty title search term.
    pub search: Option<String>,
}

impl ProjectFilter {
    /// Number of rows to skip for the requested page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

/// A project together with its goal counts, used in listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectWithCounts {
    #[serde(flatten)]
    pub project: Project,
    pub goals_total: u64,
    pub goals_completed: u64,
}

/// Paging metadata returned alongside a project listing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    /// Rows matching the filter before paging.
    pub total: u64,
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(filter: &ProjectFilter, total: u64) -> Self {
        Self {
            page: filter.page,
            limit: filter.limit,
            total,
            total_pages: total.div_ceil(u64::from(filter.limit)),
        }
    }
}

/// One page of projects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectPage {
    pub projects: Vec<ProjectWithCounts>,
    pub pagination: Pagination,
}

/// A project with its full goal list in display order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectWithGoals {
    #[serde(flatten)]
    pub project: Project,
    pub goals_total: u64,
    pub goals_completed: u64,
    pub goals: Vec<Goal>,
}
