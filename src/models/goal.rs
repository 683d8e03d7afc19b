use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::validation::{trim_opt_text, trim_text, validate_not_blank};

/// A unit of progress inside a project.
///
/// `order` is only meaningful among the project's non-completed goals (the
/// order domain). Completing a goal leaves its `order` untouched; it simply
/// stops taking part in the ranking until it is reopened.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Goal {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Goal {
    /// Resolves `completed_at` for a requested completion flag.
    ///
    /// false→true stamps `now`, true→false clears, and an unchanged or absent
    /// flag keeps the current value.
    pub fn completed_at_after(
        &self,
        requested: Option<bool>,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        match requested {
            Some(true) if !self.is_completed => Some(now),
            Some(false) if self.is_completed => None,
            _ => self.completed_at,
        }
    }
}

/// Input for creating a goal. The goal is appended to the end of the order domain.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateGoalInput {
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub title: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

/// Input for updating a goal. All fields are optional for partial updates.
impl CreateGoalInput {
    /// Trims the free-text fields.
    pub fn trimmed(self) -> Self {
        Self {
            title: trim_text(self.title),
            description: trim_opt_text(self.description),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateGoalInput {
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub title: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub is_completed: Option<bool>,
}

impl UpdateGoalInput {
    /// Trims the free-text fields.
    pub fn trimmed(self) -> Self {
        Self {
            title: trim_opt_text(self.title),
            description: trim_opt_text(self.description),
            ..self
        }
    }
}

/// A single `(goal, position)` assignment within a reorder batch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
pub struct GoalOrderItem {
    pub id: Uuid,
    #[validate(range(min = 0))]
    pub order: i64,
}

/// A reorder batch. Applied all-or-nothing.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReorderGoalsInput {
    #[validate(nested)]
    pub items: Vec<GoalOrderItem>,
}

/// Result of clearing a project's completed goals.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClearedGoals {
    pub count: usize,
}
