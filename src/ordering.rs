//! Goal ordering rules.
//!
//! Each project has an *order domain*: its non-completed goals. Positions in
//! the domain are plain integers that only need to rank correctly, so they may
//! have gaps and, after a goal is reopened, duplicates. Ties are broken by
//! creation time. Appending never renumbers existing rows.
//!
//! Completed goals sit outside the domain and are shown most recently
//! completed first. Their stale `order` is kept so reopening is cheap.
//!
//! The storage side of the engine (atomic reorder batches, the max lookup
//! behind [`next_position`]) lives in [`crate::db`].

use std::cmp::Ordering;

use crate::models::Goal;

/// Position assigned to the first goal of an empty order domain.
pub const FIRST_POSITION: i64 = 0;

/// Position for a newly appended goal given the domain's current maximum.
pub fn next_position(current_max: Option<i64>) -> i64 {
    current_max.map_or(FIRST_POSITION, |max| max.saturating_add(1))
}

/// Whether a goal currently takes part in the ranking.
pub fn in_order_domain(goal: &Goal) -> bool {
    !goal.is_completed
}

/// Display comparison: open goals by `(order, created_at)`, then completed
/// goals newest completion first.
pub fn display_cmp(a: &Goal, b: &Goal) -> Ordering {
    match (in_order_domain(a), in_order_domain(b)) {
        (true, true) => a
            .order
            .cmp(&b.order)
            .then_with(|| a.created_at.cmp(&b.created_at)),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => b
            .completed_at
            .cmp(&a.completed_at)
            .then_with(|| a.created_at.cmp(&b.created_at)),
    }
}

/// Sorts goals into display order in place.
pub fn sort_for_display(goals: &mut [Goal]) {
    goals.sort_by(display_cmp);
}
