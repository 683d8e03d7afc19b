//! Domain models for the focus tracker.
//!
//! # Core Concepts
//!
//! - [`Project`]: Owned by a single user. Carries a permissive status state
//!   machine ([`ProjectStatus`]) and an archival flag that is independent of status.
//! - [`Goal`]: Belongs to exactly one project. Non-completed goals form the
//!   project's *order domain*; see [`crate::ordering`].
//! - [`PomodoroSession`]: A focused-work interval owned by a user, optionally
//!   attributed to a project. Completed exactly once.
//!
//! Owner ids are opaque to this crate; they are supplied by the authentication
//! layer and compared on every read and write.

mod goal;
mod pomodoro;
mod project;
mod validation;

pub use goal::*;
pub use pomodoro::*;
pub use project::*;
