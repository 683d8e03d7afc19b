//! Focus tracker: projects, ordered goals and pomodoro sessions behind an
//! HTTP API, persisted in SQLite.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod ordering;
pub mod stats;

pub use error::{Result, TrackerError};
