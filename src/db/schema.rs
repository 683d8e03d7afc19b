use std::collections::BTreeSet;

use anyhow::{Context, Result};
use rusqlite::Connection;

struct Migration {
    version: &'static str,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "001",
        name: "projects_and_goals",
        sql: include_str!("migrations/001_projects_and_goals.sql"),
    },
    Migration {
        version: "002",
        name: "pomodoro_sessions",
        sql: include_str!("migrations/002_pomodoro_sessions.sql"),
    },
];

/// Applies every embedded migration that is not yet recorded.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
    )
    .context("Failed to create schema_migrations table")?;

    let applied = applied_versions(conn)?;
    let pending = MIGRATIONS
        .iter()
        .filter(|m| !applied.contains(m.version));

    for migration in pending {
        apply_migration(conn, migration)?;
    }

    Ok(())
}

fn applied_versions(conn: &Connection) -> Result<BTreeSet<String>> {
    let mut stmt = conn.prepare("SELECT version FROM schema_migrations")?;
    let versions = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<BTreeSet<String>>>()?;
    Ok(versions)
}

/// Runs one migration and records it in the same transaction.
fn apply_migration(conn: &Connection, migration: &Migration) -> Result<()> {
    tracing::info!("Applying migration {}_{}", migration.version, migration.name);

    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(migration.sql)
        .with_context(|| format!("Migration {}_{} failed", migration.version, migration.name))?;
    tx.execute(
        "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?, ?, ?)",
        (
            migration.version,
            migration.name,
            chrono::Utc::now().to_rfc3339(),
        ),
    )?;
    tx.commit()?;

    Ok(())
}
