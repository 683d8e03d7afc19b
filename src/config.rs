//! Runtime configuration loaded from the environment.
//!
//! A `.env` file in the working directory is honoured for local development.

use std::path::PathBuf;

/// Shared key the upstream gateway must present as a bearer token.
pub const API_KEY_VAR: &str = "FOCUS_TRACKER_API_KEY";
/// Comma-separated list of allowed CORS origins.
pub const CORS_ORIGINS_VAR: &str = "FOCUS_TRACKER_CORS_ORIGINS";
/// Database file path, used when no `--db` flag is given.
pub const DATABASE_PATH_VAR: &str = "FOCUS_TRACKER_DB";

/// Security configuration for the HTTP layer.
#[derive(Clone, Debug, Default)]
pub struct SecurityConfig {
    /// Gateway key (from `FOCUS_TRACKER_API_KEY`). `None` disables the check.
    pub api_key: Option<String>,
    /// Allowed CORS origins (from `FOCUS_TRACKER_CORS_ORIGINS`). `None` is permissive.
    pub cors_origins: Option<Vec<String>>,
}

impl SecurityConfig {
    /// Load security configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var(API_KEY_VAR).ok().filter(|k| !k.is_empty()),
            cors_origins: std::env::var(CORS_ORIGINS_VAR)
                .ok()
                .map(|raw| parse_origins(&raw))
                .filter(|origins| !origins.is_empty()),
        }
    }

    /// No gateway key and permissive CORS (local development and tests).
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn with_api_key(key: impl Into<String>) -> Self {
        Self {
            api_key: Some(key.into()),
            cors_origins: None,
        }
    }

    pub fn with_cors_origins(origins: Vec<String>) -> Self {
        Self {
            api_key: None,
            cors_origins: Some(origins),
        }
    }
}

/// Everything the server needs at startup.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Explicit database path; `None` means the platform data directory.
    pub database_path: Option<PathBuf>,
    pub security: SecurityConfig,
}

impl AppConfig {
    /// Loads `.env` (if present) and reads the environment. A path given on
    /// the command line wins over `FOCUS_TRACKER_DB`.
    pub fn load(database_override: Option<PathBuf>) -> Self {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!("Ignoring unreadable .env file: {}", e);
            }
        }

        let database_path = database_override.or_else(|| {
            std::env::var_os(DATABASE_PATH_VAR)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from)
        });

        Self {
            database_path,
            security: SecurityConfig::from_env(),
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
