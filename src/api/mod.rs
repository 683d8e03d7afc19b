mod handlers;
mod middleware;

use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::db::Database;

pub use crate::config::SecurityConfig;
pub use handlers::StatsQuery;
pub use middleware::{Caller, CALLER_HEADER};

/// Router with no gateway key and permissive CORS.
pub fn create_router(db: Database) -> Router {
    create_router_with_config(db, SecurityConfig::disabled())
}

pub fn create_router_with_config(db: Database, config: SecurityConfig) -> Router {
    let protected = Router::new()
        // Projects
        .route("/projects", get(handlers::list_projects))
        .route("/projects", post(handlers::create_project))
        .route("/projects/{id}", get(handlers::get_project))
        .route("/projects/{id}", put(handlers::update_project))
        .route("/projects/{id}", delete(handlers::delete_project))
        // Goals (by project)
        .route("/projects/{id}/goals", get(handlers::list_goals))
        .route("/projects/{id}/goals", post(handlers::create_goal))
        .route("/projects/{id}/goals/reorder", put(handlers::reorder_goals))
        .route(
            "/projects/{id}/goals/completed",
            delete(handlers::clear_completed_goals),
        )
        // Goals (by goal id)
        .route("/goals/{id}", put(handlers::update_goal))
        .route("/goals/{id}", delete(handlers::delete_goal))
        // Pomodoro
        .route("/pomodoro/start", post(handlers::start_pomodoro))
        .route("/pomodoro/stats", get(handlers::pomodoro_stats))
        .route("/pomodoro/{id}", get(handlers::get_pomodoro))
        .route("/pomodoro/{id}/complete", post(handlers::complete_pomodoro))
        .route_layer(from_fn_with_state(config.clone(), middleware::auth_middleware));

    let api = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected);

    Router::new()
        .nest("/api/v1", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config)),
        )
        .with_state(db)
}

fn cors_layer(config: &SecurityConfig) -> CorsLayer {
    let Some(origins) = &config.cors_origins else {
        return CorsLayer::permissive();
    };

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}
