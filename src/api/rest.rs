//! REST API routes for admin-auth.

use axum::routing::{get, post};
use axum::Router;

use super::handlers;
use crate::server::AppState;

/// Build the application router (without the gate and tracing layers).
pub fn router() -> Router<AppState> {
    Router::new()
        // Public
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/v3/api-docs", get(handlers::api_docs))
        .route("/health", get(handlers::health_check))
        // Authenticated
        .route("/admin/me", get(handlers::current_admin))
}
