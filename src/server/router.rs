//! Router construction for the config sync server.

use axum::{
    middleware as axum_mw,
    routing::{get, post},
    Extension, Router,
};
use tower_http::trace::TraceLayer;

use crate::server::{handlers, middleware::request_id};
use crate::sync::DatabaseSync;

/// Build the full axum router with all routes and middleware.
pub fn build_router(sync: DatabaseSync) -> Router {
    Router::new()
        .route("/db/sync", post(handlers::sync_database))
        .route("/health", get(handlers::health))
        .layer(Extension(sync))
        .layer(TraceLayer::new_for_http())
        .layer(axum_mw::from_fn(request_id))
}
