//! Router construction.
//!
//! Builds the axum router with all routes and middleware.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::security;
use crate::state::AppState;

/// Create the application router.
///
/// # Arguments
///
/// * `state` - Shared application state
pub fn create_router(state: Arc<AppState>) -> Router {
    let write_routes = Router::new()
        .route("/indexes", post(handlers::ingest::create_index))
        .route(
            "/notifications/objects",
            post(handlers::notifications::receive_object_notification),
        );

    let read_routes = Router::new()
        .route("/", get(handlers::diagrams::list_diagrams))
        .route("/search", get(handlers::diagrams::search_diagrams))
        .route("/items/{id}", get(handlers::diagrams::get_diagram));

    Router::new()
        .merge(write_routes)
        .merge(read_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(security::csp_layer())
                .layer(security::content_type_options_layer())
                .layer(security::frame_options_layer()),
        )
        .with_state(state)
}
