// ============================================================================
// Axum Routes Module
// ============================================================================
//
// Structure:
// - mod.rs: Main router assembly and middleware
// - health.rs: Health check and metrics endpoints
// - sessions.rs: Login page, login and logout
// - store.rs: Storefront index
// - orders.rs: New order form (payment section)
// - extractors.rs: Custom Axum extractors (CurrentUser)
// - middleware.rs: Request logging, before-action pipeline
//
// ============================================================================

mod extractors;
mod health;
mod middleware;
mod orders;
mod sessions;
mod store;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::context::AppContext;

pub use extractors::CurrentUser;

/// Create the main application router with all routes
pub fn create_router(app_context: Arc<AppContext>) -> Router {
    let login_path = app_context.config.login_path().to_string();

    Router::new()
        // Health and monitoring (public)
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics))
        // Sessions (public)
        .route(&login_path, get(sessions::new).post(sessions::create))
        .route("/logout", post(sessions::destroy))
        // Storefront (requires a logged-in user)
        .route("/", get(store::index))
        .route("/orders/new", get(orders::new))
        // Before-action pipeline runs for every route
        .layer(axum::middleware::from_fn_with_state(
            app_context.clone(),
            middleware::before_actions,
        ))
        // Applied last so it wraps the pipeline and logs its redirects
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn(middleware::request_logging))
                .into_inner(),
        )
        .with_state(app_context)
}
