// ============================================================================
// Health and Metrics Routes
// ============================================================================
//
// Endpoints:
// - GET /health - Health check (user store, session store)
// - GET /metrics - Prometheus metrics
//
// ============================================================================

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

use crate::context::AppContext;
use crate::metrics;

/// GET /health
pub async fn health_check(State(app_context): State<Arc<AppContext>>) -> impl IntoResponse {
    if let Err(e) = app_context.users.ping().await {
        tracing::error!("Health check failed (user store): {}", e);
        return (StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable");
    }
    if let Err(e) = app_context.sessions.ping().await {
        tracing::error!("Health check failed (session store): {}", e);
        return (StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable");
    }
    (StatusCode::OK, "OK")
}

/// GET /metrics
pub async fn metrics() -> impl IntoResponse {
    match metrics::gather_metrics() {
        Ok(metrics_data) => (
            StatusCode::OK,
            [("Content-Type", "text/plain; version=0.0.4")],
            metrics_data,
        ),
        Err(e) => {
            tracing::error!("Failed to gather metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("Content-Type", "text/plain")],
                "Internal Server Error".to_string(),
            )
        }
    }
}
