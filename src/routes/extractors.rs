// ============================================================================
// Axum Extractors
// ============================================================================

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;

use crate::context::AppContext;
use crate::db::User;
use crate::gatekeeper::RequestState;

/// The user the Authorize before-action resolved for this request
///
/// Usage:
/// ```rust,ignore
/// async fn handler(CurrentUser(user): CurrentUser) -> impl IntoResponse {
///     user.name
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppContext>> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppContext>,
    ) -> Result<Self, Self::Rejection> {
        match parts
            .extensions
            .get::<RequestState>()
            .and_then(|s| s.current_user.clone())
        {
            Some(user) => Ok(CurrentUser(user)),
            None => {
                // Only reachable on routes the pipeline treats as public
                tracing::warn!(path = %parts.uri.path(), "Handler requires a user but none was resolved");
                Err(Redirect::to(&state.config.login_url).into_response())
            }
        }
    }
}
