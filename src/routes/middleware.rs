// ============================================================================
// Axum Middleware
// ============================================================================
//
// - request_logging: Log all incoming requests
// - before_actions: Run the gatekeeper pipeline ahead of every handler
//
// ============================================================================

use axum::{
    extract::{Query, Request, State},
    http::{HeaderValue, header::SET_COOKIE},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::context::AppContext;
use crate::error::AppError;
use crate::gatekeeper::{Flow, RequestContext};
use crate::session::SessionId;
use crate::utils::{extract_cookie, session_cookie};

/// Request logging middleware
pub async fn request_logging(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    tracing::debug!(
        method = %method,
        path = %path,
        "Incoming request"
    );

    let response = next.run(req).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        duration_ms = start.elapsed().as_millis(),
        "Request completed"
    );

    response
}

/// Before-action middleware
///
/// Loads the session named by the session cookie, runs the configured
/// before-actions, writes the session back and then either returns the
/// halting response or hands the request to the handler with a
/// `RequestState` extension attached.
pub async fn before_actions(
    State(ctx): State<Arc<AppContext>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let session_config = &ctx.config.session;

    let session_id = extract_cookie(req.headers(), &session_config.cookie_name)
        .and_then(|raw| SessionId::parse(&raw));
    let session = match session_id {
        Some(id) => ctx.sessions.load(&id).await.map_err(AppError::session)?,
        None => None,
    };

    // Malformed query strings count as "no parameters"
    let params = Query::<HashMap<String, String>>::try_from_uri(req.uri())
        .map(|Query(params)| params)
        .unwrap_or_default();

    let mut request_ctx = RequestContext::new(
        req.uri().path(),
        params,
        session_id,
        session,
        ctx.config.i18n.default_locale.clone(),
    );

    let flow = ctx.before_actions.run(&ctx, &mut request_ctx).await?;

    let issued = request_ctx
        .commit(ctx.sessions.as_ref())
        .await
        .map_err(AppError::session)?;

    let mut response = match flow {
        Flow::Halt(response) => response,
        Flow::Continue => {
            req.extensions_mut().insert(request_ctx.into_request_state());
            next.run(req).await
        }
    };

    // A handler that set its own session cookie wins
    if let Some(id) = issued {
        let prefix = format!("{}=", session_config.cookie_name);
        let handler_set_cookie = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .any(|v| v.starts_with(&prefix));
        if !handler_set_cookie {
            let cookie = HeaderValue::from_str(&session_cookie(session_config, &id))?;
            response.headers_mut().append(SET_COOKIE, cookie);
        }
    }

    Ok(response)
}
