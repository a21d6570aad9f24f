// ============================================================================
// Session Routes
// ============================================================================
//
// Endpoints:
// - GET  /login  - Login page state (shows pending notices)
// - POST /login  - Log in with name + password
// - POST /logout - Log out
//
// The login URL is configurable; these handlers are mounted at its path.
//
// ============================================================================

use axum::{
    Extension, Json,
    extract::State,
    http::{HeaderValue, header::SET_COOKIE},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::flash::FlashKind;
use crate::gatekeeper::RequestState;
use crate::i18n::translate;
use crate::metrics;
use crate::session::{SessionData, SessionId, start_session};
use crate::utils::{log_safe_id, session_cookie};

pub const INVALID_LOGIN: &str = "Invalid user/password combination";
pub const LOGGED_OUT: &str = "Logged out";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub name: String,
    pub password: String,
}

/// GET /login
pub async fn new(Extension(state): Extension<RequestState>) -> impl IntoResponse {
    Json(json!({
        "title": translate(&state.locale, "sessions.title"),
        "locale": state.locale,
        "notice": state.flash.notice(),
        "alert": state.flash.alert(),
    }))
}

/// POST /login
pub async fn create(
    State(ctx): State<Arc<AppContext>>,
    Extension(state): Extension<RequestState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Response> {
    if request.name.trim().is_empty() {
        return Err(AppError::validation("name is required"));
    }

    let user = ctx
        .users
        .find_by_name(&request.name)
        .await
        .map_err(AppError::user_store)?
        .filter(|user| user.authenticate(&request.password));

    match user {
        Some(user) => {
            // Fresh session id on every login
            if let Some(old) = state.session_id {
                ctx.sessions.destroy(&old).await.map_err(AppError::session)?;
            }
            let data = SessionData {
                user_id: Some(user.id),
                ..Default::default()
            };
            let id = start_session(ctx.sessions.as_ref(), &data)
                .await
                .map_err(AppError::session)?;

            metrics::LOGINS_TOTAL.inc();
            tracing::info!(
                user_hash = %log_safe_id(&user.id.to_string(), &ctx.config.logging.hash_salt),
                "User logged in"
            );

            redirect_with_session(&ctx, "/", &id)
        }
        None => {
            metrics::FAILED_LOGINS_TOTAL.inc();
            tracing::warn!("Failed login attempt");

            let id = flash_into_session(&ctx, state.session_id, FlashKind::Alert, INVALID_LOGIN)
                .await?;
            redirect_with_session(&ctx, &ctx.config.login_url, &id)
        }
    }
}

/// POST /logout
pub async fn destroy(
    State(ctx): State<Arc<AppContext>>,
    Extension(state): Extension<RequestState>,
) -> AppResult<Response> {
    if let Some(id) = state.session_id {
        ctx.sessions.destroy(&id).await.map_err(AppError::session)?;
    }

    let mut data = SessionData::default();
    data.flash.set(FlashKind::Notice, LOGGED_OUT);
    let id = start_session(ctx.sessions.as_ref(), &data)
        .await
        .map_err(AppError::session)?;

    redirect_with_session(&ctx, &ctx.config.login_url, &id)
}

/// Stores a next-request flash message, creating a session when needed
async fn flash_into_session(
    ctx: &AppContext,
    session_id: Option<SessionId>,
    kind: FlashKind,
    message: &str,
) -> AppResult<SessionId> {
    let existing = match session_id {
        Some(id) => ctx
            .sessions
            .load(&id)
            .await
            .map_err(AppError::session)?
            .map(|data| (id, data)),
        None => None,
    };

    match existing {
        Some((id, mut data)) => {
            data.flash.set(kind, message);
            ctx.sessions
                .save(&id, &data)
                .await
                .map_err(AppError::session)?;
            Ok(id)
        }
        None => {
            let mut data = SessionData::default();
            data.flash.set(kind, message);
            start_session(ctx.sessions.as_ref(), &data)
                .await
                .map_err(AppError::session)
        }
    }
}

fn redirect_with_session(ctx: &AppContext, to: &str, id: &SessionId) -> AppResult<Response> {
    let mut response = Redirect::to(to).into_response();
    let cookie = HeaderValue::from_str(&session_cookie(&ctx.config.session, id))?;
    response.headers_mut().append(SET_COOKIE, cookie);
    Ok(response)
}
