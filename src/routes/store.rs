use axum::{Extension, Json, response::IntoResponse};
use serde_json::json;

use crate::gatekeeper::RequestState;
use crate::i18n::translate;
use crate::routes::extractors::CurrentUser;

/// GET /
pub async fn index(
    CurrentUser(user): CurrentUser,
    Extension(state): Extension<RequestState>,
) -> impl IntoResponse {
    Json(json!({
        "title": translate(&state.locale, "store.title"),
        "user": user,
        "locale": state.locale,
        "notice": state.flash.notice(),
        "alert": state.flash.alert(),
    }))
}
