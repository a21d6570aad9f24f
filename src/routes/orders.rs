// ============================================================================
// Order Routes
// ============================================================================
//
// Endpoints:
// - GET /orders/new?pay_type=... - Order form with the payment section
//   rendered for the given pay type
//
// ============================================================================

use axum::{Extension, Json, extract::Query, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;

use crate::gatekeeper::RequestState;
use crate::i18n::translate;
use crate::payment::PaymentForm;
use crate::routes::extractors::CurrentUser;

#[derive(Debug, Deserialize)]
pub struct NewOrderParams {
    pub pay_type: Option<String>,
}

/// GET /orders/new
pub async fn new(
    CurrentUser(_user): CurrentUser,
    Extension(state): Extension<RequestState>,
    Query(params): Query<NewOrderParams>,
) -> impl IntoResponse {
    let form = PaymentForm::for_selection(params.pay_type.as_deref());

    Json(json!({
        "title": translate(&state.locale, "orders.title"),
        "pay_type_label": translate(&state.locale, "orders.pay_type"),
        "locale": state.locale,
        "notice": state.flash.notice(),
        "payment": form,
    }))
}
