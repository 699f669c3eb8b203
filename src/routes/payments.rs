use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::payments::{CallbackOutcome, CallbackQuery},
    error::AppResult,
    response::ApiResponse,
    services::payment_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/callback", get(callback))
}

/// Called by the gateway once a checkout settles. Unauthenticated.
#[utoipa::path(
    get,
    path = "/api/payments/callback",
    params(CallbackQuery),
    responses(
        (status = 200, description = "Payment reconciled", body = ApiResponse<CallbackOutcome>),
        (status = 404, description = "Unknown transaction reference"),
        (status = 502, description = "Verification failed")
    ),
    tag = "Payments"
)]
pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> AppResult<Json<ApiResponse<CallbackOutcome>>> {
    let resp = payment_service::handle_callback(&state, &query.tx_ref).await?;
    Ok(Json(resp))
}
