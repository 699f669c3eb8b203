use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::{
        payments::PaymentInitiated,
        reservations::{BookTableRequest, BookingList, CancelBookingRequest, PayBookingRequest},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Booking,
    response::ApiResponse,
    services::reservation_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/mine", get(my_reservations))
        .route("/{restaurant_id}/book", post(book))
        .route("/{restaurant_id}/cancel", post(cancel))
        .route("/{restaurant_id}/pay", post(pay))
        .route("/booking/{id}/complete", post(complete))
}

#[utoipa::path(
    post,
    path = "/api/reservations/{restaurant_id}/book",
    params(("restaurant_id" = Uuid, Path, description = "Restaurant id")),
    request_body = BookTableRequest,
    responses(
        (status = 201, description = "Table booked", body = ApiResponse<Booking>),
        (status = 400, description = "Invalid time window"),
        (status = 404, description = "Table not found"),
        (status = 409, description = "Overlaps a confirmed booking")
    ),
    security(("bearer_auth" = [])),
    tag = "Reservations"
)]
pub async fn book(
    State(state): State<AppState>,
    user: AuthUser,
    Path(restaurant_id): Path<Uuid>,
    Json(payload): Json<BookTableRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Booking>>)> {
    let resp = reservation_service::book(&state, &user, restaurant_id, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/reservations/{restaurant_id}/cancel",
    params(("restaurant_id" = Uuid, Path, description = "Restaurant id")),
    request_body = CancelBookingRequest,
    responses(
        (status = 200, description = "Booking canceled", body = ApiResponse<Booking>),
        (status = 404, description = "No cancelable booking")
    ),
    security(("bearer_auth" = [])),
    tag = "Reservations"
)]
pub async fn cancel(
    State(state): State<AppState>,
    user: AuthUser,
    Path(restaurant_id): Path<Uuid>,
    Json(payload): Json<CancelBookingRequest>,
) -> AppResult<Json<ApiResponse<Booking>>> {
    let resp = reservation_service::cancel(&state, &user, restaurant_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/reservations/{restaurant_id}/pay",
    params(("restaurant_id" = Uuid, Path, description = "Restaurant id")),
    request_body = PayBookingRequest,
    responses(
        (status = 200, description = "Checkout created", body = ApiResponse<PaymentInitiated>),
        (status = 404, description = "No payable booking"),
        (status = 502, description = "Payment gateway failure")
    ),
    security(("bearer_auth" = [])),
    tag = "Reservations"
)]
pub async fn pay(
    State(state): State<AppState>,
    user: AuthUser,
    Path(restaurant_id): Path<Uuid>,
    Json(payload): Json<PayBookingRequest>,
) -> AppResult<Json<ApiResponse<PaymentInitiated>>> {
    let resp = reservation_service::initiate_payment(&state, &user, restaurant_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/reservations/booking/{id}/complete",
    params(("id" = Uuid, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking completed", body = ApiResponse<Booking>),
        (status = 409, description = "Booking is not confirmed")
    ),
    security(("bearer_auth" = [])),
    tag = "Reservations"
)]
pub async fn complete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Booking>>> {
    let resp = reservation_service::complete(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/reservations/mine",
    responses(
        (status = 200, description = "Bookings of the caller", body = ApiResponse<BookingList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Reservations"
)]
pub async fn my_reservations(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<BookingList>>> {
    let resp = reservation_service::my_reservations(&state, &user).await?;
    Ok(Json(resp))
}
