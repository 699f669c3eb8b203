use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::post,
};
use uuid::Uuid;

use crate::{
    dto::auth::{LoginRequest, LoginResponse, RegisterRequest},
    error::AppResult,
    models::User,
    response::ApiResponse,
    services::auth_service::{login_user, register_customer},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register/{restaurant_id}", post(register))
        .route("/login", post(login))
}

#[utoipa::path(
    post,
    path = "/api/auth/register/{restaurant_id}",
    params(("restaurant_id" = Uuid, Path, description = "Restaurant the customer signs up with")),
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Register customer", body = ApiResponse<User>),
        (status = 404, description = "Restaurant not found"),
        (status = 409, description = "Email already taken")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Path(restaurant_id): Path<Uuid>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<User>>)> {
    let resp = register_customer(&state, restaurant_id, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login user", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = login_user(&state, payload).await?;
    Ok(Json(resp))
}
