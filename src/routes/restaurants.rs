use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use uuid::Uuid;

use crate::{
    dto::restaurants::{
        CreateRestaurantRequest, CreateTableRequest, RegisterStaffRequest, TableList,
        UpdateRestaurantRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{DiningTable, Restaurant, User},
    response::ApiResponse,
    services::restaurant_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(register_restaurant))
        .route("/{id}", get(get_restaurant).put(update_restaurant))
        .route("/{id}/staff", post(register_staff))
        .route("/{id}/tables", get(list_tables).post(create_table))
        .route("/{id}/tables/{table_number}", delete(delete_table))
}

#[utoipa::path(
    post,
    path = "/api/restaurants",
    request_body = CreateRestaurantRequest,
    responses(
        (status = 201, description = "Restaurant registered", body = ApiResponse<Restaurant>),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Name or email taken")
    ),
    security(("bearer_auth" = [])),
    tag = "Restaurants"
)]
pub async fn register_restaurant(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateRestaurantRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Restaurant>>)> {
    let resp = restaurant_service::register_restaurant(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/restaurants/{id}",
    params(("id" = Uuid, Path, description = "Restaurant id")),
    responses(
        (status = 200, description = "Restaurant", body = ApiResponse<Restaurant>),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Restaurants"
)]
pub async fn get_restaurant(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Restaurant>>> {
    let resp = restaurant_service::get_restaurant(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/restaurants/{id}",
    params(("id" = Uuid, Path, description = "Restaurant id")),
    request_body = UpdateRestaurantRequest,
    responses(
        (status = 200, description = "Restaurant updated", body = ApiResponse<Restaurant>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Restaurants"
)]
pub async fn update_restaurant(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRestaurantRequest>,
) -> AppResult<Json<ApiResponse<Restaurant>>> {
    let resp = restaurant_service::update_restaurant(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/restaurants/{id}/staff",
    params(("id" = Uuid, Path, description = "Restaurant id")),
    request_body = RegisterStaffRequest,
    responses(
        (status = 201, description = "Staff registered", body = ApiResponse<User>),
        (status = 400, description = "Not a staff role"),
        (status = 409, description = "Email taken")
    ),
    security(("bearer_auth" = [])),
    tag = "Restaurants"
)]
pub async fn register_staff(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RegisterStaffRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<User>>)> {
    let resp = restaurant_service::register_staff(&state, &user, id, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/restaurants/{id}/tables",
    params(("id" = Uuid, Path, description = "Restaurant id")),
    responses(
        (status = 200, description = "Tables of the restaurant", body = ApiResponse<TableList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Restaurants"
)]
pub async fn list_tables(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<TableList>>> {
    let resp = restaurant_service::list_tables(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/restaurants/{id}/tables",
    params(("id" = Uuid, Path, description = "Restaurant id")),
    request_body = CreateTableRequest,
    responses(
        (status = 201, description = "Table created", body = ApiResponse<DiningTable>),
        (status = 409, description = "Table number taken")
    ),
    security(("bearer_auth" = [])),
    tag = "Restaurants"
)]
pub async fn create_table(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateTableRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<DiningTable>>)> {
    let resp = restaurant_service::create_table(&state, &user, id, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    delete,
    path = "/api/restaurants/{id}/tables/{table_number}",
    params(
        ("id" = Uuid, Path, description = "Restaurant id"),
        ("table_number" = i32, Path, description = "Table number")
    ),
    responses(
        (status = 200, description = "Table deleted", body = ApiResponse<DiningTable>),
        (status = 404, description = "Table not found"),
        (status = 409, description = "Table has active bookings")
    ),
    security(("bearer_auth" = [])),
    tag = "Restaurants"
)]
pub async fn delete_table(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, table_number)): Path<(Uuid, i32)>,
) -> AppResult<Json<ApiResponse<DiningTable>>> {
    let resp = restaurant_service::delete_table(&state, &user, id, table_number).await?;
    Ok(Json(resp))
}
