use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::inventory::{
        AddIngredientRequest, InventoryList, RestockRequest, RestockResult,
        UpdateIngredientRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::InventoryItem,
    response::ApiResponse,
    services::inventory_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{restaurant_id}", get(list_ingredients).post(add_ingredient))
        .route("/{restaurant_id}/low-stock", get(list_low_stock))
        .route(
            "/item/{id}",
            get(get_ingredient)
                .put(update_ingredient)
                .delete(delete_ingredient),
        )
        .route("/item/{id}/restock", post(restock))
}

#[utoipa::path(
    post,
    path = "/api/inventory/{restaurant_id}",
    params(("restaurant_id" = Uuid, Path, description = "Restaurant id")),
    request_body = AddIngredientRequest,
    responses(
        (status = 201, description = "Ingredient added", body = ApiResponse<InventoryItem>),
        (status = 409, description = "Ingredient already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Inventory"
)]
pub async fn add_ingredient(
    State(state): State<AppState>,
    user: AuthUser,
    Path(restaurant_id): Path<Uuid>,
    Json(payload): Json<AddIngredientRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<InventoryItem>>)> {
    let resp = inventory_service::add_ingredient(&state, &user, restaurant_id, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/inventory/{restaurant_id}",
    params(("restaurant_id" = Uuid, Path, description = "Restaurant id")),
    responses(
        (status = 200, description = "Inventory of the restaurant", body = ApiResponse<InventoryList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Inventory"
)]
pub async fn list_ingredients(
    State(state): State<AppState>,
    user: AuthUser,
    Path(restaurant_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<InventoryList>>> {
    let resp = inventory_service::list_ingredients(&state, &user, restaurant_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/inventory/{restaurant_id}/low-stock",
    params(("restaurant_id" = Uuid, Path, description = "Restaurant id")),
    responses(
        (status = 200, description = "Ingredients at or below 15% of supply", body = ApiResponse<InventoryList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Inventory"
)]
pub async fn list_low_stock(
    State(state): State<AppState>,
    user: AuthUser,
    Path(restaurant_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<InventoryList>>> {
    let resp = inventory_service::list_low_stock(&state, &user, restaurant_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/inventory/item/{id}",
    params(("id" = Uuid, Path, description = "Ingredient id")),
    responses(
        (status = 200, description = "Ingredient", body = ApiResponse<InventoryItem>),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Inventory"
)]
pub async fn get_ingredient(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<InventoryItem>>> {
    let resp = inventory_service::get_ingredient(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/inventory/item/{id}",
    params(("id" = Uuid, Path, description = "Ingredient id")),
    request_body = UpdateIngredientRequest,
    responses(
        (status = 200, description = "Ingredient updated", body = ApiResponse<InventoryItem>)
    ),
    security(("bearer_auth" = [])),
    tag = "Inventory"
)]
pub async fn update_ingredient(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateIngredientRequest>,
) -> AppResult<Json<ApiResponse<InventoryItem>>> {
    let resp = inventory_service::update_ingredient(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/inventory/item/{id}",
    params(("id" = Uuid, Path, description = "Ingredient id")),
    responses(
        (status = 200, description = "Ingredient deleted", body = ApiResponse<InventoryItem>),
        (status = 409, description = "Still used by a menu item")
    ),
    security(("bearer_auth" = [])),
    tag = "Inventory"
)]
pub async fn delete_ingredient(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<InventoryItem>>> {
    let resp = inventory_service::delete_ingredient(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/inventory/item/{id}/restock",
    params(("id" = Uuid, Path, description = "Ingredient id")),
    request_body = RestockRequest,
    responses(
        (status = 200, description = "Ingredient restocked", body = ApiResponse<RestockResult>),
        (status = 409, description = "Stock is not low")
    ),
    security(("bearer_auth" = [])),
    tag = "Inventory"
)]
pub async fn restock(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RestockRequest>,
) -> AppResult<Json<ApiResponse<RestockResult>>> {
    let resp = inventory_service::restock(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
