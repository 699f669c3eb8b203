use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::menu::{
        AddIngredientsRequest, AvailabilityRequest, CreateMenuItemRequest, MenuList,
        UpdateMenuItemRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::MenuItem,
    response::ApiResponse,
    services::menu_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{restaurant_id}", get(list_menu).post(add_menu_item))
        .route("/item/{id}", put(update_menu_item).delete(delete_menu_item))
        .route("/item/{id}/ingredients", post(add_ingredients))
        .route(
            "/item/{id}/ingredients/{ingredient_id}",
            delete(remove_ingredient),
        )
        .route("/item/{id}/availability", put(set_availability))
}

#[utoipa::path(
    post,
    path = "/api/menu/{restaurant_id}",
    params(("restaurant_id" = Uuid, Path, description = "Restaurant id")),
    request_body = CreateMenuItemRequest,
    responses(
        (status = 201, description = "Menu item added", body = ApiResponse<MenuItem>),
        (status = 404, description = "Ingredient not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Menu"
)]
pub async fn add_menu_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(restaurant_id): Path<Uuid>,
    Json(payload): Json<CreateMenuItemRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<MenuItem>>)> {
    let resp = menu_service::add_menu_item(&state, &user, restaurant_id, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/menu/{restaurant_id}",
    params(("restaurant_id" = Uuid, Path, description = "Restaurant id")),
    responses(
        (status = 200, description = "Menu of the restaurant", body = ApiResponse<MenuList>)
    ),
    tag = "Menu"
)]
pub async fn list_menu(
    State(state): State<AppState>,
    Path(restaurant_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<MenuList>>> {
    let resp = menu_service::list_menu(&state, restaurant_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/menu/item/{id}",
    params(("id" = Uuid, Path, description = "Menu item id")),
    request_body = UpdateMenuItemRequest,
    responses(
        (status = 200, description = "Menu item updated", body = ApiResponse<MenuItem>)
    ),
    security(("bearer_auth" = [])),
    tag = "Menu"
)]
pub async fn update_menu_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMenuItemRequest>,
) -> AppResult<Json<ApiResponse<MenuItem>>> {
    let resp = menu_service::update_menu_item(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/menu/item/{id}/ingredients",
    params(("id" = Uuid, Path, description = "Menu item id")),
    request_body = AddIngredientsRequest,
    responses(
        (status = 200, description = "Ingredients added", body = ApiResponse<MenuItem>),
        (status = 409, description = "No new ingredients")
    ),
    security(("bearer_auth" = [])),
    tag = "Menu"
)]
pub async fn add_ingredients(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddIngredientsRequest>,
) -> AppResult<Json<ApiResponse<MenuItem>>> {
    let resp = menu_service::add_ingredients(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/menu/item/{id}/ingredients/{ingredient_id}",
    params(
        ("id" = Uuid, Path, description = "Menu item id"),
        ("ingredient_id" = Uuid, Path, description = "Inventory item id")
    ),
    responses(
        (status = 200, description = "Ingredient removed", body = ApiResponse<MenuItem>),
        (status = 404, description = "Ingredient not part of the item")
    ),
    security(("bearer_auth" = [])),
    tag = "Menu"
)]
pub async fn remove_ingredient(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, ingredient_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<MenuItem>>> {
    let resp = menu_service::remove_ingredient(&state, &user, id, ingredient_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/menu/item/{id}/availability",
    params(("id" = Uuid, Path, description = "Menu item id")),
    request_body = AvailabilityRequest,
    responses(
        (status = 200, description = "Availability updated", body = ApiResponse<MenuItem>)
    ),
    security(("bearer_auth" = [])),
    tag = "Menu"
)]
pub async fn set_availability(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AvailabilityRequest>,
) -> AppResult<Json<ApiResponse<MenuItem>>> {
    let resp = menu_service::set_availability(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/menu/item/{id}",
    params(("id" = Uuid, Path, description = "Menu item id")),
    responses(
        (status = 200, description = "Menu item deleted", body = ApiResponse<MenuItem>)
    ),
    security(("bearer_auth" = [])),
    tag = "Menu"
)]
pub async fn delete_menu_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<MenuItem>>> {
    let resp = menu_service::delete_menu_item(&state, &user, id).await?;
    Ok(Json(resp))
}
