use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::{
        orders::{
            OrderList, OrderListQuery, PayOrderRequest, PlaceOrderRequest, UpdateOrderRequest,
            UpdateOrderStatusRequest,
        },
        payments::PaymentInitiated,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Order,
    response::ApiResponse,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/mine", get(my_orders))
        .route("/place/{menu_item_id}", post(place_order))
        .route("/restaurant/{restaurant_id}", get(list_restaurant_orders))
        .route("/item/{menu_item_id}", get(list_orders_for_item))
        .route("/{id}", put(update_order))
        .route("/{id}/cancel", post(cancel_order))
        .route("/{id}/pay", post(pay_order))
        .route("/{id}/status", put(update_status))
}

#[utoipa::path(
    post,
    path = "/api/orders/place/{menu_item_id}",
    params(("menu_item_id" = Uuid, Path, description = "Menu item to order")),
    request_body = PlaceOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = ApiResponse<Order>),
        (status = 400, description = "Price mismatch or item unavailable"),
        (status = 403, description = "Caller has no booking for the table"),
        (status = 409, description = "Insufficient stock")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn place_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(menu_item_id): Path<Uuid>,
    Json(payload): Json<PlaceOrderRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Order>>)> {
    let resp = order_service::place_order(&state, &user, menu_item_id, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/cancel",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order canceled", body = ApiResponse<Order>),
        (status = 409, description = "Order is past Pending")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::cancel_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = UpdateOrderRequest,
    responses(
        (status = 200, description = "Order updated", body = ApiResponse<Order>),
        (status = 409, description = "Order can no longer be edited")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn update_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::update_order(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/pay",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = PayOrderRequest,
    responses(
        (status = 200, description = "Checkout created", body = ApiResponse<PaymentInitiated>),
        (status = 409, description = "Order is not payable"),
        (status = 502, description = "Payment gateway failure")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn pay_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<PayOrderRequest>,
) -> AppResult<Json<ApiResponse<PaymentInitiated>>> {
    let resp = order_service::initiate_payment(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Order status advanced", body = ApiResponse<Order>),
        (status = 409, description = "Illegal transition")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::advance_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/mine",
    responses(
        (status = 200, description = "Orders of the caller", body = ApiResponse<OrderList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn my_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::my_orders(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/restaurant/{restaurant_id}",
    params(
        ("restaurant_id" = Uuid, Path, description = "Restaurant id"),
        OrderListQuery
    ),
    responses(
        (status = 200, description = "Orders of the restaurant", body = ApiResponse<OrderList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_restaurant_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Path(restaurant_id): Path<Uuid>,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_restaurant_orders(&state, &user, restaurant_id, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/item/{menu_item_id}",
    params(("menu_item_id" = Uuid, Path, description = "Menu item id")),
    responses(
        (status = 200, description = "Orders for one menu item", body = ApiResponse<OrderList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders_for_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(menu_item_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_orders_for_item(&state, &user, menu_item_id).await?;
    Ok(Json(resp))
}
