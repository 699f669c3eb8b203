use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, DatabaseTransaction,
    EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    domain::{OrderStatus, PaymentStatus, ReservationStatus, Role, rules},
    dto::{
        orders::{
            OrderList, OrderListQuery, PayOrderRequest, PlaceOrderRequest, UpdateOrderRequest,
            UpdateOrderStatusRequest,
        },
        payments::PaymentInitiated,
    },
    entity::{
        Bookings, DiningTables, MenuItems, Orders, UserOrders, Users, bookings, dining_tables,
        menu_item_ingredients, menu_items,
        orders::{self, ActiveModel as OrderActive},
        user_orders::{self, ActiveModel as UserOrderActive},
    },
    error::{AppError, AppResult, DomainError},
    gateway::{InitializeTransaction, Payer, VerifiedTransaction},
    middleware::auth::{AuthUser, KITCHEN, ensure_restaurant, ensure_role},
    models::Order,
    notifier::{self, LowStockLine, Notification, PaymentTarget},
    response::{ApiResponse, Meta},
    services::{
        inventory_service::{deplete, report_low_stock},
        menu_service::{find_menu_item, mark_unavailable, recipe_of},
        restaurant_service::find_restaurant,
        timestamp,
    },
    state::AppState,
};

/// Roles that see a restaurant's whole order book.
const ORDER_DESK: &[Role] = &[Role::Chef, Role::Waiter, Role::Cashier, Role::Manager];

pub async fn find_order(state: &AppState, id: Uuid) -> AppResult<orders::Model> {
    Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))
}

async fn find_own_order(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<orders::Model> {
    let order = find_order(state, id).await?;
    if order.user_id != user.user_id {
        return Err(AppError::Forbidden);
    }
    Ok(order)
}

fn open_for_edit() -> Condition {
    Condition::all()
        .add(orders::Column::OrderStatus.eq(OrderStatus::Pending.as_str()))
        .add(orders::Column::PaymentStatus.ne(PaymentStatus::Paid.as_str()))
}

fn parse_status(order: &orders::Model) -> AppResult<OrderStatus> {
    Ok(order
        .order_status
        .parse::<OrderStatus>()
        .map_err(anyhow::Error::from)?)
}

/// The caller must hold a confirmed, paid booking on the table they order from.
async fn ensure_seated(
    state: &AppState,
    user: &AuthUser,
    restaurant_id: Uuid,
    table_number: i32,
) -> AppResult<()> {
    let not_owned = || AppError::Domain(DomainError::ReservationNotOwned(table_number));
    let table = DiningTables::find()
        .filter(dining_tables::Column::RestaurantId.eq(restaurant_id))
        .filter(dining_tables::Column::TableNumber.eq(table_number))
        .one(&state.orm)
        .await?
        .ok_or_else(not_owned)?;

    Bookings::find()
        .filter(bookings::Column::TableId.eq(table.id))
        .filter(bookings::Column::UserId.eq(user.user_id))
        .filter(bookings::Column::ReservationStatus.eq(ReservationStatus::Confirmed.as_str()))
        .filter(bookings::Column::PaymentStatus.eq(PaymentStatus::Paid.as_str()))
        .one(&state.orm)
        .await?
        .ok_or_else(not_owned)?;
    Ok(())
}

/// Depletes every ingredient of the recipe for `quantity` items inside `txn`.
///
/// Returns the ingredients that crossed the low-stock threshold.
async fn deplete_recipe(
    txn: &DatabaseTransaction,
    recipe: &[menu_item_ingredients::Model],
    quantity: i32,
) -> AppResult<Vec<LowStockLine>> {
    let mut crossed = Vec::new();
    for line in recipe {
        let required = rules::required_amount(quantity, line.amount_used_per_item)?;
        let depletion = deplete(txn, line.inventory_item_id, required).await?;
        if depletion.crossed_low_stock() {
            crossed.push(depletion.low_stock_line());
        }
    }
    Ok(crossed)
}

fn is_out_of_stock(err: &AppError) -> bool {
    matches!(err, AppError::Domain(DomainError::InsufficientStock { .. }))
}

/// Rolls back and, when stock ran out, takes the item off the menu.
async fn abort_depletion(
    state: &AppState,
    txn: DatabaseTransaction,
    menu_item_id: Uuid,
    err: AppError,
) -> AppError {
    if let Err(rollback) = txn.rollback().await {
        tracing::error!(error = %rollback, "rollback failed");
    }
    if is_out_of_stock(&err) {
        tracing::info!(menu_item_id = %menu_item_id, error = %err, "menu item ran out of stock");
        if let Err(mark) = mark_unavailable(&state.orm, menu_item_id).await {
            tracing::warn!(error = %mark, "failed to mark menu item unavailable");
        }
    }
    err
}

pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    menu_item_id: Uuid,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    let item = find_menu_item(&state.orm, menu_item_id).await?;
    if !item.is_available {
        return Err(DomainError::MenuItemUnavailable.into());
    }
    ensure_seated(state, user, item.restaurant_id, payload.table_number).await?;
    let total_price = rules::check_total(payload.quantity, item.price, payload.total_price)?;

    let recipe = recipe_of(&state.orm, item.id).await?;
    let txn = state.orm.begin().await?;
    let crossed = match deplete_recipe(&txn, &recipe, payload.quantity).await {
        Ok(crossed) => crossed,
        Err(err) => return Err(abort_depletion(state, txn, item.id, err).await),
    };

    let now = timestamp(Utc::now());
    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        restaurant_id: Set(item.restaurant_id),
        menu_item_id: Set(item.id),
        user_id: Set(user.user_id),
        customer_name: Set(payload.customer_name),
        phone: Set(payload.phone),
        table_number: Set(payload.table_number),
        quantity: Set(payload.quantity),
        total_price: Set(total_price),
        order_status: Set(OrderStatus::Pending.as_str().to_string()),
        payment_method: Set(None),
        payment_status: Set(PaymentStatus::Pending.as_str().to_string()),
        amount_paid: Set(0),
        tx_ref: Set(rules::new_order_tx_ref()),
        transaction_id: Set(None),
        payment_date: Set(None),
        placed_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;

    UserOrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        order_id: Set(order.id),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    tracing::info!(order_id = %order.id, tx_ref = %order.tx_ref, "order placed");
    let restaurant = find_restaurant(state, item.restaurant_id).await?;
    notifier::dispatch(
        state.notifier.as_ref(),
        &user.email,
        Notification::OrderPlaced {
            customer_name: order.customer_name.clone(),
            order_id: order.id,
            item_name: item.name.clone(),
            quantity: order.quantity,
            total_price: order.total_price,
            currency: restaurant.currency,
        },
    )
    .await;
    report_low_stock(state, item.restaurant_id, crossed).await;
    log_audit(
        state,
        Some(user.user_id),
        "order_place",
        "orders",
        serde_json::json!({ "order_id": order.id, "total_price": order.total_price }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order placed",
        order.into(),
        Some(Meta::empty()),
    ))
}

pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    let order = find_own_order(state, user, id).await?;
    let current = parse_status(&order)?;
    let illegal = || DomainError::IllegalTransition {
        from: current.to_string(),
        to: OrderStatus::Canceled.to_string(),
    };
    if !current.can_transition_to(OrderStatus::Canceled) {
        return Err(illegal().into());
    }

    let result = Orders::update_many()
        .col_expr(
            orders::Column::OrderStatus,
            Expr::value(OrderStatus::Canceled.as_str()),
        )
        .col_expr(orders::Column::UpdatedAt, Expr::value(timestamp(Utc::now())))
        .filter(orders::Column::Id.eq(id))
        .filter(orders::Column::OrderStatus.eq(current.as_str()))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(illegal().into());
    }

    let order = find_order(state, order.id).await?;
    tracing::info!(order_id = %order.id, "order canceled");
    let item_name = MenuItems::find_by_id(order.menu_item_id)
        .one(&state.orm)
        .await?
        .map(|item| item.name)
        .unwrap_or_default();
    notifier::dispatch(
        state.notifier.as_ref(),
        &user.email,
        Notification::OrderCanceled {
            customer_name: order.customer_name.clone(),
            order_id: order.id,
            item_name,
        },
    )
    .await;
    log_audit(
        state,
        Some(user.user_id),
        "order_cancel",
        "orders",
        serde_json::json!({ "order_id": order.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order canceled",
        order.into(),
        Some(Meta::empty()),
    ))
}

/// Edits a pending, unpaid order. A larger quantity takes the extra stock; a smaller
/// one gives nothing back.
pub async fn update_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    let order = find_own_order(state, user, id).await?;
    if order.order_status != OrderStatus::Pending.as_str()
        || order.payment_status == PaymentStatus::Paid.as_str()
    {
        return Err(DomainError::OrderLocked.into());
    }

    let item = MenuItems::find_by_id(order.menu_item_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Menu item"))?;
    let quantity = payload.quantity.unwrap_or(order.quantity);
    let total_price = rules::check_total(quantity, item.price, payload.total_price)?;

    let txn = state.orm.begin().await?;
    let mut crossed = Vec::new();
    if quantity > order.quantity {
        let recipe = recipe_of(&txn, item.id).await?;
        crossed = match deplete_recipe(&txn, &recipe, quantity - order.quantity).await {
            Ok(crossed) => crossed,
            Err(err) => return Err(abort_depletion(state, txn, item.id, err).await),
        };
    }

    let mut update = Orders::update_many()
        .col_expr(orders::Column::Quantity, Expr::value(quantity))
        .col_expr(orders::Column::TotalPrice, Expr::value(total_price))
        .col_expr(orders::Column::UpdatedAt, Expr::value(timestamp(Utc::now())));
    if let Some(name) = payload.customer_name {
        update = update.col_expr(orders::Column::CustomerName, Expr::value(name));
    }
    if let Some(phone) = payload.phone {
        update = update.col_expr(orders::Column::Phone, Expr::value(phone));
    }
    let result = update
        .filter(orders::Column::Id.eq(id))
        .filter(orders::Column::Quantity.eq(order.quantity))
        .filter(open_for_edit())
        .exec(&txn)
        .await?;
    if result.rows_affected == 0 {
        txn.rollback().await?;
        return Err(DomainError::OrderLocked.into());
    }
    txn.commit().await?;

    report_low_stock(state, item.restaurant_id, crossed).await;
    tracing::info!(order_id = %id, quantity, "order updated");

    Ok(ApiResponse::success(
        "Order updated",
        find_order(state, id).await?.into(),
        Some(Meta::empty()),
    ))
}

pub async fn initiate_payment(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: PayOrderRequest,
) -> AppResult<ApiResponse<PaymentInitiated>> {
    let order = find_own_order(state, user, id).await?;
    if order.order_status != OrderStatus::Pending.as_str()
        || order.payment_status == PaymentStatus::Paid.as_str()
    {
        return Err(DomainError::NotPayable.into());
    }
    let restaurant = find_restaurant(state, order.restaurant_id).await?;

    let payment = &state.config.payment;
    let request = InitializeTransaction {
        amount: order.total_price,
        currency: restaurant.currency.clone(),
        payer: Payer::new(&user.email, &order.customer_name, &order.phone),
        tx_ref: order.tx_ref.clone(),
        callback_url: payment.callback_url(&order.tx_ref),
        return_url: payment.return_url("orderId", order.id, &order.tx_ref),
        title: "Food order".into(),
        description: format!("Order of {} item(s) at {}", order.quantity, restaurant.name),
    };
    let checkout_url = state.gateway.initialize_transaction(&request).await?;

    Orders::update_many()
        .col_expr(
            orders::Column::PaymentMethod,
            Expr::value(payload.payment_method.as_str()),
        )
        .col_expr(orders::Column::UpdatedAt, Expr::value(timestamp(Utc::now())))
        .filter(orders::Column::Id.eq(order.id))
        .filter(open_for_edit())
        .exec(&state.orm)
        .await?;

    tracing::info!(order_id = %order.id, tx_ref = %order.tx_ref, "order payment initiated");
    Ok(ApiResponse::success(
        "Payment initiated",
        PaymentInitiated {
            tx_ref: order.tx_ref,
            checkout_url,
        },
        Some(Meta::empty()),
    ))
}

/// Converges an order onto the gateway's verdict for its tx_ref.
pub async fn reconcile_payment(
    state: &AppState,
    order: orders::Model,
    verified: &VerifiedTransaction,
) -> AppResult<orders::Model> {
    let now = timestamp(Utc::now());

    if !verified.status.is_success() {
        Orders::update_many()
            .col_expr(
                orders::Column::PaymentStatus,
                Expr::value(PaymentStatus::Failed.as_str()),
            )
            .col_expr(orders::Column::AmountPaid, Expr::value(0i64))
            .col_expr(orders::Column::UpdatedAt, Expr::value(now))
            .filter(orders::Column::Id.eq(order.id))
            .filter(open_for_edit())
            .exec(&state.orm)
            .await?;
        tracing::info!(order_id = %order.id, tx_ref = %order.tx_ref, "order payment failed");
        return find_order(state, order.id).await;
    }

    if order.payment_status == PaymentStatus::Paid.as_str() {
        return Ok(order);
    }

    let mut confirm = order.order_status == OrderStatus::Pending.as_str();
    let mut wrote = mark_paid(state, &order, verified, now, confirm).await?;
    if !wrote && confirm {
        // Canceled by the stale-order sweep after it was read.
        confirm = false;
        wrote = mark_paid(state, &order, verified, now, false).await?;
    }

    if wrote {
        if confirm {
            tracing::info!(order_id = %order.id, tx_ref = %order.tx_ref, "order confirmed");
            let restaurant = find_restaurant(state, order.restaurant_id).await?;
            if let Some(customer) = Users::find_by_id(order.user_id).one(&state.orm).await? {
                notifier::dispatch(
                    state.notifier.as_ref(),
                    &customer.email,
                    Notification::PaymentConfirmed {
                        target: PaymentTarget::Order,
                        tx_ref: order.tx_ref.clone(),
                        amount: order.total_price,
                        currency: restaurant.currency,
                    },
                )
                .await;
            }
        } else {
            tracing::warn!(
                order_id = %order.id,
                tx_ref = %order.tx_ref,
                amount = order.total_price,
                "payment received for a canceled order, refund required"
            );
        }
        log_audit(
            state,
            Some(order.user_id),
            "order_payment",
            "orders",
            serde_json::json!({ "order_id": order.id, "tx_ref": order.tx_ref }),
        )
        .await;
    }

    find_order(state, order.id).await
}

/// Records the payment; `confirm` also moves a still-pending order to Confirmed,
/// otherwise only a canceled order is touched.
async fn mark_paid(
    state: &AppState,
    order: &orders::Model,
    verified: &VerifiedTransaction,
    now: sea_orm::prelude::DateTimeWithTimeZone,
    confirm: bool,
) -> AppResult<bool> {
    let mut update = Orders::update_many()
        .col_expr(
            orders::Column::PaymentStatus,
            Expr::value(PaymentStatus::Paid.as_str()),
        )
        .col_expr(orders::Column::AmountPaid, Expr::value(order.total_price))
        .col_expr(
            orders::Column::TransactionId,
            Expr::value(verified.reference.clone()),
        )
        .col_expr(orders::Column::PaymentDate, Expr::value(now))
        .col_expr(orders::Column::UpdatedAt, Expr::value(now))
        .filter(orders::Column::Id.eq(order.id))
        .filter(orders::Column::PaymentStatus.ne(PaymentStatus::Paid.as_str()));
    update = if confirm {
        update
            .col_expr(
                orders::Column::OrderStatus,
                Expr::value(OrderStatus::Confirmed.as_str()),
            )
            .filter(orders::Column::OrderStatus.eq(OrderStatus::Pending.as_str()))
    } else {
        update.filter(orders::Column::OrderStatus.eq(OrderStatus::Canceled.as_str()))
    };
    Ok(update.exec(&state.orm).await?.rows_affected > 0)
}

pub async fn advance_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_role(user, KITCHEN)?;
    let order = find_order(state, id).await?;
    ensure_restaurant(user, order.restaurant_id)?;

    let current = parse_status(&order)?;
    let next = payload.status;
    let illegal = || DomainError::IllegalTransition {
        from: current.to_string(),
        to: next.to_string(),
    };
    if !current.is_kitchen_step(next) {
        return Err(illegal().into());
    }

    let result = Orders::update_many()
        .col_expr(orders::Column::OrderStatus, Expr::value(next.as_str()))
        .col_expr(orders::Column::UpdatedAt, Expr::value(timestamp(Utc::now())))
        .filter(orders::Column::Id.eq(id))
        .filter(orders::Column::OrderStatus.eq(current.as_str()))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(illegal().into());
    }

    tracing::info!(order_id = %id, from = %current, to = %next, "order status changed");
    log_audit(
        state,
        Some(user.user_id),
        "order_status",
        "orders",
        serde_json::json!({ "order_id": id, "from": current.as_str(), "to": next.as_str() }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order status updated",
        find_order(state, id).await?.into(),
        Some(Meta::empty()),
    ))
}

fn order_list(models: Vec<orders::Model>) -> ApiResponse<OrderList> {
    let items: Vec<Order> = models.into_iter().map(Order::from).collect();
    let meta = Meta::total(items.len());
    ApiResponse::success("OK", OrderList { items }, Some(meta))
}

pub async fn my_orders(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<OrderList>> {
    let order_ids: Vec<Uuid> = UserOrders::find()
        .filter(user_orders::Column::UserId.eq(user.user_id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|row| row.order_id)
        .collect();

    let orders = Orders::find()
        .filter(orders::Column::Id.is_in(order_ids))
        .order_by_desc(orders::Column::PlacedAt)
        .all(&state.orm)
        .await?;
    Ok(order_list(orders))
}

pub async fn list_restaurant_orders(
    state: &AppState,
    user: &AuthUser,
    restaurant_id: Uuid,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_role(user, ORDER_DESK)?;
    ensure_restaurant(user, restaurant_id)?;

    let mut finder = Orders::find().filter(orders::Column::RestaurantId.eq(restaurant_id));
    if let Some(status) = query.status {
        finder = finder.filter(orders::Column::OrderStatus.eq(status.as_str()));
    }
    let orders = finder
        .order_by_desc(orders::Column::PlacedAt)
        .all(&state.orm)
        .await?;
    Ok(order_list(orders))
}

pub async fn list_orders_for_item(
    state: &AppState,
    user: &AuthUser,
    menu_item_id: Uuid,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_role(user, KITCHEN)?;
    let item = MenuItems::find()
        .filter(menu_items::Column::Id.eq(menu_item_id))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Menu item"))?;
    ensure_restaurant(user, item.restaurant_id)?;

    let orders = Orders::find()
        .filter(orders::Column::MenuItemId.eq(menu_item_id))
        .order_by_desc(orders::Column::PlacedAt)
        .all(&state.orm)
        .await?;
    Ok(order_list(orders))
}
