mod common;

use common::{TestApp, account, add_ingredient, add_menu_item, create_restaurant, create_table, seat};
use restaurant_service::{
    domain::{OrderStatus, PaymentMethod, Role},
    dto::orders::{
        OrderListQuery, PayOrderRequest, PlaceOrderRequest, UpdateOrderRequest,
        UpdateOrderStatusRequest,
    },
    error::{AppError, DomainError},
    gateway::TransactionStatus,
    middleware::auth::AuthUser,
    notifier::Notification,
    services::{inventory_service, menu_service, order_service, payment_service},
};
use uuid::Uuid;

struct Kitchen {
    restaurant_id: Uuid,
    manager: AuthUser,
    chef: AuthUser,
    customer: AuthUser,
}

const TABLE: i32 = 3;

/// A restaurant with staff and a customer already seated (paid booking) at `TABLE`.
async fn open_kitchen(app: &TestApp) -> anyhow::Result<Kitchen> {
    let restaurant_id = create_restaurant(&app.state).await?;
    let manager = account(&app.state, restaurant_id, Role::Manager).await?;
    let chef = account(&app.state, restaurant_id, Role::Chef).await?;
    let customer = account(&app.state, restaurant_id, Role::Customer).await?;
    create_table(&app.state, &manager, restaurant_id, TABLE).await?;
    seat(app, &customer, restaurant_id, TABLE).await?;
    Ok(Kitchen {
        restaurant_id,
        manager,
        chef,
        customer,
    })
}

fn order_request(quantity: i32, total_price: i64) -> PlaceOrderRequest {
    PlaceOrderRequest {
        table_number: TABLE,
        quantity,
        total_price,
        customer_name: "Sara Bekele".into(),
        phone: "+251911223344".into(),
    }
}

async fn stock_of(app: &TestApp, chef: &AuthUser, id: Uuid) -> anyhow::Result<i64> {
    let resp = inventory_service::get_ingredient(&app.state, chef, id).await?;
    Ok(resp.data.expect("ingredient").available_quantity)
}

#[tokio::test]
async fn placing_an_order_takes_the_recipe_out_of_stock() -> anyhow::Result<()> {
    let Some(app) = common::setup().await? else {
        return Ok(());
    };
    let k = open_kitchen(&app).await?;
    let flour = add_ingredient(&app.state, &k.chef, k.restaurant_id, "Teff flour", 1000).await?;
    let beef = add_ingredient(&app.state, &k.chef, k.restaurant_id, "Beef", 500).await?;
    let tibs = add_menu_item(
        &app.state,
        &k.chef,
        k.restaurant_id,
        "Tibs",
        50,
        &[(flour.id, 100), (beef.id, 50)],
    )
    .await?;

    let order = order_service::place_order(&app.state, &k.customer, tibs.id, order_request(2, 100))
        .await?
        .data
        .expect("order");
    assert_eq!(order.total_price, 100);
    assert_eq!(order.order_status, "Pending");
    assert_eq!(order.payment_status, "Pending");
    assert!(order.tx_ref.starts_with("order-"));

    assert_eq!(stock_of(&app, &k.chef, flour.id).await?, 800);
    assert_eq!(stock_of(&app, &k.chef, beef.id).await?, 400);

    let placed = app.notifier.sent_to(&k.customer.email);
    assert!(placed.iter().any(|n| matches!(
        n,
        Notification::OrderPlaced { quantity: 2, total_price: 100, .. }
    )));

    let mine = order_service::my_orders(&app.state, &k.customer).await?;
    assert_eq!(mine.data.expect("orders").items.len(), 1);
    Ok(())
}

#[tokio::test]
async fn running_out_of_stock_rolls_back_and_pulls_the_item() -> anyhow::Result<()> {
    let Some(app) = common::setup().await? else {
        return Ok(());
    };
    let k = open_kitchen(&app).await?;
    let flour = add_ingredient(&app.state, &k.chef, k.restaurant_id, "Teff flour", 1000).await?;
    let beef = add_ingredient(&app.state, &k.chef, k.restaurant_id, "Beef", 100).await?;
    let kitfo = add_menu_item(
        &app.state,
        &k.chef,
        k.restaurant_id,
        "Kitfo",
        80,
        &[(flour.id, 10), (beef.id, 60)],
    )
    .await?;

    let err = order_service::place_order(&app.state, &k.customer, kitfo.id, order_request(2, 160))
        .await
        .expect_err("not enough beef");
    assert!(matches!(
        err,
        AppError::Domain(DomainError::InsufficientStock { required: 120, available: 100, .. })
    ));

    // Nothing was taken, not even the ingredient that had enough.
    assert_eq!(stock_of(&app, &k.chef, flour.id).await?, 1000);
    assert_eq!(stock_of(&app, &k.chef, beef.id).await?, 100);
    assert!(
        order_service::my_orders(&app.state, &k.customer)
            .await?
            .data
            .expect("orders")
            .items
            .is_empty()
    );

    let menu = menu_service::list_menu(&app.state, k.restaurant_id).await?;
    let item = menu
        .data
        .expect("menu")
        .items
        .into_iter()
        .find(|item| item.id == kitfo.id)
        .expect("kitfo listed");
    assert!(!item.is_available);

    let err = order_service::place_order(&app.state, &k.customer, kitfo.id, order_request(1, 80))
        .await
        .expect_err("item is off the menu");
    assert!(matches!(err, AppError::Domain(DomainError::MenuItemUnavailable)));
    Ok(())
}

#[tokio::test]
async fn orders_need_a_seat_and_the_right_total() -> anyhow::Result<()> {
    let Some(app) = common::setup().await? else {
        return Ok(());
    };
    let k = open_kitchen(&app).await?;
    let beef = add_ingredient(&app.state, &k.chef, k.restaurant_id, "Beef", 500).await?;
    let tibs = add_menu_item(&app.state, &k.chef, k.restaurant_id, "Tibs", 50, &[(beef.id, 50)]).await?;

    let err = order_service::place_order(&app.state, &k.customer, tibs.id, order_request(2, 99))
        .await
        .expect_err("wrong total");
    assert!(matches!(
        err,
        AppError::Domain(DomainError::PriceMismatch { expected: 100, claimed: 99 })
    ));

    let walk_in = account(&app.state, k.restaurant_id, Role::Customer).await?;
    let err = order_service::place_order(&app.state, &walk_in, tibs.id, order_request(1, 50))
        .await
        .expect_err("no booking on the table");
    assert!(matches!(
        err,
        AppError::Domain(DomainError::ReservationNotOwned(TABLE))
    ));
    assert_eq!(err.status(), axum::http::StatusCode::FORBIDDEN);

    assert_eq!(stock_of(&app, &k.chef, beef.id).await?, 500);
    Ok(())
}

#[tokio::test]
async fn only_pending_unpaid_orders_can_change() -> anyhow::Result<()> {
    let Some(app) = common::setup().await? else {
        return Ok(());
    };
    let k = open_kitchen(&app).await?;
    let beef = add_ingredient(&app.state, &k.chef, k.restaurant_id, "Beef", 1000).await?;
    let tibs = add_menu_item(&app.state, &k.chef, k.restaurant_id, "Tibs", 50, &[(beef.id, 50)]).await?;

    // Editing a pending order takes only the extra stock.
    let first = order_service::place_order(&app.state, &k.customer, tibs.id, order_request(1, 50))
        .await?
        .data
        .expect("order");
    let edited = order_service::update_order(
        &app.state,
        &k.customer,
        first.id,
        UpdateOrderRequest {
            customer_name: None,
            phone: None,
            quantity: Some(3),
            total_price: 150,
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(edited.quantity, 3);
    assert_eq!(stock_of(&app, &k.chef, beef.id).await?, 850);

    // Canceling leaves stock where it is.
    let canceled = order_service::cancel_order(&app.state, &k.customer, first.id)
        .await?
        .data
        .expect("order");
    assert_eq!(canceled.order_status, "Canceled");
    assert_eq!(stock_of(&app, &k.chef, beef.id).await?, 850);

    let err = order_service::cancel_order(&app.state, &k.customer, first.id)
        .await
        .expect_err("already canceled");
    assert!(matches!(err, AppError::Domain(DomainError::IllegalTransition { .. })));

    // Paid orders are confirmed and locked.
    let second = order_service::place_order(&app.state, &k.customer, tibs.id, order_request(2, 100))
        .await?
        .data
        .expect("order");
    let initiated = order_service::initiate_payment(
        &app.state,
        &k.customer,
        second.id,
        PayOrderRequest {
            payment_method: PaymentMethod::Cbe,
        },
    )
    .await?
    .data
    .expect("checkout");
    assert_eq!(initiated.tx_ref, second.tx_ref);
    let outcome = payment_service::handle_callback(&app.state, &second.tx_ref)
        .await?
        .data
        .expect("outcome");
    assert_eq!(outcome.status, "Confirmed");
    assert_eq!(outcome.payment_status, "Paid");

    let err = order_service::cancel_order(&app.state, &k.customer, second.id)
        .await
        .expect_err("confirmed orders cannot be canceled");
    assert!(matches!(err, AppError::Domain(DomainError::IllegalTransition { .. })));
    let err = order_service::update_order(
        &app.state,
        &k.customer,
        second.id,
        UpdateOrderRequest {
            customer_name: Some("Someone else".into()),
            phone: None,
            quantity: None,
            total_price: 100,
        },
    )
    .await
    .expect_err("paid orders are locked");
    assert!(matches!(err, AppError::Domain(DomainError::OrderLocked)));
    let err = order_service::initiate_payment(
        &app.state,
        &k.customer,
        second.id,
        PayOrderRequest {
            payment_method: PaymentMethod::Cbe,
        },
    )
    .await
    .expect_err("already paid");
    assert!(matches!(err, AppError::Domain(DomainError::NotPayable)));
    Ok(())
}

#[tokio::test]
async fn kitchen_moves_paid_orders_forward_one_step_at_a_time() -> anyhow::Result<()> {
    let Some(app) = common::setup().await? else {
        return Ok(());
    };
    let k = open_kitchen(&app).await?;
    let beef = add_ingredient(&app.state, &k.chef, k.restaurant_id, "Beef", 1000).await?;
    let tibs = add_menu_item(&app.state, &k.chef, k.restaurant_id, "Tibs", 50, &[(beef.id, 50)]).await?;
    let order = order_service::place_order(&app.state, &k.customer, tibs.id, order_request(1, 50))
        .await?
        .data
        .expect("order");

    let step = |status| UpdateOrderStatusRequest { status };

    let err = order_service::advance_status(&app.state, &k.chef, order.id, step(OrderStatus::Start))
        .await
        .expect_err("unpaid orders stay with the customer");
    assert!(matches!(err, AppError::Domain(DomainError::IllegalTransition { .. })));

    let err = order_service::advance_status(&app.state, &k.customer, order.id, step(OrderStatus::Start))
        .await
        .expect_err("customers are not kitchen staff");
    assert!(matches!(err, AppError::Forbidden));

    // A failed verification leaves the order pending and retryable.
    app.gateway.set_status(TransactionStatus::Failed);
    let outcome = payment_service::handle_callback(&app.state, &order.tx_ref)
        .await?
        .data
        .expect("outcome");
    assert_eq!(outcome.status, "Pending");
    assert_eq!(outcome.payment_status, "Failed");

    app.gateway.set_status(TransactionStatus::Success);
    payment_service::handle_callback(&app.state, &order.tx_ref).await?;

    let err = order_service::advance_status(&app.state, &k.chef, order.id, step(OrderStatus::Completed))
        .await
        .expect_err("no skipping steps");
    assert!(matches!(err, AppError::Domain(DomainError::IllegalTransition { .. })));

    for next in [OrderStatus::Start, OrderStatus::Inprogress, OrderStatus::Completed] {
        let updated = order_service::advance_status(&app.state, &k.chef, order.id, step(next))
            .await?
            .data
            .expect("order");
        assert_eq!(updated.order_status, next.as_str());
    }

    let board = order_service::list_restaurant_orders(
        &app.state,
        &k.manager,
        k.restaurant_id,
        OrderListQuery {
            status: Some(OrderStatus::Completed),
        },
    )
    .await?;
    assert_eq!(board.data.expect("orders").items.len(), 1);
    Ok(())
}

#[tokio::test]
async fn crossing_the_low_stock_line_tells_the_manager() -> anyhow::Result<()> {
    let Some(app) = common::setup().await? else {
        return Ok(());
    };
    let k = open_kitchen(&app).await?;
    let beef = add_ingredient(&app.state, &k.chef, k.restaurant_id, "Beef", 1000).await?;
    let tibs = add_menu_item(&app.state, &k.chef, k.restaurant_id, "Tibs", 50, &[(beef.id, 200)]).await?;

    // 1000 -> 200: still above 15%.
    order_service::place_order(&app.state, &k.customer, tibs.id, order_request(4, 200)).await?;
    assert!(
        !app.notifier
            .sent_to(&k.manager.email)
            .iter()
            .any(|n| matches!(n, Notification::LowStock { .. }))
    );

    // 200 -> 0: crosses the line exactly once.
    order_service::place_order(&app.state, &k.customer, tibs.id, order_request(1, 50)).await?;
    let reports: Vec<Notification> = app
        .notifier
        .sent_to(&k.manager.email)
        .into_iter()
        .filter(|n| matches!(n, Notification::LowStock { .. }))
        .collect();
    assert_eq!(reports.len(), 1);

    let low = inventory_service::list_low_stock(&app.state, &k.chef, k.restaurant_id)
        .await?
        .data
        .expect("low stock");
    assert!(low.items.iter().any(|item| item.id == beef.id));
    Ok(())
}
