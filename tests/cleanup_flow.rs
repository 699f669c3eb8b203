mod common;

use chrono::{Duration, Utc};
use common::{account, add_ingredient, add_menu_item, book, create_restaurant, create_table, seat, window};
use restaurant_service::{
    domain::Role,
    dto::orders::PlaceOrderRequest,
    error::AppError,
    gateway::{TransactionStatus, VerifiedTransaction},
    notifier::Notification,
    services::{cleanup_service, order_service, payment_service, reservation_service},
};

// One test per binary: sweeps touch every row in the database.
#[tokio::test]
async fn sweeps_expire_unpaid_records_and_purge_old_cancellations() -> anyhow::Result<()> {
    let Some(app) = common::setup().await? else {
        return Ok(());
    };
    let restaurant_id = create_restaurant(&app.state).await?;
    let manager = account(&app.state, restaurant_id, Role::Manager).await?;
    let chef = account(&app.state, restaurant_id, Role::Chef).await?;
    let customer = account(&app.state, restaurant_id, Role::Customer).await?;
    create_table(&app.state, &manager, restaurant_id, 1).await?;
    create_table(&app.state, &manager, restaurant_id, 2).await?;
    seat(&app, &customer, restaurant_id, 1).await?;

    let beef = add_ingredient(&app.state, &chef, restaurant_id, "Beef", 1000).await?;
    let tibs = add_menu_item(&app.state, &chef, restaurant_id, "Tibs", 50, &[(beef.id, 10)]).await?;
    let request = || PlaceOrderRequest {
        table_number: 1,
        quantity: 1,
        total_price: 50,
        customer_name: "Sara Bekele".into(),
        phone: "+251911223344".into(),
    };
    let unpaid = order_service::place_order(&app.state, &customer, tibs.id, request())
        .await?
        .data
        .expect("order");
    let paid = order_service::place_order(&app.state, &customer, tibs.id, request())
        .await?
        .data
        .expect("order");
    payment_service::handle_callback(&app.state, &paid.tx_ref).await?;
    let late = order_service::place_order(&app.state, &customer, tibs.id, request())
        .await?
        .data
        .expect("order");
    let late_snapshot = order_service::find_order(&app.state, late.id).await?;
    let success = VerifiedTransaction {
        status: TransactionStatus::Success,
        reference: Some("chapa-late".into()),
    };

    // Nothing is stale yet.
    cleanup_service::cancel_stale_orders(&app.state, Utc::now()).await?;
    assert_eq!(order_service::find_order(&app.state, unpaid.id).await?.order_status, "Pending");

    // Seven hours later the unpaid order has expired; the paid one is untouched.
    let later = Utc::now() + Duration::hours(7);
    let canceled = cleanup_service::cancel_stale_orders(&app.state, later).await?;
    assert!(canceled >= 1);
    let expired = order_service::find_order(&app.state, unpaid.id).await?;
    assert_eq!(expired.order_status, "Canceled");
    assert_eq!(expired.payment_status, "Failed");
    let kept = order_service::find_order(&app.state, paid.id).await?;
    assert_eq!(kept.order_status, "Confirmed");
    assert_eq!(kept.payment_status, "Paid");

    // Money for an order canceled between read and write is still recorded.
    let recorded = order_service::reconcile_payment(&app.state, late_snapshot, &success).await?;
    assert_eq!(recorded.order_status, "Canceled");
    assert_eq!(recorded.payment_status, "Paid");
    assert_eq!(recorded.amount_paid, 50);
    assert_eq!(recorded.transaction_id.as_deref(), Some("chapa-late"));

    // Unpaid bookings starting within a day expire; later ones keep waiting.
    let soon = book(&app.state, &customer, restaurant_id, 2, window(10, 2)).await?;
    let far = book(&app.state, &customer, restaurant_id, 2, window(96, 2)).await?;
    let late_booking = book(&app.state, &customer, restaurant_id, 2, window(12, 2)).await?;
    let booking_snapshot = reservation_service::find_booking(&app.state, late_booking.id).await?;
    cleanup_service::cancel_stale_bookings(&app.state, Utc::now()).await?;
    let soon = reservation_service::find_booking(&app.state, soon.id).await?;
    assert_eq!(soon.reservation_status, "Canceled");
    assert_eq!(soon.payment_status, "Failed");
    assert_eq!(
        reservation_service::find_booking(&app.state, far.id).await?.reservation_status,
        "Pending"
    );

    let recorded =
        reservation_service::reconcile_payment(&app.state, booking_snapshot, &success).await?;
    assert_eq!(recorded.reservation_status, "Canceled");
    assert_eq!(recorded.payment_status, "Paid");
    assert_eq!(recorded.amount_paid, 500);
    let confirmed = app
        .notifier
        .sent_to(&customer.email)
        .iter()
        .filter(|n| matches!(n, Notification::PaymentConfirmed { .. }))
        .count();
    // Only the seat and the paid order were confirmed.
    assert_eq!(confirmed, 2);

    // Purging only reaches records canceled long enough ago.
    assert_eq!(
        cleanup_service::purge_canceled_orders(&app.state, Utc::now() - Duration::days(365)).await?,
        0
    );
    let month_later = Utc::now() + Duration::days(31);
    assert!(cleanup_service::purge_canceled_orders(&app.state, month_later).await? >= 1);
    assert!(cleanup_service::purge_canceled_bookings(&app.state, month_later).await? >= 1);

    assert!(matches!(
        order_service::find_order(&app.state, unpaid.id).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        reservation_service::find_booking(&app.state, soon.id).await,
        Err(AppError::NotFound(_))
    ));
    assert!(order_service::find_order(&app.state, paid.id).await.is_ok());
    assert!(reservation_service::find_booking(&app.state, far.id).await.is_ok());

    // Canceled but paid records wait for a refund instead of being purged.
    let awaiting_refund = order_service::find_order(&app.state, late.id).await?;
    assert_eq!(awaiting_refund.payment_status, "Paid");
    let awaiting_refund = reservation_service::find_booking(&app.state, late_booking.id).await?;
    assert_eq!(awaiting_refund.payment_status, "Paid");

    let mine = order_service::my_orders(&app.state, &customer)
        .await?
        .data
        .expect("orders");
    assert_eq!(mine.items.len(), 2);

    let (purges,): (i64,) =
        sqlx::query_as("SELECT count(*) FROM audit_logs WHERE action = 'purge_orders'")
            .fetch_one(app.state.orm.get_postgres_connection_pool())
            .await?;
    assert!(purges >= 1);
    Ok(())
}
