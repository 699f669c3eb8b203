mod common;

use chrono::Duration;
use common::{TestApp, account, book, create_restaurant, create_table, window};
use restaurant_service::{
    domain::{PaymentMethod, Role},
    dto::{
        payments::PaidResource,
        reservations::{CancelBookingRequest, PayBookingRequest},
    },
    error::{AppError, DomainError},
    gateway::TransactionStatus,
    middleware::auth::AuthUser,
    notifier::Notification,
    services::{payment_service, reservation_service},
};
use uuid::Uuid;

const TABLE: i32 = 5;

struct Floor {
    restaurant_id: Uuid,
    waiter: AuthUser,
    sara: AuthUser,
    abel: AuthUser,
}

async fn open_floor(app: &TestApp) -> anyhow::Result<Floor> {
    let restaurant_id = create_restaurant(&app.state).await?;
    let manager = account(&app.state, restaurant_id, Role::Manager).await?;
    let waiter = account(&app.state, restaurant_id, Role::Waiter).await?;
    let sara = account(&app.state, restaurant_id, Role::Customer).await?;
    let abel = account(&app.state, restaurant_id, Role::Customer).await?;
    create_table(&app.state, &manager, restaurant_id, TABLE).await?;
    Ok(Floor {
        restaurant_id,
        waiter,
        sara,
        abel,
    })
}

async fn pay(app: &TestApp, customer: &AuthUser, restaurant_id: Uuid) -> anyhow::Result<String> {
    let initiated = reservation_service::initiate_payment(
        &app.state,
        customer,
        restaurant_id,
        PayBookingRequest {
            table_number: TABLE,
            payment_method: PaymentMethod::Telebirr,
        },
    )
    .await?
    .data
    .expect("checkout");
    Ok(initiated.tx_ref)
}

fn confirmations(app: &TestApp, customer: &AuthUser) -> usize {
    app.notifier
        .sent_to(&customer.email)
        .iter()
        .filter(|n| matches!(n, Notification::PaymentConfirmed { .. }))
        .count()
}

#[tokio::test]
async fn confirmed_bookings_block_overlapping_windows() -> anyhow::Result<()> {
    let Some(app) = common::setup().await? else {
        return Ok(());
    };
    let f = open_floor(&app).await?;
    let (noon, two) = window(48, 2);

    let booking = book(&app.state, &f.sara, f.restaurant_id, TABLE, (noon, two)).await?;
    assert_eq!(booking.reservation_status, "Pending");
    assert!(app.notifier.sent_to(&f.sara.email).iter().any(|n| matches!(
        n,
        Notification::BookingConfirmation { table_number: TABLE, prepayment_amount: 500, .. }
    )));

    let tx_ref = pay(&app, &f.sara, f.restaurant_id).await?;
    assert_eq!(tx_ref, booking.tx_ref);
    let checkout = app.gateway.initialized.lock().unwrap().last().cloned().expect("checkout");
    assert_eq!(checkout.amount, 500);
    assert_eq!(checkout.currency, "ETB");
    assert!(checkout.callback_url.ends_with(&format!("tx_ref={tx_ref}")));

    let outcome = payment_service::handle_callback(&app.state, &tx_ref)
        .await?
        .data
        .expect("outcome");
    assert_eq!(outcome.resource, PaidResource::Reservation);
    assert_eq!(outcome.status, "Confirmed");
    assert_eq!(outcome.payment_status, "Paid");

    let err = book(
        &app.state,
        &f.abel,
        f.restaurant_id,
        TABLE,
        (noon + Duration::hours(1), two + Duration::hours(1)),
    )
    .await
    .expect_err("overlaps the confirmed booking");
    assert!(matches!(err, AppError::Domain(DomainError::TimeConflict)));

    // Windows are half-open: starting exactly at the end is fine.
    book(&app.state, &f.abel, f.restaurant_id, TABLE, (two, two + Duration::hours(2))).await?;

    let err = book(&app.state, &f.abel, f.restaurant_id, TABLE, (two, noon))
        .await
        .expect_err("end before start");
    assert!(matches!(err, AppError::Domain(DomainError::InvalidWindow)));

    let err = book(&app.state, &f.abel, f.restaurant_id, 99, window(72, 1))
        .await
        .expect_err("no such table");
    assert!(matches!(err, AppError::Domain(DomainError::TableNotFound(99))));
    Ok(())
}

#[tokio::test]
async fn replayed_callbacks_change_nothing() -> anyhow::Result<()> {
    let Some(app) = common::setup().await? else {
        return Ok(());
    };
    let f = open_floor(&app).await?;
    book(&app.state, &f.sara, f.restaurant_id, TABLE, window(48, 2)).await?;
    let tx_ref = pay(&app, &f.sara, f.restaurant_id).await?;

    let first = payment_service::handle_callback(&app.state, &tx_ref)
        .await?
        .data
        .expect("outcome");
    let second = payment_service::handle_callback(&app.state, &tx_ref)
        .await?
        .data
        .expect("outcome");
    assert_eq!(first.status, "Confirmed");
    assert_eq!(second.status, "Confirmed");
    assert_eq!(second.payment_status, "Paid");
    assert_eq!(confirmations(&app, &f.sara), 1);

    // A late failure verdict does not undo a recorded payment.
    app.gateway.set_status(TransactionStatus::Failed);
    let third = payment_service::handle_callback(&app.state, &tx_ref)
        .await?
        .data
        .expect("outcome");
    assert_eq!(third.payment_status, "Paid");
    assert_eq!(third.status, "Confirmed");

    let booking = reservation_service::find_booking(&app.state, first.id).await?;
    assert_eq!(booking.amount_paid, 500);
    assert_eq!(booking.transaction_id.as_deref(), Some(format!("ref-{tx_ref}").as_str()));
    Ok(())
}

#[tokio::test]
async fn unknown_references_are_rejected_before_verification() -> anyhow::Result<()> {
    let Some(app) = common::setup().await? else {
        return Ok(());
    };
    let err = payment_service::handle_callback(&app.state, "reservation-does-not-exist")
        .await
        .expect_err("unknown tx_ref");
    assert!(matches!(err, AppError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn second_payment_for_a_taken_slot_is_kept_but_canceled() -> anyhow::Result<()> {
    let Some(app) = common::setup().await? else {
        return Ok(());
    };
    let f = open_floor(&app).await?;
    let slot = window(48, 2);

    // Pending bookings do not block each other.
    book(&app.state, &f.sara, f.restaurant_id, TABLE, slot).await?;
    book(&app.state, &f.abel, f.restaurant_id, TABLE, slot).await?;
    let sara_ref = pay(&app, &f.sara, f.restaurant_id).await?;
    let abel_ref = pay(&app, &f.abel, f.restaurant_id).await?;

    let sara = payment_service::handle_callback(&app.state, &sara_ref)
        .await?
        .data
        .expect("outcome");
    assert_eq!(sara.status, "Confirmed");

    let abel = payment_service::handle_callback(&app.state, &abel_ref)
        .await?
        .data
        .expect("outcome");
    assert_eq!(abel.status, "Canceled");
    assert_eq!(abel.payment_status, "Paid");
    assert_eq!(confirmations(&app, &f.abel), 0);
    Ok(())
}

#[tokio::test]
async fn cancel_and_complete_follow_the_reservation_lifecycle() -> anyhow::Result<()> {
    let Some(app) = common::setup().await? else {
        return Ok(());
    };
    let f = open_floor(&app).await?;
    let cancel_request = || CancelBookingRequest { table_number: TABLE };

    book(&app.state, &f.abel, f.restaurant_id, TABLE, window(48, 2)).await?;
    let canceled = reservation_service::cancel(&app.state, &f.abel, f.restaurant_id, cancel_request())
        .await?
        .data
        .expect("booking");
    assert_eq!(canceled.reservation_status, "Canceled");
    assert!(app.notifier.sent_to(&f.abel.email).iter().any(|n| matches!(
        n,
        Notification::BookingCancellation { table_number: TABLE, .. }
    )));

    let err = reservation_service::cancel(&app.state, &f.abel, f.restaurant_id, cancel_request())
        .await
        .expect_err("nothing left to cancel");
    assert!(matches!(err, AppError::Domain(DomainError::BookingNotCancelable)));

    let err = pay(&app, &f.abel, f.restaurant_id).await.expect_err("canceled bookings are not payable");
    assert!(err.to_string().contains("Not in a payable state"));

    let booking = book(&app.state, &f.sara, f.restaurant_id, TABLE, window(72, 2)).await?;
    let tx_ref = pay(&app, &f.sara, f.restaurant_id).await?;
    payment_service::handle_callback(&app.state, &tx_ref).await?;

    let err = reservation_service::cancel(&app.state, &f.sara, f.restaurant_id, cancel_request())
        .await
        .expect_err("paid bookings stay");
    assert!(matches!(err, AppError::Domain(DomainError::BookingNotCancelable)));

    let err = reservation_service::complete(&app.state, &f.sara, booking.id)
        .await
        .expect_err("customers cannot complete bookings");
    assert!(matches!(err, AppError::Forbidden));

    let done = reservation_service::complete(&app.state, &f.waiter, booking.id)
        .await?
        .data
        .expect("booking");
    assert_eq!(done.reservation_status, "Completed");

    let err = reservation_service::complete(&app.state, &f.waiter, booking.id)
        .await
        .expect_err("already completed");
    assert!(matches!(err, AppError::Domain(DomainError::IllegalTransition { .. })));

    let mine = reservation_service::my_reservations(&app.state, &f.sara)
        .await?
        .data
        .expect("bookings");
    assert_eq!(mine.items.len(), 1);
    Ok(())
}
