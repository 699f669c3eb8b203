use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, LockType},
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    domain::{PaymentStatus, ReservationStatus, rules},
    dto::{
        payments::PaymentInitiated,
        reservations::{BookTableRequest, BookingList, CancelBookingRequest, PayBookingRequest},
    },
    entity::{
        Bookings, DiningTables, UserReservations, Users,
        bookings::{self, ActiveModel as BookingActive},
        dining_tables,
        user_reservations::{self, ActiveModel as UserReservationActive},
    },
    error::{AppError, AppResult, DomainError},
    gateway::{InitializeTransaction, Payer, VerifiedTransaction},
    middleware::auth::{AuthUser, FLOOR, ensure_restaurant, ensure_role},
    models::Booking,
    notifier::{self, Notification, PaymentTarget},
    response::{ApiResponse, Meta},
    services::{
        restaurant_service::{find_restaurant, find_table},
        timestamp,
    },
    state::AppState,
};

pub async fn find_booking(state: &AppState, id: Uuid) -> AppResult<bookings::Model> {
    Bookings::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Booking"))
}

/// A confirmed booking on `table_id` overlapping `[starts_at, ends_at)`, other than `except`.
async fn confirmed_overlap<C: ConnectionTrait>(
    conn: &C,
    table_id: Uuid,
    starts_at: sea_orm::prelude::DateTimeWithTimeZone,
    ends_at: sea_orm::prelude::DateTimeWithTimeZone,
    except: Option<Uuid>,
) -> AppResult<Option<bookings::Model>> {
    let mut finder = Bookings::find()
        .filter(bookings::Column::TableId.eq(table_id))
        .filter(bookings::Column::ReservationStatus.eq(ReservationStatus::Confirmed.as_str()))
        .filter(bookings::Column::StartsAt.lt(ends_at))
        .filter(bookings::Column::EndsAt.gt(starts_at));
    if let Some(id) = except {
        finder = finder.filter(bookings::Column::Id.ne(id));
    }
    Ok(finder.one(conn).await?)
}

pub async fn book(
    state: &AppState,
    user: &AuthUser,
    restaurant_id: Uuid,
    payload: BookTableRequest,
) -> AppResult<ApiResponse<Booking>> {
    if payload.starts_at >= payload.ends_at {
        return Err(DomainError::InvalidWindow.into());
    }
    let restaurant = find_restaurant(state, restaurant_id).await?;

    let txn = state.orm.begin().await?;
    // Row lock on the table serialises concurrent bookings of it.
    let table = DiningTables::find()
        .filter(dining_tables::Column::RestaurantId.eq(restaurant_id))
        .filter(dining_tables::Column::TableNumber.eq(payload.table_number))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::Domain(DomainError::TableNotFound(
            payload.table_number,
        )))?;

    let starts_at = timestamp(payload.starts_at);
    let ends_at = timestamp(payload.ends_at);
    if confirmed_overlap(&txn, table.id, starts_at, ends_at, None)
        .await?
        .is_some()
    {
        return Err(DomainError::TimeConflict.into());
    }

    let now = timestamp(Utc::now());
    let booking = BookingActive {
        id: Set(Uuid::new_v4()),
        table_id: Set(table.id),
        user_id: Set(user.user_id),
        customer_name: Set(payload.customer_name),
        customer_phone: Set(payload.phone),
        starts_at: Set(starts_at),
        ends_at: Set(ends_at),
        reservation_status: Set(ReservationStatus::Pending.as_str().to_string()),
        payment_method: Set(None),
        payment_status: Set(PaymentStatus::Pending.as_str().to_string()),
        amount_paid: Set(0),
        tx_ref: Set(rules::new_booking_tx_ref()),
        transaction_id: Set(None),
        payment_date: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;

    UserReservationActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        table_id: Set(table.id),
        booking_id: Set(booking.id),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    tracing::info!(booking_id = %booking.id, table_number = table.table_number, "table booked");
    notifier::dispatch(
        state.notifier.as_ref(),
        &user.email,
        Notification::BookingConfirmation {
            customer_name: booking.customer_name.clone(),
            table_number: table.table_number,
            starts_at: payload.starts_at,
            ends_at: payload.ends_at,
            prepayment_amount: table.prepayment_amount,
            currency: restaurant.currency,
        },
    )
    .await;
    log_audit(
        state,
        Some(user.user_id),
        "booking_create",
        "bookings",
        serde_json::json!({ "booking_id": booking.id, "tx_ref": booking.tx_ref }),
    )
    .await;

    Ok(ApiResponse::success(
        "Table reserved, pay the prepayment to confirm",
        booking.into(),
        Some(Meta::empty()),
    ))
}

/// The caller's most recent booking on a table matching `condition`.
async fn latest_own_booking(
    state: &AppState,
    user: &AuthUser,
    table_id: Uuid,
    condition: Condition,
) -> AppResult<Option<bookings::Model>> {
    let booking = Bookings::find()
        .filter(bookings::Column::TableId.eq(table_id))
        .filter(bookings::Column::UserId.eq(user.user_id))
        .filter(condition)
        .order_by_desc(bookings::Column::CreatedAt)
        .one(&state.orm)
        .await?;
    Ok(booking)
}

fn cancelable() -> Condition {
    let unpaid = bookings::Column::PaymentStatus.ne(PaymentStatus::Paid.as_str());
    Condition::any()
        .add(bookings::Column::ReservationStatus.eq(ReservationStatus::Pending.as_str()))
        .add(
            Condition::all()
                .add(bookings::Column::ReservationStatus.eq(ReservationStatus::Confirmed.as_str()))
                .add(unpaid),
        )
}

fn payable() -> Condition {
    Condition::all()
        .add(bookings::Column::ReservationStatus.eq(ReservationStatus::Pending.as_str()))
        .add(bookings::Column::PaymentStatus.ne(PaymentStatus::Paid.as_str()))
}

pub async fn cancel(
    state: &AppState,
    user: &AuthUser,
    restaurant_id: Uuid,
    payload: CancelBookingRequest,
) -> AppResult<ApiResponse<Booking>> {
    let table = find_table(state, restaurant_id, payload.table_number).await?;
    let booking = latest_own_booking(state, user, table.id, cancelable())
        .await?
        .ok_or(AppError::Domain(DomainError::BookingNotCancelable))?;

    let current: ReservationStatus = booking
        .reservation_status
        .parse()
        .map_err(anyhow::Error::from)?;
    if !current.can_transition_to(ReservationStatus::Canceled) {
        return Err(DomainError::BookingNotCancelable.into());
    }

    let result = Bookings::update_many()
        .col_expr(
            bookings::Column::ReservationStatus,
            Expr::value(ReservationStatus::Canceled.as_str()),
        )
        .col_expr(bookings::Column::UpdatedAt, Expr::value(timestamp(Utc::now())))
        .filter(bookings::Column::Id.eq(booking.id))
        .filter(bookings::Column::ReservationStatus.eq(current.as_str()))
        .filter(bookings::Column::PaymentStatus.ne(PaymentStatus::Paid.as_str()))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(DomainError::BookingNotCancelable.into());
    }

    let booking = find_booking(state, booking.id).await?;
    tracing::info!(booking_id = %booking.id, "booking canceled");
    notifier::dispatch(
        state.notifier.as_ref(),
        &user.email,
        Notification::BookingCancellation {
            customer_name: booking.customer_name.clone(),
            table_number: table.table_number,
            starts_at: booking.starts_at.with_timezone(&Utc),
        },
    )
    .await;
    log_audit(
        state,
        Some(user.user_id),
        "booking_cancel",
        "bookings",
        serde_json::json!({ "booking_id": booking.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Reservation canceled",
        booking.into(),
        Some(Meta::empty()),
    ))
}

pub async fn initiate_payment(
    state: &AppState,
    user: &AuthUser,
    restaurant_id: Uuid,
    payload: PayBookingRequest,
) -> AppResult<ApiResponse<PaymentInitiated>> {
    let restaurant = find_restaurant(state, restaurant_id).await?;
    let table = find_table(state, restaurant_id, payload.table_number).await?;
    let booking = latest_own_booking(state, user, table.id, payable())
        .await?
        .ok_or(AppError::Domain(DomainError::NotPayable))?;

    let payment = &state.config.payment;
    let request = InitializeTransaction {
        amount: table.prepayment_amount,
        currency: restaurant.currency.clone(),
        payer: Payer::new(&user.email, &booking.customer_name, &booking.customer_phone),
        tx_ref: booking.tx_ref.clone(),
        callback_url: payment.callback_url(&booking.tx_ref),
        return_url: payment.return_url("reservationId", booking.id, &booking.tx_ref),
        title: "Table reservation".into(),
        description: format!(
            "Prepayment for table {} at {}",
            table.table_number, restaurant.name
        ),
    };
    let checkout_url = state.gateway.initialize_transaction(&request).await?;

    Bookings::update_many()
        .col_expr(
            bookings::Column::PaymentMethod,
            Expr::value(payload.payment_method.as_str()),
        )
        .col_expr(bookings::Column::UpdatedAt, Expr::value(timestamp(Utc::now())))
        .filter(bookings::Column::Id.eq(booking.id))
        .filter(payable())
        .exec(&state.orm)
        .await?;

    tracing::info!(booking_id = %booking.id, tx_ref = %booking.tx_ref, "reservation payment initiated");
    Ok(ApiResponse::success(
        "Payment initiated",
        PaymentInitiated {
            tx_ref: booking.tx_ref,
            checkout_url,
        },
        Some(Meta::empty()),
    ))
}

/// Converges a booking onto the gateway's verdict for its tx_ref.
///
/// Success confirms a pending booking unless its window now collides with another
/// confirmed one; a late success on a canceled booking is recorded but left canceled.
/// Any other verdict marks an unpaid pending booking as failed. Paid bookings never move.
pub async fn reconcile_payment(
    state: &AppState,
    booking: bookings::Model,
    verified: &VerifiedTransaction,
) -> AppResult<bookings::Model> {
    let now = timestamp(Utc::now());

    if !verified.status.is_success() {
        Bookings::update_many()
            .col_expr(
                bookings::Column::PaymentStatus,
                Expr::value(PaymentStatus::Failed.as_str()),
            )
            .col_expr(bookings::Column::AmountPaid, Expr::value(0i64))
            .col_expr(bookings::Column::UpdatedAt, Expr::value(now))
            .filter(bookings::Column::Id.eq(booking.id))
            .filter(payable())
            .exec(&state.orm)
            .await?;
        tracing::info!(booking_id = %booking.id, tx_ref = %booking.tx_ref, "reservation payment failed");
        return find_booking(state, booking.id).await;
    }

    if booking.payment_status == PaymentStatus::Paid.as_str() {
        return Ok(booking);
    }

    let txn = state.orm.begin().await?;
    let table = DiningTables::find_by_id(booking.table_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Table"))?;

    let pending = booking.reservation_status == ReservationStatus::Pending.as_str();
    let collides = confirmed_overlap(
        &txn,
        table.id,
        booking.starts_at,
        booking.ends_at,
        Some(booking.id),
    )
    .await?
    .is_some();
    let mut confirm = pending && !collides;
    let expected = pending.then_some(ReservationStatus::Pending);
    let mut wrote = mark_paid(&txn, &booking, &table, verified, now, confirm, expected).await?;
    if !wrote && pending {
        // Canceled (by the sweep or the customer) after it was read.
        confirm = false;
        wrote = mark_paid(
            &txn,
            &booking,
            &table,
            verified,
            now,
            false,
            Some(ReservationStatus::Canceled),
        )
        .await?;
    }
    txn.commit().await?;

    if !wrote {
        return find_booking(state, booking.id).await;
    }
    let next = if confirm {
        ReservationStatus::Confirmed
    } else {
        ReservationStatus::Canceled
    };

    if confirm {
        tracing::info!(booking_id = %booking.id, tx_ref = %booking.tx_ref, "reservation confirmed");
        let restaurant = find_restaurant(state, table.restaurant_id).await?;
        if let Some(customer) = Users::find_by_id(booking.user_id).one(&state.orm).await? {
            notifier::dispatch(
                state.notifier.as_ref(),
                &customer.email,
                Notification::PaymentConfirmed {
                    target: PaymentTarget::Reservation,
                    tx_ref: booking.tx_ref.clone(),
                    amount: table.prepayment_amount,
                    currency: restaurant.currency,
                },
            )
            .await;
        }
    } else {
        tracing::warn!(
            booking_id = %booking.id,
            tx_ref = %booking.tx_ref,
            amount = table.prepayment_amount,
            "payment received for a canceled or conflicting booking, refund required"
        );
    }
    log_audit(
        state,
        Some(booking.user_id),
        "booking_payment",
        "bookings",
        serde_json::json!({
            "booking_id": booking.id,
            "tx_ref": booking.tx_ref,
            "status": next.as_str(),
        }),
    )
    .await;

    find_booking(state, booking.id).await
}

/// Records the payment and moves the booking to Confirmed (`confirm`) or Canceled,
/// provided it is still unpaid and, when given, in the `expected` status.
async fn mark_paid<C: ConnectionTrait>(
    conn: &C,
    booking: &bookings::Model,
    table: &dining_tables::Model,
    verified: &VerifiedTransaction,
    now: sea_orm::prelude::DateTimeWithTimeZone,
    confirm: bool,
    expected: Option<ReservationStatus>,
) -> AppResult<bool> {
    let next = if confirm {
        ReservationStatus::Confirmed
    } else {
        ReservationStatus::Canceled
    };
    let mut update = Bookings::update_many()
        .col_expr(
            bookings::Column::PaymentStatus,
            Expr::value(PaymentStatus::Paid.as_str()),
        )
        .col_expr(
            bookings::Column::AmountPaid,
            Expr::value(table.prepayment_amount),
        )
        .col_expr(
            bookings::Column::TransactionId,
            Expr::value(verified.reference.clone()),
        )
        .col_expr(bookings::Column::PaymentDate, Expr::value(now))
        .col_expr(bookings::Column::ReservationStatus, Expr::value(next.as_str()))
        .col_expr(bookings::Column::UpdatedAt, Expr::value(now))
        .filter(bookings::Column::Id.eq(booking.id))
        .filter(bookings::Column::PaymentStatus.ne(PaymentStatus::Paid.as_str()));
    if let Some(status) = expected {
        update = update.filter(bookings::Column::ReservationStatus.eq(status.as_str()));
    }
    Ok(update.exec(conn).await?.rows_affected > 0)
}

pub async fn complete(
    state: &AppState,
    user: &AuthUser,
    booking_id: Uuid,
) -> AppResult<ApiResponse<Booking>> {
    ensure_role(user, FLOOR)?;
    let booking = find_booking(state, booking_id).await?;
    let table = DiningTables::find_by_id(booking.table_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Table"))?;
    ensure_restaurant(user, table.restaurant_id)?;

    let current: ReservationStatus = booking
        .reservation_status
        .parse()
        .map_err(anyhow::Error::from)?;
    let illegal = || DomainError::IllegalTransition {
        from: current.to_string(),
        to: ReservationStatus::Completed.to_string(),
    };
    if !current.can_transition_to(ReservationStatus::Completed) {
        return Err(illegal().into());
    }

    let result = Bookings::update_many()
        .col_expr(
            bookings::Column::ReservationStatus,
            Expr::value(ReservationStatus::Completed.as_str()),
        )
        .col_expr(bookings::Column::UpdatedAt, Expr::value(timestamp(Utc::now())))
        .filter(bookings::Column::Id.eq(booking_id))
        .filter(bookings::Column::ReservationStatus.eq(current.as_str()))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(illegal().into());
    }

    Ok(ApiResponse::success(
        "Reservation completed",
        find_booking(state, booking_id).await?.into(),
        Some(Meta::empty()),
    ))
}

pub async fn my_reservations(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<BookingList>> {
    let booking_ids: Vec<Uuid> = UserReservations::find()
        .filter(user_reservations::Column::UserId.eq(user.user_id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|row| row.booking_id)
        .collect();

    let items: Vec<Booking> = Bookings::find()
        .filter(bookings::Column::Id.is_in(booking_ids))
        .order_by_desc(bookings::Column::StartsAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Booking::from)
        .collect();

    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("OK", BookingList { items }, Some(meta)))
}
