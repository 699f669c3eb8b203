//! Sweeps that expire unpaid records and purge old canceled ones.

use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QuerySelect, TransactionTrait, sea_query::Expr};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    domain::{OrderStatus, PaymentStatus, ReservationStatus, rules},
    entity::{Bookings, Orders, UserOrders, UserReservations, bookings, orders, user_orders, user_reservations},
    error::AppResult,
    services::timestamp,
    state::AppState,
};

/// Cancels pending, unpaid orders placed more than six hours before `now`.
pub async fn cancel_stale_orders(state: &AppState, now: DateTime<Utc>) -> AppResult<u64> {
    let cutoff = timestamp(rules::stale_order_cutoff(now));
    let result = Orders::update_many()
        .col_expr(
            orders::Column::OrderStatus,
            Expr::value(OrderStatus::Canceled.as_str()),
        )
        .col_expr(
            orders::Column::PaymentStatus,
            Expr::value(PaymentStatus::Failed.as_str()),
        )
        .col_expr(orders::Column::UpdatedAt, Expr::value(timestamp(now)))
        .filter(orders::Column::OrderStatus.eq(OrderStatus::Pending.as_str()))
        .filter(orders::Column::PaymentStatus.ne(PaymentStatus::Paid.as_str()))
        .filter(orders::Column::PlacedAt.lte(cutoff))
        .exec(&state.orm)
        .await?;

    let count = result.rows_affected;
    if count > 0 {
        tracing::info!(count, "stale orders canceled");
        log_audit(
            state,
            None,
            "sweep_stale_orders",
            "orders",
            serde_json::json!({ "count": count }),
        )
        .await;
    }
    Ok(count)
}

/// Cancels pending, unpaid bookings starting within the next 24 hours (or already started).
pub async fn cancel_stale_bookings(state: &AppState, now: DateTime<Utc>) -> AppResult<u64> {
    let cutoff = timestamp(rules::stale_booking_cutoff(now));
    let result = Bookings::update_many()
        .col_expr(
            bookings::Column::ReservationStatus,
            Expr::value(ReservationStatus::Canceled.as_str()),
        )
        .col_expr(
            bookings::Column::PaymentStatus,
            Expr::value(PaymentStatus::Failed.as_str()),
        )
        .col_expr(bookings::Column::UpdatedAt, Expr::value(timestamp(now)))
        .filter(bookings::Column::ReservationStatus.eq(ReservationStatus::Pending.as_str()))
        .filter(bookings::Column::PaymentStatus.ne(PaymentStatus::Paid.as_str()))
        .filter(bookings::Column::StartsAt.lte(cutoff))
        .exec(&state.orm)
        .await?;

    let count = result.rows_affected;
    if count > 0 {
        tracing::info!(count, "stale bookings canceled");
        log_audit(
            state,
            None,
            "sweep_stale_bookings",
            "bookings",
            serde_json::json!({ "count": count }),
        )
        .await;
    }
    Ok(count)
}

/// Deletes orders canceled for over 30 days together with their user index rows.
/// Canceled but paid orders are kept until refunded.
pub async fn purge_canceled_orders(state: &AppState, now: DateTime<Utc>) -> AppResult<u64> {
    let cutoff = timestamp(rules::retention_cutoff(now));
    let txn = state.orm.begin().await?;

    let ids: Vec<Uuid> = Orders::find()
        .select_only()
        .column(orders::Column::Id)
        .filter(orders::Column::OrderStatus.eq(OrderStatus::Canceled.as_str()))
        .filter(orders::Column::PaymentStatus.ne(PaymentStatus::Paid.as_str()))
        .filter(orders::Column::PlacedAt.lte(cutoff))
        .into_tuple()
        .all(&txn)
        .await?;
    if ids.is_empty() {
        return Ok(0);
    }

    UserOrders::delete_many()
        .filter(user_orders::Column::OrderId.is_in(ids.clone()))
        .exec(&txn)
        .await?;
    let deleted = Orders::delete_many()
        .filter(orders::Column::Id.is_in(ids))
        .exec(&txn)
        .await?
        .rows_affected;
    txn.commit().await?;

    tracing::info!(count = deleted, "canceled orders purged");
    log_audit(
        state,
        None,
        "purge_orders",
        "orders",
        serde_json::json!({ "count": deleted }),
    )
    .await;
    Ok(deleted)
}

/// Deletes bookings canceled for over 30 days together with their user index rows.
/// Canceled but paid bookings are kept until refunded.
pub async fn purge_canceled_bookings(state: &AppState, now: DateTime<Utc>) -> AppResult<u64> {
    let cutoff = timestamp(rules::retention_cutoff(now));
    let txn = state.orm.begin().await?;

    let ids: Vec<Uuid> = Bookings::find()
        .select_only()
        .column(bookings::Column::Id)
        .filter(bookings::Column::ReservationStatus.eq(ReservationStatus::Canceled.as_str()))
        .filter(bookings::Column::PaymentStatus.ne(PaymentStatus::Paid.as_str()))
        .filter(bookings::Column::StartsAt.lte(cutoff))
        .into_tuple()
        .all(&txn)
        .await?;
    if ids.is_empty() {
        return Ok(0);
    }

    UserReservations::delete_many()
        .filter(user_reservations::Column::BookingId.is_in(ids.clone()))
        .exec(&txn)
        .await?;
    let deleted = Bookings::delete_many()
        .filter(bookings::Column::Id.is_in(ids))
        .exec(&txn)
        .await?
        .rows_affected;
    txn.commit().await?;

    tracing::info!(count = deleted, "canceled bookings purged");
    log_audit(
        state,
        None,
        "purge_bookings",
        "bookings",
        serde_json::json!({ "count": deleted }),
    )
    .await;
    Ok(deleted)
}
