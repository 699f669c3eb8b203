use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::{
    dto::payments::{CallbackOutcome, PaidResource},
    entity::{Bookings, Orders, bookings, orders},
    error::{AppError, AppResult},
    gateway::VerifiedTransaction,
    response::{ApiResponse, Meta},
    services::{order_service, reservation_service},
    state::AppState,
};

enum Payable {
    Booking(bookings::Model),
    Order(orders::Model),
}

/// Every tx_ref belongs to exactly one booking or one order.
async fn resolve(state: &AppState, tx_ref: &str) -> AppResult<Payable> {
    let booking = Bookings::find()
        .filter(bookings::Column::TxRef.eq(tx_ref))
        .one(&state.orm)
        .await?;
    let order = Orders::find()
        .filter(orders::Column::TxRef.eq(tx_ref))
        .one(&state.orm)
        .await?;

    match (booking, order) {
        (Some(booking), None) => Ok(Payable::Booking(booking)),
        (None, Some(order)) => Ok(Payable::Order(order)),
        (None, None) => Err(AppError::not_found("Transaction")),
        (Some(_), Some(_)) => Err(AppError::Conflict(format!(
            "Transaction {tx_ref} matches both a booking and an order"
        ))),
    }
}

/// Applies an already verified gateway verdict. Replaying the same verdict is a no-op.
pub async fn reconcile(
    state: &AppState,
    tx_ref: &str,
    verified: &VerifiedTransaction,
) -> AppResult<CallbackOutcome> {
    let payment = &state.config.payment;
    let outcome = match resolve(state, tx_ref).await? {
        Payable::Booking(booking) => {
            let booking = reservation_service::reconcile_payment(state, booking, verified).await?;
            CallbackOutcome {
                resource: PaidResource::Reservation,
                id: booking.id,
                redirect_url: payment.return_url("reservationId", booking.id, tx_ref),
                tx_ref: booking.tx_ref,
                payment_status: booking.payment_status,
                status: booking.reservation_status,
            }
        }
        Payable::Order(order) => {
            let order = order_service::reconcile_payment(state, order, verified).await?;
            CallbackOutcome {
                resource: PaidResource::Order,
                id: order.id,
                redirect_url: payment.return_url("orderId", order.id, tx_ref),
                tx_ref: order.tx_ref,
                payment_status: order.payment_status,
                status: order.order_status,
            }
        }
    };
    Ok(outcome)
}

/// Gateway callback: trust comes from asking the gateway, not from the caller.
pub async fn handle_callback(
    state: &AppState,
    tx_ref: &str,
) -> AppResult<ApiResponse<CallbackOutcome>> {
    // Unknown references are rejected before the gateway is bothered.
    resolve(state, tx_ref).await?;
    let verified = state.gateway.verify_transaction(tx_ref).await?;
    tracing::info!(tx_ref, status = ?verified.status, "payment verified");

    let outcome = reconcile(state, tx_ref, &verified).await?;
    Ok(ApiResponse::success(
        "Payment reconciled",
        outcome,
        Some(Meta::empty()),
    ))
}
