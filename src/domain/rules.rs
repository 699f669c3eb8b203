//! Arithmetic and time rules shared by the order, reservation and sweep paths.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::DomainError;

/// Stock at or below this share of the supplied amount counts as low.
pub const LOW_STOCK_PERCENT: i64 = 15;

pub const ORDER_PAYMENT_WINDOW_HOURS: i64 = 6;
pub const BOOKING_PAYMENT_LEAD_HOURS: i64 = 24;
pub const CANCELED_RETENTION_DAYS: i64 = 30;

/// Upper bound for any stored stock quantity.
pub const MAX_QUANTITY: i64 = 1_000_000_000_000;

pub fn is_low_stock(available: i64, supplied: i64) -> bool {
    i128::from(available) * 100 <= i128::from(supplied) * i128::from(LOW_STOCK_PERCENT)
}

/// True when a depletion moved stock from above the threshold to at or below it.
pub fn crosses_low_stock(before: i64, after: i64, supplied: i64) -> bool {
    !is_low_stock(before, supplied) && is_low_stock(after, supplied)
}

pub fn restock_allowed(available: i64, supplied: i64) -> bool {
    is_low_stock(available, supplied)
}

/// Stock after adding `amount`, or `None` past `MAX_QUANTITY`.
pub fn restocked_quantity(available: i64, amount: i64) -> Option<i64> {
    available
        .checked_add(amount)
        .filter(|total| *total <= MAX_QUANTITY)
}

/// `quantity * price`, rejecting overflow and non-positive quantities.
pub fn expected_total(quantity: i32, price: i64) -> Result<i64, DomainError> {
    if quantity < 1 {
        return Err(DomainError::InvalidQuantity(quantity));
    }
    price
        .checked_mul(i64::from(quantity))
        .ok_or(DomainError::InvalidQuantity(quantity))
}

pub fn check_total(quantity: i32, price: i64, claimed: i64) -> Result<i64, DomainError> {
    let expected = expected_total(quantity, price)?;
    if expected != claimed {
        return Err(DomainError::PriceMismatch { expected, claimed });
    }
    Ok(expected)
}

pub fn required_amount(quantity: i32, per_item: i64) -> Result<i64, DomainError> {
    per_item
        .checked_mul(i64::from(quantity))
        .ok_or(DomainError::InvalidQuantity(quantity))
}

/// Half-open `[start, end)` windows overlap.
pub fn windows_overlap(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Unpaid orders placed at or before this instant are stale.
pub fn stale_order_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::hours(ORDER_PAYMENT_WINDOW_HOURS)
}

/// Unpaid bookings starting at or before this instant are stale.
pub fn stale_booking_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::hours(BOOKING_PAYMENT_LEAD_HOURS)
}

pub fn retention_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(CANCELED_RETENTION_DAYS)
}

pub fn new_order_tx_ref() -> String {
    format!("order-{}", Uuid::new_v4())
}

pub fn new_booking_tx_ref() -> String {
    format!("reserve-{}", Uuid::new_v4())
}
