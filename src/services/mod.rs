use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;

pub mod auth_service;
pub mod cleanup_service;
pub mod inventory_service;
pub mod menu_service;
pub mod order_service;
pub mod payment_service;
pub mod reservation_service;
pub mod restaurant_service;

/// Column value for a `TIMESTAMPTZ` written through `update_many`.
pub(crate) fn timestamp(at: DateTime<Utc>) -> DateTimeWithTimeZone {
    at.fixed_offset()
}
