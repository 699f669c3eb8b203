use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{domain::PaymentMethod, models::Booking};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BookTableRequest {
    pub table_number: i32,
    pub customer_name: String,
    pub phone: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CancelBookingRequest {
    pub table_number: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PayBookingRequest {
    pub table_number: i32,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingList {
    pub items: Vec<Booking>,
}
