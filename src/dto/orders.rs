use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    domain::{OrderStatus, PaymentMethod},
    models::Order,
};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PlaceOrderRequest {
    pub table_number: i32,
    pub quantity: i32,
    /// Must equal `quantity * price`.
    pub total_price: i64,
    pub customer_name: String,
    pub phone: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderRequest {
    pub customer_name: Option<String>,
    pub phone: Option<String>,
    pub quantity: Option<i32>,
    pub total_price: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PayOrderRequest {
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
