use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentInitiated {
    pub tx_ref: String,
    pub checkout_url: String,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct CallbackQuery {
    pub tx_ref: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaidResource {
    Reservation,
    Order,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CallbackOutcome {
    pub resource: PaidResource,
    pub id: Uuid,
    pub tx_ref: String,
    pub payment_status: String,
    pub status: String,
    /// Frontend page the customer is sent back to.
    pub redirect_url: String,
}
