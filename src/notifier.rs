//! Outbound customer and staff notifications.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LowStockLine {
    pub ingredient: String,
    pub remaining: i64,
    pub unit: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PaymentTarget {
    Reservation,
    Order,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum Notification {
    BookingConfirmation {
        customer_name: String,
        table_number: i32,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        prepayment_amount: i64,
        currency: String,
    },
    BookingCancellation {
        customer_name: String,
        table_number: i32,
        starts_at: DateTime<Utc>,
    },
    OrderPlaced {
        customer_name: String,
        order_id: Uuid,
        item_name: String,
        quantity: i32,
        total_price: i64,
        currency: String,
    },
    OrderCanceled {
        customer_name: String,
        order_id: Uuid,
        item_name: String,
    },
    PaymentConfirmed {
        target: PaymentTarget,
        tx_ref: String,
        amount: i64,
        currency: String,
    },
    LowStock {
        restaurant_name: String,
        items: Vec<LowStockLine>,
    },
}

impl Notification {
    pub fn subject(&self) -> String {
        match self {
            Notification::BookingConfirmation { table_number, .. } => {
                format!("Reservation received for table {table_number}")
            }
            Notification::BookingCancellation { table_number, .. } => {
                format!("Reservation for table {table_number} canceled")
            }
            Notification::OrderPlaced { item_name, .. } => format!("Order placed: {item_name}"),
            Notification::OrderCanceled { item_name, .. } => {
                format!("Order canceled: {item_name}")
            }
            Notification::PaymentConfirmed { target, .. } => match target {
                PaymentTarget::Reservation => "Reservation payment confirmed".to_string(),
                PaymentTarget::Order => "Order payment confirmed".to_string(),
            },
            Notification::LowStock { restaurant_name, .. } => {
                format!("Low stock at {restaurant_name}")
            }
        }
    }

    pub fn body(&self) -> String {
        match self {
            Notification::BookingConfirmation {
                customer_name,
                table_number,
                starts_at,
                ends_at,
                prepayment_amount,
                currency,
            } => format!(
                "Hello {customer_name},\n\
                 Table {table_number} is held for you from {} to {}.\n\
                 Please pay the prepayment of {prepayment_amount} {currency} \
                 to confirm the reservation.",
                starts_at.format("%Y-%m-%d %H:%M"),
                ends_at.format("%Y-%m-%d %H:%M"),
            ),
            Notification::BookingCancellation {
                customer_name,
                table_number,
                starts_at,
            } => format!(
                "Hello {customer_name},\n\
                 Your reservation of table {table_number} on {} has been canceled.",
                starts_at.format("%Y-%m-%d %H:%M"),
            ),
            Notification::OrderPlaced {
                customer_name,
                order_id,
                item_name,
                quantity,
                total_price,
                currency,
            } => format!(
                "Hello {customer_name},\n\
                 Order {order_id}: {quantity} x {item_name}, total {total_price} {currency}.\n\
                 The order is confirmed once payment is received."
            ),
            Notification::OrderCanceled {
                customer_name,
                order_id,
                item_name,
            } => format!(
                "Hello {customer_name},\n\
                 Order {order_id} for {item_name} has been canceled."
            ),
            Notification::PaymentConfirmed {
                tx_ref,
                amount,
                currency,
                ..
            } => format!("We received {amount} {currency} (reference {tx_ref}). Thank you!"),
            Notification::LowStock { items, .. } => {
                let mut body = String::from("The following ingredients are running low:\n");
                for line in items {
                    body.push_str(&format!(
                        "- {}: {} {} left\n",
                        line.ingredient, line.remaining, line.unit
                    ));
                }
                body
            }
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to: &str, notification: &Notification) -> anyhow::Result<()>;
}

/// Writes notifications to the log instead of delivering them.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, to: &str, notification: &Notification) -> anyhow::Result<()> {
        tracing::info!(to, subject = %notification.subject(), "notification");
        tracing::debug!(body = %notification.body());
        Ok(())
    }
}

/// POSTs each notification as JSON to a relay (mail gateway, chat hook, ...).
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    to: &'a str,
    subject: String,
    body: String,
    notification: &'a Notification,
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, to: &str, notification: &Notification) -> anyhow::Result<()> {
        let payload = WebhookPayload {
            to,
            subject: notification.subject(),
            body: notification.body(),
            notification,
        };
        self.client
            .post(&self.url)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;
        tracing::info!(to, subject = %payload.subject, "notification sent");
        Ok(())
    }
}

/// Delivers a notification; failures are logged and never reach the caller.
pub async fn dispatch(notifier: &dyn Notifier, to: &str, notification: Notification) {
    if let Err(err) = notifier.send(to, &notification).await {
        tracing::warn!(error = %err, to, subject = %notification.subject(), "notification failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn booking_confirmation_mentions_prepayment() {
        let n = Notification::BookingConfirmation {
            customer_name: "Sara".into(),
            table_number: 5,
            starts_at: Utc.with_ymd_and_hms(2025, 3, 29, 12, 0, 0).unwrap(),
            ends_at: Utc.with_ymd_and_hms(2025, 3, 29, 14, 0, 0).unwrap(),
            prepayment_amount: 500,
            currency: "ETB".into(),
        };
        assert_eq!(n.subject(), "Reservation received for table 5");
        let body = n.body();
        assert!(body.contains("500 ETB"));
        assert!(body.contains("2025-03-29 12:00"));
    }

    #[test]
    fn low_stock_lists_every_ingredient() {
        let n = Notification::LowStock {
            restaurant_name: "Habesha".into(),
            items: vec![
                LowStockLine {
                    ingredient: "flour".into(),
                    remaining: 120,
                    unit: "gram".into(),
                },
                LowStockLine {
                    ingredient: "milk".into(),
                    remaining: 90,
                    unit: "milliliter".into(),
                },
            ],
        };
        let body = n.body();
        assert!(body.contains("- flour: 120 gram left"));
        assert!(body.contains("- milk: 90 milliliter left"));
    }

    #[test]
    fn payload_is_tagged_by_kind() {
        let n = Notification::PaymentConfirmed {
            target: PaymentTarget::Order,
            tx_ref: "order-1".into(),
            amount: 100,
            currency: "ETB".into(),
        };
        let value = serde_json::to_value(&n).unwrap();
        assert_eq!(value["kind"], "PaymentConfirmed");
        assert_eq!(value["target"], "Order");
    }
}
