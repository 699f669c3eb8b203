//! Payment gateway client (Chapa REST API, no SDK dependency).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::PaymentConfig;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("unexpected response: {0}")]
    Malformed(String),
}

/// Payer details sent with a new transaction.
#[derive(Debug, Clone, Serialize)]
pub struct Payer {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
}

impl Payer {
    /// Splits a free-form name, falling back to "Guest User" parts.
    pub fn new(email: &str, full_name: &str, phone: &str) -> Self {
        let mut parts = full_name.split_whitespace();
        Self {
            email: email.to_string(),
            first_name: parts.next().unwrap_or("Guest").to_string(),
            last_name: parts.next().unwrap_or("User").to_string(),
            phone_number: phone.replace('+', ""),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InitializeTransaction {
    pub amount: i64,
    pub currency: String,
    pub payer: Payer,
    pub tx_ref: String,
    pub callback_url: String,
    pub return_url: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Success,
    Pending,
    Failed,
}

impl TransactionStatus {
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "success" => TransactionStatus::Success,
            "pending" => TransactionStatus::Pending,
            _ => TransactionStatus::Failed,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TransactionStatus::Success)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedTransaction {
    pub status: TransactionStatus,
    /// Gateway-side reference, recorded as the transaction id.
    pub reference: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a hosted checkout and returns its URL.
    async fn initialize_transaction(
        &self,
        request: &InitializeTransaction,
    ) -> Result<String, GatewayError>;

    async fn verify_transaction(&self, tx_ref: &str) -> Result<VerifiedTransaction, GatewayError>;
}

pub struct ChapaGateway {
    client: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl ChapaGateway {
    pub fn new(config: &PaymentConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
        }
    }
}

#[derive(Serialize)]
struct Customization<'a> {
    title: &'a str,
    description: &'a str,
}

#[derive(Serialize)]
struct InitializeBody<'a> {
    amount: String,
    currency: &'a str,
    #[serde(flatten)]
    payer: &'a Payer,
    tx_ref: &'a str,
    callback_url: &'a str,
    return_url: &'a str,
    customization: Customization<'a>,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: String,
    #[serde(default)]
    message: Value,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct CheckoutData {
    checkout_url: String,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    status: String,
    reference: Option<String>,
}

fn into_data<T>(envelope: Envelope<T>) -> Result<T, GatewayError> {
    if envelope.status != "success" {
        return Err(GatewayError::Rejected(envelope.message.to_string()));
    }
    envelope
        .data
        .ok_or_else(|| GatewayError::Malformed("missing data".into()))
}

fn parse_checkout(body: Value) -> Result<String, GatewayError> {
    let envelope: Envelope<CheckoutData> =
        serde_json::from_value(body).map_err(|e| GatewayError::Malformed(e.to_string()))?;
    Ok(into_data(envelope)?.checkout_url)
}

fn parse_verification(body: Value) -> Result<VerifiedTransaction, GatewayError> {
    let envelope: Envelope<VerifyData> =
        serde_json::from_value(body).map_err(|e| GatewayError::Malformed(e.to_string()))?;
    let data = into_data(envelope)?;
    Ok(VerifiedTransaction {
        status: TransactionStatus::parse(&data.status),
        reference: data.reference,
    })
}

#[async_trait]
impl PaymentGateway for ChapaGateway {
    async fn initialize_transaction(
        &self,
        request: &InitializeTransaction,
    ) -> Result<String, GatewayError> {
        let body = InitializeBody {
            amount: request.amount.to_string(),
            currency: &request.currency,
            payer: &request.payer,
            tx_ref: &request.tx_ref,
            callback_url: &request.callback_url,
            return_url: &request.return_url,
            customization: Customization {
                title: &request.title,
                description: &request.description,
            },
        };

        let resp: Value = self
            .client
            .post(format!("{}/transaction/initialize", self.base_url))
            .bearer_auth(&self.secret_key)
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        let checkout_url = parse_checkout(resp)?;
        tracing::debug!(tx_ref = %request.tx_ref, "payment initialized");
        Ok(checkout_url)
    }

    async fn verify_transaction(&self, tx_ref: &str) -> Result<VerifiedTransaction, GatewayError> {
        let resp: Value = self
            .client
            .get(format!("{}/transaction/verify/{}", self.base_url, tx_ref))
            .bearer_auth(&self.secret_key)
            .send()
            .await?
            .json()
            .await?;

        parse_verification(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn checkout_url_is_extracted() {
        let body = json!({
            "message": "Hosted Link",
            "status": "success",
            "data": { "checkout_url": "https://checkout.chapa.co/checkout/payment/abc" }
        });
        assert_eq!(
            parse_checkout(body).unwrap(),
            "https://checkout.chapa.co/checkout/payment/abc"
        );
    }

    #[test]
    fn failed_envelope_is_rejected() {
        let body = json!({
            "message": { "currency": ["The currency field is required."] },
            "status": "failed",
            "data": null
        });
        assert!(matches!(parse_checkout(body), Err(GatewayError::Rejected(_))));
    }

    #[test]
    fn verification_maps_statuses() {
        let body = json!({
            "message": "Payment details",
            "status": "success",
            "data": { "status": "success", "tx_ref": "order-1", "reference": "APx1" }
        });
        let verified = parse_verification(body).unwrap();
        assert_eq!(verified.status, TransactionStatus::Success);
        assert_eq!(verified.reference.as_deref(), Some("APx1"));

        assert_eq!(TransactionStatus::parse("pending"), TransactionStatus::Pending);
        assert_eq!(TransactionStatus::parse("reversed"), TransactionStatus::Failed);
    }

    #[test]
    fn payer_name_and_phone_are_normalised() {
        let payer = Payer::new("a@b.c", "Abebe", "+251911000000");
        assert_eq!(payer.first_name, "Abebe");
        assert_eq!(payer.last_name, "User");
        assert_eq!(payer.phone_number, "251911000000");

        let payer = Payer::new("a@b.c", "", "0911");
        assert_eq!(payer.first_name, "Guest");
    }
}
