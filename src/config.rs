use std::{env, time::Duration};

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub payment: PaymentConfig,
    pub notify_webhook_url: Option<String>,
    pub schedule: SweepSchedule,
}

#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub secret_key: String,
    pub base_url: String,
    /// Base the gateway calls back to, e.g. `https://api.example.com`.
    pub public_base_url: String,
    /// Base the customer's browser is returned to after checkout.
    pub frontend_url: String,
}

impl PaymentConfig {
    pub fn callback_url(&self, tx_ref: &str) -> String {
        format!(
            "{}/api/payments/callback?tx_ref={}",
            self.public_base_url.trim_end_matches('/'),
            tx_ref
        )
    }

    pub fn return_url(&self, resource: &str, id: uuid::Uuid, tx_ref: &str) -> String {
        format!(
            "{}/payment-success?{}={}&tx_ref={}",
            self.frontend_url.trim_end_matches('/'),
            resource,
            id,
            tx_ref
        )
    }
}

/// Periods of the cleanup sweeps.
#[derive(Debug, Clone)]
pub struct SweepSchedule {
    pub stale_orders: Duration,
    pub stale_bookings: Duration,
    pub purge_bookings: Duration,
    pub purge_orders: Duration,
}

impl Default for SweepSchedule {
    fn default() -> Self {
        Self {
            stale_orders: Duration::from_secs(60 * 60),
            stale_bookings: Duration::from_secs(24 * 60 * 60),
            purge_bookings: Duration::from_secs(24 * 60 * 60),
            purge_orders: Duration::from_secs(30 * 24 * 60 * 60),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is not set")?;

        let payment = PaymentConfig {
            secret_key: env::var("CHAPA_SECRET_KEY").context("CHAPA_SECRET_KEY is not set")?,
            base_url: env::var("CHAPA_BASE_URL")
                .unwrap_or_else(|_| "https://api.chapa.co/v1".to_string()),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{port}")),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
        };

        let defaults = SweepSchedule::default();
        let schedule = SweepSchedule {
            stale_orders: secs_from_env("ORDER_SWEEP_SECS", defaults.stale_orders),
            stale_bookings: secs_from_env("BOOKING_SWEEP_SECS", defaults.stale_bookings),
            purge_bookings: secs_from_env("BOOKING_SWEEP_SECS", defaults.purge_bookings),
            purge_orders: secs_from_env("ORDER_PURGE_SECS", defaults.purge_orders),
        };

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            payment,
            notify_webhook_url: env::var("NOTIFY_WEBHOOK_URL").ok().filter(|v| !v.is_empty()),
            schedule,
        })
    }
}

fn secs_from_env(key: &str, default: Duration) -> Duration {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_and_return_urls() {
        let payment = PaymentConfig {
            secret_key: "k".into(),
            base_url: "https://api.chapa.co/v1".into(),
            public_base_url: "https://api.example.com/".into(),
            frontend_url: "https://app.example.com".into(),
        };
        assert_eq!(
            payment.callback_url("order-1"),
            "https://api.example.com/api/payments/callback?tx_ref=order-1"
        );
        let id = uuid::Uuid::nil();
        assert_eq!(
            payment.return_url("orderId", id, "order-1"),
            format!("https://app.example.com/payment-success?orderId={id}&tx_ref=order-1")
        );
    }
}
