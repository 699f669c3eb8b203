use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{config::AppConfig, gateway::PaymentGateway, notifier::Notifier};

#[derive(Clone)]
pub struct AppState {
    pub orm: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(
        orm: DatabaseConnection,
        config: AppConfig,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            orm,
            config: Arc::new(config),
            gateway,
            notifier,
        }
    }
}
