#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use restaurant_service::{
    config::{AppConfig, PaymentConfig, SweepSchedule},
    db::{create_orm_conn, run_migrations},
    domain::{Country, PaymentMethod, Role, Unit},
    dto::{
        inventory::AddIngredientRequest,
        menu::{CreateMenuItemRequest, IngredientLine},
        reservations::{BookTableRequest, PayBookingRequest},
        restaurants::{CreateRestaurantRequest, CreateTableRequest},
    },
    gateway::{
        GatewayError, InitializeTransaction, PaymentGateway, TransactionStatus,
        VerifiedTransaction,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Booking, InventoryItem, MenuItem},
    notifier::{Notification, Notifier},
    services::{
        auth_service::{self, NewAccount},
        inventory_service, menu_service, payment_service, reservation_service,
        restaurant_service as restaurants,
    },
    state::AppState,
};
use uuid::Uuid;

/// Gateway double: hands out fake checkout URLs and answers verification with `status`.
pub struct FakeGateway {
    pub status: Mutex<TransactionStatus>,
    pub initialized: Mutex<Vec<InitializeTransaction>>,
}

impl FakeGateway {
    pub fn set_status(&self, status: TransactionStatus) {
        *self.status.lock().unwrap() = status;
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn initialize_transaction(
        &self,
        request: &InitializeTransaction,
    ) -> Result<String, GatewayError> {
        self.initialized.lock().unwrap().push(request.clone());
        Ok(format!("https://checkout.test/{}", request.tx_ref))
    }

    async fn verify_transaction(&self, tx_ref: &str) -> Result<VerifiedTransaction, GatewayError> {
        Ok(VerifiedTransaction {
            status: *self.status.lock().unwrap(),
            reference: Some(format!("ref-{tx_ref}")),
        })
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, Notification)>>,
}

impl RecordingNotifier {
    pub fn sent_to(&self, to: &str) -> Vec<Notification> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(recipient, _)| recipient == to)
            .map(|(_, n)| n.clone())
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, to: &str, notification: &Notification) -> anyhow::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), notification.clone()));
        Ok(())
    }
}

pub struct TestApp {
    pub state: AppState,
    pub gateway: Arc<FakeGateway>,
    pub notifier: Arc<RecordingNotifier>,
}

/// Connects to `TEST_DATABASE_URL` (or `DATABASE_URL`). `None` means skip.
pub async fn setup() -> anyhow::Result<Option<TestApp>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration tests.");
            return Ok(None);
        }
    };

    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;

    let config = AppConfig {
        database_url,
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "test-secret".into(),
        payment: PaymentConfig {
            secret_key: "CHASECK_TEST".into(),
            base_url: "http://gateway.invalid".into(),
            public_base_url: "http://api.test".into(),
            frontend_url: "http://app.test".into(),
        },
        notify_webhook_url: None,
        schedule: SweepSchedule::default(),
    };
    let gateway = Arc::new(FakeGateway {
        status: Mutex::new(TransactionStatus::Success),
        initialized: Mutex::new(Vec::new()),
    });
    let notifier = Arc::new(RecordingNotifier::default());
    let state = AppState::new(orm, config, gateway.clone(), notifier.clone());

    Ok(Some(TestApp {
        state,
        gateway,
        notifier,
    }))
}

fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

pub fn admin() -> AuthUser {
    AuthUser {
        user_id: Uuid::new_v4(),
        email: "admin@test.local".into(),
        role: Role::Admin,
        restaurant_id: None,
    }
}

pub async fn create_restaurant(state: &AppState) -> anyhow::Result<Uuid> {
    let name = unique("bistro");
    let resp = restaurants::register_restaurant(
        state,
        &admin(),
        CreateRestaurantRequest {
            email: format!("{name}@test.local"),
            name,
            phone: "251911000000".into(),
            address: "Bole Road".into(),
            country: Country::Ethiopia,
        },
    )
    .await?;
    Ok(resp.data.expect("restaurant").id)
}

/// Creates a real account and returns it as an authenticated caller.
pub async fn account(
    state: &AppState,
    restaurant_id: Uuid,
    role: Role,
) -> anyhow::Result<AuthUser> {
    let email = format!("{}@test.local", unique(role.as_str()).to_lowercase());
    let user = auth_service::create_account(
        state,
        NewAccount {
            restaurant_id: Some(restaurant_id),
            first_name: "Test".into(),
            last_name: role.as_str().into(),
            email,
            phone: "+251900000000".into(),
            password: "secret123".into(),
            role,
        },
    )
    .await?;
    Ok(AuthUser {
        user_id: user.id,
        email: user.email,
        role,
        restaurant_id: Some(restaurant_id),
    })
}

pub async fn create_table(
    state: &AppState,
    manager: &AuthUser,
    restaurant_id: Uuid,
    table_number: i32,
) -> anyhow::Result<()> {
    restaurants::create_table(
        state,
        manager,
        restaurant_id,
        CreateTableRequest {
            table_number,
            prepayment_amount: None,
            capacity: Some(4),
        },
    )
    .await?;
    Ok(())
}

pub async fn add_ingredient(
    state: &AppState,
    chef: &AuthUser,
    restaurant_id: Uuid,
    name: &str,
    supplied: i64,
) -> anyhow::Result<InventoryItem> {
    let resp = inventory_service::add_ingredient(
        state,
        chef,
        restaurant_id,
        AddIngredientRequest {
            ingredient_name: name.into(),
            supplied_amount: supplied,
            available_quantity: None,
            unit: Unit::Gram,
        },
    )
    .await?;
    Ok(resp.data.expect("inventory item"))
}

pub async fn add_menu_item(
    state: &AppState,
    chef: &AuthUser,
    restaurant_id: Uuid,
    name: &str,
    price: i64,
    recipe: &[(Uuid, i64)],
) -> anyhow::Result<MenuItem> {
    let resp = menu_service::add_menu_item(
        state,
        chef,
        restaurant_id,
        CreateMenuItemRequest {
            name: name.into(),
            category: "Main".into(),
            price,
            ingredients: recipe
                .iter()
                .map(|(ingredient_id, amount)| IngredientLine {
                    ingredient_id: *ingredient_id,
                    amount_used_per_item: *amount,
                })
                .collect(),
        },
    )
    .await?;
    Ok(resp.data.expect("menu item"))
}

pub fn window(from_now_hours: i64, length_hours: i64) -> (DateTime<Utc>, DateTime<Utc>) {
    let starts_at = Utc::now() + Duration::hours(from_now_hours);
    (starts_at, starts_at + Duration::hours(length_hours))
}

pub async fn book(
    state: &AppState,
    customer: &AuthUser,
    restaurant_id: Uuid,
    table_number: i32,
    (starts_at, ends_at): (DateTime<Utc>, DateTime<Utc>),
) -> AppResult<Booking> {
    let resp = reservation_service::book(
        state,
        customer,
        restaurant_id,
        BookTableRequest {
            table_number,
            customer_name: "Sara Bekele".into(),
            phone: "+251911223344".into(),
            starts_at,
            ends_at,
        },
    )
    .await?;
    Ok(resp.data.expect("booking"))
}

/// Books `table_number` for the customer and pays for it through the callback.
pub async fn seat(
    app: &TestApp,
    customer: &AuthUser,
    restaurant_id: Uuid,
    table_number: i32,
) -> anyhow::Result<Booking> {
    let booking = book(&app.state, customer, restaurant_id, table_number, window(48, 2)).await?;
    reservation_service::initiate_payment(
        &app.state,
        customer,
        restaurant_id,
        PayBookingRequest {
            table_number,
            payment_method: PaymentMethod::Telebirr,
        },
    )
    .await?;
    payment_service::handle_callback(&app.state, &booking.tx_ref).await?;
    Ok(booking)
}
