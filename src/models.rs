use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{
    bookings, dining_tables, inventory_items, menu_item_ingredients, menu_items, orders,
    restaurants, supply_logs, users,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Restaurant {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub country: String,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub restaurant_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InventoryItem {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub ingredient_name: String,
    pub supplied_amount: i64,
    pub available_quantity: i64,
    pub unit: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SupplyLogEntry {
    pub id: Uuid,
    pub supplied_by: Uuid,
    pub amount: i64,
    pub supplied_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MenuIngredient {
    pub ingredient_id: Uuid,
    pub amount_used_per_item: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MenuItem {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub category: String,
    pub price: i64,
    pub is_available: bool,
    pub is_deleted: bool,
    pub ingredients: Vec<MenuIngredient>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DiningTable {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub table_number: i32,
    pub prepayment_amount: i64,
    pub capacity: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Booking {
    pub id: Uuid,
    pub table_id: Uuid,
    pub user_id: Uuid,
    pub customer_name: String,
    pub customer_phone: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub reservation_status: String,
    pub payment_method: Option<String>,
    pub payment_status: String,
    pub amount_paid: i64,
    pub tx_ref: String,
    pub payment_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub menu_item_id: Uuid,
    pub user_id: Uuid,
    pub customer_name: String,
    pub phone: String,
    pub table_number: i32,
    pub quantity: i32,
    pub total_price: i64,
    pub order_status: String,
    pub payment_method: Option<String>,
    pub payment_status: String,
    pub amount_paid: i64,
    pub tx_ref: String,
    pub payment_date: Option<DateTime<Utc>>,
    pub placed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<restaurants::Model> for Restaurant {
    fn from(model: restaurants::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            phone: model.phone,
            address: model.address,
            country: model.country,
            currency: model.currency,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            restaurant_id: model.restaurant_id,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
            phone: model.phone,
            role: model.role,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<inventory_items::Model> for InventoryItem {
    fn from(model: inventory_items::Model) -> Self {
        Self {
            id: model.id,
            restaurant_id: model.restaurant_id,
            ingredient_name: model.ingredient_name,
            supplied_amount: model.supplied_amount,
            available_quantity: model.available_quantity,
            unit: model.unit,
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<supply_logs::Model> for SupplyLogEntry {
    fn from(model: supply_logs::Model) -> Self {
        Self {
            id: model.id,
            supplied_by: model.supplied_by,
            amount: model.amount,
            supplied_at: model.supplied_at.with_timezone(&Utc),
        }
    }
}

impl From<menu_item_ingredients::Model> for MenuIngredient {
    fn from(model: menu_item_ingredients::Model) -> Self {
        Self {
            ingredient_id: model.inventory_item_id,
            amount_used_per_item: model.amount_used_per_item,
        }
    }
}

impl MenuItem {
    pub fn from_parts(
        model: menu_items::Model,
        ingredients: Vec<menu_item_ingredients::Model>,
    ) -> Self {
        Self {
            id: model.id,
            restaurant_id: model.restaurant_id,
            name: model.name,
            category: model.category,
            price: model.price,
            is_available: model.is_available,
            is_deleted: model.is_deleted,
            ingredients: ingredients.into_iter().map(MenuIngredient::from).collect(),
        }
    }
}

impl From<dining_tables::Model> for DiningTable {
    fn from(model: dining_tables::Model) -> Self {
        Self {
            id: model.id,
            restaurant_id: model.restaurant_id,
            table_number: model.table_number,
            prepayment_amount: model.prepayment_amount,
            capacity: model.capacity,
        }
    }
}

impl From<bookings::Model> for Booking {
    fn from(model: bookings::Model) -> Self {
        Self {
            id: model.id,
            table_id: model.table_id,
            user_id: model.user_id,
            customer_name: model.customer_name,
            customer_phone: model.customer_phone,
            starts_at: model.starts_at.with_timezone(&Utc),
            ends_at: model.ends_at.with_timezone(&Utc),
            reservation_status: model.reservation_status,
            payment_method: model.payment_method,
            payment_status: model.payment_status,
            amount_paid: model.amount_paid,
            tx_ref: model.tx_ref,
            payment_date: model.payment_date.map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            restaurant_id: model.restaurant_id,
            menu_item_id: model.menu_item_id,
            user_id: model.user_id,
            customer_name: model.customer_name,
            phone: model.phone,
            table_number: model.table_number,
            quantity: model.quantity,
            total_price: model.total_price,
            order_status: model.order_status,
            payment_method: model.payment_method,
            payment_status: model.payment_status,
            amount_paid: model.amount_paid,
            tx_ref: model.tx_ref,
            payment_date: model.payment_date.map(|dt| dt.with_timezone(&Utc)),
            placed_at: model.placed_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}
