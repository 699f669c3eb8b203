use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    domain::{Country, Role},
    models::DiningTable,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRestaurantRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub country: Country,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateRestaurantRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub country: Option<Country>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterStaffRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTableRequest {
    pub table_number: i32,
    /// Defaults to 500 in the restaurant currency.
    pub prepayment_amount: Option<i64>,
    pub capacity: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TableList {
    pub items: Vec<DiningTable>,
}
