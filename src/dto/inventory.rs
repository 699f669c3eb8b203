use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    domain::Unit,
    models::{InventoryItem, SupplyLogEntry},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddIngredientRequest {
    pub ingredient_name: String,
    pub supplied_amount: i64,
    /// Starting stock; the supplied amount when omitted.
    pub available_quantity: Option<i64>,
    pub unit: Unit,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateIngredientRequest {
    pub ingredient_name: Option<String>,
    pub supplied_amount: Option<i64>,
    pub available_quantity: Option<i64>,
    pub unit: Option<Unit>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RestockRequest {
    pub amount: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InventoryList {
    pub items: Vec<InventoryItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RestockResult {
    pub item: InventoryItem,
    pub supply: SupplyLogEntry,
}
