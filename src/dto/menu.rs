use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::MenuItem;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct IngredientLine {
    pub ingredient_id: Uuid,
    pub amount_used_per_item: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMenuItemRequest {
    pub name: String,
    pub category: String,
    pub price: i64,
    #[serde(default)]
    pub ingredients: Vec<IngredientLine>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateMenuItemRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddIngredientsRequest {
    pub ingredients: Vec<IngredientLine>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AvailabilityRequest {
    pub is_available: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MenuList {
    pub items: Vec<MenuItem>,
}
