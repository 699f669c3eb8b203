use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, LockType},
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    domain::{Role, rules},
    dto::inventory::{
        AddIngredientRequest, InventoryList, RestockRequest, RestockResult,
        UpdateIngredientRequest,
    },
    entity::{
        InventoryItems, MenuItemIngredients,
        inventory_items::{self, ActiveModel as InventoryActive},
        menu_item_ingredients,
        supply_logs::ActiveModel as SupplyLogActive,
    },
    error::{AppError, AppResult, DomainError},
    middleware::auth::{AuthUser, KITCHEN, SUPPLY, ensure_restaurant, ensure_role},
    models::InventoryItem,
    notifier::{self, LowStockLine, Notification},
    response::{ApiResponse, Meta},
    services::restaurant_service::{find_manager, find_restaurant},
    state::AppState,
};

/// Roles allowed to read stock levels.
const STOCK_READERS: &[Role] = &[Role::Chef, Role::Supplier, Role::Manager];

pub async fn find_item(state: &AppState, id: Uuid) -> AppResult<inventory_items::Model> {
    InventoryItems::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Ingredient"))
}

async fn ensure_name_free<C: ConnectionTrait>(
    conn: &C,
    restaurant_id: Uuid,
    name: &str,
    except: Option<Uuid>,
) -> AppResult<()> {
    let mut finder = InventoryItems::find()
        .filter(inventory_items::Column::RestaurantId.eq(restaurant_id))
        .filter(inventory_items::Column::IngredientName.eq(name));
    if let Some(id) = except {
        finder = finder.filter(inventory_items::Column::Id.ne(id));
    }
    if finder.one(conn).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "Ingredient '{name}' already exists"
        )));
    }
    Ok(())
}

fn validate_amounts(supplied: i64, available: i64) -> AppResult<()> {
    if supplied < 0 || available < 0 {
        return Err(AppError::BadRequest("Quantities cannot be negative".into()));
    }
    if supplied > rules::MAX_QUANTITY || available > rules::MAX_QUANTITY {
        return Err(AppError::BadRequest(format!(
            "Quantities cannot exceed {}",
            rules::MAX_QUANTITY
        )));
    }
    Ok(())
}

pub async fn add_ingredient(
    state: &AppState,
    user: &AuthUser,
    restaurant_id: Uuid,
    payload: AddIngredientRequest,
) -> AppResult<ApiResponse<InventoryItem>> {
    ensure_role(user, KITCHEN)?;
    ensure_restaurant(user, restaurant_id)?;
    find_restaurant(state, restaurant_id).await?;

    let name = payload.ingredient_name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("Ingredient name is required".into()));
    }
    let available = payload.available_quantity.unwrap_or(payload.supplied_amount);
    validate_amounts(payload.supplied_amount, available)?;
    ensure_name_free(&state.orm, restaurant_id, &name, None).await?;

    let now = Utc::now();
    let item = InventoryActive {
        id: Set(Uuid::new_v4()),
        restaurant_id: Set(restaurant_id),
        ingredient_name: Set(name),
        supplied_amount: Set(payload.supplied_amount),
        available_quantity: Set(available),
        unit: Set(payload.unit.as_str().to_string()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    tracing::debug!(ingredient_id = %item.id, "ingredient added");
    Ok(ApiResponse::success(
        "Ingredient added",
        item.into(),
        Some(Meta::empty()),
    ))
}

pub async fn update_ingredient(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateIngredientRequest,
) -> AppResult<ApiResponse<InventoryItem>> {
    ensure_role(user, KITCHEN)?;
    let item = find_item(state, id).await?;
    ensure_restaurant(user, item.restaurant_id)?;

    let supplied = payload.supplied_amount.unwrap_or(item.supplied_amount);
    let available = payload.available_quantity.unwrap_or(item.available_quantity);
    validate_amounts(supplied, available)?;

    let mut active: InventoryActive = item.clone().into();
    if let Some(name) = payload.ingredient_name {
        let name = name.trim().to_string();
        ensure_name_free(&state.orm, item.restaurant_id, &name, Some(id)).await?;
        active.ingredient_name = Set(name);
    }
    if let Some(unit) = payload.unit {
        active.unit = Set(unit.as_str().to_string());
    }
    active.supplied_amount = Set(supplied);
    active.available_quantity = Set(available);
    active.updated_at = Set(Utc::now().into());
    let item = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Ingredient updated",
        item.into(),
        Some(Meta::empty()),
    ))
}

pub async fn get_ingredient(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<InventoryItem>> {
    ensure_role(user, STOCK_READERS)?;
    let item = find_item(state, id).await?;
    ensure_restaurant(user, item.restaurant_id)?;
    Ok(ApiResponse::success("OK", item.into(), Some(Meta::empty())))
}

pub async fn list_ingredients(
    state: &AppState,
    user: &AuthUser,
    restaurant_id: Uuid,
) -> AppResult<ApiResponse<InventoryList>> {
    ensure_role(user, STOCK_READERS)?;
    ensure_restaurant(user, restaurant_id)?;

    let items: Vec<InventoryItem> = InventoryItems::find()
        .filter(inventory_items::Column::RestaurantId.eq(restaurant_id))
        .order_by_asc(inventory_items::Column::IngredientName)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(InventoryItem::from)
        .collect();

    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("OK", InventoryList { items }, Some(meta)))
}

pub async fn delete_ingredient(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<InventoryItem>> {
    ensure_role(user, KITCHEN)?;
    let item = find_item(state, id).await?;
    ensure_restaurant(user, item.restaurant_id)?;

    let used_by = MenuItemIngredients::find()
        .filter(menu_item_ingredients::Column::InventoryItemId.eq(id))
        .count(&state.orm)
        .await?;
    if used_by > 0 {
        return Err(AppError::Conflict(format!(
            "Ingredient is still used by {used_by} menu item(s)"
        )));
    }

    InventoryItems::delete_by_id(id).exec(&state.orm).await?;
    Ok(ApiResponse::success(
        "Ingredient deleted",
        item.into(),
        Some(Meta::empty()),
    ))
}

/// Stock of one ingredient right before and after a depletion.
#[derive(Debug, Clone)]
pub struct Depletion {
    pub item: inventory_items::Model,
    pub before: i64,
}

impl Depletion {
    pub fn crossed_low_stock(&self) -> bool {
        rules::crosses_low_stock(
            self.before,
            self.item.available_quantity,
            self.item.supplied_amount,
        )
    }

    pub fn low_stock_line(&self) -> LowStockLine {
        LowStockLine {
            ingredient: self.item.ingredient_name.clone(),
            remaining: self.item.available_quantity,
            unit: self.item.unit.clone(),
        }
    }
}

/// Takes `required` units out of stock, only if that many are available.
pub async fn deplete<C: ConnectionTrait>(
    conn: &C,
    ingredient_id: Uuid,
    required: i64,
) -> AppResult<Depletion> {
    let updated = InventoryItems::update_many()
        .col_expr(
            inventory_items::Column::AvailableQuantity,
            Expr::col(inventory_items::Column::AvailableQuantity).sub(required),
        )
        .col_expr(
            inventory_items::Column::UpdatedAt,
            Expr::value(chrono::DateTime::<chrono::FixedOffset>::from(Utc::now())),
        )
        .filter(inventory_items::Column::Id.eq(ingredient_id))
        .filter(inventory_items::Column::AvailableQuantity.gte(required))
        .exec_with_returning(conn)
        .await?;

    match updated.into_iter().next() {
        Some(item) => Ok(Depletion {
            before: item.available_quantity + required,
            item,
        }),
        None => {
            let current = InventoryItems::find_by_id(ingredient_id)
                .one(conn)
                .await?
                .ok_or(AppError::Domain(DomainError::IngredientNotFound(
                    ingredient_id,
                )))?;
            Err(DomainError::InsufficientStock {
                ingredient: current.ingredient_name,
                required,
                available: current.available_quantity,
            }
            .into())
        }
    }
}

pub async fn restock(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: RestockRequest,
) -> AppResult<ApiResponse<RestockResult>> {
    ensure_role(user, SUPPLY)?;
    if payload.amount <= 0 {
        return Err(AppError::BadRequest("Restock amount must be positive".into()));
    }
    validate_amounts(payload.amount, 0)?;

    let txn = state.orm.begin().await?;
    let item = InventoryItems::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Ingredient"))?;
    ensure_restaurant(user, item.restaurant_id)?;

    if !rules::restock_allowed(item.available_quantity, item.supplied_amount) {
        return Err(DomainError::RestockNotNeeded {
            available: item.available_quantity,
            supplied: item.supplied_amount,
        }
        .into());
    }

    let now = Utc::now();
    let available = rules::restocked_quantity(item.available_quantity, payload.amount)
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "Restocked quantity cannot exceed {}",
                rules::MAX_QUANTITY
            ))
        })?;
    let mut active: InventoryActive = item.into();
    active.supplied_amount = Set(payload.amount);
    active.available_quantity = Set(available);
    active.updated_at = Set(now.into());
    let item = active.update(&txn).await?;

    let supply = SupplyLogActive {
        id: Set(Uuid::new_v4()),
        inventory_item_id: Set(item.id),
        supplied_by: Set(user.user_id),
        amount: Set(payload.amount),
        supplied_at: NotSet,
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    tracing::info!(ingredient_id = %item.id, amount = payload.amount, "ingredient restocked");
    log_audit(
        state,
        Some(user.user_id),
        "ingredient_restock",
        "inventory_items",
        serde_json::json!({ "ingredient_id": item.id, "amount": payload.amount }),
    )
    .await;

    Ok(ApiResponse::success(
        "Ingredient restocked",
        RestockResult {
            item: item.into(),
            supply: supply.into(),
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_low_stock(
    state: &AppState,
    user: &AuthUser,
    restaurant_id: Uuid,
) -> AppResult<ApiResponse<InventoryList>> {
    ensure_role(user, STOCK_READERS)?;
    ensure_restaurant(user, restaurant_id)?;

    let items: Vec<InventoryItem> = InventoryItems::find()
        .filter(inventory_items::Column::RestaurantId.eq(restaurant_id))
        .order_by_asc(inventory_items::Column::AvailableQuantity)
        .all(&state.orm)
        .await?
        .into_iter()
        .filter(|item| rules::is_low_stock(item.available_quantity, item.supplied_amount))
        .map(InventoryItem::from)
        .collect();

    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("OK", InventoryList { items }, Some(meta)))
}

/// Sends one low-stock report to the restaurant's manager.
pub async fn report_low_stock(state: &AppState, restaurant_id: Uuid, lines: Vec<LowStockLine>) {
    if lines.is_empty() {
        return;
    }
    let recipient = async {
        let restaurant = find_restaurant(state, restaurant_id).await?;
        let manager = find_manager(state, restaurant_id).await?;
        AppResult::Ok((restaurant, manager))
    }
    .await;

    match recipient {
        Ok((restaurant, Some(manager))) => {
            notifier::dispatch(
                state.notifier.as_ref(),
                &manager.email,
                Notification::LowStock {
                    restaurant_name: restaurant.name,
                    items: lines,
                },
            )
            .await;
        }
        Ok((_, None)) => {
            tracing::warn!(restaurant_id = %restaurant_id, "low stock but no manager to notify");
        }
        Err(err) => tracing::warn!(error = %err, "low stock report failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_must_be_within_bounds() {
        assert!(validate_amounts(1000, 150).is_ok());
        assert!(validate_amounts(rules::MAX_QUANTITY, rules::MAX_QUANTITY).is_ok());
        assert!(matches!(validate_amounts(-1, 0), Err(AppError::BadRequest(_))));
        assert!(matches!(
            validate_amounts(1_000_000_000_000_000_000, 0),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            validate_amounts(10, rules::MAX_QUANTITY + 1),
            Err(AppError::BadRequest(_))
        ));
    }
}
