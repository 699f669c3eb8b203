use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    dto::menu::{
        AddIngredientsRequest, AvailabilityRequest, CreateMenuItemRequest, IngredientLine,
        MenuList, UpdateMenuItemRequest,
    },
    entity::{
        InventoryItems, MenuItemIngredients, MenuItems, inventory_items,
        menu_item_ingredients::{self, ActiveModel as RecipeActive},
        menu_items::{self, ActiveModel as MenuActive},
    },
    error::{AppError, AppResult, DomainError},
    middleware::auth::{AuthUser, KITCHEN, ensure_restaurant, ensure_role},
    models::MenuItem,
    response::{ApiResponse, Meta},
    services::restaurant_service::find_restaurant,
    state::AppState,
};

/// A live (not deleted) menu item.
pub async fn find_menu_item<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<menu_items::Model> {
    MenuItems::find_by_id(id)
        .filter(menu_items::Column::IsDeleted.eq(false))
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Menu item"))
}

pub async fn recipe_of<C: ConnectionTrait>(
    conn: &C,
    menu_item_id: Uuid,
) -> AppResult<Vec<menu_item_ingredients::Model>> {
    let lines = MenuItemIngredients::find()
        .filter(menu_item_ingredients::Column::MenuItemId.eq(menu_item_id))
        .all(conn)
        .await?;
    Ok(lines)
}

async fn load(state: &AppState, item: menu_items::Model) -> AppResult<MenuItem> {
    let recipe = recipe_of(&state.orm, item.id).await?;
    Ok(MenuItem::from_parts(item, recipe))
}

/// Every ingredient must belong to the item's restaurant and be used in a positive amount.
async fn validate_lines<C: ConnectionTrait>(
    conn: &C,
    restaurant_id: Uuid,
    lines: &[IngredientLine],
) -> AppResult<()> {
    for line in lines {
        if line.amount_used_per_item <= 0 {
            return Err(AppError::BadRequest(
                "Amount used per item must be positive".into(),
            ));
        }
    }

    let ids: Vec<Uuid> = lines.iter().map(|l| l.ingredient_id).collect();
    let known: HashSet<Uuid> = InventoryItems::find()
        .filter(inventory_items::Column::RestaurantId.eq(restaurant_id))
        .filter(inventory_items::Column::Id.is_in(ids.clone()))
        .all(conn)
        .await?
        .into_iter()
        .map(|item| item.id)
        .collect();

    match ids.into_iter().find(|id| !known.contains(id)) {
        Some(missing) => Err(DomainError::IngredientNotFound(missing).into()),
        None => Ok(()),
    }
}

async fn insert_lines<C: ConnectionTrait>(
    conn: &C,
    menu_item_id: Uuid,
    lines: &[IngredientLine],
) -> AppResult<()> {
    for line in lines {
        RecipeActive {
            id: Set(Uuid::new_v4()),
            menu_item_id: Set(menu_item_id),
            inventory_item_id: Set(line.ingredient_id),
            amount_used_per_item: Set(line.amount_used_per_item),
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

/// Collapses repeated ingredients, keeping the first amount given.
fn dedupe(lines: Vec<IngredientLine>) -> Vec<IngredientLine> {
    let mut seen = HashSet::new();
    lines
        .into_iter()
        .filter(|line| seen.insert(line.ingredient_id))
        .collect()
}

async fn ensure_name_free(
    state: &AppState,
    restaurant_id: Uuid,
    name: &str,
    except: Option<Uuid>,
) -> AppResult<()> {
    let mut finder = MenuItems::find()
        .filter(menu_items::Column::RestaurantId.eq(restaurant_id))
        .filter(menu_items::Column::Name.eq(name));
    if let Some(id) = except {
        finder = finder.filter(menu_items::Column::Id.ne(id));
    }
    if finder.one(&state.orm).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "Menu item '{name}' already exists"
        )));
    }
    Ok(())
}

pub async fn add_menu_item(
    state: &AppState,
    user: &AuthUser,
    restaurant_id: Uuid,
    payload: CreateMenuItemRequest,
) -> AppResult<ApiResponse<MenuItem>> {
    ensure_role(user, KITCHEN)?;
    ensure_restaurant(user, restaurant_id)?;
    find_restaurant(state, restaurant_id).await?;
    if payload.price < 0 {
        return Err(AppError::BadRequest("Price cannot be negative".into()));
    }
    ensure_name_free(state, restaurant_id, &payload.name, None).await?;

    let lines = dedupe(payload.ingredients);
    let txn = state.orm.begin().await?;
    validate_lines(&txn, restaurant_id, &lines).await?;

    let now = Utc::now();
    let item = MenuActive {
        id: Set(Uuid::new_v4()),
        restaurant_id: Set(restaurant_id),
        name: Set(payload.name),
        category: Set(payload.category),
        price: Set(payload.price),
        is_available: Set(true),
        is_deleted: Set(false),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;
    insert_lines(&txn, item.id, &lines).await?;
    txn.commit().await?;

    tracing::debug!(menu_item_id = %item.id, "menu item added");
    Ok(ApiResponse::success(
        "Menu item added",
        load(state, item).await?,
        Some(Meta::empty()),
    ))
}

pub async fn update_menu_item(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateMenuItemRequest,
) -> AppResult<ApiResponse<MenuItem>> {
    ensure_role(user, KITCHEN)?;
    let item = find_menu_item(&state.orm, id).await?;
    ensure_restaurant(user, item.restaurant_id)?;

    let mut active: MenuActive = item.clone().into();
    if let Some(name) = payload.name {
        ensure_name_free(state, item.restaurant_id, &name, Some(id)).await?;
        active.name = Set(name);
    }
    if let Some(category) = payload.category {
        active.category = Set(category);
    }
    if let Some(price) = payload.price {
        if price < 0 {
            return Err(AppError::BadRequest("Price cannot be negative".into()));
        }
        active.price = Set(price);
    }
    active.updated_at = Set(Utc::now().into());
    let item = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Menu item updated",
        load(state, item).await?,
        Some(Meta::empty()),
    ))
}

pub async fn add_ingredients(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: AddIngredientsRequest,
) -> AppResult<ApiResponse<MenuItem>> {
    ensure_role(user, KITCHEN)?;
    let item = find_menu_item(&state.orm, id).await?;
    ensure_restaurant(user, item.restaurant_id)?;

    let txn = state.orm.begin().await?;
    let existing: HashMap<Uuid, i64> = recipe_of(&txn, id)
        .await?
        .into_iter()
        .map(|line| (line.inventory_item_id, line.amount_used_per_item))
        .collect();
    let fresh: Vec<IngredientLine> = dedupe(payload.ingredients)
        .into_iter()
        .filter(|line| !existing.contains_key(&line.ingredient_id))
        .collect();
    if fresh.is_empty() {
        return Err(DomainError::NoNewIngredients.into());
    }

    validate_lines(&txn, item.restaurant_id, &fresh).await?;
    insert_lines(&txn, id, &fresh).await?;
    txn.commit().await?;

    Ok(ApiResponse::success(
        format!("{} ingredient(s) added", fresh.len()),
        load(state, item).await?,
        Some(Meta::empty()),
    ))
}

pub async fn remove_ingredient(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    ingredient_id: Uuid,
) -> AppResult<ApiResponse<MenuItem>> {
    ensure_role(user, KITCHEN)?;
    let item = find_menu_item(&state.orm, id).await?;
    ensure_restaurant(user, item.restaurant_id)?;

    let removed = MenuItemIngredients::delete_many()
        .filter(menu_item_ingredients::Column::MenuItemId.eq(id))
        .filter(menu_item_ingredients::Column::InventoryItemId.eq(ingredient_id))
        .exec(&state.orm)
        .await?;
    if removed.rows_affected == 0 {
        return Err(DomainError::IngredientNotFound(ingredient_id).into());
    }

    Ok(ApiResponse::success(
        "Ingredient removed",
        load(state, item).await?,
        Some(Meta::empty()),
    ))
}

/// Flips availability as requested; stock is not re-checked when re-enabling.
pub async fn set_availability(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: AvailabilityRequest,
) -> AppResult<ApiResponse<MenuItem>> {
    ensure_role(user, KITCHEN)?;
    let item = find_menu_item(&state.orm, id).await?;
    ensure_restaurant(user, item.restaurant_id)?;

    let mut active: MenuActive = item.into();
    active.is_available = Set(payload.is_available);
    active.updated_at = Set(Utc::now().into());
    let item = active.update(&state.orm).await?;

    tracing::info!(menu_item_id = %item.id, is_available = item.is_available, "availability changed");
    Ok(ApiResponse::success(
        "Availability updated",
        load(state, item).await?,
        Some(Meta::empty()),
    ))
}

/// Marks an item unavailable outside any request transaction.
pub async fn mark_unavailable<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<()> {
    MenuItems::update_many()
        .col_expr(menu_items::Column::IsAvailable, Expr::value(false))
        .filter(menu_items::Column::Id.eq(id))
        .exec(conn)
        .await?;
    Ok(())
}

pub async fn delete_menu_item(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<MenuItem>> {
    ensure_role(user, KITCHEN)?;
    let item = find_menu_item(&state.orm, id).await?;
    ensure_restaurant(user, item.restaurant_id)?;

    let mut active: MenuActive = item.into();
    active.is_deleted = Set(true);
    active.is_available = Set(false);
    active.updated_at = Set(Utc::now().into());
    let item = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Menu item deleted",
        load(state, item).await?,
        Some(Meta::empty()),
    ))
}

pub async fn list_menu(state: &AppState, restaurant_id: Uuid) -> AppResult<ApiResponse<MenuList>> {
    let items = MenuItems::find()
        .filter(menu_items::Column::RestaurantId.eq(restaurant_id))
        .filter(menu_items::Column::IsDeleted.eq(false))
        .order_by_asc(menu_items::Column::Category)
        .order_by_asc(menu_items::Column::Name)
        .all(&state.orm)
        .await?;

    let ids: Vec<Uuid> = items.iter().map(|item| item.id).collect();
    let mut recipes: HashMap<Uuid, Vec<menu_item_ingredients::Model>> = HashMap::new();
    for line in MenuItemIngredients::find()
        .filter(menu_item_ingredients::Column::MenuItemId.is_in(ids))
        .all(&state.orm)
        .await?
    {
        recipes.entry(line.menu_item_id).or_default().push(line);
    }

    let items: Vec<MenuItem> = items
        .into_iter()
        .map(|item| {
            let recipe = recipes.remove(&item.id).unwrap_or_default();
            MenuItem::from_parts(item, recipe)
        })
        .collect();

    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("OK", MenuList { items }, Some(meta)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_ingredients_keep_the_first_amount() {
        let flour = Uuid::new_v4();
        let egg = Uuid::new_v4();
        let lines = dedupe(vec![
            IngredientLine {
                ingredient_id: flour,
                amount_used_per_item: 100,
            },
            IngredientLine {
                ingredient_id: egg,
                amount_used_per_item: 2,
            },
            IngredientLine {
                ingredient_id: flour,
                amount_used_per_item: 999,
            },
        ]);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].amount_used_per_item, 100);
        assert_eq!(lines[1].ingredient_id, egg);
    }
}
