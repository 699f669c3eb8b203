use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    domain::{ReservationStatus, Role},
    dto::restaurants::{
        CreateRestaurantRequest, CreateTableRequest, RegisterStaffRequest, TableList,
        UpdateRestaurantRequest,
    },
    entity::{
        Bookings, DiningTables, Restaurants, Users, bookings,
        dining_tables::{self, ActiveModel as TableActive},
        restaurants::{self, ActiveModel as RestaurantActive},
        users,
    },
    error::{AppError, AppResult, DomainError},
    middleware::auth::{AuthUser, MANAGEMENT, ensure_admin, ensure_restaurant, ensure_role},
    models::{DiningTable, Restaurant, User},
    response::{ApiResponse, Meta},
    services::auth_service::{NewAccount, create_account},
    state::AppState,
};

pub const DEFAULT_PREPAYMENT: i64 = 500;

pub async fn find_restaurant(state: &AppState, id: Uuid) -> AppResult<restaurants::Model> {
    Restaurants::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Restaurant"))
}

pub async fn find_table(
    state: &AppState,
    restaurant_id: Uuid,
    table_number: i32,
) -> AppResult<dining_tables::Model> {
    DiningTables::find()
        .filter(dining_tables::Column::RestaurantId.eq(restaurant_id))
        .filter(dining_tables::Column::TableNumber.eq(table_number))
        .one(&state.orm)
        .await?
        .ok_or(AppError::Domain(DomainError::TableNotFound(table_number)))
}

async fn ensure_unique_identity(
    state: &AppState,
    name: Option<&str>,
    email: Option<&str>,
    except: Option<Uuid>,
) -> AppResult<()> {
    let mut any = Condition::any();
    if let Some(name) = name {
        any = any.add(restaurants::Column::Name.eq(name));
    }
    if let Some(email) = email {
        any = any.add(restaurants::Column::Email.eq(email));
    }
    if any.is_empty() {
        return Ok(());
    }

    let mut finder = Restaurants::find().filter(any);
    if let Some(id) = except {
        finder = finder.filter(restaurants::Column::Id.ne(id));
    }
    if finder.one(&state.orm).await?.is_some() {
        return Err(AppError::Conflict(
            "A restaurant with this name or email already exists".into(),
        ));
    }
    Ok(())
}

pub async fn register_restaurant(
    state: &AppState,
    user: &AuthUser,
    payload: CreateRestaurantRequest,
) -> AppResult<ApiResponse<Restaurant>> {
    ensure_admin(user)?;
    ensure_unique_identity(state, Some(&payload.name), Some(&payload.email), None).await?;

    let restaurant = RestaurantActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        email: Set(payload.email),
        phone: Set(payload.phone),
        address: Set(payload.address),
        country: Set(payload.country.as_str().to_string()),
        currency: Set(payload.country.currency().to_string()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(restaurant_id = %restaurant.id, "restaurant registered");
    log_audit(
        state,
        Some(user.user_id),
        "restaurant_register",
        "restaurants",
        serde_json::json!({ "restaurant_id": restaurant.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Restaurant registered",
        restaurant.into(),
        Some(Meta::empty()),
    ))
}

pub async fn update_restaurant(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateRestaurantRequest,
) -> AppResult<ApiResponse<Restaurant>> {
    ensure_role(user, MANAGEMENT)?;
    ensure_restaurant(user, id)?;
    let existing = find_restaurant(state, id).await?;
    ensure_unique_identity(
        state,
        payload.name.as_deref(),
        payload.email.as_deref(),
        Some(id),
    )
    .await?;

    let mut active: RestaurantActive = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(email) = payload.email {
        active.email = Set(email);
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(phone);
    }
    if let Some(address) = payload.address {
        active.address = Set(address);
    }
    if let Some(country) = payload.country {
        active.country = Set(country.as_str().to_string());
        active.currency = Set(country.currency().to_string());
    }
    let restaurant = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Restaurant updated",
        restaurant.into(),
        Some(Meta::empty()),
    ))
}

pub async fn get_restaurant(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Restaurant>> {
    let restaurant = find_restaurant(state, id).await?;
    Ok(ApiResponse::success(
        "OK",
        restaurant.into(),
        Some(Meta::empty()),
    ))
}

pub async fn register_staff(
    state: &AppState,
    user: &AuthUser,
    restaurant_id: Uuid,
    payload: RegisterStaffRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_role(user, MANAGEMENT)?;
    ensure_restaurant(user, restaurant_id)?;
    if !payload.role.is_staff() {
        return Err(AppError::BadRequest(format!(
            "{} is not a staff role",
            payload.role
        )));
    }
    find_restaurant(state, restaurant_id).await?;

    let staff = create_account(
        state,
        NewAccount {
            restaurant_id: Some(restaurant_id),
            first_name: payload.first_name,
            last_name: payload.last_name,
            email: payload.email,
            phone: payload.phone,
            password: payload.password,
            role: payload.role,
        },
    )
    .await?;

    log_audit(
        state,
        Some(user.user_id),
        "staff_register",
        "users",
        serde_json::json!({ "staff_id": staff.id, "role": staff.role }),
    )
    .await;

    Ok(ApiResponse::success(
        "Staff registered",
        staff.into(),
        Some(Meta::empty()),
    ))
}

pub async fn create_table(
    state: &AppState,
    user: &AuthUser,
    restaurant_id: Uuid,
    payload: CreateTableRequest,
) -> AppResult<ApiResponse<DiningTable>> {
    ensure_role(user, MANAGEMENT)?;
    ensure_restaurant(user, restaurant_id)?;
    find_restaurant(state, restaurant_id).await?;

    if payload.table_number < 1 {
        return Err(AppError::BadRequest("Table number must be positive".into()));
    }
    let prepayment_amount = payload.prepayment_amount.unwrap_or(DEFAULT_PREPAYMENT);
    if prepayment_amount < 0 {
        return Err(AppError::BadRequest("Prepayment cannot be negative".into()));
    }

    let duplicate = DiningTables::find()
        .filter(dining_tables::Column::RestaurantId.eq(restaurant_id))
        .filter(dining_tables::Column::TableNumber.eq(payload.table_number))
        .one(&state.orm)
        .await?;
    if duplicate.is_some() {
        return Err(AppError::Conflict(format!(
            "Table {} already exists",
            payload.table_number
        )));
    }

    let table = TableActive {
        id: Set(Uuid::new_v4()),
        restaurant_id: Set(restaurant_id),
        table_number: Set(payload.table_number),
        prepayment_amount: Set(prepayment_amount),
        capacity: Set(payload.capacity),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Table created",
        table.into(),
        Some(Meta::empty()),
    ))
}

pub async fn delete_table(
    state: &AppState,
    user: &AuthUser,
    restaurant_id: Uuid,
    table_number: i32,
) -> AppResult<ApiResponse<DiningTable>> {
    ensure_role(user, MANAGEMENT)?;
    ensure_restaurant(user, restaurant_id)?;
    let table = find_table(state, restaurant_id, table_number).await?;

    let active_bookings = Bookings::find()
        .filter(bookings::Column::TableId.eq(table.id))
        .filter(bookings::Column::ReservationStatus.is_in([
            ReservationStatus::Pending.as_str(),
            ReservationStatus::Confirmed.as_str(),
        ]))
        .count(&state.orm)
        .await?;
    if active_bookings > 0 {
        return Err(AppError::Conflict(format!(
            "Table {table_number} still has {active_bookings} active booking(s)"
        )));
    }

    DiningTables::delete_by_id(table.id).exec(&state.orm).await?;
    tracing::info!(restaurant_id = %restaurant_id, table_number, "table deleted");

    Ok(ApiResponse::success(
        "Table deleted",
        table.into(),
        Some(Meta::empty()),
    ))
}

pub async fn list_tables(state: &AppState, restaurant_id: Uuid) -> AppResult<ApiResponse<TableList>> {
    let items: Vec<DiningTable> = DiningTables::find()
        .filter(dining_tables::Column::RestaurantId.eq(restaurant_id))
        .order_by_asc(dining_tables::Column::TableNumber)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(DiningTable::from)
        .collect();

    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("OK", TableList { items }, Some(meta)))
}

/// First manager account of a restaurant; low-stock reports go there.
pub async fn find_manager(
    state: &AppState,
    restaurant_id: Uuid,
) -> AppResult<Option<users::Model>> {
    let manager = Users::find()
        .filter(users::Column::RestaurantId.eq(restaurant_id))
        .filter(users::Column::Role.eq(Role::Manager.as_str()))
        .order_by_asc(users::Column::CreatedAt)
        .one(&state.orm)
        .await?;
    Ok(manager)
}
