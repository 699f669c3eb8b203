use anyhow::Context;
use restaurant_service::{
    db::{DbPool, create_orm_conn, run_migrations},
    domain::{Country, Role, Unit},
    services::auth_service::hash_password,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;

    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;
    let pool = orm.get_postgres_connection_pool();

    let admin_id = ensure_user(pool, None, "admin@example.com", "admin123", Role::Admin).await?;
    let restaurant_id = ensure_restaurant(pool, "Ferris Bistro", Country::Ethiopia).await?;
    ensure_user(
        pool,
        Some(restaurant_id),
        "manager@example.com",
        "manager123",
        Role::Manager,
    )
    .await?;
    ensure_user(pool, Some(restaurant_id), "chef@example.com", "chef123", Role::Chef).await?;
    ensure_user(
        pool,
        Some(restaurant_id),
        "supplier@example.com",
        "supplier123",
        Role::Supplier,
    )
    .await?;
    ensure_user(
        pool,
        Some(restaurant_id),
        "customer@example.com",
        "customer123",
        Role::Customer,
    )
    .await?;

    seed_tables(pool, restaurant_id).await?;
    seed_menu(pool, restaurant_id).await?;

    println!("Seed completed. Admin ID: {admin_id}, Restaurant ID: {restaurant_id}");
    Ok(())
}

async fn ensure_user(
    pool: &DbPool,
    restaurant_id: Option<Uuid>,
    email: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password)?;
    let (first_name, _) = email.split_once('@').unwrap_or((email, ""));

    let row: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, restaurant_id, first_name, last_name, email, phone, password_hash, role)
        VALUES ($1, $2, $3, 'Seed', $4, '251900000000', $5, $6)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(restaurant_id)
    .bind(first_name)
    .bind(email)
    .bind(password_hash)
    .bind(role.as_str())
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}

async fn ensure_restaurant(pool: &DbPool, name: &str, country: Country) -> anyhow::Result<Uuid> {
    let row: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO restaurants (id, name, email, phone, address, country, currency)
        VALUES ($1, $2, 'bistro@example.com', '251911000000', 'Bole Road', $3, $4)
        ON CONFLICT (name) DO UPDATE SET country = EXCLUDED.country
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(country.as_str())
    .bind(country.currency())
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}

async fn seed_tables(pool: &DbPool, restaurant_id: Uuid) -> anyhow::Result<()> {
    for (number, capacity) in [(1, 2), (2, 4), (5, 6)] {
        sqlx::query(
            r#"
            INSERT INTO dining_tables (id, restaurant_id, table_number, capacity)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (restaurant_id, table_number) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(restaurant_id)
        .bind(number)
        .bind(capacity)
        .execute(pool)
        .await?;
    }

    println!("Seeded tables");
    Ok(())
}

async fn ensure_ingredient(
    pool: &DbPool,
    restaurant_id: Uuid,
    name: &str,
    supplied: i64,
    unit: Unit,
) -> anyhow::Result<Uuid> {
    let row: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO inventory_items (id, restaurant_id, ingredient_name, supplied_amount, available_quantity, unit)
        VALUES ($1, $2, $3, $4, $4, $5)
        ON CONFLICT (restaurant_id, ingredient_name) DO UPDATE SET unit = EXCLUDED.unit
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(restaurant_id)
    .bind(name)
    .bind(supplied)
    .bind(unit.as_str())
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}

async fn seed_menu(pool: &DbPool, restaurant_id: Uuid) -> anyhow::Result<()> {
    let teff = ensure_ingredient(pool, restaurant_id, "Teff flour", 20_000, Unit::Gram).await?;
    let beef = ensure_ingredient(pool, restaurant_id, "Beef", 10_000, Unit::Gram).await?;
    let coffee = ensure_ingredient(pool, restaurant_id, "Coffee beans", 5_000, Unit::Gram).await?;

    let dishes: [(&str, &str, i64, Vec<(Uuid, i64)>); 3] = [
        ("Tibs", "Main", 350, vec![(beef, 250), (teff, 100)]),
        ("Kitfo", "Main", 420, vec![(beef, 300)]),
        ("Buna", "Drinks", 50, vec![(coffee, 20)]),
    ];

    for (name, category, price, recipe) in dishes {
        let row: (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO menu_items (id, restaurant_id, name, category, price)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (restaurant_id, name) DO UPDATE SET price = EXCLUDED.price
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(restaurant_id)
        .bind(name)
        .bind(category)
        .bind(price)
        .fetch_one(pool)
        .await?;

        for (ingredient_id, amount) in recipe {
            sqlx::query(
                r#"
                INSERT INTO menu_item_ingredients (id, menu_item_id, inventory_item_id, amount_used_per_item)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (menu_item_id, inventory_item_id) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(row.0)
            .bind(ingredient_id)
            .bind(amount)
            .execute(pool)
            .await?;
        }
    }

    println!("Seeded inventory and menu");
    Ok(())
}
