use anyhow::Context;
use restaurant_service::db::{create_orm_conn, run_migrations};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    // Only the database is needed here, not the full application config.
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;
    println!("Migrations applied");
    Ok(())
}
