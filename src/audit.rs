use serde_json::Value;
use uuid::Uuid;

use crate::{db::DbPool, error::AppResult, state::AppState};

async fn insert_audit(
    state: &AppState,
    user_id: Option<Uuid>,
    action: &str,
    resource: Option<&str>,
    metadata: Option<Value>,
) -> AppResult<()> {
    let pool: &DbPool = state.orm.get_postgres_connection_pool();
    sqlx::query(
        r#"
        INSERT INTO audit_logs (id, user_id, action, resource, metadata)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(action)
    .bind(resource)
    .bind(metadata)
    .execute(pool)
    .await?;

    Ok(())
}

/// Records an audit entry; failures are logged and never reach the caller.
pub async fn log_audit(
    state: &AppState,
    user_id: Option<Uuid>,
    action: &str,
    resource: &str,
    metadata: Value,
) {
    if let Err(err) = insert_audit(state, user_id, action, Some(resource), Some(metadata)).await {
        tracing::warn!(error = %err, action, "audit log failed");
    }
}
