use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    domain::Role,
    dto::auth::{Claims, LoginRequest, LoginResponse, RegisterRequest},
    entity::{
        Restaurants, Users,
        users::{self, ActiveModel as UserActive},
    },
    error::{AppError, AppResult},
    models::User,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub const TOKEN_TTL_HOURS: i64 = 24;

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

/// Account fields shared by customer sign-up and staff registration.
pub struct NewAccount {
    pub restaurant_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub role: Role,
}

pub async fn create_account(state: &AppState, account: NewAccount) -> AppResult<users::Model> {
    let email = account.email.trim().to_lowercase();
    let taken = Users::find()
        .filter(users::Column::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;
    if taken.is_some() {
        return Err(AppError::Conflict("Email is already taken".into()));
    }

    let password_hash = hash_password(&account.password)?;
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        restaurant_id: Set(account.restaurant_id),
        first_name: Set(account.first_name),
        last_name: Set(account.last_name),
        email: Set(email),
        phone: Set(account.phone),
        password_hash: Set(password_hash),
        role: Set(account.role.as_str().to_string()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(user)
}

pub async fn register_customer(
    state: &AppState,
    restaurant_id: Uuid,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    Restaurants::find_by_id(restaurant_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Restaurant"))?;

    let RegisterRequest {
        first_name,
        last_name,
        email,
        phone,
        password,
    } = payload;
    let user = create_account(
        state,
        NewAccount {
            restaurant_id: Some(restaurant_id),
            first_name,
            last_name,
            email,
            phone,
            password,
            role: Role::Customer,
        },
    )
    .await?;

    log_audit(
        state,
        Some(user.id),
        "user_register",
        "users",
        serde_json::json!({ "user_id": user.id, "restaurant_id": restaurant_id }),
    )
    .await;
    Ok(ApiResponse::success("User created", user.into(), None))
}

pub fn issue_token(secret: &str, user: &users::Model) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(TOKEN_TTL_HOURS))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        role: user.role.clone(),
        restaurant_id: user.restaurant_id,
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;
    let user = Users::find()
        .filter(users::Column::Email.eq(email.trim().to_lowercase()))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".into()))?;

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::Unauthorized("Invalid email or password".into()));
    }

    let token = issue_token(&state.config.jwt_secret, &user)?;

    log_audit(
        state,
        Some(user.id),
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    let resp = LoginResponse {
        token: format!("Bearer {}", token),
        user: user.into(),
    };
    Ok(ApiResponse::success("Logged in", resp, Some(Meta::empty())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::auth::decode_token;

    #[test]
    fn issued_tokens_resolve_back_to_the_user() {
        let restaurant_id = Uuid::new_v4();
        let user = users::Model {
            id: Uuid::new_v4(),
            restaurant_id: Some(restaurant_id),
            first_name: "Hana".into(),
            last_name: "Bekele".into(),
            email: "hana@example.com".into(),
            phone: "0911000000".into(),
            password_hash: String::new(),
            role: "Chef".into(),
            created_at: Utc::now().into(),
        };

        let token = issue_token("secret", &user).unwrap();
        let auth = decode_token(&token, "secret").unwrap();
        assert_eq!(auth.user_id, user.id);
        assert_eq!(auth.role, Role::Chef);
        assert_eq!(auth.restaurant_id, Some(restaurant_id));

        assert!(decode_token(&token, "other").is_err());
    }

    #[test]
    fn password_hashes_verify() {
        let hash = hash_password("pa55word").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(
            Argon2::default()
                .verify_password(b"pa55word", &parsed)
                .is_ok()
        );
    }
}
