use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

use crate::{domain::Role, dto::auth::Claims, error::AppError, state::AppState};

pub const MANAGEMENT: &[Role] = &[Role::Manager];
pub const KITCHEN: &[Role] = &[Role::Chef, Role::Manager];
pub const SUPPLY: &[Role] = &[Role::Supplier, Role::Manager];
pub const FLOOR: &[Role] = &[Role::Waiter, Role::Cashier, Role::Manager];

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub restaurant_id: Option<Uuid>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Admin passes every role check.
pub fn ensure_role(user: &AuthUser, allowed: &[Role]) -> Result<(), AppError> {
    if user.is_admin() || allowed.contains(&user.role) {
        return Ok(());
    }
    Err(AppError::Forbidden)
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, &[])
}

/// Staff may only act on the restaurant they belong to.
pub fn ensure_restaurant(user: &AuthUser, restaurant_id: Uuid) -> Result<(), AppError> {
    if user.is_admin() || user.restaurant_id == Some(restaurant_id) {
        return Ok(());
    }
    Err(AppError::Forbidden)
}

pub fn decode_token(token: &str, secret: &str) -> Result<AuthUser, AppError> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

    let claims = decoded.claims;
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid user id in token".into()))?;
    let role = claims
        .role
        .parse::<Role>()
        .map_err(|_| AppError::Unauthorized("Invalid role in token".into()))?;

    Ok(AuthUser {
        user_id,
        email: claims.email,
        role,
        restaurant_id: claims.restaurant_id,
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization scheme".into()))?
            .trim();

        decode_token(token, &state.config.jwt_secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role, restaurant_id: Option<Uuid>) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            email: "x@example.com".into(),
            role,
            restaurant_id,
        }
    }

    #[test]
    fn admin_passes_every_role_check() {
        let admin = user(Role::Admin, None);
        assert!(ensure_role(&admin, KITCHEN).is_ok());
        assert!(ensure_admin(&admin).is_ok());
        assert!(ensure_restaurant(&admin, Uuid::new_v4()).is_ok());
    }

    #[test]
    fn role_sets_are_respected() {
        let chef = user(Role::Chef, None);
        assert!(ensure_role(&chef, KITCHEN).is_ok());
        assert!(ensure_role(&chef, SUPPLY).is_err());
        assert!(ensure_admin(&chef).is_err());

        let cashier = user(Role::Cashier, None);
        assert!(ensure_role(&cashier, FLOOR).is_ok());
        assert!(ensure_role(&cashier, MANAGEMENT).is_err());
    }

    #[test]
    fn staff_are_scoped_to_their_restaurant() {
        let home = Uuid::new_v4();
        let manager = user(Role::Manager, Some(home));
        assert!(ensure_restaurant(&manager, home).is_ok());
        assert!(ensure_restaurant(&manager, Uuid::new_v4()).is_err());
    }
}
