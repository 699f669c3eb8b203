use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    gateway::GatewayError,
    response::{ApiResponse, Meta},
};

/// Status class a failure is reported with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Validation,
    Forbidden,
}

impl ErrorKind {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        }
    }
}

/// Business-rule violations raised by the inventory, menu, reservation and order paths.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Insufficient stock of {ingredient}: {required} required, {available} available")]
    InsufficientStock {
        ingredient: String,
        required: i64,
        available: i64,
    },

    #[error("Restock not needed: {available} available of {supplied} supplied")]
    RestockNotNeeded { available: i64, supplied: i64 },

    #[error("No new ingredients to add, all of them already exist")]
    NoNewIngredients,

    #[error("Ingredient {0} not found")]
    IngredientNotFound(Uuid),

    #[error("Table {0} not found")]
    TableNotFound(i32),

    #[error("The requested time overlaps a confirmed booking")]
    TimeConflict,

    #[error("No booking in a cancelable state")]
    BookingNotCancelable,

    #[error("Not in a payable state")]
    NotPayable,

    #[error("No confirmed and paid reservation on table {0} for this user")]
    ReservationNotOwned(i32),

    #[error("Total price {claimed} does not match item price x quantity ({expected})")]
    PriceMismatch { expected: i64, claimed: i64 },

    #[error("Order cannot be changed after confirmation or payment")]
    OrderLocked,

    #[error("Cannot move from {from} to {to}")]
    IllegalTransition { from: String, to: String },

    #[error("Menu item is not available")]
    MenuItemUnavailable,

    #[error("Quantity {0} is not valid")]
    InvalidQuantity(i32),

    #[error("Reservation must end after it starts")]
    InvalidWindow,
}

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::IngredientNotFound(_) | DomainError::TableNotFound(_) => {
                ErrorKind::NotFound
            }
            DomainError::ReservationNotOwned(_) => ErrorKind::Forbidden,
            DomainError::PriceMismatch { .. }
            | DomainError::InvalidQuantity(_)
            | DomainError::InvalidWindow => ErrorKind::Validation,
            DomainError::InsufficientStock { .. }
            | DomainError::RestockNotNeeded { .. }
            | DomainError::NoNewIngredients
            | DomainError::TimeConflict
            | DomainError::BookingNotCancelable
            | DomainError::NotPayable
            | DomainError::OrderLocked
            | DomainError::IllegalTransition { .. }
            | DomainError::MenuItemUnavailable => ErrorKind::Conflict,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            DomainError::InsufficientStock { .. } => "InsufficientStock",
            DomainError::RestockNotNeeded { .. } => "RestockNotNeeded",
            DomainError::NoNewIngredients => "NoNewIngredients",
            DomainError::IngredientNotFound(_) => "IngredientNotFound",
            DomainError::TableNotFound(_) => "TableNotFound",
            DomainError::TimeConflict => "TimeConflict",
            DomainError::BookingNotCancelable => "BookingNotCancelable",
            DomainError::NotPayable => "NotPayable",
            DomainError::ReservationNotOwned(_) => "ReservationNotOwned",
            DomainError::PriceMismatch { .. } => "PriceMismatch",
            DomainError::OrderLocked => "OrderLocked",
            DomainError::IllegalTransition { .. } => "IllegalTransition",
            DomainError::MenuItemUnavailable => "MenuItemUnavailable",
            DomainError::InvalidQuantity(_) => "InvalidQuantity",
            DomainError::InvalidWindow => "InvalidWindow",
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Payment gateway error: {0}")]
    Upstream(#[from] GatewayError),

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Domain(err) => err.kind().status(),
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::DbError(_) | AppError::OrmError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NotFound",
            AppError::Conflict(_) => "Conflict",
            AppError::BadRequest(_) => "Validation",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::Forbidden => "Forbidden",
            AppError::Domain(err) => err.code(),
            AppError::Upstream(_) => "UpstreamFailure",
            AppError::DbError(_) | AppError::OrmError(_) | AppError::Internal(_) => "Internal",
        }
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
    code: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::DbError(err) => tracing::error!(error = %err, "database error"),
            AppError::OrmError(err) => tracing::error!(error = %err, "orm error"),
            AppError::Internal(err) => tracing::error!(error = %err, "internal error"),
            AppError::Upstream(err) => tracing::warn!(error = %err, "payment gateway error"),
            _ => {}
        }

        let body = ApiResponse {
            message: self.to_string(),
            data: Some(ErrorData {
                error: self.to_string(),
                code: self.code(),
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_the_taxonomy() {
        let stock = AppError::from(DomainError::InsufficientStock {
            ingredient: "flour".into(),
            required: 10,
            available: 2,
        });
        assert_eq!(stock.status(), StatusCode::CONFLICT);

        let price = AppError::from(DomainError::PriceMismatch {
            expected: 100,
            claimed: 90,
        });
        assert_eq!(price.status(), StatusCode::BAD_REQUEST);

        let table = AppError::from(DomainError::TableNotFound(5));
        assert_eq!(table.status(), StatusCode::NOT_FOUND);

        let owner = AppError::from(DomainError::ReservationNotOwned(5));
        assert_eq!(owner.status(), StatusCode::FORBIDDEN);

        assert_eq!(
            AppError::from(DomainError::TimeConflict).status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn gateway_failures_are_bad_gateway() {
        let err = AppError::from(GatewayError::Rejected("declined".into()));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.code(), "UpstreamFailure");
    }

    #[test]
    fn response_carries_the_domain_code() {
        let response = AppError::from(DomainError::OrderLocked).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
