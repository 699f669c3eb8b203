use axum::{Router, http::Request};

use crate::state::AppState;

pub mod auth;
pub mod doc;
pub mod health;
pub mod inventory;
pub mod menu;
pub mod orders;
pub mod payments;
pub mod reservations;
pub mod restaurants;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/restaurants", restaurants::router())
        .nest("/inventory", inventory::router())
        .nest("/menu", menu::router())
        .nest("/reservations", reservations::router())
        .nest("/orders", orders::router())
        .nest("/payments", payments::router())
}

/// Value of `x-request-id`, or `-` when the request has none.
pub fn request_id<B>(request: &Request<B>) -> &str {
    request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_id_falls_back_to_dash() {
        let tagged = Request::builder()
            .header("x-request-id", "3f2c")
            .body(())
            .unwrap();
        assert_eq!(request_id(&tagged), "3f2c");

        let bare = Request::builder().body(()).unwrap();
        assert_eq!(request_id(&bare), "-");
    }
}
