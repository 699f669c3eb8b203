use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    domain::{
        Country, OrderStatus, PaymentMethod, PaymentStatus, ReservationStatus, Role, Unit,
    },
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        inventory::{
            AddIngredientRequest, InventoryList, RestockRequest, RestockResult,
            UpdateIngredientRequest,
        },
        menu::{
            AddIngredientsRequest, AvailabilityRequest, CreateMenuItemRequest, IngredientLine,
            MenuList, UpdateMenuItemRequest,
        },
        orders::{
            OrderList, OrderListQuery, PayOrderRequest, PlaceOrderRequest, UpdateOrderRequest,
            UpdateOrderStatusRequest,
        },
        payments::{CallbackOutcome, CallbackQuery, PaidResource, PaymentInitiated},
        reservations::{BookTableRequest, BookingList, CancelBookingRequest, PayBookingRequest},
        restaurants::{
            CreateRestaurantRequest, CreateTableRequest, RegisterStaffRequest, TableList,
            UpdateRestaurantRequest,
        },
    },
    models::{
        Booking, DiningTable, InventoryItem, MenuIngredient, MenuItem, Order, Restaurant,
        SupplyLogEntry, User,
    },
    response::{ApiResponse, Meta},
    routes::{auth, health, inventory, menu, orders, payments, reservations, restaurants},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        restaurants::register_restaurant,
        restaurants::get_restaurant,
        restaurants::update_restaurant,
        restaurants::register_staff,
        restaurants::list_tables,
        restaurants::create_table,
        restaurants::delete_table,
        inventory::add_ingredient,
        inventory::list_ingredients,
        inventory::list_low_stock,
        inventory::get_ingredient,
        inventory::update_ingredient,
        inventory::delete_ingredient,
        inventory::restock,
        menu::add_menu_item,
        menu::list_menu,
        menu::update_menu_item,
        menu::add_ingredients,
        menu::remove_ingredient,
        menu::set_availability,
        menu::delete_menu_item,
        reservations::book,
        reservations::cancel,
        reservations::pay,
        reservations::complete,
        reservations::my_reservations,
        orders::place_order,
        orders::cancel_order,
        orders::update_order,
        orders::pay_order,
        orders::update_status,
        orders::my_orders,
        orders::list_restaurant_orders,
        orders::list_orders_for_item,
        payments::callback
    ),
    components(
        schemas(
            Country,
            Role,
            Unit,
            OrderStatus,
            PaymentMethod,
            PaymentStatus,
            ReservationStatus,
            User,
            Restaurant,
            DiningTable,
            InventoryItem,
            SupplyLogEntry,
            MenuItem,
            MenuIngredient,
            Booking,
            Order,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            CreateRestaurantRequest,
            UpdateRestaurantRequest,
            RegisterStaffRequest,
            CreateTableRequest,
            TableList,
            AddIngredientRequest,
            UpdateIngredientRequest,
            RestockRequest,
            RestockResult,
            InventoryList,
            IngredientLine,
            CreateMenuItemRequest,
            UpdateMenuItemRequest,
            AddIngredientsRequest,
            AvailabilityRequest,
            MenuList,
            BookTableRequest,
            CancelBookingRequest,
            PayBookingRequest,
            BookingList,
            PlaceOrderRequest,
            UpdateOrderRequest,
            PayOrderRequest,
            UpdateOrderStatusRequest,
            OrderListQuery,
            OrderList,
            PaymentInitiated,
            CallbackQuery,
            CallbackOutcome,
            PaidResource,
            health::HealthData,
            Meta,
            ApiResponse<User>,
            ApiResponse<Order>,
            ApiResponse<Booking>,
            ApiResponse<MenuItem>,
            ApiResponse<InventoryItem>,
            ApiResponse<PaymentInitiated>,
            ApiResponse<CallbackOutcome>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Restaurants", description = "Restaurant, staff and table endpoints"),
        (name = "Inventory", description = "Ingredient stock endpoints"),
        (name = "Menu", description = "Menu endpoints"),
        (name = "Reservations", description = "Table booking endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Payments", description = "Payment gateway callback"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_callback_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/payments/callback"));
        assert!(doc.paths.paths.contains_key("/api/orders/place/{menu_item_id}"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
