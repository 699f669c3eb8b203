pub mod bookings;
pub mod dining_tables;
pub mod inventory_items;
pub mod menu_item_ingredients;
pub mod menu_items;
pub mod orders;
pub mod restaurants;
pub mod supply_logs;
pub mod user_orders;
pub mod user_reservations;
pub mod users;

pub use bookings::Entity as Bookings;
pub use dining_tables::Entity as DiningTables;
pub use inventory_items::Entity as InventoryItems;
pub use menu_item_ingredients::Entity as MenuItemIngredients;
pub use menu_items::Entity as MenuItems;
pub use orders::Entity as Orders;
pub use restaurants::Entity as Restaurants;
pub use supply_logs::Entity as SupplyLogs;
pub use user_orders::Entity as UserOrders;
pub use user_reservations::Entity as UserReservations;
pub use users::Entity as Users;
