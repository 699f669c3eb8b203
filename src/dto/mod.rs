pub mod auth;
pub mod inventory;
pub mod menu;
pub mod orders;
pub mod payments;
pub mod reservations;
pub mod restaurants;
