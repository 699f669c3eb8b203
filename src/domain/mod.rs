pub mod currency;
pub mod rules;
pub mod status;

pub use currency::Country;
pub use status::{
    OrderStatus, ParseEnumError, PaymentMethod, PaymentStatus, ReservationStatus, Role, Unit,
};
