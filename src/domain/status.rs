use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind} value '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Text-backed enumerations stored in the database as their variant name.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($text => Ok($name::$variant),)+
                    _ => Err(ParseEnumError {
                        kind: stringify!($name),
                        value: value.to_string(),
                    }),
                }
            }
        }
    };
}

text_enum!(
    /// Account roles. Admin passes every role check.
    Role {
        Admin => "Admin",
        Manager => "Manager",
        Chef => "Chef",
        Cashier => "Cashier",
        Waiter => "Waiter",
        Supplier => "Supplier",
        Customer => "Customer",
    }
);

impl Role {
    pub fn is_staff(&self) -> bool {
        !matches!(self, Role::Admin | Role::Customer)
    }
}

text_enum!(
    OrderStatus {
        Pending => "Pending",
        Confirmed => "Confirmed",
        Start => "Start",
        Inprogress => "Inprogress",
        Completed => "Completed",
        Canceled => "Canceled",
    }
);

impl OrderStatus {
    const TRANSITIONS: &'static [(OrderStatus, OrderStatus)] = &[
        (OrderStatus::Pending, OrderStatus::Confirmed),
        (OrderStatus::Pending, OrderStatus::Canceled),
        (OrderStatus::Confirmed, OrderStatus::Start),
        (OrderStatus::Start, OrderStatus::Inprogress),
        (OrderStatus::Inprogress, OrderStatus::Completed),
    ];

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        Self::TRANSITIONS.contains(&(self, next))
    }

    /// Steps the kitchen may take once an order has been paid for.
    pub fn is_kitchen_step(self, next: OrderStatus) -> bool {
        self != OrderStatus::Pending && self.can_transition_to(next)
    }
}

text_enum!(
    ReservationStatus {
        Pending => "Pending",
        Confirmed => "Confirmed",
        Canceled => "Canceled",
        Completed => "Completed",
    }
);

impl ReservationStatus {
    const TRANSITIONS: &'static [(ReservationStatus, ReservationStatus)] = &[
        (ReservationStatus::Pending, ReservationStatus::Confirmed),
        (ReservationStatus::Pending, ReservationStatus::Canceled),
        (ReservationStatus::Confirmed, ReservationStatus::Completed),
        (ReservationStatus::Confirmed, ReservationStatus::Canceled),
    ];

    pub fn can_transition_to(self, next: ReservationStatus) -> bool {
        Self::TRANSITIONS.contains(&(self, next))
    }
}

text_enum!(
    PaymentStatus {
        Pending => "Pending",
        Paid => "Paid",
        Failed => "Failed",
    }
);

text_enum!(
    PaymentMethod {
        Telebirr => "Telebirr",
        Cbe => "CBE",
    }
);

text_enum!(
    /// Base unit an ingredient is counted in.
    Unit {
        Gram => "gram",
        Milliliter => "milliliter",
        Piece => "piece",
    }
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_transitions_follow_the_table() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Canceled));
        assert!(Confirmed.can_transition_to(Start));
        assert!(Start.can_transition_to(Inprogress));
        assert!(Inprogress.can_transition_to(Completed));

        assert!(!Confirmed.can_transition_to(Canceled));
        assert!(!Confirmed.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Pending));
        assert!(!Canceled.can_transition_to(Pending));
        assert!(!Start.can_transition_to(Start));
    }

    #[test]
    fn kitchen_cannot_confirm_or_cancel() {
        use OrderStatus::*;
        assert!(!Pending.is_kitchen_step(Confirmed));
        assert!(!Pending.is_kitchen_step(Canceled));
        assert!(Confirmed.is_kitchen_step(Start));
        assert!(Inprogress.is_kitchen_step(Completed));
        assert!(!Confirmed.is_kitchen_step(Inprogress));
    }

    #[test]
    fn reservation_transitions_follow_the_table() {
        use ReservationStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Canceled));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(Confirmed.can_transition_to(Canceled));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Canceled.can_transition_to(Confirmed));
        assert!(!Completed.can_transition_to(Canceled));
    }

    #[test]
    fn text_round_trips_through_from_str() {
        assert_eq!("Inprogress".parse::<OrderStatus>(), Ok(OrderStatus::Inprogress));
        assert_eq!(OrderStatus::Canceled.as_str().parse(), Ok(OrderStatus::Canceled));
        assert_eq!("CBE".parse::<PaymentMethod>(), Ok(PaymentMethod::Cbe));
        let err = "Shipped".parse::<OrderStatus>().unwrap_err();
        assert_eq!(err.kind, "OrderStatus");
    }

    #[test]
    fn serde_uses_stored_names() {
        let json = serde_json::to_string(&PaymentMethod::Cbe).unwrap();
        assert_eq!(json, "\"CBE\"");
        let unit: Unit = serde_json::from_str("\"milliliter\"").unwrap();
        assert_eq!(unit, Unit::Milliliter);
    }

    #[test]
    fn staff_roles_exclude_admin_and_customer() {
        assert!(Role::Chef.is_staff());
        assert!(Role::Supplier.is_staff());
        assert!(!Role::Customer.is_staff());
        assert!(!Role::Admin.is_staff());
    }
}
