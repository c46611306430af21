//! Domain types and DTOs
//!
//! These types define the data structures for carwash marketplace entities.
//! They carry no persistence or transport concerns; the store and routes
//! layers convert to and from them.

/// Declares a closed set of lowercase text values backed by an enum.
///
/// Generates serde impls, `as_str`, `Display` and a `FromStr` whose error
/// lists the accepted values, so status fields can be validated before they
/// reach the store.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [&'static str] = &[$($text),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(format!(
                        "invalid value '{}', expected one of: {}",
                        other,
                        Self::ALL.join(", ")
                    )),
                }
            }
        }
    };
}

pub mod bookings;
pub mod cars;
pub mod carwashes;
pub mod notifications;
pub mod orders;
pub mod payments;
pub mod reviews;
pub mod workers;

// Re-export commonly used types
pub use bookings::*;
pub use cars::*;
pub use carwashes::*;
pub use notifications::*;
pub use orders::*;
pub use payments::*;
pub use reviews::*;
pub use workers::*;

/// Kind of record a lookup refers to.
///
/// Carried by not-found errors so callers can tell, for example, a missing
/// carwash from a missing service inside an existing carwash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Carwash,
    Service,
    Booking,
    Order,
    Worker,
    Review,
    Payment,
    Notification,
    Car,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Carwash => "carwash",
            Self::Service => "service",
            Self::Booking => "booking",
            Self::Order => "order",
            Self::Worker => "worker",
            Self::Review => "review",
            Self::Payment => "payment",
            Self::Notification => "notification",
            Self::Car => "car",
        };
        f.write_str(name)
    }
}
