//! Records and request/response payloads for the API service

pub mod customer;
pub mod membership;
pub mod service_request;
pub mod tariff;
pub mod user;

pub use customer::{Customer, CustomerResponse, UpdateProfileRequest};
pub use membership::{ActiveMembership, Membership, MembershipResponse, MembershipTier, NewMembership};
pub use service_request::{
    ClientInfo, CreateServiceRequest, InvalidTransition, NewServiceRequest, PaymentMethod,
    RequestStatus, ServiceCategory, ServiceRequest, ServiceRequestResponse, VehicleType,
};
pub use tariff::{Tariff, TariffResponse};
pub use user::{NewUser, User, UserResponse};

/// Error returned when a stored or submitted label matches no variant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown value: {0}")]
pub struct UnknownVariant(pub String);

/// Declares a fieldless enum stored and transmitted as a lowercase label.
///
/// Generates `as_str`, `label` (human-readable name), `ALL`, `FromStr`,
/// `Display` and serde impls that go through the label.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => ($text:literal, $label:literal) ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        #[allow(dead_code)]
        impl $name {
            /// Every variant, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Stored / wire representation
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            /// Human-readable name
            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::models::UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err($crate::models::UnknownVariant(other.to_string())),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use text_enum;
