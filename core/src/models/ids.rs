//! Typed entity identifiers
//!
//! Every entity reference in the engine is a dedicated newtype over a UUID
//! string. This keeps foreign keys compile-time checked: a `DriverId` can
//! never be handed to an API expecting a `RideId`.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh random identifier.
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

id_type!(
    /// Identifier of a ride (one transportation request).
    RideId
);
id_type!(
    /// Identifier of a driver.
    DriverId
);
id_type!(
    /// Identifier of a user account (passenger or driver owner).
    UserId
);
id_type!(
    /// Identifier of a wallet.
    WalletId
);
id_type!(
    /// Identifier of a ledger entry.
    EntryId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(RideId::new(), RideId::new());
    }

    #[test]
    fn from_str_round_trips() {
        let id = DriverId::from("driver-1");
        assert_eq!(id.as_str(), "driver-1");
        assert_eq!(id.to_string(), "driver-1");
    }
}
