//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `PaymentId` where an
//! `AccountId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(ActorId, "Unique identifier for the user performing an operation.");
typed_id!(AccountId, "Unique identifier for a chart of accounts entry.");
typed_id!(PeriodId, "Unique identifier for a financial period.");
typed_id!(JournalEntryId, "Unique identifier for a journal entry.");
typed_id!(JournalLineId, "Unique identifier for a journal line.");
typed_id!(LedgerRowId, "Unique identifier for a general ledger row.");
typed_id!(PartyId, "Unique identifier for a trading partner.");
typed_id!(
    PartyLedgerRowId,
    "Unique identifier for a party ledger row."
);
typed_id!(PaymentId, "Unique identifier for a payment.");
typed_id!(AllocationId, "Unique identifier for a payment allocation.");
typed_id!(InvoiceId, "Unique identifier for an invoice or purchase bill.");

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_typed_id_from_uuid_roundtrip() {
        let uuid = Uuid::new_v4();
        let id = AccountId::from_uuid(uuid);
        assert_eq!(id.into_inner(), uuid);
    }

    #[test]
    fn test_typed_id_display_matches_uuid() {
        let uuid = Uuid::new_v4();
        let id = PaymentId::from_uuid(uuid);
        assert_eq!(format!("{id}"), uuid.to_string());
    }

    #[test]
    fn test_typed_id_from_str() {
        let uuid = Uuid::new_v4();
        let id = InvoiceId::from_str(&uuid.to_string()).unwrap();
        assert_eq!(id.into_inner(), uuid);
    }

    #[test]
    fn test_typed_id_from_str_rejects_garbage() {
        assert!(AccountId::from_str("not-a-uuid").is_err());
    }

    #[test]
    fn test_new_ids_are_unique() {
        let a = JournalEntryId::new();
        let b = JournalEntryId::new();
        assert_ne!(a, b);
    }
}
