//! Append-only general ledger.
//!
//! Every posted journal line produces exactly one ledger row carrying the
//! account's running balance after the movement. Rows are write-once:
//! amending or deleting one is a programming error surfaced loudly, never
//! a supported operation.

pub mod row;
pub mod store;

pub use row::GeneralLedgerRow;
pub use store::GeneralLedger;
