//! Party (customer/supplier) running-balance ledgers.
//!
//! Each party carries an append-only subledger whose rows chain running
//! balances (`prev + debit - credit`), plus a denormalized balance cache on
//! the party record updated in the same unit of work.

pub mod service;
pub mod types;

pub use service::PartyLedger;
pub use types::{
    Party, PartyLedgerRow, PartySide, PartyTransaction, PartyTransactionType, TransactionSide,
};
