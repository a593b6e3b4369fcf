//! Core ledger and settlement logic for Saldo.
//!
//! This crate contains pure business logic with ZERO web or database
//! dependencies. All domain types, validation rules, and state machines
//! live here.
//!
//! # Modules
//!
//! - `account` - Chart of accounts and normal-balance mechanics
//! - `period` - Financial periods and the posting gate
//! - `journal` - Journal entry validation and posting state machine
//! - `ledger` - Append-only general ledger fact stream
//! - `party` - Customer/supplier running-balance ledgers
//! - `settlement` - Payments and bill-to-bill allocation

pub mod account;
pub mod context;
pub mod error;
pub mod journal;
pub mod ledger;
pub mod party;
pub mod period;
pub mod settlement;

pub use context::PostingContext;
pub use error::LedgerError;
