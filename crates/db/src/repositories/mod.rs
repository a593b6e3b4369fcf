//! Repository abstractions for data access.
//!
//! Repositories load persisted state, delegate business rules to
//! `saldo-core`, and write the results back inside a single database
//! transaction. Optimistic version columns guard every balance-carrying
//! update; a failed version check surfaces as `ConcurrentModification`.

pub mod account;
pub mod journal;
pub mod ledger_query;
pub mod party_ledger;
pub mod period;
pub mod settlement;

#[cfg(test)]
mod settlement_workflow_tests;

pub use account::AccountRepository;
pub use journal::JournalRepository;
pub use ledger_query::LedgerQueryRepository;
pub use party_ledger::PartyLedgerRepository;
pub use period::PeriodRepository;
pub use settlement::SettlementRepository;
