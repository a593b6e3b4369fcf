//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions for the ledger and settlement tables
//! - Repository abstractions that execute every multi-write operation
//!   inside a single database transaction
//!
//! Business rules live in `saldo-core`; repositories load state, delegate
//! to core services, and persist the results with optimistic version
//! checks.

pub mod entities;
pub mod error;
pub mod repositories;

pub use error::DbError;
pub use repositories::{
    AccountRepository, JournalRepository, LedgerQueryRepository, PartyLedgerRepository,
    PeriodRepository, SettlementRepository,
};

use sea_orm::{Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}
