//! `SeaORM` entity definitions.

pub mod accounts;
pub mod financial_periods;
pub mod general_ledger;
pub mod invoice_positions;
pub mod journal_entries;
pub mod journal_lines;
pub mod parties;
pub mod party_ledger;
pub mod payment_allocations;
pub mod payments;
pub mod sea_orm_active_enums;
