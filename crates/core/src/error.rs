//! Ledger error types for validation and state errors.
//!
//! Every variant names the violated invariant in human-readable form so
//! operators can correct the source data. Validation failures are raised
//! before any mutation begins; failures mid-unit abort the whole operation.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use saldo_shared::types::{
    AccountId, AllocationId, InvoiceId, JournalEntryId, PartyId, PaymentId, PeriodId,
};
use thiserror::Error;

/// Errors that can occur during ledger and settlement operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Journal Validation Errors ==========
    /// Journal entry debits and credits do not match exactly.
    #[error("entry not balanced: debit {debit} != credit {credit}")]
    UnbalancedEntry {
        /// Total debit amount across lines.
        debit: Decimal,
        /// Total credit amount across lines.
        credit: Decimal,
    },

    /// Journal entry has no lines.
    #[error("entry has no lines")]
    EmptyEntry,

    /// Journal line does not carry exactly one strictly positive side.
    #[error("line {line_no} must have exactly one of debit or credit, strictly positive")]
    InvalidLine {
        /// Line number within the entry.
        line_no: u32,
    },

    // ========== Account Errors ==========
    /// Account not found.
    #[error("account not found: {0}")]
    AccountNotFound(AccountId),

    /// Postings may not target a group (non-postable) account.
    #[error("account {0} is a group account and cannot be posted to")]
    GroupAccount(AccountId),

    /// Account is inactive and cannot be posted to.
    #[error("account {0} is inactive")]
    InactiveAccount(AccountId),

    // ========== Period Errors ==========
    /// Financial period not found.
    #[error("financial period not found: {0}")]
    PeriodNotFound(PeriodId),

    /// No financial period covers the posting date.
    #[error("no financial period covers date {0}")]
    NoPeriodForDate(NaiveDate),

    /// Period is closed, no posting allowed.
    #[error("period {code} is closed, no posting allowed")]
    PeriodClosed {
        /// Period code (e.g., "2026-03").
        code: String,
    },

    /// Posting date falls outside the period's date range.
    #[error("date {date} is outside period {code}")]
    DateOutsidePeriod {
        /// The rejected posting date.
        date: NaiveDate,
        /// Period code.
        code: String,
    },

    /// Period date ranges may not overlap.
    #[error("period dates overlap with existing period {code}")]
    OverlappingPeriod {
        /// Code of the period already covering the range.
        code: String,
    },

    /// Start date must be strictly before end date.
    #[error("period start date must be before end date")]
    InvalidDateRange,

    // ========== Immutability Errors ==========
    /// Posted ledger rows are write-once.
    #[error("ledger row is immutable once written: {0}")]
    ImmutableRecord(String),

    // ========== Journal / Payment State Errors ==========
    /// Journal entry not found.
    #[error("journal entry not found: {0}")]
    EntryNotFound(JournalEntryId),

    /// Illegal state transition or disallowed operation.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    // ========== Settlement Errors ==========
    /// Payment not found.
    #[error("payment not found: {0}")]
    PaymentNotFound(PaymentId),

    /// Invoice position not found.
    #[error("invoice not found: {0}")]
    InvoiceNotFound(InvoiceId),

    /// Allocation not found.
    #[error("allocation not found: {0}")]
    AllocationNotFound(AllocationId),

    /// Party not found.
    #[error("party not found: {0}")]
    PartyNotFound(PartyId),

    /// Allocation amount must be strictly positive.
    #[error("allocation amount must be positive, got {amount}")]
    NonPositiveAllocation {
        /// The rejected amount.
        amount: Decimal,
    },

    /// Allocation exceeds the invoice's outstanding balance.
    #[error("allocation {amount} exceeds invoice outstanding {outstanding}")]
    AllocationExceedsOutstanding {
        /// Requested allocation amount.
        amount: Decimal,
        /// Outstanding balance on the invoice.
        outstanding: Decimal,
    },

    /// Allocation exceeds the payment's unallocated remainder.
    #[error("allocation {amount} exceeds payment unallocated remainder {unallocated}")]
    AllocationExceedsPayment {
        /// Requested allocation amount.
        amount: Decimal,
        /// Unallocated remainder on the payment.
        unallocated: Decimal,
    },

    // ========== Concurrency Errors ==========
    /// Lost-update detected; the caller should retry.
    #[error("concurrent modification detected, please retry")]
    ConcurrentModification,

    // ========== Infrastructure Errors ==========
    /// Database error.
    #[error("database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Returns the stable error code consumed by the host application.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnbalancedEntry { .. } => "UNBALANCED_ENTRY",
            Self::EmptyEntry => "EMPTY_ENTRY",
            Self::InvalidLine { .. } => "INVALID_LINE",
            Self::GroupAccount(_) | Self::InactiveAccount(_) => "INVALID_ACCOUNT",
            Self::PeriodClosed { .. } | Self::DateOutsidePeriod { .. } => "PERIOD_CLOSED",
            Self::OverlappingPeriod { .. } => "OVERLAPPING_PERIOD",
            Self::InvalidDateRange => "INVALID_DATE_RANGE",
            Self::ImmutableRecord(_) => "IMMUTABLE_RECORD",
            Self::InvalidOperation(_) => "INVALID_OPERATION",
            Self::NonPositiveAllocation { .. }
            | Self::AllocationExceedsOutstanding { .. }
            | Self::AllocationExceedsPayment { .. } => "INVALID_ALLOCATION",
            Self::AccountNotFound(_)
            | Self::PeriodNotFound(_)
            | Self::NoPeriodForDate(_)
            | Self::EntryNotFound(_)
            | Self::PaymentNotFound(_)
            | Self::InvoiceNotFound(_)
            | Self::AllocationNotFound(_)
            | Self::PartyNotFound(_) => "NOT_FOUND",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true if the caller should retry the operation.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification)
    }
}
