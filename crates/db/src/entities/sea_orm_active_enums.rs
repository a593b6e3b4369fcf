//! Database enums mirroring the core domain enums.
//!
//! Stored as strings; `From` impls convert to and from the `saldo-core`
//! types at the repository boundary.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use saldo_core::account;
use saldo_core::journal;
use saldo_core::party;
use saldo_core::period;
use saldo_core::settlement;

/// Account classification.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum AccountType {
    /// Debit-normal resource account.
    #[sea_orm(string_value = "asset")]
    Asset,
    /// Credit-normal obligation account.
    #[sea_orm(string_value = "liability")]
    Liability,
    /// Credit-normal ownership account.
    #[sea_orm(string_value = "equity")]
    Equity,
    /// Credit-normal income account.
    #[sea_orm(string_value = "revenue")]
    Revenue,
    /// Debit-normal cost account.
    #[sea_orm(string_value = "expense")]
    Expense,
}

impl From<account::AccountType> for AccountType {
    fn from(value: account::AccountType) -> Self {
        match value {
            account::AccountType::Asset => Self::Asset,
            account::AccountType::Liability => Self::Liability,
            account::AccountType::Equity => Self::Equity,
            account::AccountType::Revenue => Self::Revenue,
            account::AccountType::Expense => Self::Expense,
        }
    }
}

impl From<AccountType> for account::AccountType {
    fn from(value: AccountType) -> Self {
        match value {
            AccountType::Asset => Self::Asset,
            AccountType::Liability => Self::Liability,
            AccountType::Equity => Self::Equity,
            AccountType::Revenue => Self::Revenue,
            AccountType::Expense => Self::Expense,
        }
    }
}

/// Financial period status.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum PeriodStatus {
    /// Accepts postings.
    #[sea_orm(string_value = "open")]
    Open,
    /// Rejects all postings.
    #[sea_orm(string_value = "closed")]
    Closed,
}

impl From<period::PeriodStatus> for PeriodStatus {
    fn from(value: period::PeriodStatus) -> Self {
        match value {
            period::PeriodStatus::Open => Self::Open,
            period::PeriodStatus::Closed => Self::Closed,
        }
    }
}

impl From<PeriodStatus> for period::PeriodStatus {
    fn from(value: PeriodStatus) -> Self {
        match value {
            PeriodStatus::Open => Self::Open,
            PeriodStatus::Closed => Self::Closed,
        }
    }
}

/// Journal entry classification.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum JournalEntryType {
    /// Hand-keyed entry.
    #[sea_orm(string_value = "manual")]
    Manual,
    /// Generated by a source module.
    #[sea_orm(string_value = "automated")]
    Automated,
    /// Opening balance entry.
    #[sea_orm(string_value = "opening_balance")]
    OpeningBalance,
    /// Closing entry.
    #[sea_orm(string_value = "closing")]
    Closing,
    /// Correcting adjustment.
    #[sea_orm(string_value = "adjustment")]
    Adjustment,
}

impl From<journal::JournalEntryType> for JournalEntryType {
    fn from(value: journal::JournalEntryType) -> Self {
        match value {
            journal::JournalEntryType::Manual => Self::Manual,
            journal::JournalEntryType::Automated => Self::Automated,
            journal::JournalEntryType::OpeningBalance => Self::OpeningBalance,
            journal::JournalEntryType::Closing => Self::Closing,
            journal::JournalEntryType::Adjustment => Self::Adjustment,
        }
    }
}

impl From<JournalEntryType> for journal::JournalEntryType {
    fn from(value: JournalEntryType) -> Self {
        match value {
            JournalEntryType::Manual => Self::Manual,
            JournalEntryType::Automated => Self::Automated,
            JournalEntryType::OpeningBalance => Self::OpeningBalance,
            JournalEntryType::Closing => Self::Closing,
            JournalEntryType::Adjustment => Self::Adjustment,
        }
    }
}

/// Journal entry status.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum JournalStatus {
    /// Being drafted.
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Posted to the ledger.
    #[sea_orm(string_value = "posted")]
    Posted,
    /// Abandoned before posting.
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl From<journal::JournalStatus> for JournalStatus {
    fn from(value: journal::JournalStatus) -> Self {
        match value {
            journal::JournalStatus::Draft => Self::Draft,
            journal::JournalStatus::Posted => Self::Posted,
            journal::JournalStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<JournalStatus> for journal::JournalStatus {
    fn from(value: JournalStatus) -> Self {
        match value {
            JournalStatus::Draft => Self::Draft,
            JournalStatus::Posted => Self::Posted,
            JournalStatus::Cancelled => Self::Cancelled,
        }
    }
}

/// Customer or supplier.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum PartySide {
    /// Owes us money.
    #[sea_orm(string_value = "customer")]
    Customer,
    /// We owe them money.
    #[sea_orm(string_value = "supplier")]
    Supplier,
}

impl From<party::PartySide> for PartySide {
    fn from(value: party::PartySide) -> Self {
        match value {
            party::PartySide::Customer => Self::Customer,
            party::PartySide::Supplier => Self::Supplier,
        }
    }
}

impl From<PartySide> for party::PartySide {
    fn from(value: PartySide) -> Self {
        match value {
            PartySide::Customer => Self::Customer,
            PartySide::Supplier => Self::Supplier,
        }
    }
}

/// Party ledger transaction classification.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum PartyTransactionType {
    /// Invoice raised on a customer.
    #[sea_orm(string_value = "sale")]
    Sale,
    /// Bill received from a supplier.
    #[sea_orm(string_value = "purchase")]
    Purchase,
    /// Money received or paid.
    #[sea_orm(string_value = "payment")]
    Payment,
    /// Credit note.
    #[sea_orm(string_value = "credit_note")]
    CreditNote,
    /// Debit note.
    #[sea_orm(string_value = "debit_note")]
    DebitNote,
    /// Manual correction.
    #[sea_orm(string_value = "adjustment")]
    Adjustment,
}

impl From<party::PartyTransactionType> for PartyTransactionType {
    fn from(value: party::PartyTransactionType) -> Self {
        match value {
            party::PartyTransactionType::Sale => Self::Sale,
            party::PartyTransactionType::Purchase => Self::Purchase,
            party::PartyTransactionType::Payment => Self::Payment,
            party::PartyTransactionType::CreditNote => Self::CreditNote,
            party::PartyTransactionType::DebitNote => Self::DebitNote,
            party::PartyTransactionType::Adjustment => Self::Adjustment,
        }
    }
}

impl From<PartyTransactionType> for party::PartyTransactionType {
    fn from(value: PartyTransactionType) -> Self {
        match value {
            PartyTransactionType::Sale => Self::Sale,
            PartyTransactionType::Purchase => Self::Purchase,
            PartyTransactionType::Payment => Self::Payment,
            PartyTransactionType::CreditNote => Self::CreditNote,
            PartyTransactionType::DebitNote => Self::DebitNote,
            PartyTransactionType::Adjustment => Self::Adjustment,
        }
    }
}

/// Payment instrument.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum PaymentMode {
    /// Cash in hand.
    #[sea_orm(string_value = "cash")]
    Cash,
    /// Cheque.
    #[sea_orm(string_value = "cheque")]
    Cheque,
    /// Bank transfer.
    #[sea_orm(string_value = "bank_transfer")]
    BankTransfer,
    /// Card payment.
    #[sea_orm(string_value = "card")]
    Card,
    /// Online gateway.
    #[sea_orm(string_value = "online")]
    Online,
}

impl From<settlement::PaymentMode> for PaymentMode {
    fn from(value: settlement::PaymentMode) -> Self {
        match value {
            settlement::PaymentMode::Cash => Self::Cash,
            settlement::PaymentMode::Cheque => Self::Cheque,
            settlement::PaymentMode::BankTransfer => Self::BankTransfer,
            settlement::PaymentMode::Card => Self::Card,
            settlement::PaymentMode::Online => Self::Online,
        }
    }
}

impl From<PaymentMode> for settlement::PaymentMode {
    fn from(value: PaymentMode) -> Self {
        match value {
            PaymentMode::Cash => Self::Cash,
            PaymentMode::Cheque => Self::Cheque,
            PaymentMode::BankTransfer => Self::BankTransfer,
            PaymentMode::Card => Self::Card,
            PaymentMode::Online => Self::Online,
        }
    }
}

/// Payment lifecycle status.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum PaymentStatus {
    /// Being captured.
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Submitted, awaiting clearing.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Funds confirmed.
    #[sea_orm(string_value = "cleared")]
    Cleared,
    /// Instrument failed.
    #[sea_orm(string_value = "bounced")]
    Bounced,
    /// Abandoned before submission.
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl From<settlement::PaymentStatus> for PaymentStatus {
    fn from(value: settlement::PaymentStatus) -> Self {
        match value {
            settlement::PaymentStatus::Draft => Self::Draft,
            settlement::PaymentStatus::Pending => Self::Pending,
            settlement::PaymentStatus::Cleared => Self::Cleared,
            settlement::PaymentStatus::Bounced => Self::Bounced,
            settlement::PaymentStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<PaymentStatus> for settlement::PaymentStatus {
    fn from(value: PaymentStatus) -> Self {
        match value {
            PaymentStatus::Draft => Self::Draft,
            PaymentStatus::Pending => Self::Pending,
            PaymentStatus::Cleared => Self::Cleared,
            PaymentStatus::Bounced => Self::Bounced,
            PaymentStatus::Cancelled => Self::Cancelled,
        }
    }
}

/// Invoice settlement status.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum InvoicePaymentStatus {
    /// Nothing paid.
    #[sea_orm(string_value = "unpaid")]
    Unpaid,
    /// Partly paid.
    #[sea_orm(string_value = "partial")]
    Partial,
    /// Fully paid.
    #[sea_orm(string_value = "paid")]
    Paid,
}

impl From<settlement::InvoicePaymentStatus> for InvoicePaymentStatus {
    fn from(value: settlement::InvoicePaymentStatus) -> Self {
        match value {
            settlement::InvoicePaymentStatus::Unpaid => Self::Unpaid,
            settlement::InvoicePaymentStatus::Partial => Self::Partial,
            settlement::InvoicePaymentStatus::Paid => Self::Paid,
        }
    }
}

impl From<InvoicePaymentStatus> for settlement::InvoicePaymentStatus {
    fn from(value: InvoicePaymentStatus) -> Self {
        match value {
            InvoicePaymentStatus::Unpaid => Self::Unpaid,
            InvoicePaymentStatus::Partial => Self::Partial,
            InvoicePaymentStatus::Paid => Self::Paid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_type_round_trips() {
        for core in [
            account::AccountType::Asset,
            account::AccountType::Liability,
            account::AccountType::Equity,
            account::AccountType::Revenue,
            account::AccountType::Expense,
        ] {
            let db: AccountType = core.into();
            let back: account::AccountType = db.into();
            assert_eq!(back, core);
        }
    }

    #[test]
    fn test_payment_status_round_trips() {
        for core in [
            settlement::PaymentStatus::Draft,
            settlement::PaymentStatus::Pending,
            settlement::PaymentStatus::Cleared,
            settlement::PaymentStatus::Bounced,
            settlement::PaymentStatus::Cancelled,
        ] {
            let db: PaymentStatus = core.into();
            let back: settlement::PaymentStatus = db.into();
            assert_eq!(back, core);
        }
    }
}
