//! Party ledger types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use saldo_shared::types::{AuditStamp, PartyId, PartyLedgerRowId};
use uuid::Uuid;

use crate::context::PostingContext;

/// Which side of the business a party sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartySide {
    /// Owes us money; positive balance is a receivable.
    Customer,
    /// We owe them money; positive balance is a payable.
    Supplier,
}

/// Classification of a party ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartyTransactionType {
    /// Invoice raised on a customer.
    Sale,
    /// Bill received from a supplier.
    Purchase,
    /// Money received from or paid to the party.
    Payment,
    /// Credit note reducing what the party owes (or what we owe them).
    CreditNote,
    /// Debit note increasing the party's debt (or reducing ours).
    DebitNote,
    /// Manual correction.
    Adjustment,
}

/// Which column a transaction amount lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionSide {
    /// Amount goes in the debit column (balance rises).
    Debit,
    /// Amount goes in the credit column (balance falls).
    Credit,
}

impl PartyTransactionType {
    /// The column a transaction of this type normally hits for a party on
    /// the given side. A sale debits a customer; a purchase credits that
    /// same view of a supplier's account from our books, so supplier
    /// subledgers run credit-up. Adjustments carry no fixed side.
    #[must_use]
    pub fn default_side(self, party_side: PartySide) -> Option<TransactionSide> {
        match (self, party_side) {
            (Self::Sale, PartySide::Customer)
            | (Self::DebitNote, _)
            | (Self::Payment, PartySide::Supplier) => Some(TransactionSide::Debit),
            (Self::Purchase, PartySide::Supplier)
            | (Self::CreditNote, _)
            | (Self::Payment, PartySide::Customer) => Some(TransactionSide::Credit),
            (Self::Sale, PartySide::Supplier) | (Self::Purchase, PartySide::Customer) => None,
            (Self::Adjustment, _) => None,
        }
    }
}

/// A customer or supplier master record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Party {
    /// Unique identifier.
    pub id: PartyId,
    /// Display name.
    pub name: String,
    /// Customer or supplier.
    pub side: PartySide,
    /// Denormalized running balance (cache of the last ledger row).
    pub current_balance: Decimal,
    /// Optimistic-lock version.
    pub version: i64,
    /// Audit metadata.
    pub audit: AuditStamp,
}

impl Party {
    /// Creates a party with a zero balance.
    #[must_use]
    pub fn create(name: String, side: PartySide, ctx: &PostingContext) -> Self {
        Self {
            id: PartyId::new(),
            name,
            side,
            current_balance: Decimal::ZERO,
            version: 0,
            audit: AuditStamp::new(ctx.actor, ctx.at),
        }
    }
}

/// Input for recording one party ledger transaction.
#[derive(Debug, Clone)]
pub struct PartyTransaction {
    /// Business date.
    pub date: NaiveDate,
    /// Transaction classification.
    pub transaction_type: PartyTransactionType,
    /// Debit amount (zero if credit movement).
    pub debit: Decimal,
    /// Credit amount (zero if debit movement).
    pub credit: Decimal,
    /// Human-readable reference (invoice number, payment number).
    pub reference: String,
    /// Source document id, if any.
    pub source_id: Option<Uuid>,
}

/// One immutable party-ledger fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyLedgerRow {
    /// Unique identifier.
    pub id: PartyLedgerRowId,
    /// The party this row belongs to.
    pub party_id: PartyId,
    /// Business date.
    pub date: NaiveDate,
    /// Transaction classification.
    pub transaction_type: PartyTransactionType,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Party balance immediately after this movement.
    pub running_balance: Decimal,
    /// Human-readable reference.
    pub reference: String,
    /// Source document id, if any.
    pub source_id: Option<Uuid>,
    /// Set once the row has been matched during reconciliation.
    pub reconciled: bool,
    /// When the row was written.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_side_customer() {
        let c = PartySide::Customer;
        assert_eq!(
            PartyTransactionType::Sale.default_side(c),
            Some(TransactionSide::Debit)
        );
        assert_eq!(
            PartyTransactionType::Payment.default_side(c),
            Some(TransactionSide::Credit)
        );
        assert_eq!(
            PartyTransactionType::CreditNote.default_side(c),
            Some(TransactionSide::Credit)
        );
        assert_eq!(PartyTransactionType::Purchase.default_side(c), None);
    }

    #[test]
    fn test_default_side_supplier() {
        let s = PartySide::Supplier;
        assert_eq!(
            PartyTransactionType::Purchase.default_side(s),
            Some(TransactionSide::Credit)
        );
        assert_eq!(
            PartyTransactionType::Payment.default_side(s),
            Some(TransactionSide::Debit)
        );
        assert_eq!(
            PartyTransactionType::DebitNote.default_side(s),
            Some(TransactionSide::Debit)
        );
        assert_eq!(PartyTransactionType::Sale.default_side(s), None);
    }

    #[test]
    fn test_adjustment_has_no_fixed_side() {
        assert_eq!(
            PartyTransactionType::Adjustment.default_side(PartySide::Customer),
            None
        );
        assert_eq!(
            PartyTransactionType::Adjustment.default_side(PartySide::Supplier),
            None
        );
    }
}
