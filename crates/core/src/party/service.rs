//! Party subledger: append-only rows plus the balance cache.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use saldo_shared::types::{PartyId, PartyLedgerRowId};

use super::types::{Party, PartyLedgerRow, PartyTransaction, TransactionSide};
use crate::context::PostingContext;
use crate::error::LedgerError;

/// Append-only collection of party ledger rows across all parties.
#[derive(Debug, Clone, Default)]
pub struct PartyLedger {
    rows: Vec<PartyLedgerRow>,
}

impl PartyLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one transaction: appends the row with its chained running
    /// balance and refreshes the party's balance cache in the same unit.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` when the amounts do not form exactly one
    /// strictly positive side, or when the populated side contradicts the
    /// column the transaction type books to for this party's side.
    pub fn record_transaction(
        &mut self,
        party: &mut Party,
        tx: PartyTransaction,
        ctx: &PostingContext,
    ) -> Result<PartyLedgerRow, LedgerError> {
        let debit_set = tx.debit > Decimal::ZERO;
        let credit_set = tx.credit > Decimal::ZERO;
        if tx.debit < Decimal::ZERO || tx.credit < Decimal::ZERO || debit_set == credit_set {
            return Err(LedgerError::InvalidOperation(format!(
                "party transaction {} must carry exactly one positive side",
                tx.reference
            )));
        }

        let side = if debit_set {
            TransactionSide::Debit
        } else {
            TransactionSide::Credit
        };
        if let Some(expected) = tx.transaction_type.default_side(party.side) {
            if side != expected {
                return Err(LedgerError::InvalidOperation(format!(
                    "party transaction {} books on the wrong side for its type",
                    tx.reference
                )));
            }
        }

        let running_balance = party.current_balance + tx.debit - tx.credit;

        let row = PartyLedgerRow {
            id: PartyLedgerRowId::new(),
            party_id: party.id,
            date: tx.date,
            transaction_type: tx.transaction_type,
            debit: tx.debit,
            credit: tx.credit,
            running_balance,
            reference: tx.reference,
            source_id: tx.source_id,
            reconciled: false,
            created_at: ctx.at,
        };

        party.current_balance = running_balance;
        party.version += 1;
        party.audit = party.audit.touched(ctx.actor, ctx.at);

        self.rows.push(row.clone());
        Ok(row)
    }

    /// All rows, in append order.
    #[must_use]
    pub fn rows(&self) -> &[PartyLedgerRow] {
        &self.rows
    }

    /// Statement for one party within an inclusive date range.
    pub fn statement(
        &self,
        party_id: PartyId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> impl Iterator<Item = &PartyLedgerRow> {
        self.rows
            .iter()
            .filter(move |row| row.party_id == party_id && row.date >= from && row.date <= to)
    }

    /// Party balance as of a date: the running balance of the last row on
    /// or before `date`, or zero if none exists.
    #[must_use]
    pub fn balance_as_of(&self, party_id: PartyId, date: NaiveDate) -> Decimal {
        self.rows
            .iter()
            .filter(|row| row.party_id == party_id && row.date <= date)
            .next_back()
            .map_or(Decimal::ZERO, |row| row.running_balance)
    }

    /// Rows are write-once; amending one is a logic error.
    ///
    /// # Errors
    ///
    /// Always returns `ImmutableRecord`.
    pub fn amend(&mut self, row_id: PartyLedgerRowId) -> Result<(), LedgerError> {
        Err(LedgerError::ImmutableRecord(format!(
            "party ledger row {row_id}"
        )))
    }

    /// Rows are write-once; removing one is a logic error.
    ///
    /// # Errors
    ///
    /// Always returns `ImmutableRecord`.
    pub fn remove(&mut self, row_id: PartyLedgerRowId) -> Result<(), LedgerError> {
        Err(LedgerError::ImmutableRecord(format!(
            "party ledger row {row_id}"
        )))
    }
}
