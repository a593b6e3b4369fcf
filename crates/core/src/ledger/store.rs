//! In-memory append-only ledger store.
//!
//! Backs the read operations (`balance_as_of`, `rows_for_account`) without
//! a database, and enforces the write-once contract: the only mutating
//! operation is `append`; amend/remove always fail.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use saldo_shared::types::{AccountId, LedgerRowId};

use super::row::GeneralLedgerRow;
use crate::error::LedgerError;

/// Append-only collection of general ledger rows.
#[derive(Debug, Clone, Default)]
pub struct GeneralLedger {
    rows: Vec<GeneralLedgerRow>,
}

impl GeneralLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a row. Invoked only by the journal engine during posting.
    pub fn append(&mut self, row: GeneralLedgerRow) {
        self.rows.push(row);
    }

    /// All rows, in append order.
    #[must_use]
    pub fn rows(&self) -> &[GeneralLedgerRow] {
        &self.rows
    }

    /// Rows for one account within an inclusive date range, in append order.
    pub fn rows_for_account(
        &self,
        account_id: AccountId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> impl Iterator<Item = &GeneralLedgerRow> {
        self.rows.iter().filter(move |row| {
            row.account_id == account_id && row.entry_date >= from && row.entry_date <= to
        })
    }

    /// Account balance as of a date: the running balance of the last row on
    /// or before `date`, or zero if none exists.
    #[must_use]
    pub fn balance_as_of(&self, account_id: AccountId, date: NaiveDate) -> Decimal {
        self.rows
            .iter()
            .filter(|row| row.account_id == account_id && row.entry_date <= date)
            .next_back()
            .map_or(Decimal::ZERO, |row| row.running_balance)
    }

    /// Rows are write-once; amending one is a logic error.
    ///
    /// # Errors
    ///
    /// Always returns `ImmutableRecord`.
    pub fn amend(&mut self, row_id: LedgerRowId) -> Result<(), LedgerError> {
        Err(LedgerError::ImmutableRecord(format!(
            "general ledger row {row_id}"
        )))
    }

    /// Rows are write-once; removing one is a logic error.
    ///
    /// # Errors
    ///
    /// Always returns `ImmutableRecord`.
    pub fn remove(&mut self, row_id: LedgerRowId) -> Result<(), LedgerError> {
        Err(LedgerError::ImmutableRecord(format!(
            "general ledger row {row_id}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use saldo_shared::types::{JournalEntryId, JournalLineId, PeriodId};

    fn row(
        account_id: AccountId,
        date: NaiveDate,
        debit: Decimal,
        credit: Decimal,
        running_balance: Decimal,
    ) -> GeneralLedgerRow {
        GeneralLedgerRow {
            id: LedgerRowId::new(),
            entry_date: date,
            period_id: PeriodId::new(),
            account_id,
            entry_id: JournalEntryId::new(),
            line_id: JournalLineId::new(),
            debit,
            credit,
            running_balance,
            source_type: None,
            source_id: None,
            created_at: Utc::now(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_balance_as_of_picks_last_row_on_or_before() {
        let account = AccountId::new();
        let mut ledger = GeneralLedger::new();
        ledger.append(row(account, date(2026, 3, 1), dec!(100), dec!(0), dec!(100)));
        ledger.append(row(account, date(2026, 3, 10), dec!(50), dec!(0), dec!(150)));
        ledger.append(row(account, date(2026, 3, 20), dec!(0), dec!(30), dec!(120)));

        assert_eq!(ledger.balance_as_of(account, date(2026, 3, 15)), dec!(150));
        assert_eq!(ledger.balance_as_of(account, date(2026, 3, 31)), dec!(120));
        assert_eq!(ledger.balance_as_of(account, date(2026, 2, 28)), dec!(0));
    }

    #[test]
    fn test_rows_for_account_filters_by_account_and_range() {
        let a = AccountId::new();
        let b = AccountId::new();
        let mut ledger = GeneralLedger::new();
        ledger.append(row(a, date(2026, 3, 1), dec!(100), dec!(0), dec!(100)));
        ledger.append(row(b, date(2026, 3, 5), dec!(40), dec!(0), dec!(40)));
        ledger.append(row(a, date(2026, 4, 1), dec!(10), dec!(0), dec!(110)));

        let in_march: Vec<_> = ledger
            .rows_for_account(a, date(2026, 3, 1), date(2026, 3, 31))
            .collect();
        assert_eq!(in_march.len(), 1);
        assert_eq!(in_march[0].running_balance, dec!(100));
    }

    #[test]
    fn test_amend_always_fails() {
        let account = AccountId::new();
        let mut ledger = GeneralLedger::new();
        let r = row(account, date(2026, 3, 1), dec!(100), dec!(0), dec!(100));
        let id = r.id;
        ledger.append(r);

        assert!(matches!(
            ledger.amend(id),
            Err(LedgerError::ImmutableRecord(_))
        ));
    }

    #[test]
    fn test_remove_always_fails() {
        let mut ledger = GeneralLedger::new();
        assert!(matches!(
            ledger.remove(LedgerRowId::new()),
            Err(LedgerError::ImmutableRecord(_))
        ));
        assert!(ledger.rows().is_empty());
    }
}
