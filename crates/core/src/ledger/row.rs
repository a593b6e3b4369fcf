//! General ledger row: the immutable posting fact.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use saldo_shared::types::{AccountId, JournalEntryId, JournalLineId, LedgerRowId, PeriodId};
use uuid::Uuid;

use crate::account::NormalBalance;

/// One immutable general-ledger fact.
///
/// Created exactly once when its originating journal line is posted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralLedgerRow {
    /// Unique identifier.
    pub id: LedgerRowId,
    /// Business date of the posting.
    pub entry_date: NaiveDate,
    /// Period posted into.
    pub period_id: PeriodId,
    /// Account affected.
    pub account_id: AccountId,
    /// Originating journal entry.
    pub entry_id: JournalEntryId,
    /// Originating journal line.
    pub line_id: JournalLineId,
    /// Debit amount (zero if credit movement).
    pub debit: Decimal,
    /// Credit amount (zero if debit movement).
    pub credit: Decimal,
    /// Account balance immediately after this movement.
    pub running_balance: Decimal,
    /// Source document type, if the entry was automated.
    pub source_type: Option<String>,
    /// Source document id, if the entry was automated.
    pub source_id: Option<Uuid>,
    /// When the row was written.
    pub created_at: DateTime<Utc>,
}

/// Replays rows in order and returns the final balance.
///
/// For a consistent ledger this reproduces the account's stored balance
/// exactly; it backs the reconstruction check and balance rebuild tooling.
#[must_use]
pub fn replay_balance(rows: &[GeneralLedgerRow], normal_balance: NormalBalance) -> Decimal {
    rows.iter().fold(Decimal::ZERO, |balance, row| {
        balance + normal_balance.balance_change(row.debit, row.credit)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn row(debit: Decimal, credit: Decimal, running_balance: Decimal) -> GeneralLedgerRow {
        GeneralLedgerRow {
            id: LedgerRowId::new(),
            entry_date: NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(),
            period_id: PeriodId::new(),
            account_id: AccountId::new(),
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

    #[test]
    fn test_replay_debit_normal() {
        let rows = vec![
            row(dec!(500), dec!(0), dec!(500)),
            row(dec!(0), dec!(200), dec!(300)),
        ];
        assert_eq!(replay_balance(&rows, NormalBalance::Debit), dec!(300));
    }

    #[test]
    fn test_replay_credit_normal() {
        let rows = vec![
            row(dec!(0), dec!(500), dec!(500)),
            row(dec!(100), dec!(0), dec!(400)),
        ];
        assert_eq!(replay_balance(&rows, NormalBalance::Credit), dec!(400));
    }

    #[test]
    fn test_replay_empty_is_zero() {
        assert_eq!(replay_balance(&[], NormalBalance::Debit), Decimal::ZERO);
    }

    /// Strategy for amounts in cents.
    fn amount_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Replaying a chain whose running balances were computed from the
        /// same movements reproduces the final running balance exactly.
        #[test]
        fn prop_replay_matches_running_balance(
            movements in prop::collection::vec((amount_strategy(), amount_strategy()), 1..30),
        ) {
            let mut balance = Decimal::ZERO;
            let rows: Vec<GeneralLedgerRow> = movements
                .iter()
                .map(|(debit, credit)| {
                    balance += NormalBalance::Debit.balance_change(*debit, *credit);
                    row(*debit, *credit, balance)
                })
                .collect();

            prop_assert_eq!(
                replay_balance(&rows, NormalBalance::Debit),
                rows.last().unwrap().running_balance
            );
        }
    }
}
