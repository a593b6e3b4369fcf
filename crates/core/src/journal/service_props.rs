//! Property tests for journal validation and posting plans.

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use saldo_shared::types::{AccountId, ActorId};

use super::service::{JournalService, PostingAccount};
use super::types::{CreateJournalEntryInput, JournalEntry, JournalEntryType, JournalLineInput};
use crate::account::AccountType;
use crate::context::PostingContext;
use crate::error::LedgerError;
use crate::period::FinancialPeriod;

fn ctx() -> PostingContext {
    PostingContext::new(ActorId::new(), Utc::now())
}

fn period(c: &PostingContext) -> FinancialPeriod {
    FinancialPeriod::create(
        "2026-03".to_string(),
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
        c,
    )
    .unwrap()
}

fn lookup(id: AccountId) -> Result<PostingAccount, LedgerError> {
    Ok(PostingAccount {
        id,
        account_type: AccountType::Asset,
        is_group: false,
        is_active: true,
        balance: Decimal::ZERO,
        version: 0,
    })
}

/// Positive amounts in cents.
fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Builds a balanced entry: each amount becomes a debit line plus a
/// matching credit line on a fresh account.
fn balanced_entry(amounts: &[Decimal], c: &PostingContext, p: &FinancialPeriod) -> JournalEntry {
    let mut lines = Vec::with_capacity(amounts.len() * 2);
    for amount in amounts {
        lines.push(JournalLineInput {
            account_id: AccountId::new(),
            debit: *amount,
            credit: Decimal::ZERO,
            cost_center: None,
        });
        lines.push(JournalLineInput {
            account_id: AccountId::new(),
            debit: Decimal::ZERO,
            credit: *amount,
            cost_center: None,
        });
    }
    JournalEntry::draft(
        CreateJournalEntryInput {
            number: "JV-P".to_string(),
            entry_date: NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(),
            period_id: p.id,
            entry_type: JournalEntryType::Manual,
            source: None,
            description: "property".to_string(),
            lines,
        },
        c,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every balanced entry of positive one-sided lines validates.
    #[test]
    fn prop_balanced_entries_validate(
        amounts in prop::collection::vec(amount_strategy(), 1..10),
    ) {
        let c = ctx();
        let p = period(&c);
        let entry = balanced_entry(&amounts, &c, &p);
        prop_assert!(JournalService::validate(&entry, &p, lookup).is_ok());
    }

    /// Skewing any single credit line breaks the balance check.
    #[test]
    fn prop_skewed_entries_rejected(
        amounts in prop::collection::vec(amount_strategy(), 1..10),
        skew in 1i64..10_000i64,
    ) {
        let c = ctx();
        let p = period(&c);
        let mut entry = balanced_entry(&amounts, &c, &p);
        entry.lines[1].credit += Decimal::new(skew, 2);

        prop_assert!(
            matches!(
                JournalService::validate(&entry, &p, lookup),
                Err(LedgerError::UnbalancedEntry { .. })
            ),
            "expected Err(LedgerError::UnbalancedEntry)"
        );
    }

    /// The plan's account deltas net to zero for all-asset entries: what
    /// debits add, credits remove.
    #[test]
    fn prop_plan_deltas_net_to_zero(
        amounts in prop::collection::vec(amount_strategy(), 1..10),
    ) {
        let c = ctx();
        let p = period(&c);
        let entry = balanced_entry(&amounts, &c, &p);
        let plan = JournalService::plan(&entry, &p, lookup, &c).unwrap();

        let net: Decimal = plan.account_deltas.iter().map(|d| d.delta).sum();
        prop_assert_eq!(net, Decimal::ZERO);
    }

    /// One ledger row per line, each carrying the line's exact amounts.
    #[test]
    fn prop_plan_rows_mirror_lines(
        amounts in prop::collection::vec(amount_strategy(), 1..10),
    ) {
        let c = ctx();
        let p = period(&c);
        let entry = balanced_entry(&amounts, &c, &p);
        let plan = JournalService::plan(&entry, &p, lookup, &c).unwrap();

        prop_assert_eq!(plan.rows.len(), entry.lines.len());
        for (row, line) in plan.rows.iter().zip(&entry.lines) {
            prop_assert_eq!(row.line_id, line.id);
            prop_assert_eq!(row.debit, line.debit);
            prop_assert_eq!(row.credit, line.credit);
            prop_assert_eq!(row.entry_id, entry.id);
        }
    }
}
