//! Journal service: validation, posting plans, and state transitions.
//!
//! The service contains pure business logic with no database dependencies.
//! Account state is injected through a lookup function; the persistence
//! layer executes the resulting `PostingPlan` as one atomic unit.

use std::collections::HashMap;

use rust_decimal::Decimal;
use saldo_shared::types::{AccountId, LedgerRowId, PeriodId};

use super::types::{JournalEntry, JournalEntryType, JournalStatus, SourceDocument};
use crate::account::AccountType;
use crate::context::PostingContext;
use crate::error::LedgerError;
use crate::ledger::GeneralLedgerRow;
use crate::period::FinancialPeriod;

/// Account state needed to validate and plan a posting.
#[derive(Debug, Clone, Copy)]
pub struct PostingAccount {
    /// The account ID.
    pub id: AccountId,
    /// Account classification (determines the normal-balance side).
    pub account_type: AccountType,
    /// Group accounts reject postings.
    pub is_group: bool,
    /// Inactive accounts reject postings.
    pub is_active: bool,
    /// Current running balance.
    pub balance: Decimal,
    /// Current optimistic-lock version.
    pub version: i64,
}

impl PostingAccount {
    fn ensure_postable(&self) -> Result<(), LedgerError> {
        if self.is_group {
            return Err(LedgerError::GroupAccount(self.id));
        }
        if !self.is_active {
            return Err(LedgerError::InactiveAccount(self.id));
        }
        Ok(())
    }
}

/// Net effect of one posting on one account.
#[derive(Debug, Clone, Copy)]
pub struct AccountDelta {
    /// The account to update.
    pub account_id: AccountId,
    /// Signed balance change across all of the entry's lines.
    pub delta: Decimal,
    /// Balance after applying the delta.
    pub new_balance: Decimal,
    /// Version the update must be conditioned on (lost-update guard).
    pub expected_version: i64,
    /// Number of lines contributing, i.e. the version increment.
    pub movements: i64,
}

/// Everything the persistence layer must write atomically to post an entry.
#[derive(Debug, Clone)]
pub struct PostingPlan {
    /// Per-account balance updates, in first-touched order.
    pub account_deltas: Vec<AccountDelta>,
    /// One general ledger row per line, carrying post-movement balances.
    pub rows: Vec<GeneralLedgerRow>,
}

/// Journal engine operations.
pub struct JournalService;

impl JournalService {
    /// Validates an entry against its lines, accounts, and period.
    ///
    /// All checks run before any mutation: an entry must have lines, every
    /// line must carry exactly one positive side and target a postable
    /// account, debits must equal credits exactly, and the period must
    /// accept the entry date.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant as a `LedgerError`.
    pub fn validate<A>(
        entry: &JournalEntry,
        period: &FinancialPeriod,
        account_lookup: A,
    ) -> Result<(), LedgerError>
    where
        A: Fn(AccountId) -> Result<PostingAccount, LedgerError>,
    {
        if entry.lines.is_empty() {
            return Err(LedgerError::EmptyEntry);
        }

        let mut total_debit = Decimal::ZERO;
        let mut total_credit = Decimal::ZERO;

        for line in &entry.lines {
            line.validate()?;
            account_lookup(line.account_id)?.ensure_postable()?;
            total_debit += line.debit;
            total_credit += line.credit;
        }

        // Exact decimal equality, not a rounded comparison.
        if total_debit != total_credit {
            return Err(LedgerError::UnbalancedEntry {
                debit: total_debit,
                credit: total_credit,
            });
        }

        period.can_post(entry.entry_date)?;

        Ok(())
    }

    /// Re-validates the entry and computes the atomic posting plan.
    ///
    /// Running balances accumulate across the entry's own lines, so an
    /// entry touching the same account twice yields two ledger rows with
    /// consecutive balances and a single account delta.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` unless the entry is a draft, or any
    /// validation error from [`Self::validate`].
    pub fn plan<A>(
        entry: &JournalEntry,
        period: &FinancialPeriod,
        account_lookup: A,
        ctx: &PostingContext,
    ) -> Result<PostingPlan, LedgerError>
    where
        A: Fn(AccountId) -> Result<PostingAccount, LedgerError>,
    {
        if !entry.can_post() {
            return Err(LedgerError::InvalidOperation(format!(
                "entry {} is not a draft and cannot be posted",
                entry.number
            )));
        }

        Self::validate(entry, period, &account_lookup)?;

        // Working balances per account across this entry's lines.
        let mut touched: HashMap<AccountId, usize> = HashMap::new();
        let mut deltas: Vec<AccountDelta> = Vec::new();
        let mut rows = Vec::with_capacity(entry.lines.len());

        for line in &entry.lines {
            let account = account_lookup(line.account_id)?;
            let change = account
                .account_type
                .normal_balance()
                .balance_change(line.debit, line.credit);

            let idx = *touched.entry(line.account_id).or_insert_with(|| {
                deltas.push(AccountDelta {
                    account_id: account.id,
                    delta: Decimal::ZERO,
                    new_balance: account.balance,
                    expected_version: account.version,
                    movements: 0,
                });
                deltas.len() - 1
            });

            let delta = &mut deltas[idx];
            delta.delta += change;
            delta.new_balance += change;
            delta.movements += 1;

            rows.push(GeneralLedgerRow {
                id: LedgerRowId::new(),
                entry_date: entry.entry_date,
                period_id: entry.period_id,
                account_id: line.account_id,
                entry_id: entry.id,
                line_id: line.id,
                debit: line.debit,
                credit: line.credit,
                running_balance: delta.new_balance,
                source_type: entry.source.as_ref().map(|s| s.doc_type.clone()),
                source_id: entry.source.as_ref().map(|s| s.doc_id),
                created_at: ctx.at,
            });
        }

        Ok(PostingPlan {
            account_deltas: deltas,
            rows,
        })
    }

    /// Flips a draft entry to Posted, stamping the actor and time.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` unless the entry is a draft.
    pub fn mark_posted(entry: &mut JournalEntry, ctx: &PostingContext) -> Result<(), LedgerError> {
        if !entry.can_post() {
            return Err(LedgerError::InvalidOperation(format!(
                "entry {} is not a draft and cannot be posted",
                entry.number
            )));
        }
        entry.status = JournalStatus::Posted;
        entry.posted_by = Some(ctx.actor);
        entry.posted_at = Some(ctx.at);
        entry.audit = entry.audit.touched(ctx.actor, ctx.at);
        Ok(())
    }

    /// Cancels a draft entry.
    ///
    /// Posted entries are never cancelled: corrections go through a new
    /// reversing adjustment entry, keeping history intact.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` unless the entry is a draft.
    pub fn cancel(entry: &mut JournalEntry, ctx: &PostingContext) -> Result<(), LedgerError> {
        match entry.status {
            JournalStatus::Draft => {
                entry.status = JournalStatus::Cancelled;
                entry.audit = entry.audit.touched(ctx.actor, ctx.at);
                Ok(())
            }
            JournalStatus::Posted => Err(LedgerError::InvalidOperation(format!(
                "entry {} is posted; post a reversing adjustment instead of cancelling",
                entry.number
            ))),
            JournalStatus::Cancelled => Err(LedgerError::InvalidOperation(format!(
                "entry {} is already cancelled",
                entry.number
            ))),
        }
    }

    /// Builds the contra draft for a posted entry: same lines with debit and
    /// credit swapped, typed as an adjustment, linked back to the original.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` unless the original is posted.
    pub fn reversing_entry(
        original: &JournalEntry,
        number: String,
        entry_date: chrono::NaiveDate,
        period_id: PeriodId,
        ctx: &PostingContext,
    ) -> Result<JournalEntry, LedgerError> {
        if original.status != JournalStatus::Posted {
            return Err(LedgerError::InvalidOperation(format!(
                "entry {} is not posted and needs no reversal",
                original.number
            )));
        }

        let input = super::types::CreateJournalEntryInput {
            number,
            entry_date,
            period_id,
            entry_type: JournalEntryType::Adjustment,
            source: Some(SourceDocument {
                doc_type: "journal_entry".to_string(),
                doc_id: original.id.into_inner(),
                reference: original.number.clone(),
            }),
            description: format!("Reversal of {}", original.number),
            lines: original
                .lines
                .iter()
                .map(|line| super::types::JournalLineInput {
                    account_id: line.account_id,
                    debit: line.credit,
                    credit: line.debit,
                    cost_center: line.cost_center.clone(),
                })
                .collect(),
        };

        Ok(JournalEntry::draft(input, ctx))
    }
}
