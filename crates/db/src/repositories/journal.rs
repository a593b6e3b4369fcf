//! Journal repository: drafting, posting, and cancelling entries.
//!
//! Posting is the one multi-table write in the system: account balances,
//! general ledger rows, and the header status flip all land in a single
//! database transaction, or none of them do.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use saldo_core::journal::{
    CreateJournalEntryInput, JournalEntry, JournalLine, JournalService, PostingAccount,
    PostingPlan, SourceDocument,
};
use saldo_core::{LedgerError, PostingContext};
use saldo_shared::types::{
    AccountId, ActorId, AuditStamp, JournalEntryId, JournalLineId, PeriodId,
};

use crate::entities::{accounts, general_ledger, journal_entries, journal_lines};
use crate::error::DbError;
use crate::repositories::{account, period};

/// Repository for journal entry lifecycle operations.
#[derive(Debug, Clone)]
pub struct JournalRepository {
    db: DatabaseConnection,
}

impl JournalRepository {
    /// Creates a new journal repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a draft entry with its lines.
    ///
    /// The draft is validated for shape only at this point; full
    /// validation (accounts, balance, period) runs at posting time.
    ///
    /// # Errors
    ///
    /// Returns `PeriodNotFound` or a database error.
    pub async fn create_draft(
        &self,
        input: CreateJournalEntryInput,
        ctx: &PostingContext,
    ) -> Result<JournalEntry, DbError> {
        // The period must exist even for a draft.
        financial_period_exists(&self.db, input.period_id).await?;

        let entry = JournalEntry::draft(input, ctx);

        let txn = self.db.begin().await?;
        insert_entry(&txn, &entry).await?;
        txn.commit().await?;

        Ok(entry)
    }

    /// Finds an entry with its lines.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound` if no entry exists with the given ID.
    pub async fn find_by_id(&self, id: JournalEntryId) -> Result<JournalEntry, DbError> {
        load_entry(&self.db, id).await
    }

    /// Posts a draft entry: validates it, applies one movement per line to
    /// the targeted accounts, appends one general ledger row per line, and
    /// flips the header to Posted. All writes share one transaction.
    ///
    /// # Errors
    ///
    /// Any validation error from the core journal service, or
    /// `ConcurrentModification` when an account's version check fails.
    pub async fn post(
        &self,
        id: JournalEntryId,
        ctx: &PostingContext,
    ) -> Result<JournalEntry, DbError> {
        let txn = self.db.begin().await?;

        let mut entry = load_entry(&txn, id).await?;
        let period = load_period(&txn, entry.period_id).await?;

        // Prefetch every targeted account so the pure planner can run
        // against a synchronous lookup.
        let posting_accounts = load_posting_accounts(&txn, &entry.lines).await?;
        let lookup = |account_id: AccountId| {
            posting_accounts
                .get(&account_id)
                .copied()
                .ok_or(LedgerError::AccountNotFound(account_id))
        };

        let plan = JournalService::plan(&entry, &period, lookup, ctx)?;
        apply_plan(&txn, &plan, ctx).await?;

        JournalService::mark_posted(&mut entry, ctx)?;
        flip_header_from_draft(&txn, &entry).await?;

        txn.commit().await?;

        tracing::info!(entry = %entry.number, lines = entry.lines.len(), "journal entry posted");
        Ok(entry)
    }

    /// Cancels a draft entry. Posted entries are corrected through a
    /// reversing adjustment, never cancelled.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound`, `InvalidOperation`, or
    /// `ConcurrentModification` when the entry left Draft between the read
    /// and the write.
    pub async fn cancel(
        &self,
        id: JournalEntryId,
        ctx: &PostingContext,
    ) -> Result<JournalEntry, DbError> {
        let mut entry = load_entry(&self.db, id).await?;
        JournalService::cancel(&mut entry, ctx)?;
        flip_header_from_draft(&self.db, &entry).await?;
        Ok(entry)
    }

    /// Creates the reversing draft for a posted entry: same lines with
    /// debit and credit swapped, typed as an adjustment, linked back to
    /// the original. The draft still goes through [`Self::post`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` unless the original is posted, or
    /// `NoPeriodForDate` when no period covers the reversal date.
    pub async fn create_reversal(
        &self,
        original_id: JournalEntryId,
        number: String,
        entry_date: NaiveDate,
        ctx: &PostingContext,
    ) -> Result<JournalEntry, DbError> {
        let original = load_entry(&self.db, original_id).await?;

        let period_model = crate::entities::financial_periods::Entity::find()
            .filter(crate::entities::financial_periods::Column::StartDate.lte(entry_date))
            .filter(crate::entities::financial_periods::Column::EndDate.gte(entry_date))
            .one(&self.db)
            .await?
            .ok_or(LedgerError::NoPeriodForDate(entry_date))?;

        let reversal = JournalService::reversing_entry(
            &original,
            number,
            entry_date,
            PeriodId::from_uuid(period_model.id),
            ctx,
        )?;

        let txn = self.db.begin().await?;
        insert_entry(&txn, &reversal).await?;
        txn.commit().await?;

        Ok(reversal)
    }
}

async fn financial_period_exists<C: ConnectionTrait>(
    conn: &C,
    id: PeriodId,
) -> Result<(), DbError> {
    crate::entities::financial_periods::Entity::find_by_id(id.into_inner())
        .one(conn)
        .await?
        .ok_or(LedgerError::PeriodNotFound(id))?;
    Ok(())
}

/// Reads the period under `FOR UPDATE` so a concurrent close waits for
/// the posting transaction to commit before it can flip the status.
async fn load_period<C: ConnectionTrait>(
    conn: &C,
    id: PeriodId,
) -> Result<saldo_core::period::FinancialPeriod, DbError> {
    let model = crate::entities::financial_periods::Entity::find_by_id(id.into_inner())
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or(LedgerError::PeriodNotFound(id))?;
    Ok(period::to_domain(model))
}

async fn load_posting_accounts<C: ConnectionTrait>(
    conn: &C,
    lines: &[JournalLine],
) -> Result<HashMap<AccountId, PostingAccount>, DbError> {
    let ids: Vec<_> = lines
        .iter()
        .map(|line| line.account_id.into_inner())
        .collect();

    let models = accounts::Entity::find()
        .filter(accounts::Column::Id.is_in(ids))
        .all(conn)
        .await?;

    Ok(models
        .iter()
        .map(|model| (AccountId::from_uuid(model.id), account::to_posting_account(model)))
        .collect())
}

async fn insert_entry(txn: &DatabaseTransaction, entry: &JournalEntry) -> Result<(), DbError> {
    let header = journal_entries::ActiveModel {
        id: Set(entry.id.into_inner()),
        number: Set(entry.number.clone()),
        entry_date: Set(entry.entry_date),
        period_id: Set(entry.period_id.into_inner()),
        entry_type: Set(entry.entry_type.into()),
        source_type: Set(entry.source.as_ref().map(|s| s.doc_type.clone())),
        source_id: Set(entry.source.as_ref().map(|s| s.doc_id)),
        source_reference: Set(entry.source.as_ref().map(|s| s.reference.clone())),
        description: Set(entry.description.clone()),
        total_debit: Set(entry.total_debit),
        total_credit: Set(entry.total_credit),
        status: Set(entry.status.into()),
        posted_by: Set(entry.posted_by.map(ActorId::into_inner)),
        posted_at: Set(entry.posted_at.map(Into::into)),
        created_by: Set(entry.audit.created_by.into_inner()),
        created_at: Set(entry.audit.created_at.into()),
        updated_by: Set(entry.audit.updated_by.into_inner()),
        updated_at: Set(entry.audit.updated_at.into()),
    };
    header.insert(txn).await?;

    for line in &entry.lines {
        let model = journal_lines::ActiveModel {
            id: Set(line.id.into_inner()),
            entry_id: Set(line.entry_id.into_inner()),
            line_no: Set(i32::try_from(line.line_no).unwrap_or(i32::MAX)),
            account_id: Set(line.account_id.into_inner()),
            debit: Set(line.debit),
            credit: Set(line.credit),
            cost_center: Set(line.cost_center.clone()),
        };
        model.insert(txn).await?;
    }

    Ok(())
}

async fn load_entry<C: ConnectionTrait>(
    conn: &C,
    id: JournalEntryId,
) -> Result<JournalEntry, DbError> {
    let header = journal_entries::Entity::find_by_id(id.into_inner())
        .one(conn)
        .await?
        .ok_or(LedgerError::EntryNotFound(id))?;

    let lines = journal_lines::Entity::find()
        .filter(journal_lines::Column::EntryId.eq(id.into_inner()))
        .order_by_asc(journal_lines::Column::LineNo)
        .all(conn)
        .await?;

    Ok(to_domain(header, lines))
}

async fn apply_plan(
    txn: &DatabaseTransaction,
    plan: &PostingPlan,
    ctx: &PostingContext,
) -> Result<(), DbError> {
    for delta in &plan.account_deltas {
        let result = accounts::Entity::update_many()
            .col_expr(accounts::Column::Balance, Expr::value(delta.new_balance))
            .col_expr(
                accounts::Column::Version,
                Expr::value(delta.expected_version + delta.movements),
            )
            .col_expr(
                accounts::Column::UpdatedBy,
                Expr::value(ctx.actor.into_inner()),
            )
            .col_expr(
                accounts::Column::UpdatedAt,
                Expr::value(chrono::DateTime::<chrono::FixedOffset>::from(ctx.at)),
            )
            .filter(accounts::Column::Id.eq(delta.account_id.into_inner()))
            .filter(accounts::Column::Version.eq(delta.expected_version))
            .exec(txn)
            .await?;

        if result.rows_affected == 0 {
            tracing::warn!(account = %delta.account_id, "posting lost the version race");
            return Err(LedgerError::ConcurrentModification.into());
        }
    }

    for row in &plan.rows {
        let model = general_ledger::ActiveModel {
            id: Set(row.id.into_inner()),
            entry_date: Set(row.entry_date),
            period_id: Set(row.period_id.into_inner()),
            account_id: Set(row.account_id.into_inner()),
            entry_id: Set(row.entry_id.into_inner()),
            line_id: Set(row.line_id.into_inner()),
            debit: Set(row.debit),
            credit: Set(row.credit),
            running_balance: Set(row.running_balance),
            source_type: Set(row.source_type.clone()),
            source_id: Set(row.source_id),
            created_at: Set(row.created_at.into()),
        };
        model.insert(txn).await?;
    }

    Ok(())
}

/// Flips a header out of Draft, guarded on the row still being Draft.
/// A concurrent post or cancel that won the race matches zero rows.
async fn flip_header_from_draft<C: ConnectionTrait>(
    conn: &C,
    entry: &JournalEntry,
) -> Result<(), DbError> {
    let result = journal_entries::Entity::update_many()
        .col_expr(
            journal_entries::Column::Status,
            Expr::value(crate::entities::sea_orm_active_enums::JournalStatus::from(
                entry.status,
            )),
        )
        .col_expr(
            journal_entries::Column::PostedBy,
            Expr::value(entry.posted_by.map(ActorId::into_inner)),
        )
        .col_expr(
            journal_entries::Column::PostedAt,
            Expr::value(
                entry
                    .posted_at
                    .map(chrono::DateTime::<chrono::FixedOffset>::from),
            ),
        )
        .col_expr(
            journal_entries::Column::UpdatedBy,
            Expr::value(entry.audit.updated_by.into_inner()),
        )
        .col_expr(
            journal_entries::Column::UpdatedAt,
            Expr::value(chrono::DateTime::<chrono::FixedOffset>::from(
                entry.audit.updated_at,
            )),
        )
        .filter(journal_entries::Column::Id.eq(entry.id.into_inner()))
        .filter(
            journal_entries::Column::Status
                .eq(crate::entities::sea_orm_active_enums::JournalStatus::Draft),
        )
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        tracing::warn!(entry = %entry.number, "header left draft, concurrent writer won");
        return Err(LedgerError::ConcurrentModification.into());
    }
    Ok(())
}

/// Maps header and line rows to the core aggregate.
fn to_domain(header: journal_entries::Model, lines: Vec<journal_lines::Model>) -> JournalEntry {
    let source = match (header.source_type, header.source_id) {
        (Some(doc_type), Some(doc_id)) => Some(SourceDocument {
            doc_type,
            doc_id,
            reference: header.source_reference.unwrap_or_default(),
        }),
        _ => None,
    };

    JournalEntry {
        id: JournalEntryId::from_uuid(header.id),
        number: header.number,
        entry_date: header.entry_date,
        period_id: PeriodId::from_uuid(header.period_id),
        entry_type: header.entry_type.into(),
        source,
        description: header.description,
        total_debit: header.total_debit,
        total_credit: header.total_credit,
        status: header.status.into(),
        posted_by: header.posted_by.map(ActorId::from_uuid),
        posted_at: header.posted_at.map(|t| t.with_timezone(&Utc)),
        audit: AuditStamp {
            created_by: ActorId::from_uuid(header.created_by),
            created_at: header.created_at.with_timezone(&Utc),
            updated_by: ActorId::from_uuid(header.updated_by),
            updated_at: header.updated_at.with_timezone(&Utc),
        },
        lines: lines
            .into_iter()
            .map(|line| JournalLine {
                id: JournalLineId::from_uuid(line.id),
                entry_id: JournalEntryId::from_uuid(line.entry_id),
                line_no: u32::try_from(line.line_no).unwrap_or(0),
                account_id: AccountId::from_uuid(line.account_id),
                debit: line.debit,
                credit: line.credit,
                cost_center: line.cost_center,
            })
            .collect(),
    }
}
