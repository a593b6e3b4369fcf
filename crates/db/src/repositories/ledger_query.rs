//! Read-only queries over the append-only general ledger.
//!
//! This repository deliberately exposes no update or delete: ledger rows
//! are write-once facts created by the journal repository's posting
//! transaction.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect};

use saldo_core::ledger::GeneralLedgerRow;
use saldo_shared::types::{AccountId, JournalEntryId, JournalLineId, LedgerRowId, PeriodId};

use crate::entities::general_ledger;
use crate::error::DbError;

/// Read-side repository for the general ledger.
#[derive(Debug, Clone)]
pub struct LedgerQueryRepository {
    db: DatabaseConnection,
}

impl LedgerQueryRepository {
    /// Creates a new ledger query repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Account balance as of a date: the running balance of the last row
    /// dated on or before `date`, or zero if the account has no history.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn balance_as_of(
        &self,
        account_id: AccountId,
        date: NaiveDate,
    ) -> Result<Decimal, DbError> {
        let latest = general_ledger::Entity::find()
            .filter(general_ledger::Column::AccountId.eq(account_id.into_inner()))
            .filter(general_ledger::Column::EntryDate.lte(date))
            .order_by_desc(general_ledger::Column::EntryDate)
            .order_by_desc(general_ledger::Column::CreatedAt)
            .limit(1)
            .one(&self.db)
            .await?;

        Ok(latest.map_or(Decimal::ZERO, |row| row.running_balance))
    }

    /// Rows for one account within an inclusive date range, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn rows_for_account(
        &self,
        account_id: AccountId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<GeneralLedgerRow>, DbError> {
        let models = general_ledger::Entity::find()
            .filter(general_ledger::Column::AccountId.eq(account_id.into_inner()))
            .filter(general_ledger::Column::EntryDate.gte(from))
            .filter(general_ledger::Column::EntryDate.lte(to))
            .order_by_asc(general_ledger::Column::EntryDate)
            .order_by_asc(general_ledger::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(to_domain).collect())
    }

    /// All rows produced by one journal entry, in line order of creation.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn rows_for_entry(
        &self,
        entry_id: JournalEntryId,
    ) -> Result<Vec<GeneralLedgerRow>, DbError> {
        let models = general_ledger::Entity::find()
            .filter(general_ledger::Column::EntryId.eq(entry_id.into_inner()))
            .order_by_asc(general_ledger::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(to_domain).collect())
    }
}

fn to_domain(model: general_ledger::Model) -> GeneralLedgerRow {
    GeneralLedgerRow {
        id: LedgerRowId::from_uuid(model.id),
        entry_date: model.entry_date,
        period_id: PeriodId::from_uuid(model.period_id),
        account_id: AccountId::from_uuid(model.account_id),
        entry_id: JournalEntryId::from_uuid(model.entry_id),
        line_id: JournalLineId::from_uuid(model.line_id),
        debit: model.debit,
        credit: model.credit,
        running_balance: model.running_balance,
        source_type: model.source_type,
        source_id: model.source_id,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
