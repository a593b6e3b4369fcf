//! Financial period repository.

use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};

use saldo_core::period::FinancialPeriod;
use saldo_core::{LedgerError, PostingContext};
use saldo_shared::types::{ActorId, AuditStamp, PeriodId};

use crate::entities::financial_periods;
use crate::entities::sea_orm_active_enums::PeriodStatus as DbPeriodStatus;
use crate::error::DbError;

/// Repository for financial period lifecycle operations.
#[derive(Debug, Clone)]
pub struct PeriodRepository {
    db: DatabaseConnection,
}

impl PeriodRepository {
    /// Creates a new period repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a new open period after checking the date range does not
    /// overlap any existing period.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` for an inverted range or
    /// `OverlappingPeriod` naming the period already covering part of it.
    pub async fn create(
        &self,
        code: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
        ctx: &PostingContext,
    ) -> Result<FinancialPeriod, DbError> {
        let period = FinancialPeriod::create(code, start_date, end_date, ctx)?;

        // Overlap: existing.start <= new.end AND existing.end >= new.start.
        let overlapping = financial_periods::Entity::find()
            .filter(financial_periods::Column::StartDate.lte(end_date))
            .filter(financial_periods::Column::EndDate.gte(start_date))
            .one(&self.db)
            .await?;
        if let Some(existing) = overlapping {
            return Err(LedgerError::OverlappingPeriod {
                code: existing.code,
            }
            .into());
        }

        let model = financial_periods::ActiveModel {
            id: Set(period.id.into_inner()),
            code: Set(period.code.clone()),
            start_date: Set(period.start_date),
            end_date: Set(period.end_date),
            status: Set(period.status.into()),
            closed_by: Set(None),
            closed_at: Set(None),
            created_by: Set(period.audit.created_by.into_inner()),
            created_at: Set(period.audit.created_at.into()),
            updated_by: Set(period.audit.updated_by.into_inner()),
            updated_at: Set(period.audit.updated_at.into()),
        };
        model.insert(&self.db).await?;

        Ok(period)
    }

    /// Finds a period by ID.
    ///
    /// # Errors
    ///
    /// Returns `PeriodNotFound` if no period exists with the given ID.
    pub async fn find_by_id(&self, id: PeriodId) -> Result<FinancialPeriod, DbError> {
        let model = financial_periods::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(LedgerError::PeriodNotFound(id))?;
        Ok(to_domain(model))
    }

    /// Finds the period whose date range covers the given date.
    ///
    /// # Errors
    ///
    /// Returns `NoPeriodForDate` if no period covers the date.
    pub async fn find_for_date(&self, date: NaiveDate) -> Result<FinancialPeriod, DbError> {
        let model = financial_periods::Entity::find()
            .filter(financial_periods::Column::StartDate.lte(date))
            .filter(financial_periods::Column::EndDate.gte(date))
            .one(&self.db)
            .await?
            .ok_or(LedgerError::NoPeriodForDate(date))?;
        Ok(to_domain(model))
    }

    /// Closes a period, recording who and when.
    ///
    /// # Errors
    ///
    /// Returns `PeriodNotFound`, `InvalidOperation` if already closed, or
    /// `ConcurrentModification` when another writer flipped the status
    /// between the read and the write.
    pub async fn close(&self, id: PeriodId, ctx: &PostingContext) -> Result<FinancialPeriod, DbError> {
        let mut period = self.find_by_id(id).await?;
        period.close(ctx)?;
        self.persist_status(&period, DbPeriodStatus::Open).await?;
        Ok(period)
    }

    /// Reopens a closed period, clearing the closed-by/at markers.
    ///
    /// # Errors
    ///
    /// Returns `PeriodNotFound`, `InvalidOperation` if not closed, or
    /// `ConcurrentModification` on a status race.
    pub async fn reopen(
        &self,
        id: PeriodId,
        ctx: &PostingContext,
    ) -> Result<FinancialPeriod, DbError> {
        let mut period = self.find_by_id(id).await?;
        period.reopen(ctx)?;
        self.persist_status(&period, DbPeriodStatus::Closed).await?;
        Ok(period)
    }

    /// Writes the status flip guarded on the status the caller read. The
    /// posting transaction holds the period row under `FOR UPDATE`, so a
    /// close cannot land between its period check and its commit.
    async fn persist_status(
        &self,
        period: &FinancialPeriod,
        expected: DbPeriodStatus,
    ) -> Result<(), DbError> {
        let result = financial_periods::Entity::update_many()
            .col_expr(
                financial_periods::Column::Status,
                Expr::value(DbPeriodStatus::from(period.status)),
            )
            .col_expr(
                financial_periods::Column::ClosedBy,
                Expr::value(period.closed_by.map(ActorId::into_inner)),
            )
            .col_expr(
                financial_periods::Column::ClosedAt,
                Expr::value(
                    period
                        .closed_at
                        .map(chrono::DateTime::<chrono::FixedOffset>::from),
                ),
            )
            .col_expr(
                financial_periods::Column::UpdatedBy,
                Expr::value(period.audit.updated_by.into_inner()),
            )
            .col_expr(
                financial_periods::Column::UpdatedAt,
                Expr::value(chrono::DateTime::<chrono::FixedOffset>::from(
                    period.audit.updated_at,
                )),
            )
            .filter(financial_periods::Column::Id.eq(period.id.into_inner()))
            .filter(financial_periods::Column::Status.eq(expected))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            tracing::warn!(period = %period.code, "period status race, concurrent writer won");
            return Err(LedgerError::ConcurrentModification.into());
        }
        Ok(())
    }
}

/// Maps a database row to the core period.
pub(crate) fn to_domain(model: financial_periods::Model) -> FinancialPeriod {
    FinancialPeriod {
        id: PeriodId::from_uuid(model.id),
        code: model.code,
        start_date: model.start_date,
        end_date: model.end_date,
        status: model.status.into(),
        closed_by: model.closed_by.map(ActorId::from_uuid),
        closed_at: model.closed_at.map(|t| t.with_timezone(&Utc)),
        audit: AuditStamp {
            created_by: ActorId::from_uuid(model.created_by),
            created_at: model.created_at.with_timezone(&Utc),
            updated_by: ActorId::from_uuid(model.updated_by),
            updated_at: model.updated_at.with_timezone(&Utc),
        },
    }
}
