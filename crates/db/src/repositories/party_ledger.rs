//! Party ledger repository.
//!
//! Recording a transaction appends one subledger row and refreshes the
//! party's denormalized balance cache in the same database transaction.
//! The subledger table is append-only.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

use saldo_core::party::{Party, PartyLedger, PartyLedgerRow, PartySide, PartyTransaction};
use saldo_core::{LedgerError, PostingContext};
use saldo_shared::types::{ActorId, AuditStamp, PartyId, PartyLedgerRowId};

use crate::entities::{parties, party_ledger};
use crate::error::DbError;

/// Repository for parties and their running-balance subledgers.
#[derive(Debug, Clone)]
pub struct PartyLedgerRepository {
    db: DatabaseConnection,
}

impl PartyLedgerRepository {
    /// Creates a new party ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a party with a zero balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create_party(
        &self,
        name: String,
        side: PartySide,
        ctx: &PostingContext,
    ) -> Result<Party, DbError> {
        let party = Party::create(name, side, ctx);

        let model = parties::ActiveModel {
            id: Set(party.id.into_inner()),
            name: Set(party.name.clone()),
            side: Set(party.side.into()),
            current_balance: Set(party.current_balance),
            version: Set(party.version),
            created_by: Set(party.audit.created_by.into_inner()),
            created_at: Set(party.audit.created_at.into()),
            updated_by: Set(party.audit.updated_by.into_inner()),
            updated_at: Set(party.audit.updated_at.into()),
        };
        model.insert(&self.db).await?;

        Ok(party)
    }

    /// Finds a party by ID.
    ///
    /// # Errors
    ///
    /// Returns `PartyNotFound` if no party exists with the given ID.
    pub async fn find_party(&self, id: PartyId) -> Result<Party, DbError> {
        let model = parties::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(LedgerError::PartyNotFound(id))?;
        Ok(to_domain_party(model))
    }

    /// Records one transaction: appends the subledger row and updates the
    /// party's balance cache, both in one database transaction guarded by
    /// the party's version.
    ///
    /// # Errors
    ///
    /// Returns `PartyNotFound`, `InvalidOperation` for malformed amounts,
    /// or `ConcurrentModification` when the version check fails.
    pub async fn record_transaction(
        &self,
        party_id: PartyId,
        tx: PartyTransaction,
        ctx: &PostingContext,
    ) -> Result<PartyLedgerRow, DbError> {
        let txn = self.db.begin().await?;

        let model = parties::Entity::find_by_id(party_id.into_inner())
            .one(&txn)
            .await?
            .ok_or(LedgerError::PartyNotFound(party_id))?;

        let mut party = to_domain_party(model);
        let expected_version = party.version;

        // The in-memory ledger chains off the party's cached balance, so a
        // fresh store computes the correct next running balance.
        let row = PartyLedger::new().record_transaction(&mut party, tx, ctx)?;

        let row_model = party_ledger::ActiveModel {
            id: Set(row.id.into_inner()),
            party_id: Set(row.party_id.into_inner()),
            date: Set(row.date),
            transaction_type: Set(row.transaction_type.into()),
            debit: Set(row.debit),
            credit: Set(row.credit),
            running_balance: Set(row.running_balance),
            reference: Set(row.reference.clone()),
            source_id: Set(row.source_id),
            reconciled: Set(row.reconciled),
            created_at: Set(row.created_at.into()),
        };
        row_model.insert(&txn).await?;

        let result = parties::Entity::update_many()
            .col_expr(
                parties::Column::CurrentBalance,
                Expr::value(party.current_balance),
            )
            .col_expr(parties::Column::Version, Expr::value(party.version))
            .col_expr(
                parties::Column::UpdatedBy,
                Expr::value(ctx.actor.into_inner()),
            )
            .col_expr(
                parties::Column::UpdatedAt,
                Expr::value(chrono::DateTime::<chrono::FixedOffset>::from(ctx.at)),
            )
            .filter(parties::Column::Id.eq(party_id.into_inner()))
            .filter(parties::Column::Version.eq(expected_version))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            tracing::warn!(party = %party_id, "party balance lost the version race");
            return Err(LedgerError::ConcurrentModification.into());
        }

        txn.commit().await?;
        Ok(row)
    }

    /// Statement for one party within an inclusive date range, oldest
    /// first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn statement(
        &self,
        party_id: PartyId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PartyLedgerRow>, DbError> {
        let models = party_ledger::Entity::find()
            .filter(party_ledger::Column::PartyId.eq(party_id.into_inner()))
            .filter(party_ledger::Column::Date.gte(from))
            .filter(party_ledger::Column::Date.lte(to))
            .order_by_asc(party_ledger::Column::Date)
            .order_by_asc(party_ledger::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(to_domain_row).collect())
    }

    /// Party balance as of a date.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn balance_as_of(
        &self,
        party_id: PartyId,
        date: NaiveDate,
    ) -> Result<Decimal, DbError> {
        let latest = party_ledger::Entity::find()
            .filter(party_ledger::Column::PartyId.eq(party_id.into_inner()))
            .filter(party_ledger::Column::Date.lte(date))
            .order_by_desc(party_ledger::Column::Date)
            .order_by_desc(party_ledger::Column::CreatedAt)
            .limit(1)
            .one(&self.db)
            .await?;

        Ok(latest.map_or(Decimal::ZERO, |row| row.running_balance))
    }
}

fn to_domain_party(model: parties::Model) -> Party {
    Party {
        id: PartyId::from_uuid(model.id),
        name: model.name,
        side: model.side.into(),
        current_balance: model.current_balance,
        version: model.version,
        audit: AuditStamp {
            created_by: ActorId::from_uuid(model.created_by),
            created_at: model.created_at.with_timezone(&Utc),
            updated_by: ActorId::from_uuid(model.updated_by),
            updated_at: model.updated_at.with_timezone(&Utc),
        },
    }
}

fn to_domain_row(model: party_ledger::Model) -> PartyLedgerRow {
    PartyLedgerRow {
        id: PartyLedgerRowId::from_uuid(model.id),
        party_id: PartyId::from_uuid(model.party_id),
        date: model.date,
        transaction_type: model.transaction_type.into(),
        debit: model.debit,
        credit: model.credit,
        running_balance: model.running_balance,
        reference: model.reference,
        source_id: model.source_id,
        reconciled: model.reconciled,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
