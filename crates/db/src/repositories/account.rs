//! Account repository for chart of accounts database operations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set,
};

use saldo_core::account::{Account, CreateAccountInput};
use saldo_core::journal::PostingAccount;
use saldo_core::{LedgerError, PostingContext};
use saldo_shared::types::{AccountId, ActorId, AuditStamp};

use crate::entities::accounts;
use crate::error::DbError;

/// Account repository for CRUD operations and balance movements.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a new account with a zero balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails (e.g., duplicate code).
    pub async fn create(
        &self,
        input: CreateAccountInput,
        ctx: &PostingContext,
    ) -> Result<Account, DbError> {
        let account = Account::create(input, ctx);

        let model = accounts::ActiveModel {
            id: Set(account.id.into_inner()),
            code: Set(account.code.clone()),
            name: Set(account.name.clone()),
            account_type: Set(account.account_type.into()),
            category: Set(account.category.clone()),
            parent_id: Set(account.parent.map(AccountId::into_inner)),
            is_group: Set(account.is_group),
            is_active: Set(account.is_active),
            balance: Set(account.balance),
            version: Set(account.version),
            created_by: Set(account.audit.created_by.into_inner()),
            created_at: Set(account.audit.created_at.into()),
            updated_by: Set(account.audit.updated_by.into_inner()),
            updated_at: Set(account.audit.updated_at.into()),
        };
        model.insert(&self.db).await?;

        Ok(account)
    }

    /// Finds an account by ID.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if no account exists with the given ID.
    pub async fn find_by_id(&self, id: AccountId) -> Result<Account, DbError> {
        let model = accounts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(LedgerError::AccountNotFound(id))?;
        Ok(to_domain(model))
    }

    /// Finds an account by its unique code.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<Account>, DbError> {
        let model = accounts::Entity::find()
            .filter(accounts::Column::Code.eq(code))
            .one(&self.db)
            .await?;
        Ok(model.map(to_domain))
    }

    /// Deactivates an account, blocking further postings.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` or a database error.
    pub async fn deactivate(&self, id: AccountId, ctx: &PostingContext) -> Result<(), DbError> {
        let model = accounts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(LedgerError::AccountNotFound(id))?;

        let mut active: accounts::ActiveModel = model.into();
        active.is_active = Set(false);
        active.updated_by = Set(ctx.actor.into_inner());
        active.updated_at = Set(ctx.at.into());
        active.update(&self.db).await?;

        Ok(())
    }

    /// Applies one movement to an account's running balance with an
    /// optimistic version check.
    ///
    /// # Errors
    ///
    /// Returns `ConcurrentModification` when another writer advanced the
    /// version between the read and the update, `GroupAccount`/
    /// `InactiveAccount` when the account rejects postings.
    pub async fn apply_movement(
        &self,
        id: AccountId,
        debit: Decimal,
        credit: Decimal,
        ctx: &PostingContext,
    ) -> Result<Decimal, DbError> {
        let model = accounts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(LedgerError::AccountNotFound(id))?;

        let mut account = to_domain(model);
        let expected_version = account.version;
        let new_balance = account.apply_movement(debit, credit, ctx)?;

        apply_versioned_update(&self.db, &account, expected_version).await?;

        Ok(new_balance)
    }
}

/// Conditionally writes an account's balance, guarding on the version the
/// caller read. The journal repository writes its batched movements with
/// the same version filter, computed per line from the posting plan.
pub(crate) async fn apply_versioned_update<C: ConnectionTrait>(
    conn: &C,
    account: &Account,
    expected_version: i64,
) -> Result<(), DbError> {
    let result = accounts::Entity::update_many()
        .col_expr(accounts::Column::Balance, Expr::value(account.balance))
        .col_expr(accounts::Column::Version, Expr::value(account.version))
        .col_expr(
            accounts::Column::UpdatedBy,
            Expr::value(account.audit.updated_by.into_inner()),
        )
        .col_expr(
            accounts::Column::UpdatedAt,
            Expr::value(DateTime::<chrono::FixedOffset>::from(account.audit.updated_at)),
        )
        .filter(accounts::Column::Id.eq(account.id.into_inner()))
        .filter(accounts::Column::Version.eq(expected_version))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        tracing::warn!(account = %account.id, "version check failed, concurrent writer won");
        return Err(LedgerError::ConcurrentModification.into());
    }
    Ok(())
}

/// Maps a database row to the core account.
pub(crate) fn to_domain(model: accounts::Model) -> Account {
    Account {
        id: AccountId::from_uuid(model.id),
        code: model.code,
        name: model.name,
        account_type: model.account_type.into(),
        category: model.category,
        parent: model.parent_id.map(AccountId::from_uuid),
        is_group: model.is_group,
        is_active: model.is_active,
        balance: model.balance,
        version: model.version,
        audit: AuditStamp {
            created_by: ActorId::from_uuid(model.created_by),
            created_at: model.created_at.with_timezone(&Utc),
            updated_by: ActorId::from_uuid(model.updated_by),
            updated_at: model.updated_at.with_timezone(&Utc),
        },
    }
}

/// Maps a database row to the journal engine's posting view.
pub(crate) fn to_posting_account(model: &accounts::Model) -> PostingAccount {
    PostingAccount {
        id: AccountId::from_uuid(model.id),
        account_type: model.account_type.clone().into(),
        is_group: model.is_group,
        is_active: model.is_active,
        balance: model.balance,
        version: model.version,
    }
}
