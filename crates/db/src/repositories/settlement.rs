//! Settlement repository: payments, allocations, and invoice positions.
//!
//! Every settlement operation is a single database transaction. Payment
//! and invoice rows carry optimistic version columns; a failed check
//! rolls the whole unit back as `ConcurrentModification`.

use chrono::NaiveDate;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, ModelTrait, QueryFilter, Set, TransactionTrait,
};

use saldo_core::settlement::{
    Allocation, InvoicePosition, Payment, PaymentMode, ReversalPolicy, SettlementService,
};
use saldo_core::{LedgerError, PostingContext};
use saldo_shared::types::{
    ActorId, AllocationId, AuditStamp, InvoiceId, PartyId, PaymentId,
};

use crate::entities::{invoice_positions, payment_allocations, payments};
use crate::error::DbError;

/// Repository for bill-to-bill settlement.
#[derive(Debug, Clone)]
pub struct SettlementRepository {
    db: DatabaseConnection,
}

impl SettlementRepository {
    /// Creates a new settlement repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a draft payment with nothing allocated.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails (e.g., duplicate number).
    pub async fn create_payment(
        &self,
        number: String,
        date: NaiveDate,
        party_id: PartyId,
        mode: PaymentMode,
        total: Decimal,
        ctx: &PostingContext,
    ) -> Result<Payment, DbError> {
        let payment = Payment::draft(number, date, party_id, mode, total, ctx);

        let model = payments::ActiveModel {
            id: Set(payment.id.into_inner()),
            number: Set(payment.number.clone()),
            date: Set(payment.date),
            party_id: Set(payment.party_id.into_inner()),
            mode: Set(payment.mode.into()),
            total: Set(payment.total),
            allocated: Set(payment.allocated),
            status: Set(payment.status.into()),
            version: Set(payment.version),
            created_by: Set(payment.audit.created_by.into_inner()),
            created_at: Set(payment.audit.created_at.into()),
            updated_by: Set(payment.audit.updated_by.into_inner()),
            updated_at: Set(payment.audit.updated_at.into()),
        };
        model.insert(&self.db).await?;

        Ok(payment)
    }

    /// Finds a payment by ID.
    ///
    /// # Errors
    ///
    /// Returns `PaymentNotFound` if no payment exists with the given ID.
    pub async fn find_payment(&self, id: PaymentId) -> Result<Payment, DbError> {
        let model = payments::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(LedgerError::PaymentNotFound(id))?;
        Ok(to_domain_payment(model))
    }

    /// Opens a settlement position for an externally owned invoice/bill.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn open_invoice(
        &self,
        id: InvoiceId,
        party_id: PartyId,
        number: String,
        total: Decimal,
    ) -> Result<InvoicePosition, DbError> {
        let invoice = InvoicePosition::open(id, party_id, number, total);

        let model = invoice_positions::ActiveModel {
            id: Set(invoice.id.into_inner()),
            party_id: Set(invoice.party_id.into_inner()),
            number: Set(invoice.number.clone()),
            total: Set(invoice.total),
            paid: Set(invoice.paid),
            payment_status: Set(invoice.payment_status.into()),
            version: Set(invoice.version),
        };
        model.insert(&self.db).await?;

        Ok(invoice)
    }

    /// Finds an invoice position by ID.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceNotFound` if no position exists with the given ID.
    pub async fn find_invoice(&self, id: InvoiceId) -> Result<InvoicePosition, DbError> {
        let model = invoice_positions::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(LedgerError::InvoiceNotFound(id))?;
        Ok(to_domain_invoice(model))
    }

    /// Allocates a slice of a payment against one outstanding invoice.
    /// Payment counter, invoice counters, and the allocation row change
    /// together in one transaction.
    ///
    /// # Errors
    ///
    /// Any allocation bound violation from the core, or
    /// `ConcurrentModification` on a version race.
    pub async fn allocate(
        &self,
        payment_id: PaymentId,
        invoice_id: InvoiceId,
        amount: Decimal,
        allocation_date: NaiveDate,
        ctx: &PostingContext,
    ) -> Result<Allocation, DbError> {
        let txn = self.db.begin().await?;

        let mut payment = load_payment(&txn, payment_id).await?;
        let mut invoice = load_invoice(&txn, invoice_id).await?;
        let payment_version = payment.version;
        let invoice_version = invoice.version;

        let allocation =
            SettlementService::allocate(&mut payment, &mut invoice, amount, allocation_date, ctx)?;

        persist_payment(&txn, &payment, payment_version).await?;
        persist_invoice(&txn, &invoice, invoice_version).await?;

        let model = payment_allocations::ActiveModel {
            id: Set(allocation.id.into_inner()),
            payment_id: Set(allocation.payment_id.into_inner()),
            invoice_id: Set(allocation.invoice_id.into_inner()),
            amount: Set(allocation.amount),
            allocation_date: Set(allocation.allocation_date),
            applied: Set(allocation.applied),
        };
        model.insert(&txn).await?;

        txn.commit().await?;

        tracing::info!(payment = %payment.number, invoice = %invoice.number, %amount, "allocated");
        Ok(allocation)
    }

    /// Reverses one allocation and deletes its row, symmetrically
    /// restoring the payment and invoice counters.
    ///
    /// # Errors
    ///
    /// Returns `AllocationNotFound`, `InvalidOperation` when the policy
    /// locks the cleared payment, or `ConcurrentModification`.
    pub async fn reverse_allocation(
        &self,
        allocation_id: AllocationId,
        policy: ReversalPolicy,
        ctx: &PostingContext,
    ) -> Result<(), DbError> {
        let txn = self.db.begin().await?;

        let allocation_model = payment_allocations::Entity::find_by_id(allocation_id.into_inner())
            .one(&txn)
            .await?
            .ok_or(LedgerError::AllocationNotFound(allocation_id))?;
        let allocation = to_domain_allocation(&allocation_model);

        let mut payment = load_payment(&txn, allocation.payment_id).await?;
        let mut invoice = load_invoice(&txn, allocation.invoice_id).await?;
        let payment_version = payment.version;
        let invoice_version = invoice.version;

        SettlementService::reverse_allocation(&mut payment, &allocation, &mut invoice, policy, ctx)?;

        persist_payment(&txn, &payment, payment_version).await?;
        if invoice.version != invoice_version {
            persist_invoice(&txn, &invoice, invoice_version).await?;
        }
        allocation_model.delete(&txn).await?;

        txn.commit().await?;
        Ok(())
    }

    /// Submits a draft payment for clearing (Draft -> Pending).
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` unless the payment is a draft.
    pub async fn submit(&self, payment_id: PaymentId, ctx: &PostingContext) -> Result<Payment, DbError> {
        let txn = self.db.begin().await?;
        let mut payment = load_payment(&txn, payment_id).await?;
        let expected = payment.version;

        SettlementService::submit(&mut payment, ctx)?;
        persist_payment(&txn, &payment, expected).await?;

        txn.commit().await?;
        Ok(payment)
    }

    /// Clears a pending payment, applying any allocation not yet
    /// reflected in its invoice exactly once.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` for any status but Pending (including a
    /// second approval), or `ConcurrentModification`.
    pub async fn approve(&self, payment_id: PaymentId, ctx: &PostingContext) -> Result<Payment, DbError> {
        self.run_with_allocations(payment_id, ctx, SettlementService::approve)
            .await
    }

    /// Marks a payment bounced, un-applying its allocations so every
    /// touched invoice's outstanding balance is restored.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` when the instrument cannot bounce or
    /// the status disallows it, or `ConcurrentModification`.
    pub async fn bounce(&self, payment_id: PaymentId, ctx: &PostingContext) -> Result<Payment, DbError> {
        self.run_with_allocations(payment_id, ctx, SettlementService::bounce)
            .await
    }

    /// Cancels a draft payment that has nothing allocated.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` for non-draft payments or drafts with
    /// live allocations.
    pub async fn cancel(&self, payment_id: PaymentId, ctx: &PostingContext) -> Result<Payment, DbError> {
        let txn = self.db.begin().await?;
        let mut payment = load_payment(&txn, payment_id).await?;
        let expected = payment.version;

        SettlementService::cancel(&mut payment, ctx)?;
        persist_payment(&txn, &payment, expected).await?;

        txn.commit().await?;
        Ok(payment)
    }

    /// Loads a payment with its allocations and their invoices, runs a
    /// core transition over them, and persists everything that changed.
    async fn run_with_allocations(
        &self,
        payment_id: PaymentId,
        ctx: &PostingContext,
        op: fn(
            &mut Payment,
            &mut [Allocation],
            &mut [InvoicePosition],
            &PostingContext,
        ) -> Result<(), LedgerError>,
    ) -> Result<Payment, DbError> {
        let txn = self.db.begin().await?;

        let mut payment = load_payment(&txn, payment_id).await?;
        let payment_version = payment.version;

        let allocation_models = payment_allocations::Entity::find()
            .filter(payment_allocations::Column::PaymentId.eq(payment_id.into_inner()))
            .all(&txn)
            .await?;
        let mut allocations: Vec<Allocation> =
            allocation_models.iter().map(to_domain_allocation).collect();

        let invoice_ids: Vec<_> = allocations
            .iter()
            .map(|a| a.invoice_id.into_inner())
            .collect();
        let invoice_models = invoice_positions::Entity::find()
            .filter(invoice_positions::Column::Id.is_in(invoice_ids))
            .all(&txn)
            .await?;
        let mut invoices: Vec<InvoicePosition> =
            invoice_models.into_iter().map(to_domain_invoice).collect();
        let invoice_versions: Vec<i64> = invoices.iter().map(|i| i.version).collect();

        op(&mut payment, &mut allocations, &mut invoices, ctx)?;

        persist_payment(&txn, &payment, payment_version).await?;

        for (invoice, expected) in invoices.iter().zip(invoice_versions) {
            if invoice.version != expected {
                persist_invoice(&txn, invoice, expected).await?;
            }
        }

        for (allocation, model) in allocations.iter().zip(&allocation_models) {
            if allocation.applied != model.applied {
                let mut active: payment_allocations::ActiveModel = model.clone().into();
                active.applied = Set(allocation.applied);
                active.update(&txn).await?;
            }
        }

        txn.commit().await?;
        Ok(payment)
    }
}

async fn load_payment<C: ConnectionTrait>(conn: &C, id: PaymentId) -> Result<Payment, DbError> {
    let model = payments::Entity::find_by_id(id.into_inner())
        .one(conn)
        .await?
        .ok_or(LedgerError::PaymentNotFound(id))?;
    Ok(to_domain_payment(model))
}

async fn load_invoice<C: ConnectionTrait>(
    conn: &C,
    id: InvoiceId,
) -> Result<InvoicePosition, DbError> {
    let model = invoice_positions::Entity::find_by_id(id.into_inner())
        .one(conn)
        .await?
        .ok_or(LedgerError::InvoiceNotFound(id))?;
    Ok(to_domain_invoice(model))
}

async fn persist_payment(
    txn: &DatabaseTransaction,
    payment: &Payment,
    expected_version: i64,
) -> Result<(), DbError> {
    let result = payments::Entity::update_many()
        .col_expr(payments::Column::Allocated, Expr::value(payment.allocated))
        .col_expr(
            payments::Column::Status,
            Expr::value(crate::entities::sea_orm_active_enums::PaymentStatus::from(
                payment.status,
            )),
        )
        .col_expr(payments::Column::Version, Expr::value(payment.version))
        .col_expr(
            payments::Column::UpdatedBy,
            Expr::value(payment.audit.updated_by.into_inner()),
        )
        .col_expr(
            payments::Column::UpdatedAt,
            Expr::value(chrono::DateTime::<chrono::FixedOffset>::from(
                payment.audit.updated_at,
            )),
        )
        .filter(payments::Column::Id.eq(payment.id.into_inner()))
        .filter(payments::Column::Version.eq(expected_version))
        .exec(txn)
        .await?;

    if result.rows_affected == 0 {
        tracing::warn!(payment = %payment.id, "payment lost the version race");
        return Err(LedgerError::ConcurrentModification.into());
    }
    Ok(())
}

async fn persist_invoice(
    txn: &DatabaseTransaction,
    invoice: &InvoicePosition,
    expected_version: i64,
) -> Result<(), DbError> {
    let result = invoice_positions::Entity::update_many()
        .col_expr(invoice_positions::Column::Paid, Expr::value(invoice.paid))
        .col_expr(
            invoice_positions::Column::PaymentStatus,
            Expr::value(
                crate::entities::sea_orm_active_enums::InvoicePaymentStatus::from(
                    invoice.payment_status,
                ),
            ),
        )
        .col_expr(
            invoice_positions::Column::Version,
            Expr::value(invoice.version),
        )
        .filter(invoice_positions::Column::Id.eq(invoice.id.into_inner()))
        .filter(invoice_positions::Column::Version.eq(expected_version))
        .exec(txn)
        .await?;

    if result.rows_affected == 0 {
        tracing::warn!(invoice = %invoice.id, "invoice lost the version race");
        return Err(LedgerError::ConcurrentModification.into());
    }
    Ok(())
}

fn to_domain_payment(model: payments::Model) -> Payment {
    Payment {
        id: PaymentId::from_uuid(model.id),
        number: model.number,
        date: model.date,
        party_id: PartyId::from_uuid(model.party_id),
        mode: model.mode.into(),
        total: model.total,
        allocated: model.allocated,
        status: model.status.into(),
        version: model.version,
        audit: AuditStamp {
            created_by: ActorId::from_uuid(model.created_by),
            created_at: model.created_at.with_timezone(&Utc),
            updated_by: ActorId::from_uuid(model.updated_by),
            updated_at: model.updated_at.with_timezone(&Utc),
        },
    }
}

fn to_domain_invoice(model: invoice_positions::Model) -> InvoicePosition {
    InvoicePosition {
        id: InvoiceId::from_uuid(model.id),
        party_id: PartyId::from_uuid(model.party_id),
        number: model.number,
        total: model.total,
        paid: model.paid,
        payment_status: model.payment_status.into(),
        version: model.version,
    }
}

fn to_domain_allocation(model: &payment_allocations::Model) -> Allocation {
    Allocation {
        id: AllocationId::from_uuid(model.id),
        payment_id: PaymentId::from_uuid(model.payment_id),
        invoice_id: InvoiceId::from_uuid(model.invoice_id),
        amount: model.amount,
        allocation_date: model.allocation_date,
        applied: model.applied,
    }
}
