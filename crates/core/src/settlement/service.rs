//! Settlement operations: allocation, reversal, and the payment machine.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use saldo_shared::types::{AllocationId, InvoiceId};

use super::types::{
    Allocation, InvoicePaymentStatus, InvoicePosition, Payment, PaymentStatus,
};
use crate::context::PostingContext;
use crate::error::LedgerError;

/// Governs which allocations may be reversed.
#[derive(Debug, Clone, Copy)]
pub struct ReversalPolicy {
    /// When set, allocations of a cleared payment cannot be reversed; the
    /// correction path is a bounce or a fresh contra payment.
    pub lock_cleared: bool,
}

impl Default for ReversalPolicy {
    fn default() -> Self {
        Self { lock_cleared: true }
    }
}

/// Bill-to-bill settlement engine.
pub struct SettlementService;

impl SettlementService {
    /// Allocates a slice of a payment against one outstanding invoice.
    ///
    /// All checks run before any mutation; on success the payment's
    /// allocated counter, the invoice's paid counter, and the returned
    /// allocation row change together as one unit.
    ///
    /// # Errors
    ///
    /// Rejects non-positive amounts, amounts above the invoice's
    /// outstanding balance or the payment's unallocated remainder, party
    /// mismatches, and payments that are no longer open for allocation.
    pub fn allocate(
        payment: &mut Payment,
        invoice: &mut InvoicePosition,
        amount: Decimal,
        allocation_date: NaiveDate,
        ctx: &PostingContext,
    ) -> Result<Allocation, LedgerError> {
        match payment.status {
            PaymentStatus::Draft | PaymentStatus::Pending => {}
            _ => {
                return Err(LedgerError::InvalidOperation(format!(
                    "payment {} is {:?} and cannot take allocations",
                    payment.number, payment.status
                )))
            }
        }
        if invoice.party_id != payment.party_id {
            return Err(LedgerError::InvalidOperation(format!(
                "invoice {} belongs to a different party than payment {}",
                invoice.number, payment.number
            )));
        }
        if amount <= Decimal::ZERO {
            return Err(LedgerError::NonPositiveAllocation { amount });
        }
        if amount > invoice.outstanding() {
            return Err(LedgerError::AllocationExceedsOutstanding {
                amount,
                outstanding: invoice.outstanding(),
            });
        }
        if amount > payment.unallocated() {
            return Err(LedgerError::AllocationExceedsPayment {
                amount,
                unallocated: payment.unallocated(),
            });
        }

        payment.allocated += amount;
        payment.version += 1;
        payment.audit = payment.audit.touched(ctx.actor, ctx.at);

        invoice.paid += amount;
        invoice.payment_status = InvoicePaymentStatus::from_amounts(invoice.paid, invoice.total);
        invoice.version += 1;

        Ok(Allocation {
            id: AllocationId::new(),
            payment_id: payment.id,
            invoice_id: invoice.id,
            amount,
            allocation_date,
            applied: true,
        })
    }

    /// Reverses one allocation, symmetrically decrementing the payment's
    /// allocated counter and (when applied) the invoice's paid counter.
    /// The caller deletes the allocation row afterwards.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` when the payment is cleared and the
    /// policy locks cleared payments, or when the allocation does not
    /// belong to the given payment/invoice pair.
    pub fn reverse_allocation(
        payment: &mut Payment,
        allocation: &Allocation,
        invoice: &mut InvoicePosition,
        policy: ReversalPolicy,
        ctx: &PostingContext,
    ) -> Result<(), LedgerError> {
        if allocation.payment_id != payment.id {
            return Err(LedgerError::AllocationNotFound(allocation.id));
        }
        if allocation.invoice_id != invoice.id {
            return Err(LedgerError::InvoiceNotFound(allocation.invoice_id));
        }
        if payment.status == PaymentStatus::Cleared && policy.lock_cleared {
            return Err(LedgerError::InvalidOperation(format!(
                "payment {} has cleared; reversal is locked",
                payment.number
            )));
        }

        payment.allocated -= allocation.amount;
        payment.version += 1;
        payment.audit = payment.audit.touched(ctx.actor, ctx.at);

        if allocation.applied {
            invoice.paid -= allocation.amount;
            invoice.payment_status =
                InvoicePaymentStatus::from_amounts(invoice.paid, invoice.total);
            invoice.version += 1;
        }

        Ok(())
    }

    /// Submits a draft payment for clearing (Draft -> Pending).
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` unless the payment is a draft.
    pub fn submit(payment: &mut Payment, ctx: &PostingContext) -> Result<(), LedgerError> {
        if payment.status != PaymentStatus::Draft {
            return Err(LedgerError::InvalidOperation(format!(
                "payment {} is {:?} and cannot be submitted",
                payment.number, payment.status
            )));
        }
        payment.status = PaymentStatus::Pending;
        payment.version += 1;
        payment.audit = payment.audit.touched(ctx.actor, ctx.at);
        Ok(())
    }

    /// Clears a pending payment (Pending -> Cleared), applying any
    /// allocation not yet reflected in its invoice.
    ///
    /// Allocations made through [`Self::allocate`] are applied on creation,
    /// so clearing normally touches no invoice; the `applied` flag makes
    /// the operation apply each allocation exactly once regardless of how
    /// the payment got here.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` for any status but Pending (a second
    /// approval of a cleared payment is rejected, not silently absorbed),
    /// and `InvoiceNotFound` when an allocation references a position not
    /// in `invoices`.
    pub fn approve(
        payment: &mut Payment,
        allocations: &mut [Allocation],
        invoices: &mut [InvoicePosition],
        ctx: &PostingContext,
    ) -> Result<(), LedgerError> {
        if payment.status != PaymentStatus::Pending {
            return Err(LedgerError::InvalidOperation(format!(
                "payment {} is {:?} and cannot be approved",
                payment.number, payment.status
            )));
        }

        for allocation in allocations
            .iter_mut()
            .filter(|a| a.payment_id == payment.id && !a.applied)
        {
            let invoice = find_invoice(invoices, allocation.invoice_id)?;
            invoice.paid += allocation.amount;
            invoice.payment_status =
                InvoicePaymentStatus::from_amounts(invoice.paid, invoice.total);
            invoice.version += 1;
            allocation.applied = true;
        }

        payment.status = PaymentStatus::Cleared;
        payment.version += 1;
        payment.audit = payment.audit.touched(ctx.actor, ctx.at);
        Ok(())
    }

    /// Marks a payment bounced and un-applies its allocations, restoring
    /// every touched invoice's outstanding balance.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` when the instrument cannot bounce or the
    /// payment is not Pending/Cleared, and `InvoiceNotFound` when an
    /// allocation references a position not in `invoices`.
    pub fn bounce(
        payment: &mut Payment,
        allocations: &mut [Allocation],
        invoices: &mut [InvoicePosition],
        ctx: &PostingContext,
    ) -> Result<(), LedgerError> {
        if !payment.mode.can_bounce() {
            return Err(LedgerError::InvalidOperation(format!(
                "payment {} mode {:?} cannot bounce",
                payment.number, payment.mode
            )));
        }
        match payment.status {
            PaymentStatus::Pending | PaymentStatus::Cleared => {}
            _ => {
                return Err(LedgerError::InvalidOperation(format!(
                    "payment {} is {:?} and cannot bounce",
                    payment.number, payment.status
                )))
            }
        }

        for allocation in allocations
            .iter_mut()
            .filter(|a| a.payment_id == payment.id && a.applied)
        {
            let invoice = find_invoice(invoices, allocation.invoice_id)?;
            invoice.paid -= allocation.amount;
            invoice.payment_status =
                InvoicePaymentStatus::from_amounts(invoice.paid, invoice.total);
            invoice.version += 1;
            allocation.applied = false;
        }

        payment.status = PaymentStatus::Bounced;
        payment.version += 1;
        payment.audit = payment.audit.touched(ctx.actor, ctx.at);
        Ok(())
    }

    /// Cancels a draft payment that has nothing allocated.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` for non-draft payments or drafts with
    /// live allocations (reverse those first).
    pub fn cancel(payment: &mut Payment, ctx: &PostingContext) -> Result<(), LedgerError> {
        if payment.status != PaymentStatus::Draft {
            return Err(LedgerError::InvalidOperation(format!(
                "payment {} is {:?} and cannot be cancelled",
                payment.number, payment.status
            )));
        }
        if payment.allocated != Decimal::ZERO {
            return Err(LedgerError::InvalidOperation(format!(
                "payment {} still has {} allocated; reverse allocations first",
                payment.number, payment.allocated
            )));
        }
        payment.status = PaymentStatus::Cancelled;
        payment.version += 1;
        payment.audit = payment.audit.touched(ctx.actor, ctx.at);
        Ok(())
    }
}

fn find_invoice(
    invoices: &mut [InvoicePosition],
    id: InvoiceId,
) -> Result<&mut InvoicePosition, LedgerError> {
    invoices
        .iter_mut()
        .find(|invoice| invoice.id == id)
        .ok_or(LedgerError::InvoiceNotFound(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use saldo_shared::types::{ActorId, PartyId, PaymentId};

    use crate::settlement::types::PaymentMode;

    fn ctx() -> PostingContext {
        PostingContext::new(ActorId::new(), Utc::now())
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
    }

    fn payment(party_id: PartyId, mode: PaymentMode, total: Decimal, c: &PostingContext) -> Payment {
        Payment::draft("PAY-1".to_string(), date(), party_id, mode, total, c)
    }

    fn invoice(party_id: PartyId, total: Decimal) -> InvoicePosition {
        InvoicePosition::open(InvoiceId::new(), party_id, "INV-1".to_string(), total)
    }

    #[test]
    fn test_allocation_lifecycle_six_hundred_then_four_hundred() {
        let c = ctx();
        let party = PartyId::new();
        let mut pay = payment(party, PaymentMode::BankTransfer, dec!(1000), &c);
        let mut inv = invoice(party, dec!(1000));

        let first = SettlementService::allocate(&mut pay, &mut inv, dec!(600), date(), &c).unwrap();
        assert_eq!(inv.paid, dec!(600));
        assert_eq!(inv.payment_status, InvoicePaymentStatus::Partial);
        assert_eq!(pay.allocated, dec!(600));
        assert!(first.applied);

        let second = SettlementService::allocate(&mut pay, &mut inv, dec!(400), date(), &c).unwrap();
        assert_eq!(inv.paid, dec!(1000));
        assert_eq!(inv.payment_status, InvoicePaymentStatus::Paid);
        assert_eq!(pay.unallocated(), dec!(0));

        // Reversing the 400 slice restores Partial with 400 outstanding.
        SettlementService::reverse_allocation(
            &mut pay,
            &second,
            &mut inv,
            ReversalPolicy::default(),
            &c,
        )
        .unwrap();
        assert_eq!(inv.paid, dec!(600));
        assert_eq!(inv.outstanding(), dec!(400));
        assert_eq!(inv.payment_status, InvoicePaymentStatus::Partial);
        assert_eq!(pay.allocated, dec!(600));
    }

    #[test]
    fn test_allocation_bounds() {
        let c = ctx();
        let party = PartyId::new();
        let mut pay = payment(party, PaymentMode::Cash, dec!(500), &c);
        let mut inv = invoice(party, dec!(300));

        assert!(matches!(
            SettlementService::allocate(&mut pay, &mut inv, dec!(0), date(), &c),
            Err(LedgerError::NonPositiveAllocation { .. })
        ));
        assert!(matches!(
            SettlementService::allocate(&mut pay, &mut inv, dec!(-10), date(), &c),
            Err(LedgerError::NonPositiveAllocation { .. })
        ));
        assert!(matches!(
            SettlementService::allocate(&mut pay, &mut inv, dec!(301), date(), &c),
            Err(LedgerError::AllocationExceedsOutstanding { .. })
        ));

        SettlementService::allocate(&mut pay, &mut inv, dec!(300), date(), &c).unwrap();

        let mut other = invoice(party, dec!(9000));
        assert!(matches!(
            SettlementService::allocate(&mut pay, &mut other, dec!(201), date(), &c),
            Err(LedgerError::AllocationExceedsPayment { .. })
        ));

        // Failed attempts left no trace.
        assert_eq!(other.paid, dec!(0));
        assert_eq!(pay.allocated, dec!(300));
    }

    #[test]
    fn test_party_mismatch_rejected() {
        let c = ctx();
        let mut pay = payment(PartyId::new(), PaymentMode::Cash, dec!(500), &c);
        let mut inv = invoice(PartyId::new(), dec!(500));

        assert!(matches!(
            SettlementService::allocate(&mut pay, &mut inv, dec!(100), date(), &c),
            Err(LedgerError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_approve_is_applied_exactly_once() {
        let c = ctx();
        let party = PartyId::new();
        let mut pay = payment(party, PaymentMode::Cheque, dec!(1000), &c);
        let mut inv = invoice(party, dec!(1000));

        let alloc = SettlementService::allocate(&mut pay, &mut inv, dec!(1000), date(), &c).unwrap();
        let mut allocations = vec![alloc];
        let mut invoices = vec![inv];

        SettlementService::submit(&mut pay, &c).unwrap();
        SettlementService::approve(&mut pay, &mut allocations, &mut invoices, &c).unwrap();

        assert_eq!(pay.status, PaymentStatus::Cleared);
        // Already applied at allocation time; approve must not double it.
        assert_eq!(invoices[0].paid, dec!(1000));
        assert_eq!(invoices[0].payment_status, InvoicePaymentStatus::Paid);

        // Second approval is rejected outright.
        assert!(matches!(
            SettlementService::approve(&mut pay, &mut allocations, &mut invoices, &c),
            Err(LedgerError::InvalidOperation(_))
        ));
        assert_eq!(invoices[0].paid, dec!(1000));
    }

    #[test]
    fn test_approve_applies_unapplied_allocations() {
        let c = ctx();
        let party = PartyId::new();
        let mut pay = payment(party, PaymentMode::Cheque, dec!(500), &c);
        let inv = invoice(party, dec!(500));

        let mut allocations = vec![Allocation {
            id: AllocationId::new(),
            payment_id: pay.id,
            invoice_id: inv.id,
            amount: dec!(500),
            allocation_date: date(),
            applied: false,
        }];
        let mut invoices = vec![inv];
        pay.allocated = dec!(500);

        SettlementService::submit(&mut pay, &c).unwrap();
        SettlementService::approve(&mut pay, &mut allocations, &mut invoices, &c).unwrap();

        assert!(allocations[0].applied);
        assert_eq!(invoices[0].paid, dec!(500));
        assert_eq!(invoices[0].payment_status, InvoicePaymentStatus::Paid);
    }

    #[test]
    fn test_bounce_unapplies_allocations() {
        let c = ctx();
        let party = PartyId::new();
        let mut pay = payment(party, PaymentMode::Cheque, dec!(1000), &c);
        let mut inv = invoice(party, dec!(1000));

        let alloc = SettlementService::allocate(&mut pay, &mut inv, dec!(600), date(), &c).unwrap();
        let mut allocations = vec![alloc];
        let mut invoices = vec![inv];

        SettlementService::submit(&mut pay, &c).unwrap();
        SettlementService::approve(&mut pay, &mut allocations, &mut invoices, &c).unwrap();
        SettlementService::bounce(&mut pay, &mut allocations, &mut invoices, &c).unwrap();

        assert_eq!(pay.status, PaymentStatus::Bounced);
        assert!(!allocations[0].applied);
        assert_eq!(invoices[0].paid, dec!(0));
        assert_eq!(invoices[0].payment_status, InvoicePaymentStatus::Unpaid);
        assert_eq!(invoices[0].outstanding(), dec!(1000));
    }

    #[test]
    fn test_cash_cannot_bounce() {
        let c = ctx();
        let mut pay = payment(PartyId::new(), PaymentMode::Cash, dec!(100), &c);
        SettlementService::submit(&mut pay, &c).unwrap();

        assert!(matches!(
            SettlementService::bounce(&mut pay, &mut [], &mut [], &c),
            Err(LedgerError::InvalidOperation(_))
        ));
        assert_eq!(pay.status, PaymentStatus::Pending);
    }

    #[test]
    fn test_draft_cannot_bounce() {
        let c = ctx();
        let mut pay = payment(PartyId::new(), PaymentMode::Cheque, dec!(100), &c);
        assert!(SettlementService::bounce(&mut pay, &mut [], &mut [], &c).is_err());
    }

    #[test]
    fn test_reversal_locked_after_clearing() {
        let c = ctx();
        let party = PartyId::new();
        let mut pay = payment(party, PaymentMode::BankTransfer, dec!(500), &c);
        let mut inv = invoice(party, dec!(500));

        let alloc = SettlementService::allocate(&mut pay, &mut inv, dec!(500), date(), &c).unwrap();
        SettlementService::submit(&mut pay, &c).unwrap();
        let mut allocations = vec![alloc.clone()];
        SettlementService::approve(&mut pay, &mut allocations, std::slice::from_mut(&mut inv), &c)
            .unwrap();

        assert!(matches!(
            SettlementService::reverse_allocation(
                &mut pay,
                &alloc,
                &mut inv,
                ReversalPolicy::default(),
                &c,
            ),
            Err(LedgerError::InvalidOperation(_))
        ));

        // An explicit unlocked policy allows it.
        SettlementService::reverse_allocation(
            &mut pay,
            &alloc,
            &mut inv,
            ReversalPolicy { lock_cleared: false },
            &c,
        )
        .unwrap();
        assert_eq!(inv.paid, dec!(0));
        assert_eq!(pay.allocated, dec!(0));
    }

    #[test]
    fn test_cancel_only_clean_drafts() {
        let c = ctx();
        let party = PartyId::new();
        let mut pay = payment(party, PaymentMode::Cash, dec!(500), &c);
        let mut inv = invoice(party, dec!(500));

        let alloc = SettlementService::allocate(&mut pay, &mut inv, dec!(200), date(), &c).unwrap();
        assert!(matches!(
            SettlementService::cancel(&mut pay, &c),
            Err(LedgerError::InvalidOperation(_))
        ));

        SettlementService::reverse_allocation(
            &mut pay,
            &alloc,
            &mut inv,
            ReversalPolicy::default(),
            &c,
        )
        .unwrap();
        SettlementService::cancel(&mut pay, &c).unwrap();
        assert_eq!(pay.status, PaymentStatus::Cancelled);

        // Cancelled payments take nothing further.
        assert!(SettlementService::submit(&mut pay, &c).is_err());
        assert!(
            SettlementService::allocate(&mut pay, &mut inv, dec!(1), date(), &c).is_err()
        );
    }

    fn amount_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..100_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// However allocation attempts land, the payment never over-commits
        /// and no invoice is ever paid beyond its total.
        #[test]
        fn prop_allocation_bounds_hold(
            total in amount_strategy(),
            invoice_totals in prop::collection::vec(amount_strategy(), 1..6),
            attempts in prop::collection::vec((0usize..6, amount_strategy()), 1..20),
        ) {
            let c = ctx();
            let party = PartyId::new();
            let mut pay = payment(party, PaymentMode::Cash, total, &c);
            let mut invoices: Vec<InvoicePosition> = invoice_totals
                .iter()
                .map(|t| invoice(party, *t))
                .collect();

            for (idx, amount) in attempts {
                let idx = idx % invoices.len();
                let _ = SettlementService::allocate(
                    &mut pay,
                    &mut invoices[idx],
                    amount,
                    date(),
                    &c,
                );

                prop_assert!(pay.allocated <= pay.total);
                prop_assert!(pay.allocated >= Decimal::ZERO);
                for inv in &invoices {
                    prop_assert!(inv.paid <= inv.total);
                    prop_assert!(inv.paid >= Decimal::ZERO);
                }
            }

            // Conservation: what the payment committed equals what the
            // invoices absorbed.
            let absorbed: Decimal = invoices.iter().map(|i| i.paid).sum();
            prop_assert_eq!(pay.allocated, absorbed);
        }
    }
}
