//! End-to-end settlement workflows over the core types.
//!
//! These exercise the sequences the settlement repository drives against
//! the database: allocate, submit, approve, bounce, and reverse, together
//! with the party subledger entries that accompany them.

use chrono::{NaiveDate, Utc};
use rstest::rstest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use saldo_core::party::{Party, PartyLedger, PartySide, PartyTransaction, PartyTransactionType};
use saldo_core::settlement::{
    InvoicePaymentStatus, InvoicePosition, PaymentMode, PaymentStatus, ReversalPolicy,
    SettlementService,
};
use saldo_core::{LedgerError, PostingContext};
use saldo_shared::types::{ActorId, InvoiceId, PartyId};

fn ctx() -> PostingContext {
    PostingContext::new(ActorId::new(), Utc::now())
}

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
}

/// Invoice of 1000; a 1000 payment allocated 600 then 400; reversal of
/// the 400 brings the invoice back to Partial with 400 outstanding.
#[test]
fn test_full_allocation_lifecycle() {
    let c = ctx();
    let party = PartyId::new();
    let mut invoice = InvoicePosition::open(
        InvoiceId::new(),
        party,
        "INV-1001".to_string(),
        dec!(1000.00),
    );
    let mut payment = saldo_core::settlement::Payment::draft(
        "PAY-0001".to_string(),
        date(10),
        party,
        PaymentMode::BankTransfer,
        dec!(1000.00),
        &c,
    );

    let first =
        SettlementService::allocate(&mut payment, &mut invoice, dec!(600.00), date(10), &c)
            .unwrap();
    assert_eq!(invoice.payment_status, InvoicePaymentStatus::Partial);
    assert_eq!(invoice.outstanding(), dec!(400.00));

    let second =
        SettlementService::allocate(&mut payment, &mut invoice, dec!(400.00), date(11), &c)
            .unwrap();
    assert_eq!(invoice.payment_status, InvoicePaymentStatus::Paid);
    assert_eq!(payment.unallocated(), Decimal::ZERO);

    // Reverse the second slice while the payment is still open.
    SettlementService::reverse_allocation(
        &mut payment,
        &second,
        &mut invoice,
        ReversalPolicy::default(),
        &c,
    )
    .unwrap();
    assert_eq!(invoice.payment_status, InvoicePaymentStatus::Partial);
    assert_eq!(invoice.outstanding(), dec!(400.00));
    assert_eq!(payment.allocated, dec!(600.00));

    // The first slice survives untouched.
    assert!(first.applied);
    assert_eq!(invoice.paid, dec!(600.00));
}

/// Submit -> approve clears the payment; a bounce afterwards restores
/// every invoice and leaves an audit trail via the un-applied
/// allocations. Both bounce-capable instruments behave the same.
#[rstest]
#[case(PaymentMode::Cheque)]
#[case(PaymentMode::BankTransfer)]
fn test_clear_then_bounce_round_trip(#[case] mode: PaymentMode) {
    let c = ctx();
    let party = PartyId::new();
    let mut invoice = InvoicePosition::open(
        InvoiceId::new(),
        party,
        "INV-7".to_string(),
        dec!(500.00),
    );
    let mut payment = saldo_core::settlement::Payment::draft(
        "PAY-7".to_string(),
        date(5),
        party,
        mode,
        dec!(500.00),
        &c,
    );

    let alloc =
        SettlementService::allocate(&mut payment, &mut invoice, dec!(500.00), date(5), &c).unwrap();
    let mut allocations = vec![alloc];
    let mut invoices = vec![invoice];

    SettlementService::submit(&mut payment, &c).unwrap();
    SettlementService::approve(&mut payment, &mut allocations, &mut invoices, &c).unwrap();
    assert_eq!(payment.status, PaymentStatus::Cleared);
    assert_eq!(invoices[0].payment_status, InvoicePaymentStatus::Paid);

    SettlementService::bounce(&mut payment, &mut allocations, &mut invoices, &c).unwrap();
    assert_eq!(payment.status, PaymentStatus::Bounced);
    assert_eq!(invoices[0].payment_status, InvoicePaymentStatus::Unpaid);
    assert_eq!(invoices[0].outstanding(), dec!(500.00));
    assert!(!allocations[0].applied);

    // Bounced is terminal: no further allocation or submission.
    let mut other = InvoicePosition::open(InvoiceId::new(), party, "INV-8".to_string(), dec!(100));
    assert!(matches!(
        SettlementService::allocate(&mut payment, &mut other, dec!(100), date(6), &c),
        Err(LedgerError::InvalidOperation(_))
    ));
    assert!(SettlementService::submit(&mut payment, &c).is_err());
}

/// The customer subledger mirrors the settlement: sale raises the
/// receivable, the cleared payment brings it back down.
#[test]
fn test_settlement_with_party_ledger() {
    let c = ctx();
    let mut party = Party::create("Acme Traders".to_string(), PartySide::Customer, &c);
    let mut ledger = PartyLedger::new();
    let invoice_total = dec!(1000.00);

    ledger
        .record_transaction(
            &mut party,
            PartyTransaction {
                date: date(1),
                transaction_type: PartyTransactionType::Sale,
                debit: invoice_total,
                credit: Decimal::ZERO,
                reference: "INV-1001".to_string(),
                source_id: None,
            },
            &c,
        )
        .unwrap();
    assert_eq!(party.current_balance, invoice_total);

    let mut invoice =
        InvoicePosition::open(InvoiceId::new(), party.id, "INV-1001".to_string(), invoice_total);
    let mut payment = saldo_core::settlement::Payment::draft(
        "PAY-0001".to_string(),
        date(15),
        party.id,
        PaymentMode::BankTransfer,
        dec!(600.00),
        &c,
    );
    SettlementService::allocate(&mut payment, &mut invoice, dec!(600.00), date(15), &c).unwrap();

    ledger
        .record_transaction(
            &mut party,
            PartyTransaction {
                date: date(15),
                transaction_type: PartyTransactionType::Payment,
                debit: Decimal::ZERO,
                credit: dec!(600.00),
                reference: payment.number.clone(),
                source_id: Some(payment.id.into_inner()),
            },
            &c,
        )
        .unwrap();

    // Receivable and invoice outstanding agree.
    assert_eq!(party.current_balance, dec!(400.00));
    assert_eq!(invoice.outstanding(), dec!(400.00));
    assert_eq!(ledger.balance_as_of(party.id, date(31)), dec!(400.00));
}

/// Allocation never proceeds partially: the first failed check leaves
/// payment and invoice untouched.
#[test]
fn test_failed_allocation_is_atomic() {
    let c = ctx();
    let party = PartyId::new();
    let mut invoice =
        InvoicePosition::open(InvoiceId::new(), party, "INV-9".to_string(), dec!(300.00));
    let mut payment = saldo_core::settlement::Payment::draft(
        "PAY-9".to_string(),
        date(2),
        party,
        PaymentMode::Cash,
        dec!(200.00),
        &c,
    );

    // Exceeds the payment's remainder even though the invoice could
    // absorb it.
    let result = SettlementService::allocate(&mut payment, &mut invoice, dec!(250.00), date(2), &c);
    assert!(matches!(
        result,
        Err(LedgerError::AllocationExceedsPayment { .. })
    ));
    assert_eq!(payment.allocated, Decimal::ZERO);
    assert_eq!(payment.version, 0);
    assert_eq!(invoice.paid, Decimal::ZERO);
    assert_eq!(invoice.version, 0);
    assert_eq!(invoice.payment_status, InvoicePaymentStatus::Unpaid);
}
