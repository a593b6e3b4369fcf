//! Settlement types: payments, allocations, and invoice positions.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use saldo_shared::types::{AllocationId, AuditStamp, InvoiceId, PartyId, PaymentId};

use crate::context::PostingContext;

/// How a payment was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    /// Cash in hand.
    Cash,
    /// Cheque; can bounce after clearing starts.
    Cheque,
    /// Bank transfer; can bounce after clearing starts.
    BankTransfer,
    /// Card payment.
    Card,
    /// Online gateway payment.
    Online,
}

impl PaymentMode {
    /// Only instruments that clear through a bank can bounce.
    #[must_use]
    pub const fn can_bounce(self) -> bool {
        matches!(self, Self::Cheque | Self::BankTransfer)
    }
}

/// Payment lifecycle.
///
/// Draft -> Pending -> Cleared is the forward path. Cheque and bank
/// payments may go Bounced from Pending or Cleared; Cancelled is reachable
/// only from Draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Being captured; allocations may be added or reversed freely.
    Draft,
    /// Submitted, awaiting clearing.
    Pending,
    /// Funds confirmed; allocations applied to invoices.
    Cleared,
    /// Instrument failed after submission; allocations un-applied.
    Bounced,
    /// Abandoned before submission.
    Cancelled,
}

/// Settlement status of an invoice or bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoicePaymentStatus {
    /// Nothing paid.
    Unpaid,
    /// Partly paid.
    Partial,
    /// Fully paid.
    Paid,
}

impl InvoicePaymentStatus {
    /// Derives the status from paid/total amounts.
    #[must_use]
    pub fn from_amounts(paid: Decimal, total: Decimal) -> Self {
        if paid <= Decimal::ZERO {
            Self::Unpaid
        } else if paid < total {
            Self::Partial
        } else {
            Self::Paid
        }
    }
}

/// A payment received from (or made to) a party.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    /// Unique identifier.
    pub id: PaymentId,
    /// Unique payment number (e.g., "PAY-2026-00017").
    pub number: String,
    /// Business date.
    pub date: NaiveDate,
    /// The paying/paid party.
    pub party_id: PartyId,
    /// Payment instrument.
    pub mode: PaymentMode,
    /// Total payment amount.
    pub total: Decimal,
    /// Sum of allocation amounts; never exceeds `total`.
    pub allocated: Decimal,
    /// Current lifecycle status.
    pub status: PaymentStatus,
    /// Optimistic-lock version.
    pub version: i64,
    /// Audit metadata.
    pub audit: AuditStamp,
}

impl Payment {
    /// Creates a draft payment with nothing allocated.
    #[must_use]
    pub fn draft(
        number: String,
        date: NaiveDate,
        party_id: PartyId,
        mode: PaymentMode,
        total: Decimal,
        ctx: &PostingContext,
    ) -> Self {
        Self {
            id: PaymentId::new(),
            number,
            date,
            party_id,
            mode,
            total,
            allocated: Decimal::ZERO,
            status: PaymentStatus::Draft,
            version: 0,
            audit: AuditStamp::new(ctx.actor, ctx.at),
        }
    }

    /// Amount not yet allocated to any invoice.
    #[must_use]
    pub fn unallocated(&self) -> Decimal {
        self.total - self.allocated
    }
}

/// One payment-to-invoice allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    /// Unique identifier.
    pub id: AllocationId,
    /// The payment this slice comes from.
    pub payment_id: PaymentId,
    /// The invoice/bill it settles.
    pub invoice_id: InvoiceId,
    /// Allocated amount, strictly positive.
    pub amount: Decimal,
    /// When the allocation was made.
    pub allocation_date: NaiveDate,
    /// Whether the amount is currently reflected in the invoice's `paid`.
    /// Cleared exactly once; a bounce resets it.
    pub applied: bool,
}

/// The engine's settlement counters for an externally owned invoice/bill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoicePosition {
    /// Host document identifier.
    pub id: InvoiceId,
    /// The party the document belongs to.
    pub party_id: PartyId,
    /// Human-readable document number.
    pub number: String,
    /// Gross document total.
    pub total: Decimal,
    /// Amount settled so far; never exceeds `total`.
    pub paid: Decimal,
    /// Derived settlement status.
    pub payment_status: InvoicePaymentStatus,
    /// Optimistic-lock version.
    pub version: i64,
}

impl InvoicePosition {
    /// Opens a position for an unpaid document.
    #[must_use]
    pub fn open(id: InvoiceId, party_id: PartyId, number: String, total: Decimal) -> Self {
        Self {
            id,
            party_id,
            number,
            total,
            paid: Decimal::ZERO,
            payment_status: InvoicePaymentStatus::Unpaid,
            version: 0,
        }
    }

    /// Amount still owed on the document.
    #[must_use]
    pub fn outstanding(&self) -> Decimal {
        self.total - self.paid
    }
}
