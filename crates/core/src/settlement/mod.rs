//! Payments and bill-to-bill settlement.
//!
//! A payment is allocated against specific outstanding invoices or bills.
//! Allocation, reversal, and the payment status machine all live here;
//! persistence executes each operation as one transaction.

pub mod service;
pub mod types;

pub use service::{ReversalPolicy, SettlementService};
pub use types::{
    Allocation, InvoicePaymentStatus, InvoicePosition, Payment, PaymentMode, PaymentStatus,
};
