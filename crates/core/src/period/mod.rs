//! Financial periods.
//!
//! Periods are the gatekeeper all postings must consult: a posting is
//! accepted only while the period is open and its date range covers the
//! posting date. Closing is a hard gate, reversible by reopening.

pub mod types;
pub mod validation;

pub use types::{FinancialPeriod, PeriodStatus};
pub use validation::{date_ranges_overlap, validate_date_range};
