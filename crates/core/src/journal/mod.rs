//! Journal entry validation and posting.
//!
//! The journal engine is the central state machine of the ledger: it
//! validates balanced entries against the chart of accounts and the
//! financial period, and turns a posted entry into account movements plus
//! immutable general-ledger rows.

pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use service::{AccountDelta, JournalService, PostingAccount, PostingPlan};
pub use types::{
    CreateJournalEntryInput, JournalEntry, JournalEntryType, JournalLine, JournalLineInput,
    JournalStatus, SourceDocument,
};
