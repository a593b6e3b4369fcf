//! Journal entry aggregate types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use saldo_shared::types::{AccountId, ActorId, AuditStamp, JournalEntryId, JournalLineId, PeriodId};
use uuid::Uuid;

use crate::context::PostingContext;
use crate::error::LedgerError;

/// Journal entry classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalEntryType {
    /// Hand-keyed entry.
    Manual,
    /// Entry generated by a source module (sales, purchasing, cash).
    Automated,
    /// Opening balance entry.
    OpeningBalance,
    /// Period/year-end closing entry.
    Closing,
    /// Correcting adjustment (including reversals).
    Adjustment,
}

/// Journal entry status.
///
/// Draft -> Posted and Draft -> Cancelled are the only transitions; nothing
/// leaves Posted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalStatus {
    /// Entry is being drafted and can be modified.
    Draft,
    /// Entry has been posted to the ledger (immutable).
    Posted,
    /// Entry was abandoned before posting (immutable).
    Cancelled,
}

impl JournalStatus {
    /// Returns true if the entry can be modified.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft)
    }

    /// Returns true if the entry is immutable.
    #[must_use]
    pub fn is_immutable(&self) -> bool {
        matches!(self, Self::Posted | Self::Cancelled)
    }
}

/// Reference to the source document that produced an automated entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Host document type (e.g., "sales_invoice", "journal_entry").
    pub doc_type: String,
    /// Host document identifier.
    pub doc_id: Uuid,
    /// Human-readable reference (e.g., the invoice number).
    pub reference: String,
}

/// Input for one journal line.
#[derive(Debug, Clone)]
pub struct JournalLineInput {
    /// Account to post to.
    pub account_id: AccountId,
    /// Debit amount (zero if credit line).
    pub debit: Decimal,
    /// Credit amount (zero if debit line).
    pub credit: Decimal,
    /// Optional cost-center/dimension tag.
    pub cost_center: Option<String>,
}

/// Input for creating a draft journal entry.
#[derive(Debug, Clone)]
pub struct CreateJournalEntryInput {
    /// Unique entry number (e.g., "JV-2026-00042").
    pub number: String,
    /// Business date of the entry.
    pub entry_date: NaiveDate,
    /// Period the entry posts into.
    pub period_id: PeriodId,
    /// Entry classification.
    pub entry_type: JournalEntryType,
    /// Source document link, if automated.
    pub source: Option<SourceDocument>,
    /// Description of the entry.
    pub description: String,
    /// The lines, in order.
    pub lines: Vec<JournalLineInput>,
}

/// A single line of a journal entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalLine {
    /// Unique identifier.
    pub id: JournalLineId,
    /// Owning entry (id reference, not a back-pointer).
    pub entry_id: JournalEntryId,
    /// Position within the entry, starting at 1.
    pub line_no: u32,
    /// Account this line posts to.
    pub account_id: AccountId,
    /// Debit amount (zero if credit line).
    pub debit: Decimal,
    /// Credit amount (zero if debit line).
    pub credit: Decimal,
    /// Optional cost-center/dimension tag.
    pub cost_center: Option<String>,
}

impl JournalLine {
    /// Validates that exactly one of debit/credit is strictly positive.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLine` when the line carries both sides, neither
    /// side, or a negative amount.
    pub fn validate(&self) -> Result<(), LedgerError> {
        let debit_set = self.debit > Decimal::ZERO;
        let credit_set = self.credit > Decimal::ZERO;
        let negative = self.debit < Decimal::ZERO || self.credit < Decimal::ZERO;

        if negative || debit_set == credit_set {
            return Err(LedgerError::InvalidLine {
                line_no: self.line_no,
            });
        }
        Ok(())
    }
}

/// A journal entry header owning its ordered lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Unique identifier.
    pub id: JournalEntryId,
    /// Unique entry number.
    pub number: String,
    /// Business date of the entry.
    pub entry_date: NaiveDate,
    /// Period the entry posts into.
    pub period_id: PeriodId,
    /// Entry classification.
    pub entry_type: JournalEntryType,
    /// Source document link, if automated.
    pub source: Option<SourceDocument>,
    /// Description of the entry.
    pub description: String,
    /// Sum of line debits.
    pub total_debit: Decimal,
    /// Sum of line credits.
    pub total_credit: Decimal,
    /// Current status.
    pub status: JournalStatus,
    /// Who posted the entry, if posted.
    pub posted_by: Option<ActorId>,
    /// When the entry was posted, if posted.
    pub posted_at: Option<DateTime<Utc>>,
    /// Audit metadata.
    pub audit: AuditStamp,
    /// Lines in entry order.
    pub lines: Vec<JournalLine>,
}

impl JournalEntry {
    /// Creates a draft entry from input, numbering the lines from 1.
    #[must_use]
    pub fn draft(input: CreateJournalEntryInput, ctx: &PostingContext) -> Self {
        let entry_id = JournalEntryId::new();

        let lines: Vec<JournalLine> = input
            .lines
            .into_iter()
            .enumerate()
            .map(|(i, line)| JournalLine {
                id: JournalLineId::new(),
                entry_id,
                line_no: u32::try_from(i).unwrap_or(u32::MAX).saturating_add(1),
                account_id: line.account_id,
                debit: line.debit,
                credit: line.credit,
                cost_center: line.cost_center,
            })
            .collect();

        let total_debit = lines.iter().map(|l| l.debit).sum();
        let total_credit = lines.iter().map(|l| l.credit).sum();

        Self {
            id: entry_id,
            number: input.number,
            entry_date: input.entry_date,
            period_id: input.period_id,
            entry_type: input.entry_type,
            source: input.source,
            description: input.description,
            total_debit,
            total_credit,
            status: JournalStatus::Draft,
            posted_by: None,
            posted_at: None,
            audit: AuditStamp::new(ctx.actor, ctx.at),
            lines,
        }
    }

    /// Returns true if the entry can still be posted.
    #[must_use]
    pub fn can_post(&self) -> bool {
        self.status == JournalStatus::Draft
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(line_no: u32, debit: Decimal, credit: Decimal) -> JournalLine {
        JournalLine {
            id: JournalLineId::new(),
            entry_id: JournalEntryId::new(),
            line_no,
            account_id: AccountId::new(),
            debit,
            credit,
            cost_center: None,
        }
    }

    #[test]
    fn test_debit_line_is_valid() {
        assert!(line(1, dec!(100), dec!(0)).validate().is_ok());
    }

    #[test]
    fn test_credit_line_is_valid() {
        assert!(line(1, dec!(0), dec!(100)).validate().is_ok());
    }

    #[test]
    fn test_both_sides_rejected() {
        let result = line(3, dec!(100), dec!(50)).validate();
        assert!(matches!(result, Err(LedgerError::InvalidLine { line_no: 3 })));
    }

    #[test]
    fn test_neither_side_rejected() {
        assert!(line(1, dec!(0), dec!(0)).validate().is_err());
    }

    #[test]
    fn test_negative_amount_rejected() {
        assert!(line(1, dec!(-100), dec!(0)).validate().is_err());
        assert!(line(1, dec!(0), dec!(-100)).validate().is_err());
    }

    #[test]
    fn test_draft_numbers_lines_and_totals() {
        let ctx = PostingContext::new(ActorId::new(), Utc::now());
        let entry = JournalEntry::draft(
            CreateJournalEntryInput {
                number: "JV-1".to_string(),
                entry_date: NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(),
                period_id: PeriodId::new(),
                entry_type: JournalEntryType::Manual,
                source: None,
                description: "test".to_string(),
                lines: vec![
                    JournalLineInput {
                        account_id: AccountId::new(),
                        debit: dec!(500),
                        credit: dec!(0),
                        cost_center: None,
                    },
                    JournalLineInput {
                        account_id: AccountId::new(),
                        debit: dec!(0),
                        credit: dec!(500),
                        cost_center: Some("ops".to_string()),
                    },
                ],
            },
            &ctx,
        );

        assert_eq!(entry.status, JournalStatus::Draft);
        assert_eq!(entry.lines[0].line_no, 1);
        assert_eq!(entry.lines[1].line_no, 2);
        assert_eq!(entry.total_debit, dec!(500));
        assert_eq!(entry.total_credit, dec!(500));
        assert!(entry.lines.iter().all(|l| l.entry_id == entry.id));
    }

    #[test]
    fn test_status_editability() {
        assert!(JournalStatus::Draft.is_editable());
        assert!(!JournalStatus::Posted.is_editable());
        assert!(!JournalStatus::Cancelled.is_editable());
        assert!(JournalStatus::Posted.is_immutable());
        assert!(JournalStatus::Cancelled.is_immutable());
    }
}
