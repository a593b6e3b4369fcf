//! Financial period types and the posting gate.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use saldo_shared::types::{ActorId, AuditStamp, PeriodId};

use crate::context::PostingContext;
use crate::error::LedgerError;

/// Status of a financial period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodStatus {
    /// Period accepts postings.
    Open,
    /// Period rejects all postings.
    Closed,
}

/// A calendar/fiscal posting window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialPeriod {
    /// Unique identifier.
    pub id: PeriodId,
    /// Period code (e.g., "2026-03").
    pub code: String,
    /// First date of the period (inclusive).
    pub start_date: NaiveDate,
    /// Last date of the period (inclusive).
    pub end_date: NaiveDate,
    /// Current status.
    pub status: PeriodStatus,
    /// Who closed the period, if closed.
    pub closed_by: Option<ActorId>,
    /// When the period was closed, if closed.
    pub closed_at: Option<DateTime<Utc>>,
    /// Audit metadata.
    pub audit: AuditStamp,
}

impl FinancialPeriod {
    /// Creates a new open period.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` if `start_date` is not strictly before
    /// `end_date`.
    pub fn create(
        code: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
        ctx: &PostingContext,
    ) -> Result<Self, LedgerError> {
        super::validation::validate_date_range(start_date, end_date)?;

        Ok(Self {
            id: PeriodId::new(),
            code,
            start_date,
            end_date,
            status: PeriodStatus::Open,
            closed_by: None,
            closed_at: None,
            audit: AuditStamp::new(ctx.actor, ctx.at),
        })
    }

    /// Returns true if the given date falls within this period.
    #[must_use]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Returns true if the period is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == PeriodStatus::Open
    }

    /// Checks whether a posting dated `date` is accepted by this period.
    ///
    /// # Errors
    ///
    /// Returns `PeriodClosed` if the period is closed, or
    /// `DateOutsidePeriod` if the date is not in `[start_date, end_date]`.
    /// Both surface to callers as the period-closed condition.
    pub fn can_post(&self, date: NaiveDate) -> Result<(), LedgerError> {
        if self.status == PeriodStatus::Closed {
            return Err(LedgerError::PeriodClosed {
                code: self.code.clone(),
            });
        }
        if !self.contains_date(date) {
            return Err(LedgerError::DateOutsidePeriod {
                date,
                code: self.code.clone(),
            });
        }
        Ok(())
    }

    /// Closes the period. New postings are rejected until reopened.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if the period is already closed.
    pub fn close(&mut self, ctx: &PostingContext) -> Result<(), LedgerError> {
        if self.status == PeriodStatus::Closed {
            return Err(LedgerError::InvalidOperation(format!(
                "period {} is already closed",
                self.code
            )));
        }
        self.status = PeriodStatus::Closed;
        self.closed_by = Some(ctx.actor);
        self.closed_at = Some(ctx.at);
        self.audit = self.audit.touched(ctx.actor, ctx.at);
        Ok(())
    }

    /// Reopens a closed period, clearing the closed-by/at markers.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if the period is not closed.
    pub fn reopen(&mut self, ctx: &PostingContext) -> Result<(), LedgerError> {
        if self.status == PeriodStatus::Open {
            return Err(LedgerError::InvalidOperation(format!(
                "period {} is not closed",
                self.code
            )));
        }
        self.status = PeriodStatus::Open;
        self.closed_by = None;
        self.closed_at = None;
        self.audit = self.audit.touched(ctx.actor, ctx.at);
        Ok(())
    }
}
