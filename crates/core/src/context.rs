//! Explicit posting context.
//!
//! Every mutating call receives the acting user and the timestamp to use,
//! rather than reading an ambient clock or session. This keeps posting
//! deterministic and testable.

use chrono::{DateTime, Utc};
use saldo_shared::types::ActorId;

/// Actor and timestamp for a mutating operation.
#[derive(Debug, Clone, Copy)]
pub struct PostingContext {
    /// The authenticated user performing the operation.
    pub actor: ActorId,
    /// The timestamp to record for the operation.
    pub at: DateTime<Utc>,
}

impl PostingContext {
    /// Creates a new posting context.
    #[must_use]
    pub const fn new(actor: ActorId, at: DateTime<Utc>) -> Self {
        Self { actor, at }
    }
}
