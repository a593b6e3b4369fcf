//! Audit metadata shared by every persisted entity.
//!
//! Modelled as a composable value embedded in each record rather than a
//! base type; nothing dispatches on it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::ActorId;

/// Who created/updated a record, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStamp {
    /// User who created the record.
    pub created_by: ActorId,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// User who last updated the record.
    pub updated_by: ActorId,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl AuditStamp {
    /// Creates a stamp for a freshly created record.
    #[must_use]
    pub const fn new(actor: ActorId, at: DateTime<Utc>) -> Self {
        Self {
            created_by: actor,
            created_at: at,
            updated_by: actor,
            updated_at: at,
        }
    }

    /// Returns a copy with the update fields advanced.
    #[must_use]
    pub fn touched(mut self, actor: ActorId, at: DateTime<Utc>) -> Self {
        self.updated_by = actor;
        self.updated_at = at;
        self
    }
}
