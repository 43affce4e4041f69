//! The per-month budget record owning incomes, categories, and transactions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::common::{Identifiable, Syncable};
use super::month::Month;

/// One budget per (owner, calendar month). At most one non-deleted budget
/// may exist for a pair; `SyncEngine::ensure_budget` relies on that to stay
/// idempotent under retry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Budget {
    pub id: Uuid,
    pub owner_id: String,
    pub month: Month,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted: bool,
}

impl Budget {
    pub fn new(owner_id: impl Into<String>, month: Month, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.into(),
            month,
            name: name.into(),
            created_at: now,
            updated_at: now,
            deleted: false,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Identifiable for Budget {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Syncable for Budget {
    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn is_deleted(&self) -> bool {
        self.deleted
    }
}
