//! Budget categories with borrow tracking between envelopes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::common::{Identifiable, Syncable};

/// A spending envelope inside one monthly budget.
///
/// `borrowed` is signed: positive means capacity received from another
/// category, negative means capacity lent out. The sum of `borrowed`
/// across a budget's categories is always zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: Uuid,
    pub budget_id: Uuid,
    pub name: String,
    pub budgeted: f64,
    #[serde(default)]
    pub borrowed: f64,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted: bool,
}

impl Category {
    pub fn new(
        budget_id: Uuid,
        name: impl Into<String>,
        budgeted: f64,
        color: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            budget_id,
            name: name.into(),
            budgeted,
            borrowed: 0.0,
            color: color.into(),
            notes: None,
            created_at: now,
            updated_at: now,
            deleted: false,
        }
    }

    /// Budgeted target plus net borrow, the amount actually available.
    pub fn available(&self) -> f64 {
        self.budgeted + self.borrowed
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Deep copy carried into another budget: fresh id and timestamps,
    /// borrow position reset since borrows never span months.
    pub fn copy_into(&self, budget_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            budget_id,
            name: self.name.clone(),
            budgeted: self.budgeted,
            borrowed: 0.0,
            color: self.color.clone(),
            notes: self.notes.clone(),
            created_at: now,
            updated_at: now,
            deleted: false,
        }
    }
}

impl Identifiable for Category {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Syncable for Category {
    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn is_deleted(&self) -> bool {
        self.deleted
    }
}
