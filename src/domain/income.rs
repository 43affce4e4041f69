//! Income entries attached to a monthly budget.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::common::{Identifiable, Syncable};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Income {
    pub id: Uuid,
    pub budget_id: Uuid,
    pub name: String,
    pub amount: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted: bool,
}

impl Income {
    pub fn new(budget_id: Uuid, name: impl Into<String>, amount: f64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            budget_id,
            name: name.into(),
            amount,
            created_at: now,
            updated_at: now,
            deleted: false,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Deep copy carried into another budget: fresh id and timestamps.
    pub fn copy_into(&self, budget_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            budget_id,
            name: self.name.clone(),
            amount: self.amount,
            created_at: now,
            updated_at: now,
            deleted: false,
        }
    }
}

impl Identifiable for Income {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Syncable for Income {
    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn is_deleted(&self) -> bool {
        self.deleted
    }
}
