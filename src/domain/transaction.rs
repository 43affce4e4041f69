//! Transaction records, soft-deleted via tombstones so deletions survive
//! the merge instead of resurrecting on the next pull.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::common::{Identifiable, Syncable};

pub const MIN_DESCRIPTION_LEN: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: Uuid,
    pub budget_id: Uuid,
    /// Absent for uncategorized and always absent for unplanned spending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    pub amount: f64,
    pub description: String,
    pub account: String,
    #[serde(default)]
    pub is_unplanned: bool,
    /// User-editable transaction date, distinct from the record timestamps.
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted: bool,
}

impl Transaction {
    pub fn new(
        budget_id: Uuid,
        category_id: Option<Uuid>,
        amount: f64,
        description: impl Into<String>,
        account: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            budget_id,
            category_id,
            amount,
            description: description.into(),
            account: account.into(),
            is_unplanned: false,
            date,
            created_at: now,
            updated_at: now,
            deleted: false,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Marks the record as a tombstone with a fresh timestamp so the
    /// deletion wins the next last-write-wins comparison.
    pub fn mark_deleted(&mut self) {
        self.deleted = true;
        self.touch();
    }

    /// Counts toward a category's spend only when planned and categorized.
    pub fn counts_for_category(&self, category_id: Uuid) -> bool {
        !self.deleted && !self.is_unplanned && self.category_id == Some(category_id)
    }
}

impl Identifiable for Transaction {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Syncable for Transaction {
    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn is_deleted(&self) -> bool {
        self.deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_deleted_bumps_updated_at() {
        let mut txn = Transaction::new(
            Uuid::new_v4(),
            None,
            12.5,
            "Coffee",
            "cash",
            NaiveDate::from_ymd_opt(2025, 8, 10).unwrap(),
        );
        let before = txn.updated_at;
        txn.mark_deleted();
        assert!(txn.deleted);
        assert!(txn.updated_at >= before);
    }
}
