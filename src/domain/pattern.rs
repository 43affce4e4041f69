//! Learned transaction patterns, a local-only usage cache. Never synced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Occurrence statistics for a (description, category) pair, updated on
/// every planned, categorized transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionPattern {
    pub description: String,
    pub category_id: Uuid,
    pub count: u32,
    pub last_amount: f64,
    pub last_used: DateTime<Utc>,
}

impl TransactionPattern {
    pub fn first(description: impl Into<String>, category_id: Uuid, amount: f64) -> Self {
        Self {
            description: description.into(),
            category_id,
            count: 1,
            last_amount: amount,
            last_used: Utc::now(),
        }
    }

    pub fn record_use(&mut self, amount: f64) {
        self.count += 1;
        self.last_amount = amount;
        self.last_used = Utc::now();
    }

    pub fn matches(&self, description: &str, category_id: Uuid) -> bool {
        self.category_id == category_id && self.description == description
    }
}

/// A frequent pattern enriched with the category's current name for display.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequentPattern {
    pub description: String,
    pub category_id: Uuid,
    pub category_name: String,
    pub count: u32,
    pub last_amount: f64,
}
