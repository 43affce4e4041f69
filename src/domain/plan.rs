//! The per-month bundle persisted under `plan:{month}`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::budget::Budget;
use super::category::Category;
use super::income::Income;

/// Budget plus its incomes and categories for one month. Transactions are
/// stored individually and indexed separately.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MonthlyPlan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<Budget>,
    #[serde(default)]
    pub incomes: Vec<Income>,
    #[serde(default)]
    pub categories: Vec<Category>,
}

impl MonthlyPlan {
    pub fn with_budget(budget: Budget) -> Self {
        Self {
            budget: Some(budget),
            incomes: Vec::new(),
            categories: Vec::new(),
        }
    }

    pub fn budget_id(&self) -> Option<Uuid> {
        self.budget.as_ref().map(|budget| budget.id)
    }

    pub fn category(&self, id: Uuid) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }

    /// Net borrow across all categories; zero whenever the borrow
    /// invariant holds.
    pub fn borrow_balance(&self) -> f64 {
        self.categories.iter().map(|category| category.borrowed).sum()
    }
}
