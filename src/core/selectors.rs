//! Pure derived views over an in-memory month snapshot. No I/O.

use std::collections::HashMap;

use uuid::Uuid;

use crate::domain::{Category, MonthlyPlan, Transaction};

const WARNING_RATIO: f64 = 0.8;
const RANKING_LIMIT: usize = 5;

/// Traffic-light state of one category's spending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryHealth {
    Healthy,
    Warning,
    Overspent,
}

/// A category enriched with its computed spend figures.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryWithSpent {
    pub category: Category,
    pub spent: f64,
    pub remaining: f64,
    pub health: CategoryHealth,
}

/// Transaction count per category, for the frequency ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryFrequency {
    pub category_id: Uuid,
    pub name: String,
    pub count: usize,
}

/// Display slice of the most expensive categories.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySpend {
    pub name: String,
    pub spent: f64,
    pub color: String,
}

/// Aggregate borrow position. Both sides are equal whenever the zero-sum
/// invariant holds; they are reported separately for display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorrowSummary {
    pub total_borrowed: f64,
    pub total_lent: f64,
}

pub fn total_income(plan: &MonthlyPlan) -> f64 {
    plan.incomes.iter().map(|income| income.amount).sum()
}

pub fn total_budgeted(plan: &MonthlyPlan) -> f64 {
    plan.categories.iter().map(|category| category.available()).sum()
}

/// All non-deleted spending for the month, planned and unplanned.
pub fn total_spent(transactions: &[Transaction]) -> f64 {
    transactions
        .iter()
        .filter(|txn| !txn.deleted)
        .map(|txn| txn.amount)
        .sum()
}

pub fn total_unplanned_spent(transactions: &[Transaction]) -> f64 {
    transactions
        .iter()
        .filter(|txn| !txn.deleted && txn.is_unplanned)
        .map(|txn| txn.amount)
        .sum()
}

/// Sum of each category's overshoot beyond its available amount.
pub fn total_overspent(plan: &MonthlyPlan, transactions: &[Transaction]) -> f64 {
    plan.categories
        .iter()
        .map(|category| {
            let overshoot = category_spent(category.id, transactions) - category.available();
            overshoot.max(0.0)
        })
        .sum()
}

/// Spend attributed to one category. Unplanned transactions never carry a
/// category id, so they are naturally excluded.
pub fn category_spent(category_id: Uuid, transactions: &[Transaction]) -> f64 {
    transactions
        .iter()
        .filter(|txn| txn.counts_for_category(category_id))
        .map(|txn| txn.amount)
        .sum()
}

pub fn category_health(available: f64, spent: f64) -> CategoryHealth {
    if available == 0.0 {
        // An unbudgeted category cannot be overspent.
        CategoryHealth::Healthy
    } else if spent > available {
        CategoryHealth::Overspent
    } else if spent > WARNING_RATIO * available {
        CategoryHealth::Warning
    } else {
        CategoryHealth::Healthy
    }
}

pub fn categories_with_spent(
    plan: &MonthlyPlan,
    transactions: &[Transaction],
) -> Vec<CategoryWithSpent> {
    plan.categories
        .iter()
        .map(|category| {
            let spent = category_spent(category.id, transactions);
            let available = category.available();
            CategoryWithSpent {
                category: category.clone(),
                spent,
                remaining: available - spent,
                health: category_health(available, spent),
            }
        })
        .collect()
}

/// Cash that should still sit in the bank: the unspent budgeted pool minus
/// unplanned spend, which was never part of the pool and drains real cash
/// a second time.
pub fn amount_in_bank(plan: &MonthlyPlan, transactions: &[Transaction]) -> f64 {
    (total_budgeted(plan) - total_spent(transactions)) - total_unplanned_spent(transactions)
}

/// Income not yet assigned to any category, independent of spending.
pub fn allocation_left(plan: &MonthlyPlan) -> f64 {
    total_income(plan) - total_budgeted(plan)
}

/// Categories ranked by transaction count, top 5.
pub fn frequent_categories(
    plan: &MonthlyPlan,
    transactions: &[Transaction],
) -> Vec<CategoryFrequency> {
    let mut counts: HashMap<Uuid, usize> = HashMap::new();
    for txn in transactions.iter().filter(|txn| !txn.deleted) {
        if let Some(category_id) = txn.category_id {
            *counts.entry(category_id).or_default() += 1;
        }
    }
    let mut ranked: Vec<CategoryFrequency> = plan
        .categories
        .iter()
        .filter_map(|category| {
            let count = *counts.get(&category.id)?;
            Some(CategoryFrequency {
                category_id: category.id,
                name: category.name.clone(),
                count,
            })
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(RANKING_LIMIT);
    ranked
}

/// Categories with spend, ranked by amount, top 5.
pub fn most_expensive_categories(
    plan: &MonthlyPlan,
    transactions: &[Transaction],
) -> Vec<CategorySpend> {
    let mut ranked: Vec<CategorySpend> = plan
        .categories
        .iter()
        .filter_map(|category| {
            let spent = category_spent(category.id, transactions);
            (spent > 0.0).then(|| CategorySpend {
                name: category.name.clone(),
                spent,
                color: category.color.clone(),
            })
        })
        .collect();
    ranked.sort_by(|a, b| b.spent.partial_cmp(&a.spent).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(RANKING_LIMIT);
    ranked
}

pub fn borrow_summary(plan: &MonthlyPlan) -> BorrowSummary {
    let total_borrowed = plan
        .categories
        .iter()
        .filter(|category| category.borrowed > 0.0)
        .map(|category| category.borrowed)
        .sum();
    let total_lent = plan
        .categories
        .iter()
        .filter(|category| category.borrowed < 0.0)
        .map(|category| -category.borrowed)
        .sum();
    BorrowSummary {
        total_borrowed,
        total_lent,
    }
}
