//! The remote store boundary: a row contract per entity table, plus an
//! in-memory implementation used by tests and as an offline stand-in.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use uuid::Uuid;

use crate::domain::{Budget, Category, Income, Transaction};
use crate::errors::{BudgetError, Result};

/// Record-level access to the remote relational store. Every row carries
/// `id`, `updated_at`, and `deleted`; rows are scoped to an owner by the
/// remote's own access policy, which is opaque here.
pub trait RemoteStore: Send + Sync {
    /// The non-deleted budget for (owner, month), if any.
    fn find_budget(&self, owner_id: &str, month: &str) -> Result<Option<Budget>>;
    fn fetch_budget(&self, id: Uuid) -> Result<Option<Budget>>;
    fn upsert_budget(&self, budget: &Budget) -> Result<Budget>;

    fn fetch_income(&self, id: Uuid) -> Result<Option<Income>>;
    fn upsert_income(&self, income: &Income) -> Result<()>;
    /// Non-deleted incomes for a budget.
    fn list_incomes(&self, budget_id: Uuid) -> Result<Vec<Income>>;

    fn fetch_category(&self, id: Uuid) -> Result<Option<Category>>;
    fn upsert_category(&self, category: &Category) -> Result<()>;
    /// Non-deleted categories for a budget.
    fn list_categories(&self, budget_id: Uuid) -> Result<Vec<Category>>;

    fn fetch_transaction(&self, id: Uuid) -> Result<Option<Transaction>>;
    fn upsert_transaction(&self, transaction: &Transaction) -> Result<()>;
    /// Transactions for a budget whose ISO date satisfies
    /// `lo <= date < hi`. Tombstones are included so deletions propagate.
    fn list_transactions(&self, budget_id: Uuid, lo: &str, hi: &str) -> Result<Vec<Transaction>>;
}

/// In-memory [`RemoteStore`] with per-call and per-record failure
/// injection. Doubles as the shared remote in multi-device tests.
#[derive(Default)]
pub struct MemoryRemote {
    budgets: Mutex<HashMap<Uuid, Budget>>,
    incomes: Mutex<HashMap<Uuid, Income>>,
    categories: Mutex<HashMap<Uuid, Category>>,
    transactions: Mutex<HashMap<Uuid, Transaction>>,
    /// Remaining number of calls that fail outright.
    fail_next: AtomicUsize,
    /// Record ids whose fetch/upsert always fails.
    fail_ids: Mutex<HashSet<Uuid>>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `calls` remote operations fail.
    pub fn fail_next_calls(&self, calls: usize) {
        self.fail_next.store(calls, Ordering::SeqCst);
    }

    /// Makes every operation touching `id` fail.
    pub fn fail_record(&self, id: Uuid) {
        self.lock(&self.fail_ids).insert(id);
    }

    pub fn clear_failures(&self) {
        self.fail_next.store(0, Ordering::SeqCst);
        self.lock(&self.fail_ids).clear();
    }

    pub fn budget_count(&self) -> usize {
        self.lock(&self.budgets).len()
    }

    fn lock<'a, T>(&self, mutex: &'a Mutex<T>) -> std::sync::MutexGuard<'a, T> {
        mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn gate(&self, id: Option<Uuid>) -> Result<()> {
        if self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| {
                remaining.checked_sub(1)
            })
            .is_ok()
        {
            return Err(BudgetError::Remote("injected failure".into()));
        }
        if let Some(id) = id {
            if self.lock(&self.fail_ids).contains(&id) {
                return Err(BudgetError::Remote(format!("injected failure for {id}")));
            }
        }
        Ok(())
    }
}

impl RemoteStore for MemoryRemote {
    fn find_budget(&self, owner_id: &str, month: &str) -> Result<Option<Budget>> {
        self.gate(None)?;
        Ok(self
            .lock(&self.budgets)
            .values()
            .find(|budget| {
                !budget.deleted && budget.owner_id == owner_id && budget.month.as_str() == month
            })
            .cloned())
    }

    fn fetch_budget(&self, id: Uuid) -> Result<Option<Budget>> {
        self.gate(Some(id))?;
        Ok(self.lock(&self.budgets).get(&id).cloned())
    }

    fn upsert_budget(&self, budget: &Budget) -> Result<Budget> {
        self.gate(Some(budget.id))?;
        self.lock(&self.budgets).insert(budget.id, budget.clone());
        Ok(budget.clone())
    }

    fn fetch_income(&self, id: Uuid) -> Result<Option<Income>> {
        self.gate(Some(id))?;
        Ok(self.lock(&self.incomes).get(&id).cloned())
    }

    fn upsert_income(&self, income: &Income) -> Result<()> {
        self.gate(Some(income.id))?;
        self.lock(&self.incomes).insert(income.id, income.clone());
        Ok(())
    }

    fn list_incomes(&self, budget_id: Uuid) -> Result<Vec<Income>> {
        self.gate(None)?;
        Ok(self
            .lock(&self.incomes)
            .values()
            .filter(|income| income.budget_id == budget_id && !income.deleted)
            .cloned()
            .collect())
    }

    fn fetch_category(&self, id: Uuid) -> Result<Option<Category>> {
        self.gate(Some(id))?;
        Ok(self.lock(&self.categories).get(&id).cloned())
    }

    fn upsert_category(&self, category: &Category) -> Result<()> {
        self.gate(Some(category.id))?;
        self.lock(&self.categories)
            .insert(category.id, category.clone());
        Ok(())
    }

    fn list_categories(&self, budget_id: Uuid) -> Result<Vec<Category>> {
        self.gate(None)?;
        Ok(self
            .lock(&self.categories)
            .values()
            .filter(|category| category.budget_id == budget_id && !category.deleted)
            .cloned()
            .collect())
    }

    fn fetch_transaction(&self, id: Uuid) -> Result<Option<Transaction>> {
        self.gate(Some(id))?;
        Ok(self.lock(&self.transactions).get(&id).cloned())
    }

    fn upsert_transaction(&self, transaction: &Transaction) -> Result<()> {
        self.gate(Some(transaction.id))?;
        self.lock(&self.transactions)
            .insert(transaction.id, transaction.clone());
        Ok(())
    }

    fn list_transactions(&self, budget_id: Uuid, lo: &str, hi: &str) -> Result<Vec<Transaction>> {
        self.gate(None)?;
        Ok(self
            .lock(&self.transactions)
            .values()
            .filter(|txn| {
                let date = txn.date.to_string();
                txn.budget_id == budget_id && date.as_str() >= lo && date.as_str() < hi
            })
            .cloned()
            .collect())
    }
}
