//! The in-memory state container for the current month.
//!
//! All mutations follow the same optimistic order: compute the next state,
//! notify subscribers synchronously, then persist and mark the touched ids
//! pending-sync. The UI never waits on storage, and a failed write keeps
//! the in-memory state so the next successful write catches up.

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::{
    Budget, Category, FrequentPattern, Income, Month, MonthlyPlan, Settings, Transaction,
    TransactionPattern, LOCAL_OWNER_ID, MIN_DESCRIPTION_LEN,
};
use crate::errors::{BudgetError, Result};
use crate::storage::{KeyValueStore, LocalStore};

/// Patterns need this many occurrences before they are suggested.
const FREQUENT_PATTERN_THRESHOLD: u32 = 3;

/// Snapshot of everything loaded for the active month.
#[derive(Debug, Clone, Default)]
pub struct BudgetState {
    pub month: Option<Month>,
    pub budget: Option<Budget>,
    pub incomes: Vec<Income>,
    pub categories: Vec<Category>,
    pub transactions: Vec<Transaction>,
    pub loading: bool,
}

impl BudgetState {
    pub fn plan(&self) -> MonthlyPlan {
        MonthlyPlan {
            budget: self.budget.clone(),
            incomes: self.incomes.clone(),
            categories: self.categories.clone(),
        }
    }
}

/// Which dimensions `copy_from_previous_month` carries over.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyOptions {
    pub incomes: bool,
    pub categories: bool,
}

/// Input for a new transaction. The date defaults to today when absent.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub category_id: Option<Uuid>,
    pub amount: f64,
    pub description: String,
    pub account: String,
    pub is_unplanned: bool,
    pub date: Option<NaiveDate>,
}

/// Handle returned by [`BudgetStore::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriberToken(usize);

type Subscriber = Box<dyn Fn(&BudgetState)>;

/// Single source of truth for the current month. Constructed explicitly by
/// the composition root and handed to whoever needs reads or mutations;
/// change notification goes through the subscriber list.
pub struct BudgetStore<S: KeyValueStore> {
    local: LocalStore<S>,
    state: BudgetState,
    subscribers: Vec<(SubscriberToken, Subscriber)>,
    next_token: usize,
}

impl<S: KeyValueStore> BudgetStore<S> {
    pub fn new(local: LocalStore<S>) -> Self {
        Self {
            local,
            state: BudgetState::default(),
            subscribers: Vec::new(),
            next_token: 0,
        }
    }

    pub fn state(&self) -> &BudgetState {
        &self.state
    }

    pub fn local(&self) -> &LocalStore<S> {
        &self.local
    }

    pub fn subscribe(&mut self, subscriber: impl Fn(&BudgetState) + 'static) -> SubscriberToken {
        let token = SubscriberToken(self.next_token);
        self.next_token += 1;
        self.subscribers.push((token, Box::new(subscriber)));
        token
    }

    pub fn unsubscribe(&mut self, token: SubscriberToken) {
        self.subscribers.retain(|(existing, _)| *existing != token);
    }

    fn notify(&self) {
        for (_, subscriber) in &self.subscribers {
            subscriber(&self.state);
        }
    }

    // -- month loading -----------------------------------------------------

    /// Loads a month wholesale, synthesizing an empty local budget on first
    /// visit. Never fails outward: whatever goes wrong, the store ends up
    /// with something to show and the loading flag cleared.
    pub fn load_month(&mut self, month: Month) {
        self.state.loading = true;
        self.notify();

        let mut plan = self.local.load_plan(&month);
        if plan.budget.is_none() {
            let budget = Budget::new(LOCAL_OWNER_ID, month.clone(), format!("Budget {month}"));
            info!(%month, budget_id = %budget.id, "synthesizing local budget");
            plan.budget = Some(budget);
            if let Err(err) = self.local.save_plan(&month, &plan) {
                warn!(%month, %err, "could not persist synthesized budget");
            }
        }
        let transactions = self.local.load_transactions(&month);

        self.state = BudgetState {
            month: Some(month),
            budget: plan.budget,
            incomes: plan.incomes,
            categories: plan.categories,
            transactions,
            loading: false,
        };
        self.notify();
    }

    pub fn set_current_month(&mut self, month: Month) {
        self.load_month(month);
    }

    // -- incomes -----------------------------------------------------------

    pub fn add_income(&mut self, name: impl Into<String>, amount: f64) -> Result<Uuid> {
        if amount < 0.0 {
            return Err(BudgetError::Validation(
                "income amount must not be negative".into(),
            ));
        }
        let budget_id = self.require_budget()?;
        let income = Income::new(budget_id, name, amount);
        let id = income.id;
        self.state.incomes.push(income);
        self.notify();
        self.persist_plan(&[id]);
        Ok(id)
    }

    pub fn update_income(&mut self, id: Uuid, name: impl Into<String>, amount: f64) -> Result<()> {
        if amount < 0.0 {
            return Err(BudgetError::Validation(
                "income amount must not be negative".into(),
            ));
        }
        let income = self
            .state
            .incomes
            .iter_mut()
            .find(|income| income.id == id)
            .ok_or_else(|| BudgetError::Validation(format!("income {id} not found")))?;
        income.name = name.into();
        income.amount = amount;
        income.touch();
        self.notify();
        self.persist_plan(&[id]);
        Ok(())
    }

    /// Removes the income from the plan outright. Incomes are not
    /// tombstoned; the record simply disappears from the snapshot.
    pub fn remove_income(&mut self, id: Uuid) -> Result<()> {
        let before = self.state.incomes.len();
        self.state.incomes.retain(|income| income.id != id);
        if self.state.incomes.len() == before {
            return Err(BudgetError::Validation(format!("income {id} not found")));
        }
        self.notify();
        self.persist_plan(&[id]);
        Ok(())
    }

    // -- categories --------------------------------------------------------

    pub fn add_category(
        &mut self,
        name: impl Into<String>,
        budgeted: f64,
        color: impl Into<String>,
        notes: Option<String>,
    ) -> Result<Uuid> {
        if budgeted < 0.0 {
            return Err(BudgetError::Validation(
                "budgeted amount must not be negative".into(),
            ));
        }
        let budget_id = self.require_budget()?;
        let mut category = Category::new(budget_id, name, budgeted, color);
        category.notes = notes;
        let id = category.id;
        self.state.categories.push(category);
        self.notify();
        self.persist_plan(&[id]);
        Ok(id)
    }

    pub fn update_category(
        &mut self,
        id: Uuid,
        name: impl Into<String>,
        budgeted: f64,
        color: impl Into<String>,
        notes: Option<String>,
    ) -> Result<()> {
        if budgeted < 0.0 {
            return Err(BudgetError::Validation(
                "budgeted amount must not be negative".into(),
            ));
        }
        let category = self
            .state
            .categories
            .iter_mut()
            .find(|category| category.id == id)
            .ok_or_else(|| BudgetError::Validation(format!("category {id} not found")))?;
        category.name = name.into();
        category.budgeted = budgeted;
        category.color = color.into();
        category.notes = notes;
        category.touch();
        self.notify();
        self.persist_plan(&[id]);
        Ok(())
    }

    /// Removes the category from the plan outright, mirroring income
    /// removal. Transactions keep their dangling category id; selectors
    /// simply no longer attribute them.
    pub fn remove_category(&mut self, id: Uuid) -> Result<()> {
        let before = self.state.categories.len();
        self.state.categories.retain(|category| category.id != id);
        if self.state.categories.len() == before {
            return Err(BudgetError::Validation(format!("category {id} not found")));
        }
        self.notify();
        self.persist_plan(&[id]);
        Ok(())
    }

    /// Moves budget capacity between two categories in one state
    /// transition, so no observer ever sees a half-applied borrow and the
    /// zero-sum invariant holds after every call.
    pub fn borrow_between_categories(&mut self, from: Uuid, to: Uuid, amount: f64) -> Result<()> {
        if from == to {
            return Err(BudgetError::Validation(
                "cannot borrow from a category into itself".into(),
            ));
        }
        if amount <= 0.0 {
            return Err(BudgetError::Validation(
                "borrow amount must be positive".into(),
            ));
        }
        let source = self
            .state
            .categories
            .iter()
            .find(|category| category.id == from)
            .ok_or_else(|| BudgetError::Validation(format!("category {from} not found")))?;
        let source_remaining = source.available()
            - crate::core::selectors::category_spent(from, &self.state.transactions);
        if amount > source_remaining {
            return Err(BudgetError::Validation(format!(
                "borrow amount {amount:.2} exceeds remaining {source_remaining:.2}"
            )));
        }
        if !self.state.categories.iter().any(|category| category.id == to) {
            return Err(BudgetError::Validation(format!("category {to} not found")));
        }

        for category in &mut self.state.categories {
            if category.id == from {
                category.borrowed -= amount;
                category.touch();
            } else if category.id == to {
                category.borrowed += amount;
                category.touch();
            }
        }
        self.notify();
        self.persist_plan(&[from, to]);
        Ok(())
    }

    // -- transactions ------------------------------------------------------

    pub fn add_transaction(&mut self, input: NewTransaction) -> Result<Uuid> {
        validate_transaction_input(input.amount, &input.description)?;
        let budget_id = self.require_budget()?;

        // Unplanned spending is never attributed to a category, whatever
        // the caller passed.
        let category_id = if input.is_unplanned {
            None
        } else {
            input.category_id
        };
        let date = input.date.unwrap_or_else(|| Utc::now().date_naive());

        let mut transaction = Transaction::new(
            budget_id,
            category_id,
            input.amount,
            input.description.trim(),
            input.account,
            date,
        );
        transaction.is_unplanned = input.is_unplanned;
        let id = transaction.id;

        let in_current_month = self
            .state
            .month
            .as_ref()
            .map(|month| month.contains(date))
            .unwrap_or(false);
        if in_current_month {
            self.state.transactions.push(transaction.clone());
        }
        self.notify();

        if let Err(err) = self.local.save_transaction(&transaction) {
            warn!(%id, %err, "transaction persist failed, keeping optimistic state");
        }
        self.mark_pending(&[id]);

        if !transaction.is_unplanned {
            if let Some(category_id) = transaction.category_id {
                self.learn_pattern(&transaction.description, category_id, transaction.amount);
            }
        }
        Ok(id)
    }

    pub fn update_transaction(
        &mut self,
        id: Uuid,
        input: NewTransaction,
    ) -> Result<()> {
        validate_transaction_input(input.amount, &input.description)?;
        let position = self
            .state
            .transactions
            .iter()
            .position(|txn| txn.id == id)
            .ok_or_else(|| BudgetError::Validation(format!("transaction {id} not found")))?;

        let transaction = &mut self.state.transactions[position];
        transaction.is_unplanned = input.is_unplanned;
        transaction.category_id = if input.is_unplanned {
            None
        } else {
            input.category_id
        };
        transaction.amount = input.amount;
        transaction.description = input.description.trim().to_string();
        transaction.account = input.account;
        if let Some(date) = input.date {
            transaction.date = date;
        }
        transaction.touch();
        let updated = transaction.clone();

        // A date edit can move the record out of the loaded month.
        let stays = self
            .state
            .month
            .as_ref()
            .map(|month| month.contains(updated.date))
            .unwrap_or(true);
        if !stays {
            self.state.transactions.remove(position);
        }
        self.notify();

        if let Err(err) = self.local.save_transaction(&updated) {
            warn!(%id, %err, "transaction persist failed, keeping optimistic state");
        }
        self.mark_pending(&[id]);
        Ok(())
    }

    /// Soft-deletes a transaction: the record stays, flagged and
    /// re-timestamped, so the deletion propagates through sync.
    pub fn delete_transaction(&mut self, id: Uuid) -> Result<()> {
        let transaction = self
            .state
            .transactions
            .iter_mut()
            .find(|txn| txn.id == id)
            .ok_or_else(|| BudgetError::Validation(format!("transaction {id} not found")))?;
        transaction.mark_deleted();
        let tombstone = transaction.clone();
        self.notify();

        if let Err(err) = self.local.save_transaction(&tombstone) {
            warn!(%id, %err, "tombstone persist failed, keeping optimistic state");
        }
        self.mark_pending(&[id]);
        Ok(())
    }

    // -- transaction patterns ----------------------------------------------

    fn learn_pattern(&mut self, description: &str, category_id: Uuid, amount: f64) {
        let mut patterns = self.local.load_patterns();
        match patterns
            .iter_mut()
            .find(|pattern| pattern.matches(description, category_id))
        {
            Some(pattern) => pattern.record_use(amount),
            None => patterns.push(TransactionPattern::first(description, category_id, amount)),
        }
        if let Err(err) = self.local.save_patterns(&patterns) {
            warn!(%err, "pattern table persist failed");
        }
    }

    /// Patterns seen at least three times, ranked by count then recency,
    /// enriched with the category's current name. Patterns whose category
    /// no longer exists are dropped silently.
    pub fn frequent_patterns(&self, limit: Option<usize>) -> Vec<FrequentPattern> {
        let limit = limit.unwrap_or_else(|| self.local.load_settings().pattern_suggestions);
        let mut patterns: Vec<TransactionPattern> = self
            .local
            .load_patterns()
            .into_iter()
            .filter(|pattern| pattern.count >= FREQUENT_PATTERN_THRESHOLD)
            .collect();
        patterns.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| b.last_used.cmp(&a.last_used))
        });
        patterns
            .into_iter()
            .filter_map(|pattern| {
                let category = self
                    .state
                    .categories
                    .iter()
                    .find(|category| category.id == pattern.category_id)?;
                Some(FrequentPattern {
                    description: pattern.description,
                    category_id: pattern.category_id,
                    category_name: category.name.clone(),
                    count: pattern.count,
                    last_amount: pattern.last_amount,
                })
            })
            .take(limit)
            .collect()
    }

    // -- month-to-month copy -----------------------------------------------

    /// Deep-copies the selected dimensions of a previous month's plan into
    /// the current one, appending to whatever already exists. Fails when
    /// the source month was never stored, regardless of dimensions.
    pub fn copy_from_previous_month(&mut self, source: &Month, options: CopyOptions) -> Result<()> {
        if !self.local.has_plan(source) {
            return Err(BudgetError::NoPreviousData(source.clone()));
        }
        let budget_id = self.require_budget()?;
        let source_plan = self.local.load_plan(source);

        let mut copied = Vec::new();
        if options.incomes {
            for income in &source_plan.incomes {
                let copy = income.copy_into(budget_id);
                copied.push(copy.id);
                self.state.incomes.push(copy);
            }
        }
        if options.categories {
            for category in &source_plan.categories {
                let copy = category.copy_into(budget_id);
                copied.push(copy.id);
                self.state.categories.push(copy);
            }
        }
        debug!(source = %source, count = copied.len(), "copied plan records");
        self.notify();
        self.persist_plan(&copied);
        Ok(())
    }

    // -- settings ----------------------------------------------------------

    pub fn settings(&self) -> Settings {
        self.local.load_settings()
    }

    pub fn update_settings(&self, settings: &Settings) -> Result<()> {
        self.local.save_settings(settings)
    }

    // -- helpers -----------------------------------------------------------

    fn require_budget(&self) -> Result<Uuid> {
        self.state
            .budget
            .as_ref()
            .map(|budget| budget.id)
            .ok_or_else(|| BudgetError::Validation("no month loaded".into()))
    }

    /// Persists the whole plan for the loaded month and marks the ids
    /// pending. Failures are logged, never surfaced: the optimistic state
    /// stands and the next successful write catches up.
    fn persist_plan(&self, pending: &[Uuid]) {
        let Some(month) = self.state.month.clone() else {
            return;
        };
        if let Err(err) = self.local.save_plan(&month, &self.state.plan()) {
            warn!(%month, %err, "plan persist failed, keeping optimistic state");
        }
        self.mark_pending(pending);
    }

    fn mark_pending(&self, ids: &[Uuid]) {
        if let Err(err) = self.local.mark_pending(ids) {
            warn!(%err, "pending-sync bookkeeping failed");
        }
    }
}

fn validate_transaction_input(amount: f64, description: &str) -> Result<()> {
    if amount <= 0.0 {
        return Err(BudgetError::Validation(
            "transaction amount must be positive".into(),
        ));
    }
    if description.trim().chars().count() < MIN_DESCRIPTION_LEN {
        return Err(BudgetError::Validation(format!(
            "description must be at least {MIN_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(())
}
