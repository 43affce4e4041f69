//! Push-then-pull reconciliation of one month against the remote store.
//!
//! Push runs first so a device returning from a long offline stretch never
//! has its edits clobbered by a stale pull; the last-write-wins merge then
//! makes the outcome independent of pass order. The cardinal rule
//! throughout: local data survives any sync failure.

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::{Budget, Month, MonthlyPlan, Syncable, Transaction};
use crate::errors::{BudgetError, Result};
use crate::storage::{KeyValueStore, LocalStore};

use super::merge::merge_records;
use super::remote::RemoteStore;
use super::IdentityProvider;

/// Outcome counters for one `full_sync` pass. Failures here are the
/// per-record kind that were logged and skipped, not fatal ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub pushed: usize,
    pub pulled: usize,
    pub failed: usize,
}

pub struct SyncEngine<'a, S: KeyValueStore> {
    local: &'a LocalStore<S>,
    remote: &'a dyn RemoteStore,
}

impl<'a, S: KeyValueStore> SyncEngine<'a, S> {
    pub fn new(local: &'a LocalStore<S>, remote: &'a dyn RemoteStore) -> Self {
        Self { local, remote }
    }

    /// Syncs when an owner is known, does nothing when offline.
    pub fn sync_with_identity(
        &self,
        month: &Month,
        identity: &dyn IdentityProvider,
    ) -> Result<Option<SyncReport>> {
        match identity.owner_id() {
            Some(owner_id) => self.full_sync(month, &owner_id).map(Some),
            None => {
                debug!(%month, "no identity, staying offline");
                Ok(None)
            }
        }
    }

    /// Reconciles one month for one owner: ensure-budget, push, pull +
    /// merge, transaction sync, bookkeeping. Only an ensure-budget failure
    /// aborts; everything after is best-effort and counted in the report.
    pub fn full_sync(&self, month: &Month, owner_id: &str) -> Result<SyncReport> {
        let budget = self
            .ensure_budget(month, owner_id)
            .map_err(|err| BudgetError::SyncUnavailable(err.to_string()))?;
        info!(%month, budget_id = %budget.id, "starting sync");

        let mut report = SyncReport::default();
        let mut pushed_ids = Vec::new();

        self.push_plan(month, &budget, &mut report, &mut pushed_ids);
        self.push_transactions(month, &mut report, &mut pushed_ids);
        self.pull_plan(month, &budget, &mut report);
        self.pull_transactions(month, &budget, &mut report);
        // Anything created locally after ensure-budget resolved gets a
        // second chance before bookkeeping.
        self.push_transactions(month, &mut report, &mut pushed_ids);

        if let Err(err) = self.local.clear_pending(&pushed_ids) {
            warn!(%err, "clearing pending ids failed");
        }
        if let Err(err) = self.local.set_last_sync(Utc::now()) {
            warn!(%err, "recording last sync failed");
        }
        info!(?report, "sync finished");
        Ok(report)
    }

    /// Resolves the month's budget against the remote, idempotently: adopt
    /// the remote budget when one exists for (owner, month), otherwise
    /// promote the local one (or mint a fresh one) and create it remotely.
    fn ensure_budget(&self, month: &Month, owner_id: &str) -> Result<Budget> {
        let mut plan = self.local.load_plan(month);

        if let Some(budget) = &plan.budget {
            if budget.owner_id == owner_id {
                return Ok(budget.clone());
            }
        }

        match self.remote.find_budget(owner_id, month.as_str())? {
            Some(remote_budget) => {
                self.adopt_budget(month, &mut plan, remote_budget.clone())?;
                Ok(remote_budget)
            }
            None => {
                let mut budget = plan
                    .budget
                    .clone()
                    .unwrap_or_else(|| Budget::new(owner_id, month.clone(), format!("Budget {month}")));
                if budget.owner_id != owner_id {
                    budget.owner_id = owner_id.to_string();
                    budget.touch();
                }
                let created = self.remote.upsert_budget(&budget)?;
                plan.budget = Some(created.clone());
                self.local.save_plan(month, &plan)?;
                Ok(created)
            }
        }
    }

    /// Swaps in a remote budget and re-homes local child records that
    /// still point at the placeholder-owned budget id.
    fn adopt_budget(&self, month: &Month, plan: &mut MonthlyPlan, budget: Budget) -> Result<()> {
        let old_id = plan.budget_id();
        let new_id = budget.id;
        plan.budget = Some(budget);
        if let Some(old_id) = old_id.filter(|old_id| *old_id != new_id) {
            for income in plan.incomes.iter_mut().filter(|income| income.budget_id == old_id) {
                income.budget_id = new_id;
            }
            for category in plan
                .categories
                .iter_mut()
                .filter(|category| category.budget_id == old_id)
            {
                category.budget_id = new_id;
            }
            for mut transaction in self.local.load_transactions(month) {
                if transaction.budget_id == old_id {
                    transaction.budget_id = new_id;
                    self.local.save_transaction(&transaction)?;
                }
            }
        }
        self.local.save_plan(month, plan)
    }

    /// Push pass for the budget, incomes, and categories. Per-record
    /// failures are logged and counted, never aborting the pass.
    fn push_plan(
        &self,
        month: &Month,
        budget: &Budget,
        report: &mut SyncReport,
        pushed_ids: &mut Vec<Uuid>,
    ) {
        let plan = self.local.load_plan(month);

        self.push_one(
            budget,
            |id| self.remote.fetch_budget(id),
            |record| self.remote.upsert_budget(record).map(|_| ()),
            report,
            pushed_ids,
        );
        for income in &plan.incomes {
            self.push_one(
                income,
                |id| self.remote.fetch_income(id),
                |record| self.remote.upsert_income(record),
                report,
                pushed_ids,
            );
        }
        for category in &plan.categories {
            self.push_one(
                category,
                |id| self.remote.fetch_category(id),
                |record| self.remote.upsert_category(record),
                report,
                pushed_ids,
            );
        }
    }

    fn push_transactions(
        &self,
        month: &Month,
        report: &mut SyncReport,
        pushed_ids: &mut Vec<Uuid>,
    ) {
        for transaction in self.local.load_transactions(month) {
            self.push_one(
                &transaction,
                |id| self.remote.fetch_transaction(id),
                |record| self.remote.upsert_transaction(record),
                report,
                pushed_ids,
            );
        }
    }

    /// Uploads one record when the remote has no row or a strictly older
    /// one. Written once against [`Syncable`] for every entity type.
    fn push_one<T: Syncable>(
        &self,
        record: &T,
        fetch: impl Fn(Uuid) -> Result<Option<T>>,
        upsert: impl Fn(&T) -> Result<()>,
        report: &mut SyncReport,
        pushed_ids: &mut Vec<Uuid>,
    ) {
        let id = record.id();
        let outcome = fetch(id).and_then(|remote| {
            let should_push = match remote {
                Some(row) => record.updated_at() > row.updated_at(),
                None => true,
            };
            if should_push {
                upsert(record)?;
            }
            Ok(should_push)
        });
        match outcome {
            Ok(true) => {
                report.pushed += 1;
                pushed_ids.push(id);
            }
            Ok(false) => {
                // Remote is newer; the pull pass will bring it back.
                pushed_ids.push(id);
            }
            Err(err) => {
                warn!(%id, %err, "push failed for record");
                report.failed += 1;
            }
        }
    }

    /// Pull pass for incomes and categories: last-write-wins merge into
    /// the local plan. Any failure leaves the local plan untouched.
    fn pull_plan(&self, month: &Month, budget: &Budget, report: &mut SyncReport) {
        let fetched = self
            .remote
            .list_incomes(budget.id)
            .and_then(|incomes| Ok((incomes, self.remote.list_categories(budget.id)?)));
        let (remote_incomes, remote_categories) = match fetched {
            Ok(rows) => rows,
            Err(err) => {
                warn!(%month, %err, "pull failed, keeping local plan");
                report.failed += 1;
                return;
            }
        };
        report.pulled += remote_incomes.len() + remote_categories.len();

        let mut plan = self.local.load_plan(month);
        if plan.budget.is_none() {
            // Minimal wrapper so the merged records have a home.
            plan.budget = Some(budget.clone());
        }
        plan.incomes = merge_records(&plan.incomes, &remote_incomes);
        plan.categories = merge_records(&plan.categories, &remote_categories);
        if let Err(err) = self.local.save_plan(month, &plan) {
            warn!(%month, %err, "persisting merged plan failed, keeping local plan");
            report.failed += 1;
        }
    }

    /// Pulls the month's remote transactions and stores each by id. Push
    /// already ran, so the fetched rows are authoritative.
    fn pull_transactions(&self, month: &Month, budget: &Budget, report: &mut SyncReport) {
        let (lo, hi) = month.date_bounds();
        let rows = match self.remote.list_transactions(budget.id, &lo, &hi) {
            Ok(rows) => rows,
            Err(err) => {
                warn!(%month, %err, "transaction pull failed, keeping local records");
                report.failed += 1;
                return;
            }
        };
        report.pulled += rows.len();
        for transaction in rows {
            if let Err(err) = self.save_pulled(&transaction) {
                warn!(id = %transaction.id, %err, "storing pulled transaction failed");
                report.failed += 1;
            }
        }
    }

    fn save_pulled(&self, transaction: &Transaction) -> Result<()> {
        self.local.save_transaction(transaction)
    }
}
