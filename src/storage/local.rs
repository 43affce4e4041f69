//! Typed record layer over the key-value primitive.
//!
//! Key layout: `plan:{month}` for the monthly bundle, `tx:{id}` for single
//! transactions, `txindex:{month}` for the per-month transaction id index,
//! plus `patterns`, `syncState`, and `settings` singletons.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::{Month, MonthlyPlan, Settings, Transaction, TransactionPattern};
use crate::errors::Result;

use super::{
    plan_key, tx_index_key, tx_key, KeyValueStore, PATTERNS_KEY, PLAN_PREFIX, SETTINGS_KEY,
    SYNC_STATE_KEY,
};

/// Sync bookkeeping: the last completed sync and the set of record ids
/// with unpushed local changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SyncState {
    #[serde(default)]
    pub last_sync: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pending_changes: Vec<Uuid>,
}

/// The Local Record Store. Reads never fail outward: a missing or corrupt
/// record degrades to its default value so the app keeps working offline.
pub struct LocalStore<S: KeyValueStore> {
    backend: S,
}

impl<S: KeyValueStore> LocalStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    // -- monthly plans -----------------------------------------------------

    pub fn load_plan(&self, month: &Month) -> MonthlyPlan {
        self.read_or_default(&plan_key(month))
    }

    /// Whether any plan has ever been stored for the month. Used to tell a
    /// never-seen month apart from an empty one.
    pub fn has_plan(&self, month: &Month) -> bool {
        matches!(self.backend.get(&plan_key(month)), Ok(Some(_)))
    }

    pub fn save_plan(&self, month: &Month, plan: &MonthlyPlan) -> Result<()> {
        self.write(&plan_key(month), plan)
    }

    /// Every month with a stored plan, discovered by key prefix.
    pub fn stored_months(&self) -> Vec<Month> {
        let keys = match self.backend.list_keys() {
            Ok(keys) => keys,
            Err(err) => {
                warn!(%err, "listing keys failed");
                return Vec::new();
            }
        };
        let mut months: Vec<Month> = keys
            .iter()
            .filter_map(|key| key.strip_prefix(PLAN_PREFIX))
            .filter_map(|raw| raw.parse().ok())
            .collect();
        months.sort();
        months
    }

    // -- transactions ------------------------------------------------------

    pub fn load_transaction(&self, id: Uuid) -> Option<Transaction> {
        self.read(&tx_key(id))
    }

    /// Persists a transaction and keeps the month index consistent: the id
    /// is added to the index of the month containing `date` (exactly once)
    /// and removed from a previous month's index when the date moved.
    pub fn save_transaction(&self, transaction: &Transaction) -> Result<()> {
        let month = Month::of_date(transaction.date);
        if let Some(existing) = self.load_transaction(transaction.id) {
            let old_month = Month::of_date(existing.date);
            if old_month != month {
                self.remove_from_index(&old_month, transaction.id)?;
            }
        }
        self.write(&tx_key(transaction.id), transaction)?;
        self.add_to_index(&month, transaction.id)
    }

    /// Tombstones a transaction in place. The key survives so the deletion
    /// can still be pushed and merged.
    pub fn delete_transaction(&self, id: Uuid) -> Result<Option<Transaction>> {
        match self.load_transaction(id) {
            Some(mut transaction) => {
                transaction.mark_deleted();
                self.write(&tx_key(id), &transaction)?;
                Ok(Some(transaction))
            }
            None => Ok(None),
        }
    }

    pub fn month_transaction_ids(&self, month: &Month) -> Vec<Uuid> {
        self.read_or_default(&tx_index_key(month))
    }

    /// All indexed transactions for the month, tombstones included; ids
    /// whose record vanished are skipped.
    pub fn load_transactions(&self, month: &Month) -> Vec<Transaction> {
        self.month_transaction_ids(month)
            .into_iter()
            .filter_map(|id| self.load_transaction(id))
            .collect()
    }

    fn add_to_index(&self, month: &Month, id: Uuid) -> Result<()> {
        let mut index = self.month_transaction_ids(month);
        if !index.contains(&id) {
            index.push(id);
            self.write(&tx_index_key(month), &index)?;
        }
        Ok(())
    }

    fn remove_from_index(&self, month: &Month, id: Uuid) -> Result<()> {
        let mut index = self.month_transaction_ids(month);
        let before = index.len();
        index.retain(|entry| *entry != id);
        if index.len() != before {
            self.write(&tx_index_key(month), &index)?;
        }
        Ok(())
    }

    // -- patterns ----------------------------------------------------------

    pub fn load_patterns(&self) -> Vec<TransactionPattern> {
        self.read_or_default(PATTERNS_KEY)
    }

    pub fn save_patterns(&self, patterns: &[TransactionPattern]) -> Result<()> {
        self.write(PATTERNS_KEY, &patterns)
    }

    // -- sync bookkeeping --------------------------------------------------

    pub fn sync_state(&self) -> SyncState {
        self.read_or_default(SYNC_STATE_KEY)
    }

    pub fn mark_pending(&self, ids: &[Uuid]) -> Result<()> {
        let mut state = self.sync_state();
        for id in ids {
            if !state.pending_changes.contains(id) {
                state.pending_changes.push(*id);
            }
        }
        self.write(SYNC_STATE_KEY, &state)
    }

    pub fn clear_pending(&self, ids: &[Uuid]) -> Result<()> {
        let mut state = self.sync_state();
        state.pending_changes.retain(|id| !ids.contains(id));
        self.write(SYNC_STATE_KEY, &state)
    }

    pub fn set_last_sync(&self, at: DateTime<Utc>) -> Result<()> {
        let mut state = self.sync_state();
        state.last_sync = Some(at);
        self.write(SYNC_STATE_KEY, &state)
    }

    // -- settings ----------------------------------------------------------

    pub fn load_settings(&self) -> Settings {
        self.read_or_default(SETTINGS_KEY)
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<()> {
        self.write(SETTINGS_KEY, settings)
    }

    // -- helpers -----------------------------------------------------------

    fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.backend.get(key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => Some(value),
                Err(err) => {
                    warn!(key, %err, "stored record unreadable, treating as missing");
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                warn!(key, %err, "read failed, treating as missing");
                None
            }
        }
    }

    fn read_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.read(key).unwrap_or_default()
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        debug!(key, "persisting record");
        self.backend.set(key, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Budget;
    use crate::storage::MemoryStore;
    use chrono::NaiveDate;

    fn store() -> LocalStore<MemoryStore> {
        LocalStore::new(MemoryStore::new())
    }

    fn month() -> Month {
        "2025-08".parse().expect("valid month")
    }

    fn sample_transaction(day: u32) -> Transaction {
        Transaction::new(
            Uuid::new_v4(),
            None,
            42.0,
            "Groceries",
            "bank",
            NaiveDate::from_ymd_opt(2025, 8, day).unwrap(),
        )
    }

    #[test]
    fn missing_plan_loads_as_default() {
        let store = store();
        let plan = store.load_plan(&month());
        assert!(plan.budget.is_none());
        assert!(!store.has_plan(&month()));
    }

    #[test]
    fn plan_roundtrip_and_month_discovery() {
        let store = store();
        let budget = Budget::new("owner", month(), "August");
        store
            .save_plan(&month(), &MonthlyPlan::with_budget(budget))
            .expect("save plan");
        assert!(store.has_plan(&month()));
        assert_eq!(store.stored_months(), vec![month()]);
    }

    #[test]
    fn saving_transaction_indexes_it_exactly_once() {
        let store = store();
        let txn = sample_transaction(5);
        store.save_transaction(&txn).expect("save");
        store.save_transaction(&txn).expect("save again");
        assert_eq!(store.month_transaction_ids(&month()), vec![txn.id]);
    }

    #[test]
    fn moving_a_transaction_reindexes_it() {
        let store = store();
        let mut txn = sample_transaction(5);
        store.save_transaction(&txn).expect("save");
        txn.date = NaiveDate::from_ymd_opt(2025, 9, 2).unwrap();
        store.save_transaction(&txn).expect("save moved");
        let september: Month = "2025-09".parse().expect("valid month");
        assert!(store.month_transaction_ids(&month()).is_empty());
        assert_eq!(store.month_transaction_ids(&september), vec![txn.id]);
    }

    #[test]
    fn delete_keeps_a_tombstone() {
        let store = store();
        let txn = sample_transaction(10);
        store.save_transaction(&txn).expect("save");
        let deleted = store
            .delete_transaction(txn.id)
            .expect("delete")
            .expect("existing record");
        assert!(deleted.deleted);
        assert!(deleted.updated_at >= txn.updated_at);
        // Key and index entry both survive for the merge.
        let stored = store.load_transaction(txn.id).expect("tombstone present");
        assert!(stored.deleted);
        assert_eq!(store.month_transaction_ids(&month()), vec![txn.id]);
    }

    #[test]
    fn pending_set_deduplicates_and_clears() {
        let store = store();
        let id = Uuid::new_v4();
        store.mark_pending(&[id]).expect("mark");
        store.mark_pending(&[id]).expect("mark again");
        assert_eq!(store.sync_state().pending_changes, vec![id]);
        store.clear_pending(&[id]).expect("clear");
        assert!(store.sync_state().pending_changes.is_empty());
    }

    #[test]
    fn corrupt_record_degrades_to_default() {
        let backend = MemoryStore::new();
        backend.set("syncState", "{broken").expect("seed garbage");
        let store = LocalStore::new(backend);
        assert_eq!(store.sync_state(), SyncState::default());
    }
}
