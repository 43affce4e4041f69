//! End-to-end persistence through the file-backed store: everything the
//! app writes must survive a process restart.

mod common;

use budgetbook::core::{BudgetStore, NewTransaction};
use budgetbook::domain::Month;
use budgetbook::storage::{JsonFileStore, LocalStore};
use budgetbook::StorageConfig;
use chrono::NaiveDate;
use tempfile::TempDir;

fn month() -> Month {
    "2025-08".parse().expect("valid month")
}

fn open_store(root: &TempDir) -> BudgetStore<JsonFileStore> {
    let backend = StorageConfig::with_root(root.path())
        .open_store()
        .expect("open file store");
    BudgetStore::new(LocalStore::new(backend))
}

#[test]
fn full_month_survives_a_restart() {
    common::init_tracing();
    let root = TempDir::new().expect("temp dir");

    let (category_id, txn_id) = {
        let mut store = open_store(&root);
        store.load_month(month());
        store.add_income("Salary", 2600.0).expect("income");
        let category = store
            .add_category("Groceries", 450.0, "#2a9d8f", Some("incl. market".into()))
            .expect("category");
        let txn = store
            .add_transaction(NewTransaction {
                category_id: Some(category),
                amount: 63.2,
                description: "Saturday market".into(),
                account: "bank".into(),
                is_unplanned: false,
                date: Some(NaiveDate::from_ymd_opt(2025, 8, 16).unwrap()),
            })
            .expect("transaction");
        (category, txn)
    };

    // Fresh process: reopen the same file and reload.
    let mut store = open_store(&root);
    store.load_month(month());
    let state = store.state();
    assert_eq!(state.incomes.len(), 1);
    assert_eq!(state.incomes[0].amount, 2600.0);
    assert_eq!(state.categories.len(), 1);
    assert_eq!(state.categories[0].id, category_id);
    assert_eq!(state.categories[0].notes.as_deref(), Some("incl. market"));
    let txn = state
        .transactions
        .iter()
        .find(|txn| txn.id == txn_id)
        .expect("transaction survives restart");
    assert_eq!(txn.amount, 63.2);
    assert_eq!(txn.category_id, Some(category_id));
}

#[test]
fn borrows_and_tombstones_survive_a_restart() {
    common::init_tracing();
    let root = TempDir::new().expect("temp dir");

    let (from, to, deleted_id) = {
        let mut store = open_store(&root);
        store.load_month(month());
        let from = store
            .add_category("Groceries", 300.0, "#2a9d8f", None)
            .expect("category");
        let to = store
            .add_category("Eating out", 100.0, "#e76f51", None)
            .expect("category");
        store
            .borrow_between_categories(from, to, 75.0)
            .expect("borrow");
        let txn = store
            .add_transaction(NewTransaction {
                category_id: Some(from),
                amount: 12.0,
                description: "Wrong entry".into(),
                account: "cash".into(),
                is_unplanned: false,
                date: Some(NaiveDate::from_ymd_opt(2025, 8, 3).unwrap()),
            })
            .expect("transaction");
        store.delete_transaction(txn).expect("delete");
        (from, to, txn)
    };

    let mut store = open_store(&root);
    store.load_month(month());
    let plan = store.state().plan();
    assert_eq!(plan.borrow_balance(), 0.0);
    assert_eq!(plan.category(from).expect("source").borrowed, -75.0);
    assert_eq!(plan.category(to).expect("target").borrowed, 75.0);

    let tombstone = store
        .state()
        .transactions
        .iter()
        .find(|txn| txn.id == deleted_id)
        .expect("tombstone survives restart");
    assert!(tombstone.deleted);
}

#[test]
fn stored_months_are_discoverable_after_restart() {
    common::init_tracing();
    let root = TempDir::new().expect("temp dir");
    {
        let mut store = open_store(&root);
        for raw in ["2025-06", "2025-07", "2025-08"] {
            store.load_month(raw.parse().expect("valid month"));
        }
    }
    let store = open_store(&root);
    let months: Vec<String> = store
        .local()
        .stored_months()
        .iter()
        .map(|month| month.to_string())
        .collect();
    assert_eq!(months, vec!["2025-06", "2025-07", "2025-08"]);
}
