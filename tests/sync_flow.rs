//! Two-device sync scenarios through the public API: the budget store on
//! each device, one shared remote, push-then-pull reconciliation.

mod common;

use budgetbook::core::{BudgetStore, NewTransaction};
use budgetbook::domain::Month;
use budgetbook::storage::{LocalStore, MemoryStore};
use budgetbook::sync::{MemoryRemote, OfflineIdentity, StaticIdentity, SyncEngine};
use budgetbook::IdentityProvider;
use chrono::NaiveDate;

fn month() -> Month {
    "2025-08".parse().expect("valid month")
}

fn device() -> BudgetStore<MemoryStore> {
    let mut store = BudgetStore::new(LocalStore::new(MemoryStore::new()));
    store.load_month(month());
    store
}

fn sync(store: &BudgetStore<MemoryStore>, remote: &MemoryRemote, owner: &str) {
    SyncEngine::new(store.local(), remote)
        .full_sync(&month(), owner)
        .expect("sync");
}

fn transaction(category: Option<uuid::Uuid>, amount: f64, description: &str) -> NewTransaction {
    NewTransaction {
        category_id: category,
        amount,
        description: description.into(),
        account: "bank".into(),
        is_unplanned: false,
        date: Some(NaiveDate::from_ymd_opt(2025, 8, 11).unwrap()),
    }
}

#[test]
fn a_month_planned_offline_reaches_a_second_device() {
    common::init_tracing();
    let remote = MemoryRemote::new();

    let mut device_a = device();
    device_a.add_income("Salary", 3200.0).expect("income");
    let groceries = device_a
        .add_category("Groceries", 500.0, "#2a9d8f", None)
        .expect("category");
    device_a
        .add_transaction(transaction(Some(groceries), 82.5, "Weekly shop"))
        .expect("transaction");

    sync(&device_a, &remote, "alice");

    let mut device_b = device();
    sync(&device_b, &remote, "alice");
    device_b.load_month(month());

    let state = device_b.state();
    assert_eq!(state.incomes.len(), 1);
    assert_eq!(state.categories.len(), 1);
    assert_eq!(state.categories[0].name, "Groceries");
    assert_eq!(state.transactions.len(), 1);
    assert_eq!(state.transactions[0].description, "Weekly shop");
    // Both devices resolved the same budget.
    assert_eq!(
        device_b.state().budget.as_ref().expect("budget").id,
        device_a
            .local()
            .load_plan(&month())
            .budget
            .expect("budget")
            .id
    );
}

#[test]
fn concurrent_edits_resolve_to_the_latest_writer() {
    common::init_tracing();
    let remote = MemoryRemote::new();

    let mut device_a = device();
    let income = device_a.add_income("Salary", 3000.0).expect("income");
    sync(&device_a, &remote, "alice");

    let mut device_b = device();
    sync(&device_b, &remote, "alice");
    device_b.load_month(month());

    // A edits first, B edits later; B's write must win everywhere.
    device_a
        .update_income(income, "Salary", 3100.0)
        .expect("edit on A");
    std::thread::sleep(std::time::Duration::from_millis(5));
    device_b
        .update_income(income, "Salary", 3300.0)
        .expect("edit on B");

    sync(&device_a, &remote, "alice");
    sync(&device_b, &remote, "alice");
    sync(&device_a, &remote, "alice");
    device_a.load_month(month());
    device_b.load_month(month());

    assert_eq!(device_a.state().incomes[0].amount, 3300.0);
    assert_eq!(device_b.state().incomes[0].amount, 3300.0);
}

#[test]
fn deleting_on_one_device_tombstones_on_the_other() {
    common::init_tracing();
    let remote = MemoryRemote::new();

    let mut device_a = device();
    let txn = device_a
        .add_transaction(transaction(None, 19.0, "Impulse buy"))
        .expect("transaction");
    sync(&device_a, &remote, "alice");

    let mut device_b = device();
    sync(&device_b, &remote, "alice");
    device_b.load_month(month());
    assert_eq!(device_b.state().transactions.len(), 1);

    device_a.delete_transaction(txn).expect("delete");
    sync(&device_a, &remote, "alice");
    sync(&device_b, &remote, "alice");
    device_b.load_month(month());

    let tombstone = device_b
        .state()
        .transactions
        .iter()
        .find(|candidate| candidate.id == txn)
        .expect("tombstone pulled");
    assert!(tombstone.deleted);
    // Derived totals no longer count it.
    assert_eq!(
        budgetbook::core::selectors::total_spent(&device_b.state().transactions),
        0.0
    );
}

#[test]
fn unauthenticated_devices_never_touch_the_remote() {
    common::init_tracing();
    let remote = MemoryRemote::new();
    let mut store = device();
    store.add_income("Salary", 1000.0).expect("income");

    let engine = SyncEngine::new(store.local(), &remote);
    let outcome = engine
        .sync_with_identity(&month(), &OfflineIdentity)
        .expect("offline no-op");
    assert!(outcome.is_none());
    assert_eq!(remote.budget_count(), 0);

    let identity = StaticIdentity("alice".into());
    assert_eq!(identity.owner_id().as_deref(), Some("alice"));
    let report = engine
        .sync_with_identity(&month(), &identity)
        .expect("online sync")
        .expect("report");
    assert!(report.pushed >= 1);
    assert_eq!(remote.budget_count(), 1);
}

#[test]
fn borrow_invariant_holds_after_cross_device_merge() {
    common::init_tracing();
    let remote = MemoryRemote::new();

    let mut device_a = device();
    let from = device_a
        .add_category("Groceries", 400.0, "#2a9d8f", None)
        .expect("category");
    let to = device_a
        .add_category("Eating out", 150.0, "#e76f51", None)
        .expect("category");
    sync(&device_a, &remote, "alice");

    let mut device_b = device();
    sync(&device_b, &remote, "alice");
    device_b.load_month(month());

    device_b
        .borrow_between_categories(from, to, 100.0)
        .expect("borrow");
    sync(&device_b, &remote, "alice");
    sync(&device_a, &remote, "alice");
    device_a.load_month(month());

    let plan = device_a.state().plan();
    assert_eq!(plan.borrow_balance(), 0.0);
    assert_eq!(plan.category(from).expect("source").borrowed, -100.0);
    assert_eq!(plan.category(to).expect("target").borrowed, 100.0);
}
