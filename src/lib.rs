//! budgetbook
//!
//! Offline-first personal budgeting core. Budget data lives in a local
//! key-value store and keeps working with no connectivity; an optional
//! sync engine reconciles each month against a remote relational store
//! with per-record last-write-wins timestamps.

pub mod config;
pub mod core;
pub mod domain;
pub mod errors;
pub mod storage;
pub mod sync;

pub use config::StorageConfig;
pub use crate::core::{BudgetState, BudgetStore, CopyOptions, NewTransaction};
pub use domain::{
    Budget, Category, Income, Month, MonthlyPlan, Settings, Transaction, TransactionPattern,
};
pub use errors::{BudgetError, Result};
pub use storage::{JsonFileStore, KeyValueStore, LocalStore, MemoryStore};
pub use sync::{IdentityProvider, MemoryRemote, RemoteStore, SyncEngine, SyncReport};
