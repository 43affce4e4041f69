//! Business logic: the state container and the pure derived-metric layer.

pub mod selectors;
pub mod store;

pub use store::{BudgetState, BudgetStore, CopyOptions, NewTransaction, SubscriberToken};
