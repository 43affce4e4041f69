//! Domain types for the budgeting core.

pub mod budget;
pub mod category;
pub mod common;
pub mod income;
pub mod month;
pub mod pattern;
pub mod plan;
pub mod settings;
pub mod transaction;

pub use budget::Budget;
pub use category::Category;
pub use common::{Identifiable, Syncable, LOCAL_OWNER_ID};
pub use income::Income;
pub use month::Month;
pub use pattern::{FrequentPattern, TransactionPattern};
pub use plan::MonthlyPlan;
pub use settings::Settings;
pub use transaction::{Transaction, MIN_DESCRIPTION_LEN};
