//! Local persistence: a string key-value primitive plus the typed record
//! layer (`LocalStore`) the rest of the crate talks to.

pub mod json_backend;
pub mod local;
pub mod memory;

use uuid::Uuid;

use crate::domain::Month;
use crate::errors::Result;

pub use json_backend::JsonFileStore;
pub use local::{LocalStore, SyncState};
pub use memory::MemoryStore;

/// Abstraction over the key-value primitive backing the record store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn delete(&self, key: &str) -> Result<()>;
    fn list_keys(&self) -> Result<Vec<String>>;
}

pub const PLAN_PREFIX: &str = "plan:";
pub const TX_PREFIX: &str = "tx:";
pub const TX_INDEX_PREFIX: &str = "txindex:";
pub const PATTERNS_KEY: &str = "patterns";
pub const SYNC_STATE_KEY: &str = "syncState";
pub const SETTINGS_KEY: &str = "settings";

pub fn plan_key(month: &Month) -> String {
    format!("{PLAN_PREFIX}{month}")
}

pub fn tx_key(id: Uuid) -> String {
    format!("{TX_PREFIX}{id}")
}

pub fn tx_index_key(month: &Month) -> String {
    format!("{TX_INDEX_PREFIX}{month}")
}
