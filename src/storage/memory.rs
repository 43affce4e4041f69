//! In-memory key-value backend, the default for tests and fully offline use.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::errors::{BudgetError, Result};

use super::KeyValueStore;

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| BudgetError::Storage("memory store lock poisoned".into()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.lock()?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.lock()?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self.lock()?;
        entries.remove(key);
        Ok(())
    }

    fn list_keys(&self) -> Result<Vec<String>> {
        let entries = self.lock()?;
        Ok(entries.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_delete_roundtrip() {
        let store = MemoryStore::new();
        store.set("plan:2025-08", "{}").expect("set");
        assert_eq!(store.get("plan:2025-08").expect("get").as_deref(), Some("{}"));
        store.delete("plan:2025-08").expect("delete");
        assert_eq!(store.get("plan:2025-08").expect("get"), None);
    }

    #[test]
    fn list_keys_returns_everything() {
        let store = MemoryStore::new();
        store.set("plan:2025-07", "{}").expect("set");
        store.set("plan:2025-08", "{}").expect("set");
        store.set("settings", "{}").expect("set");
        let keys = store.list_keys().expect("list");
        assert_eq!(keys.len(), 3);
        assert!(keys.contains(&"plan:2025-07".to_string()));
    }
}
