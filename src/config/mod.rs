//! Storage-location resolution for the file-backed store.

use std::path::PathBuf;

use crate::errors::Result;
use crate::storage::JsonFileStore;

const APP_DIR: &str = "budgetbook";
const STORE_FILE: &str = "store.json";

/// Where the local store lives on disk.
#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    /// Explicit root; when unset the platform data directory is used,
    /// falling back to the current directory.
    pub root: Option<PathBuf>,
}

impl StorageConfig {
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    pub fn store_path(&self) -> PathBuf {
        let base = self
            .root
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join(APP_DIR)))
            .unwrap_or_else(|| PathBuf::from(".").join(APP_DIR));
        base.join(STORE_FILE)
    }

    pub fn open_store(&self) -> Result<JsonFileStore> {
        JsonFileStore::open(self.store_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_root_is_honored() {
        use crate::storage::KeyValueStore;

        let temp = TempDir::new().expect("temp dir");
        let config = StorageConfig::with_root(temp.path());
        assert!(config.store_path().starts_with(temp.path()));
        let store = config.open_store().expect("open store");
        store.set("settings", "{}").expect("write");
        assert!(temp.path().join(STORE_FILE).exists());
    }
}
