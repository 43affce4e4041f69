//! File-backed key-value store: the whole map lives in one JSON document,
//! rewritten atomically via a temp file and rename.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::warn;

use crate::errors::{BudgetError, Result};

use super::KeyValueStore;

const TMP_SUFFIX: &str = "tmp";

pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Opens (or creates) the store at `path`. A missing file is an empty
    /// store; an unreadable or corrupt file degrades to empty with a
    /// warning rather than failing the caller.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let entries = match fs::read_to_string(&path) {
            Ok(data) => match serde_json::from_str(&data) {
                Ok(map) => map,
                Err(err) => {
                    warn!(path = %path.display(), %err, "store file corrupt, starting empty");
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| BudgetError::Storage("json store lock poisoned".into()))
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let json = serde_json::to_string_pretty(entries)?;
        let tmp = tmp_path(&self.path);
        write_file(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.lock()?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.lock()?;
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self.lock()?;
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }

    fn list_keys(&self) -> Result<Vec<String>> {
        let entries = self.lock()?;
        Ok(entries.keys().cloned().collect())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_file(path: &Path, data: &str) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in_temp_dir() -> (JsonFileStore, TempDir) {
        let temp = TempDir::new().expect("temp dir");
        let store = JsonFileStore::open(temp.path().join("store.json")).expect("open store");
        (store, temp)
    }

    #[test]
    fn persists_across_reopen() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("store.json");
        {
            let store = JsonFileStore::open(&path).expect("open store");
            store.set("tx:abc", r#"{"amount":10}"#).expect("set");
        }
        let reopened = JsonFileStore::open(&path).expect("reopen store");
        assert_eq!(
            reopened.get("tx:abc").expect("get").as_deref(),
            Some(r#"{"amount":10}"#)
        );
    }

    #[test]
    fn corrupt_file_degrades_to_empty() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("store.json");
        fs::write(&path, "not json at all").expect("write garbage");
        let store = JsonFileStore::open(&path).expect("open store");
        assert!(store.list_keys().expect("list").is_empty());
    }

    #[test]
    fn delete_removes_key() {
        let (store, _guard) = store_in_temp_dir();
        store.set("patterns", "[]").expect("set");
        store.delete("patterns").expect("delete");
        assert_eq!(store.get("patterns").expect("get"), None);
    }
}
