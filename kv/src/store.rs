//! Core KvStore implementation

use chrono::{DateTime, Local};
use eyre::{Context, Result};
use fs2::FileExt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::{KvBackend, VALUE_EXTENSION, validate_key};

/// Name of the advisory lock file inside the store directory
const LOCK_FILE: &str = ".lock";

/// Metadata for a single stored entry
#[derive(Debug, Clone)]
pub struct EntryMeta {
    /// Key name
    pub key: String,
    /// Size of the stored value in bytes
    pub size: u64,
    /// Last modification time
    pub modified: Option<DateTime<Local>>,
}

/// The main file-backed store
pub struct KvStore {
    /// Base path for storage
    base_path: PathBuf,
}

impl KvStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).context("Failed to create store directory")?;
        debug!(?base_path, "Opened kv store");
        Ok(Self { base_path })
    }

    fn value_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.{}", key, VALUE_EXTENSION))
    }

    /// Run `f` while holding the store's exclusive write lock
    fn with_lock<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let lock_path = self.base_path.join(LOCK_FILE);
        let lock = fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .context(format!("Failed to open lock file: {}", lock_path.display()))?;
        lock.lock_exclusive().context("Failed to acquire store lock")?;
        let result = f();
        fs2::FileExt::unlock(&lock).context("Failed to release store lock")?;
        result
    }

    /// List stored entries with size and modification time
    pub fn entries(&self) -> Result<Vec<EntryMeta>> {
        let mut entries = Vec::new();
        for key in self.keys()? {
            let meta = fs::metadata(self.value_path(&key))?;
            entries.push(EntryMeta {
                key,
                size: meta.len(),
                modified: meta.modified().ok().map(DateTime::<Local>::from),
            });
        }
        Ok(entries)
    }
}

impl KvBackend for KvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let path = self.value_path(key);
        if !path.exists() {
            debug!(%key, "get: key not found");
            return Ok(None);
        }
        let value = fs::read_to_string(&path).context(format!("Failed to read value: {}", path.display()))?;
        debug!(%key, len = value.len(), "get: hit");
        Ok(Some(value))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        let path = self.value_path(key);
        let tmp_path = self.base_path.join(format!(".{}.tmp", key));

        self.with_lock(|| {
            let mut tmp = fs::File::create(&tmp_path).context("Failed to create temp file")?;
            tmp.write_all(value.as_bytes())?;
            tmp.sync_all()?;
            fs::rename(&tmp_path, &path).context(format!("Failed to replace value: {}", path.display()))?;
            Ok(())
        })?;

        debug!(%key, len = value.len(), "set: stored");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        let path = self.value_path(key);
        self.with_lock(|| {
            if path.exists() {
                fs::remove_file(&path).context(format!("Failed to remove value: {}", path.display()))?;
                info!(%key, "Removed key");
            }
            Ok(())
        })
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();

        for entry in fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().map(|e| e != VALUE_EXTENSION).unwrap_or(true) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str())
                && validate_key(stem).is_ok()
            {
                keys.push(stem.to_string());
            }
        }

        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_get_overwrite() {
        let temp = TempDir::new().unwrap();
        let store = KvStore::open(temp.path()).unwrap();

        assert_eq!(store.get("state").unwrap(), None);

        store.set("state", r#"{"xp":10}"#).unwrap();
        assert_eq!(store.get("state").unwrap().as_deref(), Some(r#"{"xp":10}"#));

        store.set("state", r#"{"xp":20}"#).unwrap();
        assert_eq!(store.get("state").unwrap().as_deref(), Some(r#"{"xp":20}"#));
    }

    #[test]
    fn test_remove_and_list() {
        let temp = TempDir::new().unwrap();
        let store = KvStore::open(temp.path()).unwrap();

        store.set("b", "2").unwrap();
        store.set("a", "1").unwrap();
        assert_eq!(store.keys().unwrap(), vec!["a".to_string(), "b".to_string()]);

        store.remove("a").unwrap();
        store.remove("missing").unwrap();
        assert_eq!(store.keys().unwrap(), vec!["b".to_string()]);
        assert!(!temp.path().join("a.json").exists());
    }

    #[test]
    fn test_lock_and_temp_files_are_not_keys() {
        let temp = TempDir::new().unwrap();
        let store = KvStore::open(temp.path()).unwrap();

        store.set("only", "1").unwrap();
        fs::write(temp.path().join("notes.txt"), "ignored").unwrap();

        assert_eq!(store.keys().unwrap(), vec!["only".to_string()]);
        assert!(temp.path().join(LOCK_FILE).exists());
    }

    #[test]
    fn test_invalid_key_is_rejected() {
        let temp = TempDir::new().unwrap();
        let store = KvStore::open(temp.path()).unwrap();

        assert!(store.set("../escape", "x").is_err());
        assert!(store.get("a/b").is_err());
    }

    #[test]
    fn test_store_survives_reopen() {
        let temp = TempDir::new().unwrap();
        {
            let store = KvStore::open(temp.path()).unwrap();
            store.set("persisted", "yes").unwrap();
        }
        let store = KvStore::open(temp.path()).unwrap();
        assert_eq!(store.get("persisted").unwrap().as_deref(), Some("yes"));

        let entries = store.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].size, 3);
    }
}
