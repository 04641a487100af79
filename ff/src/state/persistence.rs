//! Persistence adapter for garden progress and the task batch
//!
//! Reads fail soft: a missing, unreadable or malformed value loads as the
//! zero state (or an empty batch) and is logged, never propagated. Writes
//! overwrite unconditionally.

use std::sync::Arc;

use kvstore::KvBackend;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::domain::{ProgressionState, TaskBatch};

use super::messages::{StateError, StateResponse};

/// Storage key for the task batch; the suffix is the schema version
pub const TASKS_KEY: &str = "focusFlow_tasks_v7";

/// Storage key for garden progression
pub const GARDEN_KEY: &str = "focusFlow_gardenState_v7";

/// Typed load/save over a key-value backend
#[derive(Clone)]
pub struct GardenStore {
    backend: Arc<dyn KvBackend>,
}

impl GardenStore {
    pub fn new(backend: Arc<dyn KvBackend>) -> Self {
        Self { backend }
    }

    /// Last stored progression, or the zero state
    pub fn load_progress(&self) -> ProgressionState {
        debug!("load_progress: called");
        match self.read_json::<ProgressionState>(GARDEN_KEY) {
            Some(state) if state.is_normalized() => state,
            Some(state) => {
                warn!(?state, "Stored garden state violates invariants, starting from zero");
                ProgressionState::ZERO
            }
            None => ProgressionState::ZERO,
        }
    }

    pub fn save_progress(&self, state: &ProgressionState) -> StateResponse<()> {
        debug!(?state, "save_progress: called");
        self.write_json(GARDEN_KEY, state)
    }

    /// Last stored batch, or an empty one
    pub fn load_batch(&self) -> TaskBatch {
        debug!("load_batch: called");
        self.read_json::<TaskBatch>(TASKS_KEY).unwrap_or_default()
    }

    pub fn save_batch(&self, batch: &TaskBatch) -> StateResponse<()> {
        debug!(task_count = batch.len(), "save_batch: called");
        self.write_json(TASKS_KEY, batch)
    }

    /// Remove the stored batch entirely
    pub fn clear_batch(&self) -> StateResponse<()> {
        debug!("clear_batch: called");
        self.backend
            .remove(TASKS_KEY)
            .map_err(|e| StateError::Store(e.to_string()))?;
        info!("Cleared stored task batch");
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.backend.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(%key, "read_json: nothing stored");
                return None;
            }
            Err(e) => {
                warn!(%key, error = %e, "Failed to read stored value, using default");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(%key, error = %e, "Stored value is malformed, using default");
                None
            }
        }
    }

    fn write_json<T: Serialize>(&self, key: &str, value: &T) -> StateResponse<()> {
        let json = serde_json::to_string(value).map_err(|e| StateError::Serialization(e.to_string()))?;
        self.backend
            .set(key, &json)
            .map_err(|e| StateError::Store(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Task;
    use kvstore::{KvStore, MemoryStore};
    use tempfile::TempDir;

    fn memory() -> (Arc<MemoryStore>, GardenStore) {
        let backend = Arc::new(MemoryStore::new());
        let store = GardenStore::new(backend.clone());
        (backend, store)
    }

    #[test]
    fn test_progress_roundtrip() {
        let (_, store) = memory();
        let state = ProgressionState {
            xp: 120,
            stage: 3,
            cycle: 2,
        };
        store.save_progress(&state).unwrap();
        assert_eq!(store.load_progress(), state);
    }

    #[test]
    fn test_missing_progress_is_zero() {
        let (_, store) = memory();
        assert_eq!(store.load_progress(), ProgressionState::ZERO);
    }

    #[test]
    fn test_malformed_progress_is_zero() {
        let (backend, store) = memory();
        backend.set(GARDEN_KEY, "{not json").unwrap();
        assert_eq!(store.load_progress(), ProgressionState::ZERO);

        backend.set(GARDEN_KEY, r#"{"xp":-5,"stage":1,"cycle":0}"#).unwrap();
        assert_eq!(store.load_progress(), ProgressionState::ZERO);
    }

    #[test]
    fn test_out_of_range_progress_is_zero() {
        let (backend, store) = memory();
        backend.set(GARDEN_KEY, r#"{"xp":10,"stage":7,"cycle":0}"#).unwrap();
        assert_eq!(store.load_progress(), ProgressionState::ZERO);

        backend.set(GARDEN_KEY, r#"{"xp":300,"stage":0,"cycle":0}"#).unwrap();
        assert_eq!(store.load_progress(), ProgressionState::ZERO);
    }

    #[test]
    fn test_old_version_key_is_ignored() {
        let (backend, store) = memory();
        backend
            .set("focusFlow_gardenState_v6", r#"{"xp":10,"stage":1,"cycle":0}"#)
            .unwrap();
        assert_eq!(store.load_progress(), ProgressionState::ZERO);
    }

    #[test]
    fn test_batch_roundtrip_and_clear() {
        let (backend, store) = memory();
        let batch = TaskBatch::new(vec![Task::new("abc123", "Stretch", "1 min").with_reward(15)]);

        store.save_batch(&batch).unwrap();
        assert_eq!(store.load_batch(), batch);

        store.clear_batch().unwrap();
        assert_eq!(backend.get(TASKS_KEY).unwrap(), None);
        assert!(store.load_batch().is_empty());
    }

    #[test]
    fn test_malformed_batch_is_empty() {
        let (backend, store) = memory();
        backend.set(TASKS_KEY, r#"{"tasks": "nope"}"#).unwrap();
        assert!(store.load_batch().is_empty());
    }

    #[test]
    fn test_reads_legacy_browser_shape() {
        let (backend, store) = memory();
        backend
            .set(
                TASKS_KEY,
                r#"[{"id":"k3j9x0q2m","title":"Hít thở sâu","duration":"1 phút","completed":true,"xpReward":10,"difficulty":"easy"}]"#,
            )
            .unwrap();
        let batch = store.load_batch();
        assert_eq!(batch.len(), 1);
        assert!(batch.all_completed());
    }

    #[test]
    fn test_file_backend_roundtrip() {
        let temp = TempDir::new().unwrap();
        let store = GardenStore::new(Arc::new(KvStore::open(temp.path()).unwrap()));

        let state = ProgressionState {
            xp: 50,
            stage: 2,
            cycle: 0,
        };
        store.save_progress(&state).unwrap();

        let reopened = GardenStore::new(Arc::new(KvStore::open(temp.path()).unwrap()));
        assert_eq!(reopened.load_progress(), state);
    }
}
