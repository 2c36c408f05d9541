use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::record::{ActionRecord, Field, RecordPatch};
use crate::{Error, Result};

pub type ChangeListener = Arc<dyn Fn(&[Field], &ActionRecord) + Send + Sync>;

/// The persistent shared-record store, reduced to the three operations this
/// crate consumes. Last-write-wins; a single `update` call's field set is
/// applied atomically, nothing larger is.
///
/// Change notifications are expected per key, in order, at least once.
pub trait RecordStore {
    fn read(&self, key: &str) -> Result<ActionRecord>;

    /// Merge-updates the record under `key`, creating it from
    /// [`ActionRecord::default`] if absent.
    fn update(&self, key: &str, patch: RecordPatch) -> Result<()>;

    fn subscribe(&self, key: &str, on_change: ChangeListener);
}

/// In-process reference store. Notifications are dispatched synchronously
/// inside `update`, after all locks are released, so a listener is free to
/// call back into the store; a nested update completes (including its own
/// notifications) before the outer dispatch continues.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, ActionRecord>>,
    subscribers: Mutex<HashMap<String, Vec<ChangeListener>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn read(&self, key: &str) -> Result<ActionRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
            .ok_or_else(|| Error::MissingRecord(key.to_string()))
    }

    fn update(&self, key: &str, patch: RecordPatch) -> Result<()> {
        let (changed, after) = {
            let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
            let record = records.entry(key.to_string()).or_default();
            let changed = patch.apply(record);
            (changed, record.clone())
        };
        if changed.is_empty() {
            return Ok(());
        }

        let subscribers: Vec<ChangeListener> = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
            .unwrap_or_default();
        for subscriber in subscribers {
            subscriber(&changed, &after);
        }
        Ok(())
    }

    fn subscribe(&self, key: &str, on_change: ChangeListener) {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key.to_string())
            .or_default()
            .push(on_change);
    }
}
