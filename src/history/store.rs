use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use super::blob_store::BlobStore;
use super::record::{NewTranslation, TranslationRecord};
use crate::config::HistoryConfig;
use crate::error::StoreError;

/// Bounded, most-recent-first translation history mirrored to one blob key.
///
/// Every mutation runs under a single lock: the next sequence is built,
/// persisted, and only then published. A failed write leaves the previous
/// sequence in place.
pub struct HistoryStore {
    blobs: Arc<dyn BlobStore>,
    key: String,
    max_entries: usize,
    state: Mutex<HistoryState>,
}

#[derive(Debug, Default)]
struct HistoryState {
    records: Vec<TranslationRecord>,
    version: u64,
    last_id: u64,
}

impl HistoryState {
    fn commit(&mut self, records: Vec<TranslationRecord>) {
        self.last_id = self.last_id.max(max_numeric_id(&records));
        self.records = records;
        self.version += 1;
    }
}

/// Next id: current time in millis, kept above every id handed out so far.
/// Once the counter is exhausted, the first id from `millis` up that is not
/// in the current sequence is used.
fn next_id(state: &HistoryState, millis: u64) -> u64 {
    if let Some(next) = state.last_id.checked_add(1) {
        return millis.max(next);
    }

    let taken: HashSet<u64> = state
        .records
        .iter()
        .filter_map(|r| r.id.parse::<u64>().ok())
        .collect();
    let mut id = millis;
    while taken.contains(&id) {
        id = id.wrapping_add(1);
    }
    id
}

fn max_numeric_id(records: &[TranslationRecord]) -> u64 {
    records
        .iter()
        .filter_map(|r| r.id.parse::<u64>().ok())
        .max()
        .unwrap_or(0)
}

impl HistoryStore {
    pub fn new(blobs: Arc<dyn BlobStore>, config: &HistoryConfig) -> Self {
        Self {
            blobs,
            key: config.storage_key.clone(),
            max_entries: config.max_entries.max(1),
            state: Mutex::new(HistoryState::default()),
        }
    }

    /// Create the store and load whatever is persisted. A corrupt blob is
    /// logged and the store starts empty.
    pub async fn open(blobs: Arc<dyn BlobStore>, config: &HistoryConfig) -> Self {
        let store = Self::new(blobs, config);
        match store.load_all().await {
            Ok(records) => info!("Loaded {} translations from history", records.len()),
            Err(e) => error!("Error loading translations: {}", e),
        }
        store
    }

    /// Reload from persistence. On failure the in-memory sequence is untouched.
    pub async fn load_all(&self) -> Result<Vec<TranslationRecord>, StoreError> {
        let mut state = self.state.lock().await;

        let records = match self.blobs.get(&self.key).await? {
            None => Vec::new(),
            Some(raw) => {
                let mut records: Vec<TranslationRecord> = serde_json::from_str(&raw)?;
                let mut seen = HashSet::new();
                records.retain(|r| seen.insert(r.id.clone()));
                records.truncate(self.max_entries);
                records
            }
        };

        state.commit(records.clone());
        Ok(records)
    }

    /// Current in-memory sequence, most recent first
    pub async fn snapshot(&self) -> Vec<TranslationRecord> {
        self.state.lock().await.records.clone()
    }

    pub async fn version(&self) -> u64 {
        self.state.lock().await.version
    }

    pub async fn get(&self, id: &str) -> Option<TranslationRecord> {
        let state = self.state.lock().await;
        state.records.iter().find(|r| r.id == id).cloned()
    }

    /// Stamp `translation` with an id and timestamp and put it at the front,
    /// evicting the oldest entries beyond capacity.
    pub async fn append(&self, translation: NewTranslation) -> Result<TranslationRecord, StoreError> {
        let mut state = self.state.lock().await;

        let now = Utc::now();
        let millis = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        let id = next_id(&state, millis);
        let record = TranslationRecord::new(id.to_string(), now, translation);

        let mut next = Vec::with_capacity(self.max_entries);
        next.push(record.clone());
        next.extend(state.records.iter().take(self.max_entries - 1).cloned());

        if let Err(e) = self.persist(&next).await {
            error!("Error saving translation: {}", e);
            return Err(e);
        }

        state.commit(next);
        debug!("Saved translation {} ({} in history)", record.id, state.records.len());
        Ok(record)
    }

    /// Delete one record. Unknown ids are ignored.
    pub async fn remove(&self, id: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;

        if !state.records.iter().any(|r| r.id == id) {
            debug!("No translation with id {} to delete", id);
            return Ok(());
        }

        let next: Vec<TranslationRecord> = state
            .records
            .iter()
            .filter(|r| r.id != id)
            .cloned()
            .collect();

        if let Err(e) = self.persist(&next).await {
            error!("Error deleting translation: {}", e);
            return Err(e);
        }

        state.commit(next);
        debug!("Deleted translation {}", id);
        Ok(())
    }

    /// Drop all history and the persisted key itself
    pub async fn clear(&self) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;

        if let Err(e) = self.blobs.remove(&self.key).await {
            error!("Error clearing history: {}", e);
            return Err(e);
        }

        state.commit(Vec::new());
        info!("Cleared translation history");
        Ok(())
    }

    async fn persist(&self, records: &[TranslationRecord]) -> Result<(), StoreError> {
        let json = serde_json::to_string(records)
            .map_err(|e| StoreError::Persistence(e.to_string()))?;
        self.blobs.set(&self.key, &json).await
    }
}

impl std::fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryStore")
            .field("key", &self.key)
            .field("max_entries", &self.max_entries)
            .finish()
    }
}
