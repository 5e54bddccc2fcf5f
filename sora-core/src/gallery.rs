//! Gallery Store — the persisted, newest-first list of generated videos.
//!
//! The whole collection is stored as one JSON array under a single key.
//! Every mutation rewrites that blob; the new collection is written first and
//! only swapped into memory once the write succeeded, so the stored and
//! in-memory lists never diverge.

use std::collections::HashSet;

use crate::config::DEFAULT_STORAGE_KEY;
use crate::error::SoraError;
use crate::kv::KeyValueStore;
use crate::models::VideoRecord;

pub struct GalleryStore<K: KeyValueStore> {
    store: K,
    key: String,
    records: Vec<VideoRecord>,
}

impl<K: KeyValueStore> GalleryStore<K> {
    /// Load the gallery stored under the default key.
    pub fn load(store: K) -> Self {
        Self::load_with_key(store, DEFAULT_STORAGE_KEY)
    }

    /// Load the gallery stored under `key`. Missing or malformed text yields
    /// an empty gallery; nothing is returned as an error.
    pub fn load_with_key(store: K, key: &str) -> Self {
        let records = match store.get(key) {
            None => Vec::new(),
            Some(text) => match serde_json::from_str::<Vec<VideoRecord>>(&text) {
                Ok(records) => dedupe(records),
                Err(e) => {
                    tracing::warn!(
                        "Stored gallery under '{}' is unreadable ({}), starting empty",
                        key,
                        e
                    );
                    Vec::new()
                }
            },
        };

        tracing::debug!("Loaded {} videos from '{}'", records.len(), key);

        Self {
            store,
            key: key.to_string(),
            records,
        }
    }

    /// Records, newest first.
    pub fn records(&self) -> &[VideoRecord] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&VideoRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Largest millisecond id in the gallery, if any id is numeric.
    pub fn newest_id_millis(&self) -> Option<i64> {
        self.records.iter().filter_map(VideoRecord::id_millis).max()
    }

    pub fn store(&self) -> &K {
        &self.store
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Prepend `record` and persist.
    pub fn add(&mut self, record: VideoRecord) -> Result<(), SoraError> {
        if self.get(&record.id).is_some() {
            return Err(SoraError::DuplicateId(record.id));
        }

        let mut next = Vec::with_capacity(self.records.len() + 1);
        next.push(record);
        next.extend(self.records.iter().cloned());

        self.commit(next)?;
        tracing::info!("Added video {} ({} total)", self.records[0].id, self.records.len());
        Ok(())
    }

    /// Drop the record with `id` and persist. Returns whether anything was
    /// removed; an unknown id leaves both memory and storage untouched.
    pub fn remove(&mut self, id: &str) -> Result<bool, SoraError> {
        if self.get(id).is_none() {
            tracing::debug!("Remove of unknown video {} ignored", id);
            return Ok(false);
        }

        let next: Vec<VideoRecord> = self.records.iter().filter(|r| r.id != id).cloned().collect();
        self.commit(next)?;
        tracing::info!("Removed video {} ({} left)", id, self.records.len());
        Ok(true)
    }

    fn commit(&mut self, next: Vec<VideoRecord>) -> Result<(), SoraError> {
        let text = serde_json::to_string(&next)?;
        self.store.set(&self.key, &text)?;
        self.records = next;
        Ok(())
    }
}

/// Keep the first (newest) occurrence of each id.
fn dedupe(records: Vec<VideoRecord>) -> Vec<VideoRecord> {
    let mut seen = HashSet::new();
    let before = records.len();
    let kept: Vec<VideoRecord> = records
        .into_iter()
        .filter(|r| seen.insert(r.id.clone()))
        .collect();
    if kept.len() != before {
        tracing::warn!("Dropped {} duplicate video ids from stored gallery", before - kept.len());
    }
    kept
}
