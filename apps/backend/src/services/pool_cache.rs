//! Fetch-once, consume-many cache over pools of generated content.
//!
//! A pool is loaded from the store or fetched from the provider in full,
//! then served locally by page or one item at a time until exhausted or
//! invalidated. Each fingerprint has its own async slot lock, so concurrent
//! readers of one fingerprint wait for the load already in flight instead of
//! issuing a second provider call.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex as AsyncMutex;
use tutor_core::paging::{page_count, page_slice};
use tutor_core::types::{ContentItem, Fingerprint};
use tutor_core::validation::validate_batch;

use super::provider::{ContentProvider, ProviderError};
use crate::store::{Lifetime, Storage};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("content fetch failed: {0}")]
    ContentFetchFailed(#[from] ProviderError),
}

pub type Result<T> = std::result::Result<T, CacheError>;

/// Idle topic pools kept in memory before they are evicted.
pub const MAX_TOPIC_POOLS: usize = 32;

#[derive(Debug, Clone)]
pub struct PoolSettings {
    /// Items requested from the provider per pool.
    pub pool_size: usize,
    /// Default page size when the caller does not give one.
    pub page_size: usize,
    /// Lifetime used for every persisted pool key.
    pub lifetime: Lifetime,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            pool_size: 50,
            page_size: 10,
            lifetime: Lifetime::Durable,
        }
    }
}

/// Pool record as written to the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredPool {
    pub fingerprint: Fingerprint,
    pub items: Vec<ContentItem>,
    pub fetched_at: DateTime<Utc>,
}

/// Observable state of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryState {
    Absent,
    Loading,
    Ready,
}

#[derive(Debug, Clone, Serialize)]
pub struct PoolStatus {
    pub state: EntryState,
    pub len: usize,
    pub cursor: usize,
    pub remaining: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PoolPage {
    pub items: Vec<ContentItem>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub total_pages: usize,
}

impl PoolPage {
    /// The pool itself held no items.
    pub fn is_empty_pool(&self) -> bool {
        self.total == 0
    }
}

struct LoadedPool {
    items: Vec<ContentItem>,
    /// Shuffled once at load; `get_next` walks items in this order.
    order: Vec<usize>,
    cursor: usize,
}

impl LoadedPool {
    fn new(items: Vec<ContentItem>) -> Self {
        let mut order: Vec<usize> = (0..items.len()).collect();
        order.shuffle(&mut rand::thread_rng());
        Self {
            items,
            order,
            cursor: 0,
        }
    }

    fn next(&mut self) -> Option<ContentItem> {
        let idx = *self.order.get(self.cursor)?;
        self.cursor += 1;
        self.items.get(idx).cloned()
    }
}

enum Slot {
    Absent,
    /// Dropped by invalidation or exhaustion; the next load skips the store.
    Invalidated,
    Ready(LoadedPool),
}

pub struct PoolCache {
    provider: Arc<dyn ContentProvider>,
    storage: Storage,
    settings: PoolSettings,
    slots: Mutex<HashMap<Fingerprint, Arc<AsyncMutex<Slot>>>>,
}

impl PoolCache {
    pub fn new(provider: Arc<dyn ContentProvider>, storage: Storage, settings: PoolSettings) -> Self {
        Self {
            provider,
            storage,
            settings,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    /// Items `[(page-1)*page_size, page*page_size)` of the pool, loading it
    /// first if needed. Out-of-range pages are empty, never an error.
    pub async fn get_page(
        &self,
        fingerprint: &Fingerprint,
        page: usize,
        page_size: Option<usize>,
    ) -> Result<PoolPage> {
        let page_size = page_size.unwrap_or(self.settings.page_size);
        let entry = self.slot(fingerprint);
        let mut slot = entry.lock().await;
        let pool = self.ensure_loaded(fingerprint, &mut slot).await?;

        Ok(PoolPage {
            items: page_slice(&pool.items, page, page_size).to_vec(),
            page,
            page_size,
            total: pool.items.len(),
            total_pages: page_count(pool.items.len(), page_size),
        })
    }

    /// Next item in shuffled order. When the pool is used up it is dropped
    /// and a fresh one is fetched before serving. `None` means the provider
    /// returned no usable items.
    pub async fn get_next(&self, fingerprint: &Fingerprint) -> Result<Option<ContentItem>> {
        let entry = self.slot(fingerprint);
        let mut slot = entry.lock().await;

        let pool = self.ensure_loaded(fingerprint, &mut slot).await?;
        if pool.items.is_empty() {
            return Ok(None);
        }
        if let Some(item) = pool.next() {
            return Ok(Some(item));
        }

        tracing::info!(%fingerprint, "pool exhausted, fetching a new one");
        self.drop_persisted(fingerprint);
        *slot = Slot::Invalidated;

        let pool = self.ensure_loaded(fingerprint, &mut slot).await?;
        Ok(pool.next())
    }

    /// Drop the pool so the next read fetches a new one. Waits for any load
    /// in flight for this fingerprint.
    pub async fn invalidate(&self, fingerprint: &Fingerprint) {
        let entry = self.slot(fingerprint);
        let mut slot = entry.lock().await;
        self.drop_persisted(fingerprint);
        *slot = Slot::Invalidated;
        drop(slot);
        tracing::info!(%fingerprint, "pool invalidated");

        if !fingerprint.is_persistable() {
            self.release(fingerprint, &entry);
        }
    }

    pub fn entry_state(&self, fingerprint: &Fingerprint) -> EntryState {
        self.status(fingerprint).state
    }

    pub fn status(&self, fingerprint: &Fingerprint) -> PoolStatus {
        let absent = PoolStatus {
            state: EntryState::Absent,
            len: 0,
            cursor: 0,
            remaining: 0,
        };
        let entry = {
            let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            match slots.get(fingerprint) {
                Some(entry) => entry.clone(),
                None => return absent,
            }
        };
        let guard = match entry.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                return PoolStatus {
                    state: EntryState::Loading,
                    len: 0,
                    cursor: 0,
                    remaining: 0,
                }
            }
        };
        match &*guard {
            Slot::Ready(pool) => PoolStatus {
                state: EntryState::Ready,
                len: pool.items.len(),
                cursor: pool.cursor,
                remaining: pool.items.len().saturating_sub(pool.cursor),
            },
            Slot::Absent | Slot::Invalidated => absent,
        }
    }

    /// Slot for `fingerprint`, created on first use. Creating a topic slot
    /// past [`MAX_TOPIC_POOLS`] evicts every topic slot nobody is using.
    fn slot(&self, fingerprint: &Fingerprint) -> Arc<AsyncMutex<Slot>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if !fingerprint.is_persistable() && !slots.contains_key(fingerprint) {
            let topics = slots.keys().filter(|fp| !fp.is_persistable()).count();
            if topics >= MAX_TOPIC_POOLS {
                // Only the map holds an idle slot, and new handles are only
                // handed out under this lock.
                slots.retain(|fp, entry| fp.is_persistable() || Arc::strong_count(entry) > 1);
                tracing::debug!(
                    evicted = topics - slots.keys().filter(|fp| !fp.is_persistable()).count(),
                    "evicted idle topic pools"
                );
            }
        }
        slots
            .entry(fingerprint.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(Slot::Absent)))
            .clone()
    }

    /// Forget `fingerprint`'s slot if `entry` is the only handle left
    /// outside the map.
    fn release(&self, fingerprint: &Fingerprint, entry: &Arc<AsyncMutex<Slot>>) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if Arc::strong_count(entry) == 2 {
            slots.remove(fingerprint);
        }
    }

    #[cfg(test)]
    fn slot_count(&self) -> usize {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    async fn ensure_loaded<'s>(
        &self,
        fingerprint: &Fingerprint,
        slot: &'s mut Slot,
    ) -> Result<&'s mut LoadedPool> {
        // An empty pool is a loaded pool; it is served until invalidated.
        if !matches!(slot, Slot::Ready(_)) {
            let skip_store = matches!(slot, Slot::Invalidated);
            let stored = if skip_store {
                None
            } else {
                self.load_persisted(fingerprint)
            };

            let items = match stored {
                Some(items) => items,
                None => {
                    let items = self.fetch(fingerprint).await?;
                    self.persist(fingerprint, &items);
                    items
                }
            };
            *slot = Slot::Ready(LoadedPool::new(items));
        }

        match slot {
            Slot::Ready(pool) => Ok(pool),
            Slot::Absent | Slot::Invalidated => unreachable!("slot loaded above"),
        }
    }

    async fn fetch(&self, fingerprint: &Fingerprint) -> Result<Vec<ContentItem>> {
        let request = fingerprint.request(self.settings.pool_size);
        let raw = self.provider.request(&request).await.map_err(|e| {
            tracing::warn!(%fingerprint, "provider request failed: {}", e);
            CacheError::ContentFetchFailed(e)
        })?;

        let received = raw.len();
        let batch = validate_batch(fingerprint.kind, raw);
        for reason in &batch.rejected {
            tracing::debug!(%fingerprint, "discarded invalid item: {}", reason);
        }
        tracing::info!(
            %fingerprint,
            received,
            valid = batch.items.len(),
            "fetched pool"
        );
        Ok(batch.items)
    }

    fn load_persisted(&self, fingerprint: &Fingerprint) -> Option<Vec<ContentItem>> {
        if !fingerprint.is_persistable() {
            return None;
        }
        let key = fingerprint.storage_key();
        match self
            .storage
            .get_json::<StoredPool>(self.settings.lifetime, &key)
        {
            Ok(Some(stored)) if !stored.items.is_empty() => {
                tracing::debug!(%fingerprint, len = stored.items.len(), "pool loaded from store");
                Some(stored.items)
            }
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(%fingerprint, "pool read failed, fetching instead: {}", e);
                None
            }
        }
    }

    fn persist(&self, fingerprint: &Fingerprint, items: &[ContentItem]) {
        if !fingerprint.is_persistable() || items.is_empty() {
            return;
        }
        let record = StoredPool {
            fingerprint: fingerprint.clone(),
            items: items.to_vec(),
            fetched_at: Utc::now(),
        };
        if let Err(e) = self
            .storage
            .set_json(self.settings.lifetime, &fingerprint.storage_key(), &record)
        {
            tracing::warn!(%fingerprint, "pool write failed, serving from memory: {}", e);
        }
    }

    fn drop_persisted(&self, fingerprint: &Fingerprint) {
        if !fingerprint.is_persistable() {
            return;
        }
        if let Err(e) = self
            .storage
            .delete(self.settings.lifetime, &fingerprint.storage_key())
        {
            tracing::warn!(%fingerprint, "pool delete failed: {}", e);
        }
    }
}
