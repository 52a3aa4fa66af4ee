//! Session-scoped cache for single-term lookups (dictionary, translation).

use std::sync::Arc;

use tutor_core::types::{ContentItem, ContentKind, ContentRequest, Level};
use tutor_core::validation::validate_item;

use super::pool_cache::{CacheError, Result};
use super::provider::ContentProvider;
use crate::store::{Lifetime, Storage};

pub struct LookupCache {
    provider: Arc<dyn ContentProvider>,
    storage: Storage,
}

impl LookupCache {
    pub fn new(provider: Arc<dyn ContentProvider>, storage: Storage) -> Self {
        Self { provider, storage }
    }

    pub fn supports(kind: ContentKind) -> bool {
        matches!(kind, ContentKind::DictionaryEntry | ContentKind::Translation)
    }

    /// Key for one lookup: `lookup:<kind>:<term>`.
    pub fn storage_key(kind: ContentKind, term: &str) -> String {
        format!("lookup:{}:{}", kind, term.trim())
    }

    /// Look up `term`, asking the provider for a single item on a miss.
    /// `None` means the provider had nothing usable for the term.
    pub async fn lookup(&self, kind: ContentKind, level: Level, term: &str) -> Result<Option<ContentItem>> {
        let key = Self::storage_key(kind, term);
        match self.storage.get_json::<ContentItem>(Lifetime::Session, &key) {
            Ok(Some(item)) => return Ok(Some(item)),
            Ok(None) => {}
            Err(e) => tracing::warn!(%key, "lookup read failed: {}", e),
        }

        let request = ContentRequest {
            kind,
            level,
            count: 1,
            topic: Some(term.trim().to_string()),
        };
        let items = self
            .provider
            .request(&request)
            .await
            .map_err(CacheError::ContentFetchFailed)?;

        let found = items
            .into_iter()
            .find_map(|item| validate_item(kind, item).ok());

        if let Some(item) = &found {
            if let Err(e) = self.storage.set_json(Lifetime::Session, &key, item) {
                tracing::warn!(%key, "lookup write failed: {}", e);
            }
        }
        Ok(found)
    }
}
