//! Synchronous key-value storage with session and durable lifetimes.

pub mod error;
pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub use error::StoreError;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

pub type Result<T> = std::result::Result<T, StoreError>;

/// String-keyed store. A missing key is `Ok(None)`, never an error.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn delete(&self, key: &str) -> Result<()>;
}

/// How long a stored value lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifetime {
    /// Cleared when the application session ends.
    Session,
    /// Survives indefinitely on the device.
    Durable,
}

impl std::str::FromStr for Lifetime {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "session" => Ok(Self::Session),
            "durable" => Ok(Self::Durable),
            other => Err(format!("unknown lifetime: {}", other)),
        }
    }
}

/// Both store lifetimes behind one handle, with JSON helpers.
#[derive(Clone)]
pub struct Storage {
    session: Arc<dyn KeyValueStore>,
    durable: Arc<dyn KeyValueStore>,
}

impl Storage {
    pub fn new(session: Arc<dyn KeyValueStore>, durable: Arc<dyn KeyValueStore>) -> Self {
        Self { session, durable }
    }

    /// Memory-backed storage for both lifetimes (for testing).
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    pub fn scope(&self, lifetime: Lifetime) -> &dyn KeyValueStore {
        match lifetime {
            Lifetime::Session => self.session.as_ref(),
            Lifetime::Durable => self.durable.as_ref(),
        }
    }

    pub fn get_json<T: DeserializeOwned>(&self, lifetime: Lifetime, key: &str) -> Result<Option<T>> {
        match self.scope(lifetime).get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn set_json<T: Serialize>(&self, lifetime: Lifetime, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.scope(lifetime).set(key, &raw)
    }

    pub fn delete(&self, lifetime: Lifetime, key: &str) -> Result<()> {
        self.scope(lifetime).delete(key)
    }
}
