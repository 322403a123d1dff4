//! # Poll Display Cache
//!
//! The community contract stores a poll's question and tallies but not the option labels
//! or recipient addresses the creator typed in. The creating browser keeps them in a
//! key-value store so the poll list can show them later.
//!
//! This is a best-effort annotation, never a source of truth: another browser, cleared
//! storage or a poll created elsewhere all read back the two-option placeholder.

use std::cell::RefCell;
use std::collections::HashMap;

use lib_core::{AppError, Result};
use shared::PollDetails;
use tracing::{debug, warn};

/// String key-value storage (`localStorage` in the browser).
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// In-memory store for tests and for browsers without storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for std::rc::Rc<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

/// Options and recipients per `(community id, poll id)`.
#[derive(Debug, Clone)]
pub struct PollDisplayCache<S> {
    store: S,
}

impl<S: KeyValueStore> PollDisplayCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn key(community_id: u64, poll_id: u64) -> String {
        format!("poll-{}-{}", community_id, poll_id)
    }

    /// Remember the display metadata of a freshly created poll.
    pub fn save(&self, community_id: u64, poll_id: u64, details: &PollDetails) -> Result<()> {
        let key = Self::key(community_id, poll_id);
        let value = serde_json::to_string(details)
            .map_err(|e| AppError::Storage(format!("encoding {}: {}", key, e)))?;
        self.store.set(&key, &value)?;
        debug!(%key, options = details.options.len(), "poll details cached");
        Ok(())
    }

    /// Cached metadata, or `None` if nothing usable is stored.
    pub fn get(&self, community_id: u64, poll_id: u64) -> Option<PollDetails> {
        let key = Self::key(community_id, poll_id);
        let raw = match self.store.get(&key) {
            Ok(raw) => raw?,
            Err(err) => {
                warn!(%key, error = %err, "reading poll details failed");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(details) => Some(details),
            Err(err) => {
                warn!(%key, error = %err, "ignoring malformed poll details");
                None
            }
        }
    }

    /// Cached metadata, or the two-option placeholder.
    pub fn load(&self, community_id: u64, poll_id: u64) -> PollDetails {
        self.get(community_id, poll_id)
            .unwrap_or_else(PollDetails::placeholder)
    }
}
