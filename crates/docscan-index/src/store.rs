// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Key-value string store — the only durability mechanism behind the document
// index.

use std::collections::HashMap;
use std::sync::Mutex;

use docscan_core::error::{DocscanError, Result};

/// A persisted string-to-string map.
///
/// Implementations are synchronous; in an async context wrap calls in
/// `tokio::task::spawn_blocking` if the backend can stall.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, or `None` if it was never set.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Volatile store used by tests and as the fallback when no database can be
/// opened.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| DocscanError::Store("memory store lock poisoned".into()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| DocscanError::Store("memory store lock poisoned".into()))?;
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_key_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get("SAVED_PDFS").expect("get"), None);
    }

    #[test]
    fn set_replaces_value() {
        let store = MemoryStore::new();
        store.set("k", "one").expect("set");
        store.set("k", "two").expect("set");
        assert_eq!(store.get("k").expect("get").as_deref(), Some("two"));
    }
}
