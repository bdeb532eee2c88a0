//! In-Memory Session Storage
//!
//! Volatile by construction: values live in a process-local map and vanish
//! when the process exits, matching a browser tab's `sessionStorage`.

use bridge_traits::storage::SessionStore;
use std::collections::HashMap;
use std::sync::Mutex;

/// Tab-scoped volatile key-value store backed by a process-local map
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored
    pub fn len(&self) -> usize {
        match self.items.lock() {
            Ok(items) => items.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemorySessionStore {
    fn get_item(&self, key: &str) -> Option<String> {
        match self.items.lock() {
            Ok(items) => items.get(key).cloned(),
            Err(poisoned) => poisoned.into_inner().get(key).cloned(),
        }
    }

    fn set_item(&self, key: &str, value: &str) {
        match self.items.lock() {
            Ok(mut items) => {
                items.insert(key.to_string(), value.to_string());
            }
            Err(poisoned) => {
                poisoned
                    .into_inner()
                    .insert(key.to_string(), value.to_string());
            }
        }
    }

    fn remove_item(&self, key: &str) {
        match self.items.lock() {
            Ok(mut items) => {
                items.remove(key);
            }
            Err(poisoned) => {
                poisoned.into_inner().remove(key);
            }
        }
    }
}
