//! Tab-Scoped Session Storage Abstraction
//!
//! Mirrors the semantics of a browser's `sessionStorage`: a synchronous
//! string key-value store scoped to one tab, wiped when the tab closes.
//! Implementations must never persist values across a process restart.

/// Volatile string key-value store with sessionStorage semantics
///
/// All operations are synchronous and infallible: a missing key reads as
/// `None`, and writes either take effect or are silently dropped by hosts
/// that have run out of quota (matching the browser's degraded behavior).
pub trait SessionStore: Send + Sync {
    /// Read the value stored under `key`
    fn get_item(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value
    fn set_item(&self, key: &str, value: &str);

    /// Remove `key` and its value, if present
    fn remove_item(&self, key: &str);

    /// Check whether `key` currently holds a value
    fn has_item(&self, key: &str) -> bool {
        self.get_item(key).is_some()
    }
}
