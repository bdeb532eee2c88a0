//! Recording Navigator
//!
//! Navigation stub for headless and test hosts. Records every redirect and
//! history replacement instead of driving a real window; hosts that embed a
//! webview implement `Navigator` against it directly.

use bridge_traits::navigation::Navigator;
use std::sync::Mutex;
use tracing::debug;

/// `Navigator` implementation that records navigation instead of performing it
#[derive(Debug)]
pub struct RecordingNavigator {
    current: Mutex<String>,
    redirects: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new(initial_url: impl Into<String>) -> Self {
        Self {
            current: Mutex::new(initial_url.into()),
            redirects: Mutex::new(Vec::new()),
        }
    }

    /// Simulate the user agent landing on `url` (e.g. a provider callback)
    pub fn set_current_url(&self, url: impl Into<String>) {
        match self.current.lock() {
            Ok(mut current) => *current = url.into(),
            Err(poisoned) => *poisoned.into_inner() = url.into(),
        }
    }

    /// The most recent redirect target, if any
    pub fn last_redirect(&self) -> Option<String> {
        match self.redirects.lock() {
            Ok(redirects) => redirects.last().cloned(),
            Err(poisoned) => poisoned.into_inner().last().cloned(),
        }
    }

    /// All redirect targets in order
    pub fn redirects(&self) -> Vec<String> {
        match self.redirects.lock() {
            Ok(redirects) => redirects.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Default for RecordingNavigator {
    fn default() -> Self {
        Self::new("https://localhost/")
    }
}

impl Navigator for RecordingNavigator {
    fn current_url(&self) -> String {
        match self.current.lock() {
            Ok(current) => current.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn redirect(&self, url: &str) {
        debug!(url = %url, "Recording redirect");
        match self.redirects.lock() {
            Ok(mut redirects) => redirects.push(url.to_string()),
            Err(poisoned) => poisoned.into_inner().push(url.to_string()),
        }
        self.set_current_url(url);
    }

    fn replace_history(&self, url: &str) {
        debug!(url = %url, "Replacing history entry");
        self.set_current_url(url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_updates_current_url() {
        let navigator = RecordingNavigator::new("https://game.example.com/");
        navigator.redirect("https://provider.example.com/authorize");

        assert_eq!(
            navigator.current_url(),
            "https://provider.example.com/authorize"
        );
        assert_eq!(navigator.redirects().len(), 1);
    }

    #[test]
    fn test_replace_history_does_not_count_as_redirect() {
        let navigator = RecordingNavigator::new("https://game.example.com/?code=abc");
        navigator.replace_history("https://game.example.com/");

        assert_eq!(navigator.current_url(), "https://game.example.com/");
        assert!(navigator.last_redirect().is_none());
    }
}
