//! User-Agent Navigation Abstraction
//!
//! The login flow hands control to the identity provider with a hard
//! redirect and scrubs the authorization code out of the address bar after
//! consuming it. Both are host concerns, abstracted here.

/// Location control for the hosting user agent
pub trait Navigator: Send + Sync {
    /// The URL currently shown in the address bar
    fn current_url(&self) -> String;

    /// Navigate away to `url`, abandoning the current page
    fn redirect(&self, url: &str);

    /// Replace the current history entry with `url` without navigating
    ///
    /// Used to remove a consumed authorization code so that reload or
    /// back-navigation cannot replay it.
    fn replace_history(&self, url: &str);
}
