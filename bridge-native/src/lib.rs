//! Native Host Adapters
//!
//! Concrete implementations of the `bridge-traits` capabilities for native
//! and test hosts:
//!
//! - [`ReqwestHttpClient`] - HTTP transport over reqwest
//! - [`MemorySessionStore`] - volatile in-process session storage
//! - [`RecordingNavigator`] - navigation stub that records redirects
//!
//! Hosts embedding a real webview substitute their own `Navigator`.

pub mod http;
pub mod navigator;
pub mod session_store;

pub use http::ReqwestHttpClient;
pub use navigator::RecordingNavigator;
pub use session_store::MemorySessionStore;
