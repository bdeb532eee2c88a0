//! Host Capability Traits
//!
//! Abstractions the session core is written against. Each host (native shell,
//! test harness, embedded webview) provides concrete implementations of these
//! traits, keeping the core free of platform-specific code:
//!
//! - [`http::HttpClient`] - async HTTP transport
//! - [`storage::SessionStore`] - tab-scoped volatile key-value storage
//! - [`navigation::Navigator`] - user-agent location control
//! - [`time::Clock`] - injectable time source

pub mod error;
pub mod http;
pub mod navigation;
pub mod storage;
pub mod time;

pub use error::{BridgeError, Result};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use navigation::Navigator;
pub use storage::SessionStore;
pub use time::{Clock, SystemClock};
