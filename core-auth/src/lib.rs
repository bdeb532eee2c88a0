//! Session & Authentication Core
//!
//! Client-side session management for the game client: OAuth-derived token
//! lifecycle, expiry tracking, transparent single-flight refresh on 401, and
//! the 2FA gate in front of game entry.
//!
//! The core is written entirely against the `bridge-traits` capabilities, so
//! the same logic runs under a native shell, a headless test harness, or an
//! embedded webview.
//!
//! # Wiring
//!
//! ```ignore
//! use std::sync::Arc;
//! use bridge_native::{MemorySessionStore, RecordingNavigator, ReqwestHttpClient};
//! use bridge_traits::time::SystemClock;
//! use core_auth::{AuthConfig, AuthFlow, HomeGate, RequestGateway, TokenStore, TwoFactorFlow};
//! use core_runtime::events::EventBus;
//!
//! let http = Arc::new(ReqwestHttpClient::new());
//! let store = TokenStore::new(Arc::new(MemorySessionStore::new()), Arc::new(SystemClock));
//! let events = EventBus::default();
//! let config = AuthConfig::default().with_base_url("https://game.example.com");
//!
//! let flow = Arc::new(AuthFlow::new(
//!     http.clone(),
//!     Arc::new(RecordingNavigator::default()),
//!     store.clone(),
//!     config.clone(),
//!     events.clone(),
//! ));
//! let gateway = Arc::new(RequestGateway::new(http, store.clone(), flow.clone()));
//! let twofa = Arc::new(TwoFactorFlow::new(gateway, store.clone(), config, events));
//! let gate = HomeGate::new(flow, twofa, store);
//! ```

pub mod config;
pub mod error;
pub mod flow;
pub mod gate;
pub mod gateway;
pub mod session;
pub mod twofa;
pub mod types;

pub use config::AuthConfig;
pub use error::{AuthError, Result};
pub use flow::{AuthFlow, LoginOutcome};
pub use gate::{GameEntry, HomeGate, LoginGateState};
pub use gateway::{ApiBody, ApiResponse, RequestGateway};
pub use session::TokenStore;
pub use twofa::{EnrollmentData, TwoFactorFlow};
pub use types::{
    AuthState, Language, PlayerProfile, Session, TwoFactorState, TwoFactorStatus,
};
