//! Runtime Services
//!
//! Ambient infrastructure shared by the session core and its hosts:
//!
//! - [`events`] - broadcast event bus the UI layer subscribes to
//! - [`logging`] - tracing subscriber initialization

pub mod error;
pub mod events;
pub mod logging;

pub use error::{Result, RuntimeError};
pub use events::{AuthEvent, CoreEvent, EventBus, EventSeverity, TwoFactorEvent};
pub use logging::{init_logging, LogFormat, LoggingConfig};
