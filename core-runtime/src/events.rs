//! Event Bus
//!
//! Broadcast channel carrying authentication and 2FA state changes from the
//! session core to whatever renders them. Subscribers that fall behind drop
//! the oldest events (broadcast semantics); the core never blocks on a slow
//! UI.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Default buffer size for the event channel
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

/// Severity level of an event, for UI filtering and log forwarding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

/// Authentication lifecycle events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum AuthEvent {
    /// Login initiated; the user agent is being sent to the identity provider
    LoginStarted,
    /// Authorization code exchanged, tokens stored
    LoggedIn { player: Option<String> },
    /// Code exchange rejected by the backend
    LoginFailed { reason: String },
    /// A token refresh request is in flight
    TokenRefreshing,
    /// Refresh succeeded; new expiry window in seconds
    TokenRefreshed { expires_in: i64 },
    /// Refresh failed; the session has been cleared
    RefreshFailed { reason: String },
    /// Session ended locally (server revocation is best-effort)
    LoggedOut,
}

/// Two-factor authentication events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum TwoFactorEvent {
    /// Server-side 2FA status was fetched
    StatusFetched { enabled: bool, verified: bool },
    /// Enrollment started; a QR code is available for the authenticator app
    EnrollmentStarted,
    /// A TOTP code was accepted
    Verified,
    /// A TOTP code was rejected
    VerificationRejected { message: String },
    /// 2FA was reset; enrollment is open again
    Reset,
}

/// Top-level event type carried on the bus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    Auth(AuthEvent),
    TwoFactor(TwoFactorEvent),
}

impl CoreEvent {
    /// Severity of this event
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Auth(AuthEvent::LoginFailed { .. })
            | CoreEvent::Auth(AuthEvent::RefreshFailed { .. }) => EventSeverity::Error,
            CoreEvent::TwoFactor(TwoFactorEvent::VerificationRejected { .. }) => {
                EventSeverity::Warning
            }
            CoreEvent::Auth(AuthEvent::LoggedIn { .. })
            | CoreEvent::Auth(AuthEvent::LoggedOut)
            | CoreEvent::TwoFactor(TwoFactorEvent::Verified)
            | CoreEvent::TwoFactor(TwoFactorEvent::Reset) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }

    /// Human-readable description for logs
    pub fn description(&self) -> String {
        match self {
            CoreEvent::Auth(AuthEvent::LoginStarted) => "Login started".to_string(),
            CoreEvent::Auth(AuthEvent::LoggedIn { player }) => match player {
                Some(name) => format!("Logged in as {}", name),
                None => "Logged in".to_string(),
            },
            CoreEvent::Auth(AuthEvent::LoginFailed { reason }) => {
                format!("Login failed: {}", reason)
            }
            CoreEvent::Auth(AuthEvent::TokenRefreshing) => "Refreshing session".to_string(),
            CoreEvent::Auth(AuthEvent::TokenRefreshed { expires_in }) => {
                format!("Session refreshed, valid for {}s", expires_in)
            }
            CoreEvent::Auth(AuthEvent::RefreshFailed { reason }) => {
                format!("Session refresh failed: {}", reason)
            }
            CoreEvent::Auth(AuthEvent::LoggedOut) => "Logged out".to_string(),
            CoreEvent::TwoFactor(TwoFactorEvent::StatusFetched { enabled, verified }) => {
                format!("2FA status: enabled={}, verified={}", enabled, verified)
            }
            CoreEvent::TwoFactor(TwoFactorEvent::EnrollmentStarted) => {
                "2FA enrollment started".to_string()
            }
            CoreEvent::TwoFactor(TwoFactorEvent::Verified) => "2FA verified".to_string(),
            CoreEvent::TwoFactor(TwoFactorEvent::VerificationRejected { message }) => {
                format!("2FA verification rejected: {}", message)
            }
            CoreEvent::TwoFactor(TwoFactorEvent::Reset) => "2FA reset".to_string(),
        }
    }
}

/// Broadcast event bus
///
/// Cheap to clone; all clones share the same channel. Emitting with no
/// subscribers is not an error worth surfacing to callers, so producers
/// typically ignore the emit result.
///
/// # Example
///
/// ```ignore
/// use core_runtime::events::{CoreEvent, AuthEvent, EventBus};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
/// bus.emit(CoreEvent::Auth(AuthEvent::LoggedOut)).ok();
/// ```
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Create a bus with a custom channel buffer size
    pub fn new(buffer_size: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer_size);
        Self { sender }
    }

    /// Emit an event to all current subscribers
    ///
    /// Every event is also logged at its severity, so the trace stays
    /// complete even when nothing is subscribed. Returns the number of
    /// subscribers that received it, or an error when there are none.
    pub fn emit(
        &self,
        event: CoreEvent,
    ) -> std::result::Result<usize, broadcast::error::SendError<CoreEvent>> {
        match event.severity() {
            EventSeverity::Error => error!(event = %event.description(), "Core event"),
            EventSeverity::Warning => warn!(event = %event.description(), "Core event"),
            EventSeverity::Info => info!(event = %event.description(), "Core event"),
            EventSeverity::Debug => debug!(event = %event.description(), "Core event"),
        }
        self.sender.send(event)
    }

    /// Subscribe to all events emitted after this call
    pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}
