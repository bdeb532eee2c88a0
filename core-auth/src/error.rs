//! Authentication Error Types

use thiserror::Error;

/// Errors surfaced by the session core
///
/// Transport failures are kept distinct from authentication rejections: a
/// network outage must never be mistaken for an expired session.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The request never produced an HTTP response
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The server rejected our credentials, even after a refresh
    #[error("Authentication rejected with status {status}")]
    Authentication { status: u16 },

    /// A non-auth endpoint answered with a non-success status
    #[error("Request failed with status {status}")]
    RequestFailed { status: u16 },

    /// The login code exchange was rejected
    #[error("Login failed with status {status}")]
    LoginFailed { status: u16 },

    /// The server answered, but the body was not what the protocol promises
    #[error("Malformed server response: {0}")]
    MalformedResponse(String),

    /// Token refresh failed; the local session has been cleared
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    /// A 2FA code was rejected; session tokens are untouched
    #[error("2FA verification failed: {message}")]
    VerificationFailed { message: String },

    /// The server declined to reset 2FA
    #[error("2FA reset rejected: {message}")]
    ResetRejected { message: String },

    /// An operation that needs a session found none
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Session storage failed
    #[error("Storage failure: {0}")]
    Storage(String),

    /// A URL could not be parsed or built
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;
