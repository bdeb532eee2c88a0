//! Core Authentication Types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decoded snapshot of the tab-scoped session
///
/// Owned and cheap to drop; every consumer reloads from the store instead of
/// holding a snapshot across an await point.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Absolute expiry of the access token
    pub expiry: Option<DateTime<Utc>>,
    /// Whether a 2FA code was accepted in this tab
    pub two_factor_verified: bool,
    /// Temporary token issued by a successful 2FA verification
    pub two_factor_temp_token: Option<String>,
}

impl Session {
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

// Token material must never leak through Debug formatting into logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("expiry", &self.expiry)
            .field("two_factor_verified", &self.two_factor_verified)
            .field(
                "two_factor_temp_token",
                &self.two_factor_temp_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Display fields captured from the login callback
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub name: Option<String>,
    pub image: Option<String>,
}

/// UI locale, persisted per tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ko,
    Ja,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ko => "ko",
            Language::Ja => "ja",
        }
    }

    /// Parse a stored locale tag; unknown tags read as `None`
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "en" => Some(Language::En),
            "ko" => Some(Language::Ko),
            "ja" => Some(Language::Ja),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authentication state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AuthState {
    /// No session, no authorization code in the URL
    #[default]
    AnonymousNoCode,
    /// An authorization code was found and is about to be exchanged
    AnonymousWithCode,
    /// Code exchange in flight
    Authenticating,
    /// Valid tokens held
    Authenticated,
    /// A refresh failed; the session was cleared and a re-login is required
    RefreshFailed,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated)
    }
}

/// Two-factor sub-flow state
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TwoFactorState {
    /// The account has no authenticator enrolled
    #[default]
    NotEnabled,
    /// Enrollment started; the QR code awaits scanning
    PendingEnrollment { qr_url: String },
    /// An authenticator is enrolled but this tab has not verified yet
    EnabledUnverified,
    /// Verified in this tab; game entry is open
    EnabledVerified,
}

impl TwoFactorState {
    pub fn is_verified(&self) -> bool {
        matches!(self, TwoFactorState::EnabledVerified)
    }
}

/// Server-side 2FA status snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TwoFactorStatus {
    pub enabled: bool,
    pub verified: bool,
}
