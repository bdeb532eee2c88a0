//! Session Persistence and Expiry Predicates
//!
//! `TokenStore` is the only writer of the tab-scoped store. Every key it
//! owns is listed below; nothing else in the workspace touches them, so a
//! `clear()` is guaranteed to leave no credential behind.

use crate::types::{Language, PlayerProfile, Session};
use bridge_traits::storage::SessionStore;
use bridge_traits::time::Clock;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const TOKEN_EXPIRY_KEY: &str = "tokenExpiry";
pub const TWO_FA_TOKEN_KEY: &str = "2FAToken";
pub const TWO_FA_VERIFIED_KEY: &str = "2FAVerified";
pub const PLAYER_NAME_KEY: &str = "playerName";
pub const PLAYER_IMAGE_KEY: &str = "playerImage";
pub const LANGUAGE_KEY: &str = "language";

/// Typed facade over the tab-scoped session store
///
/// All operations are synchronous and infallible: the store has
/// sessionStorage semantics, and a value that fails to decode reads as
/// absent rather than as an error.
#[derive(Clone)]
pub struct TokenStore {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
}

impl TokenStore {
    pub fn new(store: Arc<dyn SessionStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Current time from the injected clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Persist a token pair and its expiry
    ///
    /// Writes all three fields before returning, so a concurrent `load`
    /// observes either the old session or the new one, never a mix with a
    /// stale expiry.
    pub fn save(&self, access_token: &str, refresh_token: &str, ttl_seconds: i64) {
        let expiry = self.clock.now() + Duration::seconds(ttl_seconds);
        self.store.set_item(ACCESS_TOKEN_KEY, access_token);
        self.store.set_item(REFRESH_TOKEN_KEY, refresh_token);
        self.store
            .set_item(TOKEN_EXPIRY_KEY, &expiry.timestamp_millis().to_string());
        debug!(expiry = %expiry, "Session tokens stored");
    }

    /// Decode the current session snapshot
    pub fn load(&self) -> Session {
        let expiry = self
            .store
            .get_item(TOKEN_EXPIRY_KEY)
            .and_then(|raw| match raw.parse::<i64>() {
                Ok(millis) => Utc.timestamp_millis_opt(millis).single(),
                Err(_) => {
                    warn!("Stored token expiry is not a timestamp, treating as absent");
                    None
                }
            });

        let two_factor_verified = self
            .store
            .get_item(TWO_FA_VERIFIED_KEY)
            .and_then(|raw| serde_json::from_str::<bool>(&raw).ok())
            .unwrap_or(false);

        Session {
            access_token: self.store.get_item(ACCESS_TOKEN_KEY),
            refresh_token: self.store.get_item(REFRESH_TOKEN_KEY),
            expiry,
            two_factor_verified,
            two_factor_temp_token: self.store.get_item(TWO_FA_TOKEN_KEY),
        }
    }

    /// Wipe every credential and profile field
    pub fn clear(&self) {
        for key in [
            ACCESS_TOKEN_KEY,
            REFRESH_TOKEN_KEY,
            TOKEN_EXPIRY_KEY,
            TWO_FA_TOKEN_KEY,
            TWO_FA_VERIFIED_KEY,
            PLAYER_NAME_KEY,
            PLAYER_IMAGE_KEY,
        ] {
            self.store.remove_item(key);
        }
        debug!("Session cleared");
    }

    pub fn set_two_factor_verified(&self, verified: bool) {
        // JSON boolean encoding, matching how `load` decodes it
        self.store
            .set_item(TWO_FA_VERIFIED_KEY, if verified { "true" } else { "false" });
    }

    pub fn set_two_factor_temp_token(&self, token: &str) {
        self.store.set_item(TWO_FA_TOKEN_KEY, token);
    }

    /// Store display fields from the login callback
    pub fn set_profile(&self, profile: &PlayerProfile) {
        if let Ok(encoded) = serde_json::to_string(&profile.name) {
            self.store.set_item(PLAYER_NAME_KEY, &encoded);
        }
        if let Ok(encoded) = serde_json::to_string(&profile.image) {
            self.store.set_item(PLAYER_IMAGE_KEY, &encoded);
        }
    }

    pub fn profile(&self) -> PlayerProfile {
        let decode = |key: &str| {
            self.store
                .get_item(key)
                .and_then(|raw| serde_json::from_str::<Option<String>>(&raw).ok())
                .flatten()
        };
        PlayerProfile {
            name: decode(PLAYER_NAME_KEY),
            image: decode(PLAYER_IMAGE_KEY),
        }
    }

    pub fn set_language(&self, language: Language) {
        self.store.set_item(LANGUAGE_KEY, language.as_str());
    }

    /// Stored locale; unknown or missing tags fall back to the default
    pub fn language(&self) -> Language {
        self.store
            .get_item(LANGUAGE_KEY)
            .and_then(|raw| Language::parse(&raw))
            .unwrap_or_default()
    }
}

/// A session counts as authenticated while it holds an unexpired access token
pub fn is_authenticated(session: &Session, now: DateTime<Utc>) -> bool {
    match (&session.access_token, session.expiry) {
        (Some(_), Some(expiry)) => now < expiry,
        _ => false,
    }
}

/// Whether the access token has less than `threshold` of lifetime left
///
/// An absent expiry counts as expiring. Exactly `threshold` remaining does
/// not.
pub fn is_expiring_soon(session: &Session, now: DateTime<Utc>, threshold: Duration) -> bool {
    match session.expiry {
        Some(expiry) => expiry - now < threshold,
        None => true,
    }
}
