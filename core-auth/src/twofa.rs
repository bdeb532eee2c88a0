//! Two-Factor Authentication Flow
//!
//! Game entry is gated behind TOTP verification. This module drives the
//! server-side status check, enrollment (QR provisioning), code
//! verification, and reset. All requests go through the gateway so an
//! expired access token is refreshed transparently.

use crate::config::AuthConfig;
use crate::error::{AuthError, Result};
use crate::gateway::RequestGateway;
use crate::session::TokenStore;
use crate::types::{TwoFactorState, TwoFactorStatus};
use core_runtime::events::{CoreEvent, EventBus, TwoFactorEvent};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

#[derive(Debug, Default, Deserialize)]
struct StatusResponse {
    #[serde(default)]
    is_enabled: bool,
    #[serde(default)]
    is_verified: bool,
}

#[derive(Debug, Deserialize)]
struct SetupResponse {
    qr_url: Option<String>,
    secret: Option<String>,
}

#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    code: &'a str,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    #[serde(default)]
    success: bool,
    temp_token: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResetResponse {
    #[serde(default)]
    success: bool,
    message: Option<String>,
}

/// Material needed to enroll an authenticator app
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentData {
    /// otpauth:// provisioning URL rendered as a QR code
    pub qr_url: String,
    /// Manual-entry secret, when the server provides one
    pub secret: Option<String>,
}

/// 2FA status, enrollment, verification, and reset
pub struct TwoFactorFlow {
    gateway: Arc<RequestGateway>,
    store: TokenStore,
    config: AuthConfig,
    events: EventBus,
    state: RwLock<TwoFactorState>,
}

impl TwoFactorFlow {
    pub fn new(
        gateway: Arc<RequestGateway>,
        store: TokenStore,
        config: AuthConfig,
        events: EventBus,
    ) -> Self {
        Self {
            gateway,
            store,
            config,
            events,
            state: RwLock::new(TwoFactorState::NotEnabled),
        }
    }

    pub async fn state(&self) -> TwoFactorState {
        self.state.read().await.clone()
    }

    /// Fetch the server-side 2FA status
    ///
    /// Never fails: any transport or authentication problem degrades to
    /// `{enabled: false, verified: false}`, which the UI treats as
    /// "enrollment required". Failing closed here can never unlock the game.
    pub async fn fetch_status(&self) -> TwoFactorStatus {
        let url = self.config.endpoint(&self.config.twofa_status_path);
        let status = match self.gateway.get(&url).await {
            Ok(response) if response.is_success() => match response.json::<StatusResponse>() {
                Ok(body) => TwoFactorStatus {
                    enabled: body.is_enabled,
                    verified: body.is_verified,
                },
                Err(e) => {
                    warn!(error = %e, "2FA status body malformed, assuming not enabled");
                    TwoFactorStatus::default()
                }
            },
            Ok(response) => {
                warn!(status = response.status, "2FA status check rejected");
                TwoFactorStatus::default()
            }
            Err(e) => {
                warn!(error = %e, "2FA status check failed");
                TwoFactorStatus::default()
            }
        };

        self.apply_status(status).await;
        status
    }

    async fn apply_status(&self, status: TwoFactorStatus) {
        // keep the tab-local flag in sync so the entry gate agrees with
        // what the server just told us
        if status.verified {
            self.store.set_two_factor_verified(true);
        }
        let mut state = self.state.write().await;
        *state = match (status.enabled, status.verified) {
            // an enrollment this tab started stays pending until verified
            (false, _) => match &*state {
                TwoFactorState::PendingEnrollment { qr_url } => TwoFactorState::PendingEnrollment {
                    qr_url: qr_url.clone(),
                },
                _ => TwoFactorState::NotEnabled,
            },
            (true, false) => TwoFactorState::EnabledUnverified,
            (true, true) => TwoFactorState::EnabledVerified,
        };
        drop(state);
        self.events
            .emit(CoreEvent::TwoFactor(TwoFactorEvent::StatusFetched {
                enabled: status.enabled,
                verified: status.verified,
            }))
            .ok();
    }

    /// Start enrollment: obtain the provisioning QR for the authenticator app
    pub async fn begin_enrollment(&self) -> Result<EnrollmentData> {
        let url = self.config.endpoint(&self.config.twofa_setup_path);
        let response = self.gateway.get(&url).await?;
        if !response.is_success() {
            return Err(AuthError::RequestFailed {
                status: response.status,
            });
        }

        let setup: SetupResponse = response.json()?;
        let Some(qr_url) = setup.qr_url else {
            return Err(AuthError::MalformedResponse(
                "qr_url missing from enrollment response".to_string(),
            ));
        };

        *self.state.write().await = TwoFactorState::PendingEnrollment {
            qr_url: qr_url.clone(),
        };
        self.events
            .emit(CoreEvent::TwoFactor(TwoFactorEvent::EnrollmentStarted))
            .ok();
        info!("2FA enrollment started");

        Ok(EnrollmentData {
            qr_url,
            secret: setup.secret,
        })
    }

    /// Submit a TOTP code
    ///
    /// Success persists the temporary token and flips the verified flag.
    /// Rejection carries the server's message when it sent one; the session
    /// tokens are untouched either way, so the user can simply retry. A
    /// session lost underneath the request (failed refresh, credentials
    /// rejected twice) propagates as-is: that is a forced logout, not a bad
    /// code.
    pub async fn verify_code(&self, code: &str) -> Result<String> {
        let url = self.config.endpoint(&self.config.twofa_verify_path);
        // the server answers rejections with a non-2xx status and a JSON
        // verdict body, so the status code alone decides nothing here
        let verdict = match self.gateway.post_json(&url, &VerifyRequest { code }).await {
            Ok(response) => response.json::<VerifyResponse>().ok(),
            Err(
                e @ (AuthError::RefreshFailed(_)
                | AuthError::Authentication { .. }
                | AuthError::NotAuthenticated),
            ) => {
                warn!(error = %e, "2FA verification aborted, session no longer valid");
                return Err(e);
            }
            Err(e) => {
                warn!(error = %e, "2FA verification request failed");
                None
            }
        };

        let Some(verdict) = verdict else {
            return self.reject_verification(None).await;
        };

        if !verdict.success {
            return self.reject_verification(verdict.message).await;
        }

        let Some(temp_token) = verdict.temp_token else {
            return Err(AuthError::MalformedResponse(
                "temp_token missing from verification response".to_string(),
            ));
        };

        self.store.set_two_factor_temp_token(&temp_token);
        self.store.set_two_factor_verified(true);
        *self.state.write().await = TwoFactorState::EnabledVerified;
        self.events
            .emit(CoreEvent::TwoFactor(TwoFactorEvent::Verified))
            .ok();
        info!("2FA code accepted");

        Ok(temp_token)
    }

    async fn reject_verification(&self, message: Option<String>) -> Result<String> {
        let message = message.unwrap_or_else(|| "Verification failed".to_string());
        debug!(message = %message, "2FA code rejected");
        self.events
            .emit(CoreEvent::TwoFactor(TwoFactorEvent::VerificationRejected {
                message: message.clone(),
            }))
            .ok();
        Err(AuthError::VerificationFailed { message })
    }

    /// Reset 2FA for the account, re-opening enrollment
    pub async fn reset(&self) -> Result<()> {
        let url = self.config.endpoint(&self.config.twofa_reset_path);
        let response = self
            .gateway
            .send(bridge_traits::http::HttpRequest::new(
                bridge_traits::http::HttpMethod::Post,
                url,
            ))
            .await?;

        match response.json::<ResetResponse>() {
            Ok(outcome) if outcome.success => {
                self.store.set_two_factor_verified(false);
                *self.state.write().await = TwoFactorState::NotEnabled;
                self.events
                    .emit(CoreEvent::TwoFactor(TwoFactorEvent::Reset))
                    .ok();
                info!("2FA reset, enrollment re-opened");
                Ok(())
            }
            Ok(outcome) => Err(AuthError::ResetRejected {
                message: outcome
                    .message
                    .unwrap_or_else(|| "Failed to reset 2FA".to_string()),
            }),
            Err(_) if !response.is_success() => Err(AuthError::RequestFailed {
                status: response.status,
            }),
            Err(e) => Err(e),
        }
    }
}
