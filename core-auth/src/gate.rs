//! Home Gate
//!
//! Orchestrates what the landing page does on load and when the user hits
//! "start game": resume a session, finish a login that came back from the
//! provider, and refuse game entry until 2FA is verified.

use crate::error::Result;
use crate::flow::AuthFlow;
use crate::session::{self, TokenStore};
use crate::twofa::TwoFactorFlow;
use crate::types::{Language, TwoFactorStatus};
use std::sync::Arc;
use tracing::{debug, info};

/// What the landing page must show after a load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginGateState {
    /// No session and no code: show the login button
    Anonymous,
    /// Logged in, but no authenticator enrolled yet
    EnrollmentRequired,
    /// Authenticator enrolled, this tab still needs a code
    VerificationRequired,
    /// Fully verified, game entry open
    Ready,
}

/// Verdict for a game-entry attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEntry {
    /// All checks passed
    Enter,
    /// Authenticated but unverified; carries the user-facing message
    TwoFactorRequired(String),
    /// Not authenticated; a login redirect has been initiated
    LoginRedirect,
}

/// Landing-page orchestrator
pub struct HomeGate {
    flow: Arc<AuthFlow>,
    twofa: Arc<TwoFactorFlow>,
    store: TokenStore,
}

impl HomeGate {
    pub fn new(flow: Arc<AuthFlow>, twofa: Arc<TwoFactorFlow>, store: TokenStore) -> Self {
        Self { flow, twofa, store }
    }

    /// Resolve the login state on page load
    ///
    /// An existing session goes straight to a 2FA status check. Otherwise a
    /// returning authorization code is exchanged; completing a login always
    /// leads to code verification, never directly into the game.
    pub async fn sync_login_state(&self) -> Result<LoginGateState> {
        let current = self.store.load();
        if session::is_authenticated(&current, self.store.now()) {
            debug!("Existing session found, checking 2FA status");
            let status = self.twofa.fetch_status().await;
            return Ok(Self::gate_from_status(status));
        }

        let Some(code) = self.flow.extract_code().await? else {
            return Ok(LoginGateState::Anonymous);
        };

        let outcome = self.flow.complete_login(&code).await?;
        info!("Login completed from callback, 2FA verification required");
        debug_assert!(outcome.requires_two_factor);
        Ok(LoginGateState::VerificationRequired)
    }

    fn gate_from_status(status: TwoFactorStatus) -> LoginGateState {
        match (status.enabled, status.verified) {
            (false, _) => LoginGateState::EnrollmentRequired,
            (true, false) => LoginGateState::VerificationRequired,
            (true, true) => LoginGateState::Ready,
        }
    }

    /// Decide whether the game may start right now
    pub async fn start_game(&self) -> Result<GameEntry> {
        let current = self.store.load();
        if !session::is_authenticated(&current, self.store.now()) {
            info!("Game entry attempted without a session, starting login");
            self.flow.begin_login().await?;
            return Ok(GameEntry::LoginRedirect);
        }

        if !current.two_factor_verified {
            debug!("Game entry refused: 2FA not verified in this tab");
            return Ok(GameEntry::TwoFactorRequired(two_factor_required_message(
                self.store.language(),
            )));
        }

        Ok(GameEntry::Enter)
    }
}

fn two_factor_required_message(language: Language) -> String {
    match language {
        Language::En => "Two-factor authentication is required to start the game.",
        Language::Ko => "게임을 시작하려면 2단계 인증이 필요합니다.",
        Language::Ja => "ゲームを開始するには二要素認証が必要です。",
    }
    .to_string()
}
