//! Authentication Flow
//!
//! Owns the login/refresh/logout lifecycle:
//!
//! 1. `begin_login` discovers the OAuth client parameters and hands the user
//!    agent to the identity provider.
//! 2. `extract_code` pulls the authorization code out of the callback URL
//!    exactly once and scrubs it from history.
//! 3. `complete_login` exchanges the code for tokens; a 2FA status check is
//!    always required afterwards regardless of what the server enforces.
//! 4. `refresh` is single-flight: concurrent callers share one network
//!    call's outcome. Any refresh failure clears the whole session.

use crate::config::AuthConfig;
use crate::error::{AuthError, Result};
use crate::session::{self, TokenStore};
use crate::types::{AuthState, PlayerProfile};
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use bridge_traits::navigation::Navigator;
use core_runtime::events::{AuthEvent, CoreEvent, EventBus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use url::{form_urlencoded, Url};

#[derive(Debug, Deserialize)]
struct DiscoveryResponse {
    client_id: String,
    redirect_uri: String,
}

#[derive(Debug, Default, Deserialize)]
struct CallbackUser {
    name: Option<String>,
    image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CallbackResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
    #[serde(default)]
    user: CallbackUser,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: String,
    refresh: Option<String>,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

/// What a completed login yields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    /// Always true: holding tokens never opens the game by itself
    pub requires_two_factor: bool,
    pub player: PlayerProfile,
}

/// Login, refresh, and logout state machine
pub struct AuthFlow {
    http: Arc<dyn HttpClient>,
    navigator: Arc<dyn Navigator>,
    store: TokenStore,
    config: AuthConfig,
    events: EventBus,
    state: RwLock<AuthState>,
    // Guards the refresh critical section; the only lock held across I/O
    refresh_lock: Mutex<()>,
}

impl AuthFlow {
    pub fn new(
        http: Arc<dyn HttpClient>,
        navigator: Arc<dyn Navigator>,
        store: TokenStore,
        config: AuthConfig,
        events: EventBus,
    ) -> Self {
        Self {
            http,
            navigator,
            store,
            config,
            events,
            state: RwLock::new(AuthState::AnonymousNoCode),
            refresh_lock: Mutex::new(()),
        }
    }

    pub async fn state(&self) -> AuthState {
        *self.state.read().await
    }

    async fn set_state(&self, next: AuthState) {
        *self.state.write().await = next;
    }

    /// Discover the OAuth client parameters and redirect to the provider
    ///
    /// Terminal from the caller's perspective: the user agent leaves the
    /// page and comes back through the callback URL.
    pub async fn begin_login(&self) -> Result<()> {
        let request = HttpRequest::new(
            HttpMethod::Get,
            self.config.endpoint(&self.config.login_path),
        );
        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        if !response.is_success() {
            warn!(status = response.status, "Login discovery rejected");
            return Err(AuthError::LoginFailed {
                status: response.status,
            });
        }

        let discovery: DiscoveryResponse = response
            .json()
            .map_err(|e| AuthError::MalformedResponse(e.to_string()))?;

        let mut authorize = Url::parse(&self.config.authorize_url)
            .map_err(|e| AuthError::InvalidUrl(e.to_string()))?;
        authorize
            .query_pairs_mut()
            .append_pair("client_id", &discovery.client_id)
            .append_pair("redirect_uri", &discovery.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.config.oauth_scope);

        self.events.emit(CoreEvent::Auth(AuthEvent::LoginStarted)).ok();
        info!("Redirecting to identity provider");
        self.navigator.redirect(authorize.as_str());
        Ok(())
    }

    /// Consume the authorization code from the current URL, if present
    ///
    /// The code is single-use: once read, the history entry is replaced with
    /// a scrubbed URL so reload or back-navigation cannot replay it.
    pub async fn extract_code(&self) -> Result<Option<String>> {
        let current = self.navigator.current_url();
        let url = Url::parse(&current).map_err(|e| AuthError::InvalidUrl(e.to_string()))?;

        let code = url
            .query_pairs()
            .find(|(key, _)| key == "code")
            .map(|(_, value)| value.into_owned());

        if code.is_some() {
            let mut scrubbed = url;
            scrubbed.set_query(None);
            scrubbed.set_path("/");
            self.navigator.replace_history(scrubbed.as_str());
            self.set_state(AuthState::AnonymousWithCode).await;
            debug!("Authorization code consumed and scrubbed from history");
        }

        Ok(code)
    }

    /// Exchange an authorization code for a token pair
    pub async fn complete_login(&self, code: &str) -> Result<LoginOutcome> {
        self.set_state(AuthState::Authenticating).await;

        match self.exchange_code(code).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.set_state(AuthState::AnonymousNoCode).await;
                self.events
                    .emit(CoreEvent::Auth(AuthEvent::LoginFailed {
                        reason: e.to_string(),
                    }))
                    .ok();
                Err(e)
            }
        }
    }

    async fn exchange_code(&self, code: &str) -> Result<LoginOutcome> {
        let encoded: String = form_urlencoded::byte_serialize(code.as_bytes()).collect();
        let url = format!(
            "{}?code={}",
            self.config.endpoint(&self.config.callback_path),
            encoded
        );

        let response = self
            .http
            .execute(HttpRequest::new(HttpMethod::Get, url))
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        if response.status != 200 {
            warn!(status = response.status, "Login code exchange rejected");
            return Err(AuthError::LoginFailed {
                status: response.status,
            });
        }

        let bundle: CallbackResponse = response
            .json()
            .map_err(|e| AuthError::MalformedResponse(e.to_string()))?;

        self.store
            .save(&bundle.access_token, &bundle.refresh_token, bundle.expires_in);
        let player = PlayerProfile {
            name: bundle.user.name,
            image: bundle.user.image,
        };
        self.store.set_profile(&player);
        self.set_state(AuthState::Authenticated).await;
        self.events
            .emit(CoreEvent::Auth(AuthEvent::LoggedIn {
                player: player.name.clone(),
            }))
            .ok();
        info!("Login completed, 2FA status check pending");

        Ok(LoginOutcome {
            requires_two_factor: true,
            player,
        })
    }

    /// Refresh the token pair, single-flight
    ///
    /// A caller records the access token it observed before taking the lock;
    /// if the token rotated while it waited, it adopts that outcome without
    /// a second network call. On failure the session is cleared entirely and
    /// the caller sees `RefreshFailed` (the UI treats it as a forced logout).
    pub async fn refresh(&self) -> Result<()> {
        let observed = self.store.load().access_token;
        let _guard = self.refresh_lock.lock().await;

        let session = self.store.load();
        if session.access_token != observed {
            return if session.access_token.is_some() {
                debug!("Adopting concurrent refresh result");
                Ok(())
            } else {
                Err(AuthError::RefreshFailed(
                    "session cleared by a concurrent refresh failure".to_string(),
                ))
            };
        }

        let Some(refresh_token) = session.refresh_token else {
            self.fail_refresh("no refresh token held").await;
            return Err(AuthError::NotAuthenticated);
        };

        self.events
            .emit(CoreEvent::Auth(AuthEvent::TokenRefreshing))
            .ok();
        debug!("Refreshing access token");

        let request = HttpRequest::new(
            HttpMethod::Post,
            self.config.endpoint(&self.config.refresh_path),
        )
        .json(&RefreshRequest {
            refresh: &refresh_token,
        })
        .map_err(|e| AuthError::Transport(e.to_string()))?;

        let outcome = match self.http.execute(request).await {
            Ok(response) if response.is_success() => {
                match response.json::<RefreshResponse>() {
                    Ok(bundle) => Ok(bundle),
                    Err(e) => Err(format!("refresh response malformed: {}", e)),
                }
            }
            Ok(response) => Err(format!("refresh endpoint returned {}", response.status)),
            Err(e) => Err(format!("transport failure: {}", e)),
        };

        match outcome {
            Ok(bundle) => {
                // The response replaces the whole pair. A server that omits
                // the rotated refresh token keeps the redeemed one valid.
                let next_refresh = bundle.refresh.unwrap_or(refresh_token);
                self.store.save(&bundle.access, &next_refresh, bundle.expires_in);
                self.set_state(AuthState::Authenticated).await;
                self.events
                    .emit(CoreEvent::Auth(AuthEvent::TokenRefreshed {
                        expires_in: bundle.expires_in,
                    }))
                    .ok();
                info!("Access token refreshed");
                Ok(())
            }
            Err(reason) => {
                self.fail_refresh(&reason).await;
                Err(AuthError::RefreshFailed(reason))
            }
        }
    }

    async fn fail_refresh(&self, reason: &str) {
        warn!(reason = %reason, "Token refresh failed, clearing session");
        self.store.clear();
        self.set_state(AuthState::RefreshFailed).await;
        self.events
            .emit(CoreEvent::Auth(AuthEvent::RefreshFailed {
                reason: reason.to_string(),
            }))
            .ok();
    }

    /// Refresh proactively when the access token is close to expiry
    ///
    /// Returns whether a refresh was performed.
    pub async fn refresh_if_expiring(&self) -> Result<bool> {
        let current = self.store.load();
        if session::is_expiring_soon(&current, self.store.now(), self.config.expiry_threshold) {
            self.refresh().await?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// End the session: best-effort server revocation, unconditional local clear
    pub async fn logout(&self) {
        if let Some(refresh_token) = self.store.load().refresh_token {
            let request = HttpRequest::new(
                HttpMethod::Post,
                self.config.endpoint(&self.config.logout_path),
            )
            .json(&RefreshRequest {
                refresh: &refresh_token,
            });

            match request {
                Ok(request) => {
                    if let Err(e) = self.http.execute(request).await {
                        warn!(error = %e, "Logout revocation failed, clearing locally anyway");
                    }
                }
                Err(e) => warn!(error = %e, "Could not build logout request"),
            }
        }

        self.store.clear();
        self.set_state(AuthState::AnonymousNoCode).await;
        self.events.emit(CoreEvent::Auth(AuthEvent::LoggedOut)).ok();
        info!("Logged out");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_native::{MemorySessionStore, RecordingNavigator};
    use bridge_traits::http::HttpResponse;
    use bridge_traits::time::Clock;
    use bytes::Bytes;
    use chrono::{DateTime, TimeZone, Utc};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    type Responder =
        Box<dyn Fn(&HttpRequest) -> bridge_traits::Result<HttpResponse> + Send + Sync>;

    struct ScriptedHttp {
        responder: Responder,
    }

    impl ScriptedHttp {
        fn new(
            responder: impl Fn(&HttpRequest) -> bridge_traits::Result<HttpResponse>
                + Send
                + Sync
                + 'static,
        ) -> Arc<Self> {
            Arc::new(Self {
                responder: Box::new(responder),
            })
        }
    }

    #[async_trait]
    impl HttpClient for ScriptedHttp {
        async fn execute(&self, request: HttpRequest) -> bridge_traits::Result<HttpResponse> {
            // Suspend once so concurrent callers interleave like real I/O
            tokio::task::yield_now().await;
            (self.responder)(&request)
        }
    }

    fn json_response(status: u16, body: serde_json::Value) -> HttpResponse {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        HttpResponse {
            status,
            headers,
            body: Bytes::from(body.to_string()),
        }
    }

    struct Harness {
        flow: AuthFlow,
        store: TokenStore,
        navigator: Arc<RecordingNavigator>,
    }

    fn harness(http: Arc<dyn HttpClient>, initial_url: &str) -> Harness {
        let navigator = Arc::new(RecordingNavigator::new(initial_url));
        let clock = Arc::new(FixedClock(Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()));
        let store = TokenStore::new(Arc::new(MemorySessionStore::new()), clock);
        let flow = AuthFlow::new(
            http,
            navigator.clone(),
            store.clone(),
            AuthConfig::default(),
            EventBus::default(),
        );
        Harness {
            flow,
            store,
            navigator,
        }
    }

    #[tokio::test]
    async fn test_begin_login_redirects_to_provider() {
        let http = ScriptedHttp::new(|request| {
            assert_eq!(request.url, "/oauth/login");
            Ok(json_response(
                200,
                serde_json::json!({"client_id": "cid", "redirect_uri": "https://game.example.com/"}),
            ))
        });
        let h = harness(http, "https://game.example.com/");

        h.flow.begin_login().await.unwrap();

        let target = h.navigator.last_redirect().unwrap();
        let url = Url::parse(&target).unwrap();
        assert!(target.starts_with("https://api.intra.42.fr/oauth/authorize?"));
        let pairs: HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs.get("client_id").map(String::as_str), Some("cid"));
        assert_eq!(pairs.get("response_type").map(String::as_str), Some("code"));
        assert_eq!(pairs.get("scope").map(String::as_str), Some("public"));
    }

    #[tokio::test]
    async fn test_begin_login_discovery_failure() {
        let http = ScriptedHttp::new(|_| Ok(json_response(500, serde_json::json!({}))));
        let h = harness(http, "https://game.example.com/");

        let err = h.flow.begin_login().await.unwrap_err();
        assert!(matches!(err, AuthError::LoginFailed { status: 500 }));
        assert!(h.navigator.last_redirect().is_none());
    }

    #[tokio::test]
    async fn test_extract_code_consumes_and_scrubs() {
        let http = ScriptedHttp::new(|_| panic!("no network expected"));
        let h = harness(
            http,
            "https://game.example.com/play?code=abc123&state=xyz#lobby",
        );

        let code = h.flow.extract_code().await.unwrap();
        assert_eq!(code.as_deref(), Some("abc123"));
        // path and query are gone; the fragment survives
        assert_eq!(h.navigator.current_url(), "https://game.example.com/#lobby");
        assert_eq!(h.flow.state().await, AuthState::AnonymousWithCode);

        // a second read finds nothing: the code is single-use
        assert_eq!(h.flow.extract_code().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_extract_code_absent() {
        let http = ScriptedHttp::new(|_| panic!("no network expected"));
        let h = harness(http, "https://game.example.com/");

        assert_eq!(h.flow.extract_code().await.unwrap(), None);
        assert_eq!(h.flow.state().await, AuthState::AnonymousNoCode);
    }

    #[tokio::test]
    async fn test_complete_login_persists_tokens_and_profile() {
        let http = ScriptedHttp::new(|request| {
            assert_eq!(request.url, "/oauth/login/callback/?code=abc123");
            Ok(json_response(
                200,
                serde_json::json!({
                    "access_token": "acc",
                    "refresh_token": "ref",
                    "expires_in": 7200,
                    "user": {"name": "alice", "image": "https://cdn/x.png"}
                }),
            ))
        });
        let h = harness(http, "https://game.example.com/");

        let outcome = h.flow.complete_login("abc123").await.unwrap();
        assert!(outcome.requires_two_factor);
        assert_eq!(outcome.player.name.as_deref(), Some("alice"));

        let session = h.store.load();
        assert_eq!(session.access_token.as_deref(), Some("acc"));
        assert_eq!(session.refresh_token.as_deref(), Some("ref"));
        assert!(session.expiry.is_some());
        assert_eq!(h.store.profile().name.as_deref(), Some("alice"));
        assert_eq!(h.flow.state().await, AuthState::Authenticated);
    }

    #[tokio::test]
    async fn test_complete_login_rejected_persists_nothing() {
        let http = ScriptedHttp::new(|_| {
            Ok(json_response(401, serde_json::json!({"detail": "bad code"})))
        });
        let h = harness(http, "https://game.example.com/");

        let err = h.flow.complete_login("stale").await.unwrap_err();
        assert!(matches!(err, AuthError::LoginFailed { status: 401 }));
        assert!(h.store.load().is_empty());
        assert_eq!(h.flow.state().await, AuthState::AnonymousNoCode);
    }

    #[tokio::test]
    async fn test_refresh_replaces_whole_pair() {
        let http = ScriptedHttp::new(|request| {
            assert_eq!(request.url, "/oauth/token/refresh/");
            let body: serde_json::Value =
                serde_json::from_slice(request.body.as_ref().unwrap()).unwrap();
            assert_eq!(body["refresh"], "old-refresh");
            Ok(json_response(
                200,
                serde_json::json!({"access": "new-access", "refresh": "new-refresh", "expires_in": 3600}),
            ))
        });
        let h = harness(http, "https://game.example.com/");
        h.store.save("old-access", "old-refresh", 60);

        h.flow.refresh().await.unwrap();

        let session = h.store.load();
        assert_eq!(session.access_token.as_deref(), Some("new-access"));
        assert_eq!(session.refresh_token.as_deref(), Some("new-refresh"));
        assert_eq!(h.flow.state().await, AuthState::Authenticated);
    }

    #[tokio::test]
    async fn test_refresh_keeps_redeemed_token_when_rotation_omitted() {
        let http = ScriptedHttp::new(|_| {
            Ok(json_response(
                200,
                serde_json::json!({"access": "new-access", "expires_in": 3600}),
            ))
        });
        let h = harness(http, "https://game.example.com/");
        h.store.save("old-access", "old-refresh", 60);

        h.flow.refresh().await.unwrap();
        assert_eq!(h.store.load().refresh_token.as_deref(), Some("old-refresh"));
    }

    #[tokio::test]
    async fn test_refresh_rejection_clears_session() {
        let http = ScriptedHttp::new(|_| {
            Ok(json_response(401, serde_json::json!({"detail": "revoked"})))
        });
        let h = harness(http, "https://game.example.com/");
        h.store.save("acc", "ref", 60);
        h.store.set_two_factor_verified(true);

        let err = h.flow.refresh().await.unwrap_err();
        assert!(matches!(err, AuthError::RefreshFailed(_)));

        let session = h.store.load();
        assert!(session.is_empty());
        assert!(!session.two_factor_verified);
        assert_eq!(h.flow.state().await, AuthState::RefreshFailed);
    }

    #[tokio::test]
    async fn test_refresh_transport_failure_clears_session() {
        let http = ScriptedHttp::new(|_| {
            Err(bridge_traits::BridgeError::OperationFailed(
                "connection refused".to_string(),
            ))
        });
        let h = harness(http, "https://game.example.com/");
        h.store.save("acc", "ref", 60);

        assert!(h.flow.refresh().await.is_err());
        assert!(h.store.load().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_without_session() {
        let http = ScriptedHttp::new(|_| panic!("no network expected"));
        let h = harness(http, "https://game.example.com/");

        let err = h.flow.refresh().await.unwrap_err();
        assert!(matches!(err, AuthError::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_share_one_network_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let http = ScriptedHttp::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(json_response(
                200,
                serde_json::json!({"access": "new-access", "refresh": "new-refresh", "expires_in": 3600}),
            ))
        });
        let h = harness(http, "https://game.example.com/");
        h.store.save("old-access", "old-refresh", 60);

        let (a, b) = tokio::join!(h.flow.refresh(), h.flow.refresh());
        a.unwrap();
        b.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.store.load().access_token.as_deref(), Some("new-access"));
    }

    #[tokio::test]
    async fn test_concurrent_refresh_failure_is_shared() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let http = ScriptedHttp::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(json_response(401, serde_json::json!({"detail": "revoked"})))
        });
        let h = harness(http, "https://game.example.com/");
        h.store.save("old-access", "old-refresh", 60);

        let (a, b) = tokio::join!(h.flow.refresh(), h.flow.refresh());
        assert!(a.is_err());
        assert!(b.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refresh_if_expiring() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let http = ScriptedHttp::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(json_response(
                200,
                serde_json::json!({"access": "a2", "refresh": "r2", "expires_in": 3600}),
            ))
        });
        let h = harness(http, "https://game.example.com/");

        // plenty of lifetime left: no call
        h.store.save("a1", "r1", 3600);
        assert!(!h.flow.refresh_if_expiring().await.unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        // inside the threshold: refreshed
        h.store.save("a1", "r1", 120);
        assert!(h.flow.refresh_if_expiring().await.unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_logout_clears_even_when_revocation_fails() {
        let http = ScriptedHttp::new(|request| {
            assert_eq!(request.url, "/oauth/logout/");
            Err(bridge_traits::BridgeError::OperationFailed(
                "server unreachable".to_string(),
            ))
        });
        let h = harness(http, "https://game.example.com/");
        h.store.save("acc", "ref", 3600);

        h.flow.logout().await;

        assert!(h.store.load().is_empty());
        assert_eq!(h.flow.state().await, AuthState::AnonymousNoCode);
    }
}
