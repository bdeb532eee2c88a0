//! Authentication Configuration

use chrono::Duration;

/// Endpoint layout and flow parameters
///
/// `Default` carries the deployment the client ships against; hosts with a
/// different backend origin override `base_url`.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Backend origin prefixed to every endpoint path; empty means same-origin
    pub base_url: String,
    /// Identity provider authorize endpoint
    pub authorize_url: String,
    /// OAuth scope requested from the provider
    pub oauth_scope: String,

    pub login_path: String,
    pub callback_path: String,
    pub refresh_path: String,
    pub logout_path: String,

    pub twofa_status_path: String,
    pub twofa_setup_path: String,
    pub twofa_verify_path: String,
    pub twofa_reset_path: String,

    /// Tokens with less remaining lifetime than this count as expiring
    pub expiry_threshold: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            authorize_url: "https://api.intra.42.fr/oauth/authorize".to_string(),
            oauth_scope: "public".to_string(),
            login_path: "/oauth/login".to_string(),
            callback_path: "/oauth/login/callback/".to_string(),
            refresh_path: "/oauth/token/refresh/".to_string(),
            logout_path: "/oauth/logout/".to_string(),
            twofa_status_path: "/twofa/status/".to_string(),
            twofa_setup_path: "/twofa/setup/".to_string(),
            twofa_verify_path: "/twofa/verify/".to_string(),
            twofa_reset_path: "/api/reset_2fa".to_string(),
            expiry_threshold: Duration::seconds(300),
        }
    }
}

impl AuthConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Absolute URL for an endpoint path
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
