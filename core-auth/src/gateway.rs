//! Authenticated Request Gateway
//!
//! Every API call that needs a session goes through here. The gateway
//! attaches the bearer token, and on a 401 performs exactly one refresh and
//! one retry. A second 401 surfaces as `AuthError::Authentication`; there is
//! no recursion and no third attempt.

use crate::error::{AuthError, Result};
use crate::flow::AuthFlow;
use crate::session::TokenStore;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Decoded response body
#[derive(Debug, Clone, PartialEq)]
pub enum ApiBody {
    Json(serde_json::Value),
    Text(String),
}

/// Response as seen by gateway callers
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: ApiBody,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Deserialize the JSON body into `T`
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        match &self.body {
            ApiBody::Json(value) => serde_json::from_value(value.clone())
                .map_err(|e| AuthError::MalformedResponse(e.to_string())),
            ApiBody::Text(_) => Err(AuthError::MalformedResponse(
                "expected a JSON body".to_string(),
            )),
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.body {
            ApiBody::Text(text) => Some(text),
            ApiBody::Json(_) => None,
        }
    }
}

/// Bearer-authenticated HTTP gateway with bounded 401 recovery
pub struct RequestGateway {
    http: Arc<dyn HttpClient>,
    store: TokenStore,
    auth: Arc<AuthFlow>,
}

impl RequestGateway {
    pub fn new(http: Arc<dyn HttpClient>, store: TokenStore, auth: Arc<AuthFlow>) -> Self {
        Self { http, store, auth }
    }

    /// Execute `request` with the current bearer token
    ///
    /// The gateway's token wins over any Authorization header already on the
    /// request. On 401 the session is refreshed once and the request retried
    /// once with whatever token the refresh produced.
    pub async fn send(&self, request: HttpRequest) -> Result<ApiResponse> {
        let token = self.store.load().access_token;
        let first = self.execute(request.clone(), token.as_deref()).await?;
        if first.status != 401 {
            return Self::decode(first);
        }

        debug!(url = %request.url, "Request unauthorized, refreshing session");
        self.auth.refresh().await?;

        let token = self.store.load().access_token;
        let second = self.execute(request, token.as_deref()).await?;
        if second.status == 401 {
            warn!("Request still unauthorized after refresh");
            return Err(AuthError::Authentication { status: 401 });
        }
        Self::decode(second)
    }

    /// GET convenience wrapper
    pub async fn get(&self, url: &str) -> Result<ApiResponse> {
        self.send(HttpRequest::new(HttpMethod::Get, url)).await
    }

    /// POST convenience wrapper with a JSON body
    pub async fn post_json<T: Serialize>(&self, url: &str, body: &T) -> Result<ApiResponse> {
        let request = HttpRequest::new(HttpMethod::Post, url)
            .json(body)
            .map_err(|e| AuthError::Transport(e.to_string()))?;
        self.send(request).await
    }

    async fn execute(
        &self,
        mut request: HttpRequest,
        token: Option<&str>,
    ) -> Result<HttpResponse> {
        if let Some(token) = token {
            request
                .headers
                .insert("Authorization".to_string(), format!("Bearer {}", token));
        }
        self.http
            .execute(request)
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))
    }

    fn decode(response: HttpResponse) -> Result<ApiResponse> {
        let body = if response.is_json() {
            match serde_json::from_slice(&response.body) {
                Ok(value) => ApiBody::Json(value),
                Err(e) => {
                    return Err(AuthError::MalformedResponse(format!(
                        "response declared JSON but body failed to parse: {}",
                        e
                    )))
                }
            }
        } else {
            ApiBody::Text(String::from_utf8_lossy(&response.body).into_owned())
        };
        Ok(ApiResponse {
            status: response.status,
            body,
        })
    }
}
