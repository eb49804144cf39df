//! Authenticated HTTP client
//!
//! Provides an HTTP client that handles:
//! - Bearer token attachment from the token store
//! - Coordinated token refresh when a request is rejected with 401/403
//! - Queueing of requests rejected while a refresh is in flight
//! - Session-end signalling when a refresh episode fails

use super::refresh::{RefreshCoordinator, RefreshLease, RefreshTicket};
use crate::error::{Error, Result};
use crate::session::{NoopObserver, SessionEndReason, SessionObserver};
use crate::token::{TokenPair, TokenStore};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL for all requests
    pub base_url: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Upper bound on a single refresh call
    pub refresh_timeout: Duration,
    /// Login endpoint path
    pub login_path: String,
    /// Refresh (reissue) endpoint path
    pub refresh_path: String,
    /// Default headers for all requests
    pub default_headers: HashMap<String, String>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(30),
            refresh_timeout: Duration::from_secs(10),
            login_path: "/auth/login".to_string(),
            refresh_path: "/auth/reissue".to_string(),
            default_headers: HashMap::new(),
            user_agent: format!("session-http/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the refresh call timeout
    pub fn refresh_timeout(mut self, timeout: Duration) -> Self {
        self.config.refresh_timeout = timeout;
        self
    }

    /// Set the login endpoint path
    pub fn login_path(mut self, path: impl Into<String>) -> Self {
        self.config.login_path = path.into();
        self
    }

    /// Set the refresh endpoint path
    pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
        self.config.refresh_path = path.into();
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Configuration for a single request
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Query parameters
    pub query: HashMap<String, String>,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// Request body (JSON)
    pub body: Option<Value>,
    /// Override timeout for this request
    pub timeout: Option<Duration>,
}

impl RequestConfig {
    /// Create a new request config
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Set timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// State of one logical request across its (at most two) attempts
#[derive(Debug)]
struct RequestContext {
    method: Method,
    path: String,
    config: RequestConfig,
    /// Access token the latest attempt carried
    sent_token: Option<String>,
    /// Set before the retry; a retried request never refreshes again
    already_retried: bool,
}

impl RequestContext {
    fn new(method: Method, path: &str, config: RequestConfig) -> Self {
        Self {
            method,
            path: path.to_string(),
            config,
            sent_token: None,
            already_retried: false,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReissueRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReissueResponse {
    access_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// HTTP client with bearer auth and coordinated token refresh
pub struct AuthenticatedHttpClient {
    client: Client,
    config: HttpClientConfig,
    store: Arc<dyn TokenStore>,
    observer: Arc<dyn SessionObserver>,
    refresh: RefreshCoordinator,
}

impl AuthenticatedHttpClient {
    /// Create a client over the given token store
    pub fn new(config: HttpClientConfig, store: Arc<dyn TokenStore>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self::with_client(client, config, store))
    }

    /// Create a client reusing an existing reqwest client
    pub fn with_client(
        client: Client,
        config: HttpClientConfig,
        store: Arc<dyn TokenStore>,
    ) -> Self {
        Self {
            client,
            config,
            store,
            observer: Arc::new(NoopObserver),
            refresh: RefreshCoordinator::new(),
        }
    }

    /// Set the receiver of the session-end signal
    #[must_use]
    pub fn with_observer(mut self, observer: impl SessionObserver + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    /// Get the client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Get the token store
    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    /// Whether a refresh is in flight
    pub fn is_refreshing(&self) -> bool {
        self.refresh.is_refreshing()
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        self.request(Method::GET, path, RequestConfig::default())
            .await
    }

    /// Make a POST request
    pub async fn post(&self, path: &str, body: Value) -> Result<Response> {
        self.request(Method::POST, path, RequestConfig::default().json(body))
            .await
    }

    /// Make a PUT request
    pub async fn put(&self, path: &str, body: Value) -> Result<Response> {
        self.request(Method::PUT, path, RequestConfig::default().json(body))
            .await
    }

    /// Make a PATCH request
    pub async fn patch(&self, path: &str, body: Value) -> Result<Response> {
        self.request(Method::PATCH, path, RequestConfig::default().json(body))
            .await
    }

    /// Make a DELETE request
    pub async fn delete(&self, path: &str) -> Result<Response> {
        self.request(Method::DELETE, path, RequestConfig::default())
            .await
    }

    /// Make a request, refreshing the access token once if it is rejected
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        config: RequestConfig,
    ) -> Result<Response> {
        let mut ctx = RequestContext::new(method, path, config);
        let token = self.store.access_token().await?;
        let response = self.send(&mut ctx, token).await?;

        match check_status(response).await {
            Err(err) if err.is_auth_failure() && !ctx.already_retried => {
                self.recover(ctx, err).await
            }
            other => other,
        }
    }

    /// Make a request and parse JSON response
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        config: RequestConfig,
    ) -> Result<T> {
        let response = self.request(method, path, config).await?;
        let json: T = response.json().await?;
        Ok(json)
    }

    /// Make a GET request and parse JSON response
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request_json(Method::GET, path, RequestConfig::default())
            .await
    }

    /// Log in and persist the returned token pair.
    ///
    /// Posts to `login_path` directly rather than through [`request`](Self::request),
    /// so rejected credentials surface as [`Error::Auth`] and never start a refresh.
    pub async fn login<B: Serialize + ?Sized>(&self, credentials: &B) -> Result<TokenPair> {
        let url = self.build_url(&self.config.login_path);
        let response = self
            .client
            .post(&url)
            .json(credentials)
            .send()
            .await
            .map_err(|e| self.transport_error(e, self.config.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::auth(format!(
                "Login request failed with status {}: {body}",
                status.as_u16()
            )));
        }

        let login: LoginResponse = response.json().await?;
        if login.access_token.is_empty() {
            return Err(Error::auth("Login response carried an empty access token"));
        }

        let tokens = TokenPair {
            access_token: login.access_token,
            refresh_token: login.refresh_token,
        };
        self.store.set_tokens(tokens.clone()).await?;
        info!("Logged in");
        Ok(tokens)
    }

    /// Forget the stored tokens
    pub async fn logout(&self) -> Result<()> {
        self.store.clear_tokens().await?;
        info!("Logged out");
        Ok(())
    }

    /// Whether a usable access token is stored
    pub async fn is_authenticated(&self) -> Result<bool> {
        Ok(self
            .store
            .access_token()
            .await?
            .is_some_and(|token| self.store.is_token_valid(&token)))
    }

    /// Handle a 401/403 on a first attempt
    async fn recover(&self, mut ctx: RequestContext, rejection: Error) -> Result<Response> {
        warn!(
            status = rejection.status(),
            "{} {} rejected, recovering credentials", ctx.method, ctx.path
        );

        if self.is_refresh_endpoint(&ctx.path) {
            self.clear_tokens_after_failure().await;
            self.notify_session_end(&SessionEndReason::RefreshRejected);
            return Err(rejection);
        }

        ctx.already_retried = true;

        let token = match self.store.access_token().await? {
            // Renewed since this request went out; no need for a new episode
            Some(current) if ctx.sent_token.as_deref() != Some(current.as_str()) => {
                debug!("Access token changed while request was in flight, retrying");
                current
            }
            _ => match self.refresh.begin() {
                RefreshTicket::Wait(pending) => {
                    debug!("Refresh in progress, queueing {} {}", ctx.method, ctx.path);
                    pending.wait().await?
                }
                RefreshTicket::Lead(lease) => self.run_refresh(lease).await?,
            },
        };

        let response = self.send(&mut ctx, Some(token)).await?;
        check_status(response).await
    }

    /// Lead one refresh episode and settle its lease on every path
    async fn run_refresh(&self, lease: RefreshLease<'_>) -> Result<String> {
        info!("Refreshing access token");

        let outcome = match self.refreshable_tokens().await {
            Ok(Some(tokens)) => self.reissue(&tokens).await.map_err(|e| {
                SessionEndReason::RefreshFailed {
                    message: e.to_string(),
                }
            }),
            Ok(None) => Err(SessionEndReason::MissingRefreshToken),
            Err(e) => Err(SessionEndReason::RefreshFailed {
                message: e.to_string(),
            }),
        };

        match outcome {
            Ok(access_token) => {
                let released = lease.succeed(&access_token);
                info!(released, "Access token refreshed");
                Ok(access_token)
            }
            Err(reason) => {
                self.clear_tokens_after_failure().await;
                let message = match &reason {
                    SessionEndReason::RefreshFailed { message } => message.clone(),
                    other => other.to_string(),
                };
                let released = lease.fail(&message);
                warn!(released, "Token refresh failed: {message}");
                self.notify_session_end(&reason);
                Err(Error::token_refresh(message))
            }
        }
    }

    /// Stored pair, if it carries a refresh token
    async fn refreshable_tokens(&self) -> Result<Option<TokenPair>> {
        Ok(self
            .store
            .tokens()
            .await?
            .filter(|pair| pair.refresh_token().is_some()))
    }

    /// Exchange the refresh token for a new access token and persist it.
    /// Goes straight to reqwest so a rejection here cannot recurse.
    async fn reissue(&self, tokens: &TokenPair) -> Result<String> {
        let Some(refresh_token) = tokens.refresh_token() else {
            return Err(Error::token_refresh("No refresh token stored"));
        };
        let url = self.build_url(&self.config.refresh_path);
        let timeout = self.config.refresh_timeout;

        let call = async {
            let response = self
                .client
                .post(&url)
                .json(&ReissueRequest { refresh_token })
                .timeout(timeout)
                .send()
                .await
                .map_err(|e| self.transport_error(e, timeout))?;
            let response = check_status(response).await?;
            let body: ReissueResponse = response.json().await?;
            Ok::<_, Error>(body.access_token)
        };

        let access_token = tokio::time::timeout(timeout, call)
            .await
            .map_err(|_| Error::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            })??;

        if access_token.is_empty() {
            return Err(Error::token_refresh(
                "Reissue response carried an empty access token",
            ));
        }

        // The refresh token is never rotated by a reissue
        self.store
            .set_tokens(tokens.with_access_token(access_token.as_str()))
            .await?;
        Ok(access_token)
    }

    async fn clear_tokens_after_failure(&self) {
        if let Err(e) = self.store.clear_tokens().await {
            warn!("Failed to clear tokens: {e}");
        }
    }

    fn notify_session_end(&self, reason: &SessionEndReason) {
        warn!(%reason, "Session ended");
        self.observer.session_ended(reason);
    }

    /// Send one attempt, attaching the bearer token when present
    async fn send(&self, ctx: &mut RequestContext, token: Option<String>) -> Result<Response> {
        let full_url = self.build_url(&ctx.path);
        let timeout = ctx.config.timeout.unwrap_or(self.config.timeout);

        // Build request
        let mut req = self.client.request(ctx.method.clone(), &full_url);

        // Add default headers
        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }

        // Add request-specific headers
        for (key, value) in &ctx.config.headers {
            req = req.header(key.as_str(), value.as_str());
        }

        // Add query parameters
        if !ctx.config.query.is_empty() {
            req = req.query(&ctx.config.query);
        }

        // Add body
        if let Some(ref body) = ctx.config.body {
            req = req.json(body);
        }

        req = req.timeout(timeout);

        if let Some(ref token) = token {
            req = req.bearer_auth(token);
        }
        ctx.sent_token = token;

        let response = req
            .send()
            .await
            .map_err(|e| self.transport_error(e, timeout))?;
        debug!(
            status = response.status().as_u16(),
            retried = ctx.already_retried,
            "{} {}",
            ctx.method,
            full_url
        );
        Ok(response)
    }

    fn transport_error(&self, error: reqwest::Error, timeout: Duration) -> Error {
        if error.is_timeout() {
            Error::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            }
        } else {
            Error::Http(error)
        }
    }

    /// Compared by path so an absolute URL matches a relative `refresh_path`
    fn is_refresh_endpoint(&self, path: &str) -> bool {
        url_path(&self.build_url(path)) == url_path(&self.build_url(&self.config.refresh_path))
    }

    /// Build full URL from path
    fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }

        match &self.config.base_url {
            Some(base) => {
                let base = base.trim_end_matches('/');
                let path = path.trim_start_matches('/');
                format!("{base}/{path}")
            }
            None => path.to_string(),
        }
    }
}

impl std::fmt::Debug for AuthenticatedHttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedHttpClient")
            .field("config", &self.config)
            .field("is_refreshing", &self.refresh.is_refreshing())
            .finish_non_exhaustive()
    }
}

/// Turn a non-2xx response into an `HttpStatus` error
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::http_status(status.as_u16(), body))
}

/// Path of an absolute or relative URL, without query and trailing slash
fn url_path(raw: &str) -> String {
    let path = match Url::parse(raw) {
        Ok(url) => url.path().to_string(),
        Err(_) => raw.split(['?', '#']).next().unwrap_or_default().to_string(),
    };
    format!("/{}", path.trim_matches('/'))
}
