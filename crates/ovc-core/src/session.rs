//! Bearer token storage and password-grant refresh.
//!
//! A [`Session`] is the only mutable state shared by every resource accessor of
//! a client. It is created once, authenticated once, and then refreshed in place
//! whenever the controller rejects the current token.
//!
//! Refreshes are single-flight: callers hand back the [`TokenSnapshot`] that was
//! rejected, and if another task has already replaced that token the refresh is
//! skipped and the newer token returned.

use crate::client::{OAUTH_CLIENT_ID, TOKEN_PATH};
use crate::transport::{read_response, ApiEndpoint};
use crate::{Error, Result};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Username/password pair used for the password grant.
pub struct Credentials {
    username: String,
    password: SecretString,
}

impl Credentials {
    /// Create credentials from a username and password.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// Login user name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }
}

impl Clone for Credentials {
    fn clone(&self) -> Self {
        Self {
            username: self.username.clone(),
            password: SecretString::from(self.password.expose_secret().to_owned()),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Token endpoint response.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Default)]
struct TokenState {
    token: Option<Arc<SecretString>>,
    generation: u64,
}

/// The token in force when a request was signed.
#[derive(Clone)]
pub struct TokenSnapshot {
    token: Option<Arc<SecretString>>,
    generation: u64,
}

impl TokenSnapshot {
    /// Value for the `Authorization` header, if a token has been obtained.
    #[must_use]
    pub fn bearer(&self) -> Option<String> {
        self.token
            .as_ref()
            .map(|token| format!("Bearer {}", token.expose_secret()))
    }

    /// Number of successful password grants that preceded this snapshot.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

impl fmt::Debug for TokenSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSnapshot")
            .field("present", &self.token.is_some())
            .field("generation", &self.generation)
            .finish()
    }
}

/// Authenticated connection state shared by all accessors of one client.
pub struct Session {
    endpoint: ApiEndpoint,
    credentials: Credentials,
    http: Client,
    token: RwLock<TokenState>,
    refresh_lock: Mutex<()>,
}

impl Session {
    /// Create an unauthenticated session.
    #[must_use]
    pub fn new(endpoint: ApiEndpoint, credentials: Credentials, http: Client) -> Self {
        Self {
            endpoint,
            credentials,
            http,
            token: RwLock::new(TokenState::default()),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Create a session and perform the initial password grant.
    ///
    /// # Errors
    ///
    /// Returns the transport or API error of the token request.
    pub async fn connect(
        endpoint: ApiEndpoint,
        credentials: Credentials,
        http: Client,
    ) -> Result<Self> {
        let session = Self::new(endpoint, credentials, http);
        session.authenticate().await?;
        Ok(session)
    }

    /// Controller endpoint this session talks to.
    #[must_use]
    pub fn endpoint(&self) -> &ApiEndpoint {
        &self.endpoint
    }

    /// Underlying HTTP client.
    #[must_use]
    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Credentials used for the password grant.
    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Perform a password grant and store the returned access token.
    ///
    /// # Errors
    ///
    /// Returns the transport, API or decode error of the token request unchanged;
    /// the previously stored token is kept in that case.
    pub async fn authenticate(&self) -> Result<()> {
        let _guard = self.refresh_lock.lock().await;
        self.exchange_password().await
    }

    /// The token to sign the next request with.
    pub async fn current_token(&self) -> TokenSnapshot {
        let state = self.token.read().await;
        TokenSnapshot {
            token: state.token.clone(),
            generation: state.generation,
        }
    }

    /// Replace the token rejected in `stale`, unless a concurrent caller already did.
    ///
    /// # Errors
    ///
    /// Returns the error of the password grant.
    pub async fn refresh(&self, stale: &TokenSnapshot) -> Result<TokenSnapshot> {
        let _guard = self.refresh_lock.lock().await;

        let current = self.current_token().await;
        if current.generation != stale.generation {
            debug!(
                generation = current.generation,
                "Token already refreshed by a concurrent request"
            );
            return Ok(current);
        }

        warn!("Token expired - requesting a new token");
        self.exchange_password().await?;
        Ok(self.current_token().await)
    }

    async fn exchange_password(&self) -> Result<()> {
        let url = self.endpoint.url(TOKEN_PATH, &[])?;
        let form = [
            ("username", self.credentials.username.as_str()),
            ("password", self.credentials.password.expose_secret()),
            ("grant_type", "password"),
        ];

        info!(username = %self.credentials.username, "Requesting OVC access token");

        let response = self
            .http
            .post(url)
            .basic_auth(OAUTH_CLIENT_ID, Some(""))
            .form(&form)
            .send()
            .await?;

        let body = read_response(response).await?;
        let token: TokenResponse = serde_json::from_slice(&body).map_err(|err| {
            Error::DecodeError(format!("Failed to parse OVC token response: {err}"))
        })?;

        let mut state = self.token.write().await;
        state.token = Some(Arc::new(SecretString::from(token.access_token)));
        state.generation += 1;
        Ok(())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("endpoint", &self.endpoint)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientConfig;
    use crate::transport::build_http_client;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_session(server: &MockServer) -> Session {
        let http = build_http_client(&ClientConfig::new(), None).unwrap();
        let endpoint = ApiEndpoint::from_host(server.uri()).unwrap();
        Session::new(endpoint, Credentials::new("user", "pass"), http)
    }

    #[tokio::test]
    async fn authenticate_stores_access_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .and(header("authorization", "Basic c2ltcGxpdml0eTo="))
            .and(body_string_contains("username=user"))
            .and(body_string_contains("password=pass"))
            .and(body_string_contains("grant_type=password"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "12345"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let session = test_session(&server);
        assert!(session.current_token().await.bearer().is_none());

        session.authenticate().await.unwrap();
        let token = session.current_token().await;
        assert_eq!(token.bearer().as_deref(), Some("Bearer 12345"));
        assert_eq!(token.generation(), 1);
    }

    #[tokio::test]
    async fn authenticate_failure_is_returned_unchanged() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "message": "Bad credentials"
            })))
            .mount(&server)
            .await;

        let session = test_session(&server);
        let err = session.authenticate().await.unwrap_err();
        assert_eq!(
            err,
            Error::Api {
                status: "400".to_string(),
                error: Some("invalid_grant".to_string()),
                message: "Bad credentials".to_string(),
            }
        );
        assert!(session.current_token().await.bearer().is_none());
    }

    #[tokio::test]
    async fn refresh_replaces_stale_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "first"
            })))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "second"
            })))
            .mount(&server)
            .await;

        let session = test_session(&server);
        session.authenticate().await.unwrap();
        let stale = session.current_token().await;

        let fresh = session.refresh(&stale).await.unwrap();
        assert_eq!(fresh.bearer().as_deref(), Some("Bearer second"));
        assert_eq!(fresh.generation(), 2);
    }

    #[tokio::test]
    async fn refresh_is_skipped_when_token_already_replaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "token"
            })))
            .expect(2)
            .mount(&server)
            .await;

        let session = test_session(&server);
        session.authenticate().await.unwrap();
        let stale = session.current_token().await;

        // The first refresh performs a grant, the second sees a newer generation.
        let first = session.refresh(&stale).await.unwrap();
        let second = session.refresh(&stale).await.unwrap();
        assert_eq!(first.generation(), 2);
        assert_eq!(second.generation(), 2);
    }

    #[test]
    fn credentials_debug_redacts_password() {
        let credentials = Credentials::new("admin", "hunter2");
        let rendered = format!("{credentials:?}");
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("hunter2"));
    }
}
