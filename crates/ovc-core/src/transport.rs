//! Request execution and status classification.
//!
//! [`Transport`] signs requests with the session's bearer token, sends them, and
//! sorts responses into success bodies and structured [`Error::Api`] values. When
//! the controller answers with `invalid_token` the session is refreshed and the
//! request retried exactly once; no other failure is retried.

use crate::client::{ClientConfig, API_PATH_PREFIX, MEDIA_TYPE_V1};
use crate::error::ApiErrorBody;
use crate::session::{Session, TokenSnapshot};
use crate::{Error, Result};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, ClientBuilder, Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

const USER_AGENT: &str = concat!("ovc-rs/", env!("CARGO_PKG_VERSION"));

/// HTTP statuses the controller uses for success.
pub const SUCCESS_STATUSES: [u16; 4] = [200, 201, 202, 204];

/// Returns true if `status` is one of [`SUCCESS_STATUSES`].
#[must_use]
pub fn is_success_status(status: u16) -> bool {
    SUCCESS_STATUSES.contains(&status)
}

/// Base URL every request path is appended to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoint {
    base: String,
}

impl ApiEndpoint {
    /// Derive the API base from the configured controller address.
    ///
    /// A bare host becomes `https://<host>/api`; an address that already carries a
    /// scheme is used as given.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEndpoint`] if the result is not a valid URL.
    pub fn from_host(host: impl AsRef<str>) -> Result<Self> {
        let host = host.as_ref().trim();
        let base = if host.starts_with("http") {
            host.trim_end_matches('/').to_string()
        } else {
            format!("https://{host}{API_PATH_PREFIX}")
        };

        Url::parse(&base)
            .map_err(|err| Error::InvalidEndpoint(format!("Invalid OVC address `{host}`: {err}")))?;

        Ok(Self { base })
    }

    /// Base URL as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.base
    }

    /// Build the full URL for `path` with the given query pairs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEndpoint`] if the path does not form a valid URL.
    pub fn url(&self, path: &str, query: &[(String, String)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{path}", self.base))
            .map_err(|err| Error::InvalidEndpoint(format!("Invalid OVC path `{path}`: {err}")))?;

        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        Ok(url)
    }
}

impl fmt::Display for ApiEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base)
    }
}

/// A request to the controller, independent of the token that will sign it.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Vec<u8>>,
    headers: Vec<(&'static str, String)>,
}

impl ApiRequest {
    /// Create a request without query, body or extra headers.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            headers: Vec::new(),
        }
    }

    /// Create a `GET` request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Create a `POST` request.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Set the query pairs.
    #[must_use]
    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    /// Serialize `body` as the JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] if the body cannot be serialized.
    pub fn with_json<B>(mut self, body: &B) -> Result<Self>
    where
        B: Serialize + ?Sized,
    {
        let bytes = serde_json::to_vec(body)
            .map_err(|err| Error::InvalidRequest(format!("Failed to encode request body: {err}")))?;
        self.body = Some(bytes);
        Ok(self)
    }

    /// Add a header; it replaces any default header of the same name.
    #[must_use]
    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Add several headers.
    #[must_use]
    pub fn with_headers(mut self, headers: &[(&'static str, &str)]) -> Self {
        for (name, value) in headers {
            self.headers.push((name, (*value).to_string()));
        }
        self
    }

    /// HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request path below the API base.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query pairs.
    #[must_use]
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Encoded JSON body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Headers to send: defaults first, overridden by the caller's headers.
    #[must_use]
    pub fn effective_headers(&self) -> Vec<(&'static str, String)> {
        let mut headers: Vec<(&'static str, String)> = Vec::new();
        if self.body.is_some() {
            headers.push(("content-type", MEDIA_TYPE_V1.to_string()));
        }

        for (name, value) in &self.headers {
            headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
            headers.push((name, value.clone()));
        }

        headers
    }
}

/// Build the HTTP client used for every controller call.
///
/// # Errors
///
/// Returns [`Error::ConfigError`] if the CA certificate cannot be read or the
/// client cannot be constructed.
pub fn build_http_client(config: &ClientConfig, ca_cert: Option<&Path>) -> Result<Client> {
    let mut builder = ClientBuilder::new()
        .user_agent(USER_AGENT)
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .pool_idle_timeout(config.pool_idle_timeout)
        .pool_max_idle_per_host(config.pool_max_idle_per_host);

    if !config.enable_compression {
        builder = builder.no_gzip();
    }

    if !config.tls_verify {
        warn!("TLS verification disabled for OVC client");
        builder = builder.danger_accept_invalid_certs(true);
    }

    if let Some(ca_cert) = ca_cert {
        debug!("loading OVC CA certificate from {}", ca_cert.display());
        let bytes = std::fs::read(ca_cert).map_err(|err| {
            Error::ConfigError(format!(
                "Failed to read OVC CA certificate {}: {err}",
                ca_cert.display()
            ))
        })?;
        let cert = reqwest::Certificate::from_pem(&bytes)
            .map_err(|err| Error::ConfigError(format!("Invalid OVC CA certificate: {err}")))?;
        builder = builder.add_root_certificate(cert);
    }

    builder
        .build()
        .map_err(|err| Error::ConfigError(format!("Failed to build OVC HTTP client: {err}")))
}

/// Read a response body and classify its status.
pub(crate) async fn read_response(response: Response) -> Result<Vec<u8>> {
    let status = response.status().as_u16();
    let body = response.bytes().await?;

    if is_success_status(status) {
        return Ok(body.to_vec());
    }

    debug!(status, "OVC returned an error status");
    Err(decode_error_body(status, &body))
}

fn decode_error_body(status: u16, body: &[u8]) -> Error {
    match serde_json::from_slice::<ApiErrorBody>(body) {
        Ok(envelope) => envelope.into_error(status),
        Err(_) => Error::Api {
            status: status.to_string(),
            error: None,
            message: String::from_utf8_lossy(body).trim().to_string(),
        },
    }
}

/// Race `future` against `cancel`, reporting cancellation with `context`.
///
/// # Errors
///
/// Returns [`Error::Cancelled`] if the token fires first, otherwise the
/// future's own result.
pub async fn cancellable<F, T>(
    cancel: Option<&CancellationToken>,
    context: impl FnOnce() -> String,
    future: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match cancel {
        Some(token) => {
            tokio::select! {
                biased;
                () = token.cancelled() => Err(Error::Cancelled(context())),
                result = future => result,
            }
        }
        None => future.await,
    }
}

/// Executes requests against the controller on behalf of a shared [`Session`].
#[derive(Debug, Clone)]
pub struct Transport {
    session: Arc<Session>,
}

impl Transport {
    /// Create a transport over an existing session.
    #[must_use]
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    /// The shared session.
    #[must_use]
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Send `request` once, signed with `token`.
    ///
    /// # Errors
    ///
    /// Returns transport errors verbatim and non-success statuses as
    /// [`Error::Api`].
    pub async fn execute(&self, request: &ApiRequest, token: &TokenSnapshot) -> Result<Vec<u8>> {
        let url = self.session.endpoint().url(&request.path, &request.query)?;
        let mut builder = self.session.http().request(request.method.clone(), url);

        if let Some(bearer) = token.bearer() {
            builder = builder.header(AUTHORIZATION, bearer);
        }
        for (name, value) in request.effective_headers() {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        info!(method = %request.method, path = %request.path, "OVC request");

        let response = builder.send().await?;
        read_response(response).await
    }

    /// Send `request`, refreshing the token and retrying once on `invalid_token`.
    ///
    /// # Errors
    ///
    /// Returns the first error that is not `invalid_token`, the refresh error,
    /// or the error of the single retry.
    pub async fn request(&self, request: &ApiRequest) -> Result<Vec<u8>> {
        let token = self.session.current_token().await;

        match self.execute(request, &token).await {
            Err(err) if err.is_invalid_token() => {
                warn!(path = %request.path, "Token expired - retrying with a new token");
                let refreshed = self.session.refresh(&token).await?;
                self.execute(request, &refreshed).await
            }
            other => other,
        }
    }

    /// [`Transport::request`] that can be abandoned through `cancel`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] when cancelled, otherwise as
    /// [`Transport::request`].
    pub async fn request_cancellable(
        &self,
        request: &ApiRequest,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<u8>> {
        cancellable(
            cancel,
            || format!("{} {} cancelled", request.method, request.path),
            self.request(request),
        )
        .await
    }

    /// Send `request` and decode the JSON response.
    ///
    /// # Errors
    ///
    /// As [`Transport::request`], plus [`Error::DecodeError`].
    pub async fn request_json<T>(&self, request: &ApiRequest) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let body = self.request(request).await?;
        decode_json(&request.path, &body)
    }
}

/// Decode a success body, naming `path` in the error.
///
/// # Errors
///
/// Returns [`Error::DecodeError`] if the body is not the expected JSON.
pub fn decode_json<T>(path: &str, body: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    serde_json::from_slice(body).map_err(|err| {
        Error::DecodeError(format!("Failed to parse OVC response for `{path}`: {err}"))
    })
}
