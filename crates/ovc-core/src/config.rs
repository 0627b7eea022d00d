//! Configuration structures for OVC clients.
//!
//! [`OvcConfig`] is the serializable description of a controller connection:
//! where it lives, how to log in, and how patiently to wait on tasks. It can be
//! loaded from any serde format and converted into the runtime [`ClientConfig`]
//! and [`PollPolicy`].

use crate::client::{
    ClientConfig, PollPolicy, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_REQUEST_TIMEOUT,
};
use crate::session::Credentials;
use crate::Error;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use validator::Validate;

/// Configuration for an OVC client instance.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct OvcConfig {
    /// Controller address: a bare host/IP, or a full base URL starting with `http`
    #[validate(length(min = 1))]
    pub host: String,

    /// Login user name
    #[validate(length(min = 1))]
    pub username: String,

    /// Login password
    #[serde(skip_serializing, deserialize_with = "deserialize_secret")]
    pub password: SecretString,

    /// Whether to verify TLS certificates
    #[serde(default = "default_tls_verify")]
    pub tls_verify: bool,

    /// Optional path to a PEM CA certificate trusted in addition to the system roots
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_ca_cert: Option<PathBuf>,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Delay between task status fetches in seconds
    #[validate(range(min = 1, max = 60))]
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Upper bound on one task wait in seconds (unset waits indefinitely)
    #[validate(range(min = 1))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_timeout_secs: Option<u64>,

    /// Upper bound on task status fetches per wait
    #[validate(range(min = 1))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_max_attempts: Option<u32>,
}

const fn default_tls_verify() -> bool {
    true
}

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT
}

const fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

impl Clone for OvcConfig {
    fn clone(&self) -> Self {
        Self {
            host: self.host.clone(),
            username: self.username.clone(),
            password: SecretString::from(self.password.expose_secret().to_owned()),
            tls_verify: self.tls_verify,
            tls_ca_cert: self.tls_ca_cert.clone(),
            request_timeout_secs: self.request_timeout_secs,
            poll_interval_secs: self.poll_interval_secs,
            poll_timeout_secs: self.poll_timeout_secs,
            poll_max_attempts: self.poll_max_attempts,
        }
    }
}

impl OvcConfig {
    /// Create a new configuration with the required connection parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, Error> {
        let config = Self {
            host: host.into(),
            username: username.into(),
            password: SecretString::from(password.into()),
            tls_verify: default_tls_verify(),
            tls_ca_cert: None,
            request_timeout_secs: default_request_timeout_secs(),
            poll_interval_secs: default_poll_interval_secs(),
            poll_timeout_secs: None,
            poll_max_attempts: None,
        };

        config.ensure_valid()?;
        Ok(config)
    }

    /// Check the field constraints, e.g. after deserializing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] describing the violated constraints.
    pub fn ensure_valid(&self) -> Result<(), Error> {
        self.validate()
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {e}")))
    }

    /// Set whether to verify TLS certificates.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Set custom CA certificate path.
    #[must_use]
    pub fn with_ca_cert(mut self, path: PathBuf) -> Self {
        self.tls_ca_cert = Some(path);
        self
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// Set the delay between task status fetches in seconds.
    #[must_use]
    pub const fn with_poll_interval(mut self, seconds: u64) -> Self {
        self.poll_interval_secs = seconds;
        self
    }

    /// Set (or clear) the upper bound on a single task wait.
    #[must_use]
    pub const fn with_poll_timeout(mut self, seconds: Option<u64>) -> Self {
        self.poll_timeout_secs = seconds;
        self
    }

    /// Set the upper bound on task status fetches per wait.
    #[must_use]
    pub const fn with_poll_max_attempts(mut self, attempts: u32) -> Self {
        self.poll_max_attempts = Some(attempts);
        self
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Login credentials for the password grant.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials::new(
            self.username.clone(),
            self.password.expose_secret().to_owned(),
        )
    }

    /// HTTP client settings derived from this configuration.
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new()
            .with_timeout(self.timeout())
            .with_tls_verify(self.tls_verify)
    }

    /// Task polling policy derived from this configuration.
    #[must_use]
    pub fn poll_policy(&self) -> PollPolicy {
        let mut policy =
            PollPolicy::unbounded().with_interval(Duration::from_secs(self.poll_interval_secs));
        if let Some(seconds) = self.poll_timeout_secs {
            policy = policy.with_timeout(Duration::from_secs(seconds));
        }
        if let Some(attempts) = self.poll_max_attempts {
            policy = policy.with_max_attempts(attempts);
        }
        policy
    }
}
