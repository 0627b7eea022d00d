//! HTTP client settings and task polling policy.
//!
//! This module holds the tunables shared by the transport and the task poller,
//! along with the fixed protocol constants of the OVC REST API.

use std::time::Duration;

/// Default request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT: u64 = 30;

/// Default connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 10;

// Connection pool settings

/// Default idle timeout for connection pools
pub const DEFAULT_POOL_IDLE_TIMEOUT: u64 = 90;

/// Default maximum idle connections per host
pub const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 10;

// Task polling settings

/// Delay between two task status fetches, in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;

// Protocol constants

/// Path prefix appended to a bare controller host.
pub const API_PATH_PREFIX: &str = "/api";

/// Token endpoint for the password grant.
pub const TOKEN_PATH: &str = "/oauth/token";

/// Fixed OAuth client identifier (sent with an empty secret).
pub const OAUTH_CLIENT_ID: &str = "simplivity";

/// Content type for JSON request bodies.
pub const MEDIA_TYPE_V1: &str = "application/vnd.simplivity.v1+json";

/// Content type required by the power state and backup parameter endpoints.
pub const MEDIA_TYPE_V1_11: &str = "application/vnd.simplivity.v1.11+json";

/// Media type required by every persistent volume endpoint.
pub const MEDIA_TYPE_V1_16: &str = "application/vnd.simplivity.v1.16+json";

/// Task polling policy.
///
/// The controller offers no push notification for task completion, so callers
/// wait by re-fetching the task at a fixed interval. `max_attempts` and `timeout`
/// bound the wait; `None` leaves that dimension unbounded. Both are unset unless
/// the caller opts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay before each status fetch
    pub interval: Duration,

    /// Maximum number of status fetches
    pub max_attempts: Option<u32>,

    /// Maximum total wait
    pub timeout: Option<Duration>,
}

impl PollPolicy {
    /// Create a poll policy that waits until the task leaves the in-progress
    /// state, fetching every [`DEFAULT_POLL_INTERVAL_SECS`] seconds.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            max_attempts: None,
            timeout: None,
        }
    }

    /// Alias of [`PollPolicy::new`], for call sites that want to spell out the
    /// absence of bounds.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self::new()
    }

    /// Set the delay between status fetches.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Bound the number of status fetches.
    #[must_use]
    pub const fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Bound the total wait.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Remove the total wait bound.
    #[must_use]
    pub const fn without_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Check whether `attempts` fetches have used up the attempt budget.
    #[must_use]
    pub const fn attempts_exhausted(&self, attempts: u32) -> bool {
        match self.max_attempts {
            Some(max) => attempts >= max,
            None => false,
        }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// HTTP client configuration.
///
/// Configures HTTP client behavior including timeouts, TLS and connection pooling.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout
    pub timeout: Duration,

    /// Connect timeout
    pub connect_timeout: Duration,

    /// Connection pool idle timeout
    pub pool_idle_timeout: Duration,

    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,

    /// Verify the controller's TLS certificate
    pub tls_verify: bool,

    /// Enable response compression
    pub enable_compression: bool,
}

impl ClientConfig {
    /// Create a new client configuration with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT),
            pool_idle_timeout: Duration::from_secs(DEFAULT_POOL_IDLE_TIMEOUT),
            pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
            tls_verify: true,
            enable_compression: true,
        }
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set connection pool idle timeout.
    #[must_use]
    pub const fn with_pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }

    /// Set maximum idle connections per host.
    #[must_use]
    pub const fn with_pool_max_idle(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Enable or disable TLS certificate verification.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Enable or disable compression.
    #[must_use]
    pub const fn with_compression(mut self, enabled: bool) -> Self {
        self.enable_compression = enabled;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}
