//! Top-level OVC client.

use crate::models::{
    Backup, Datastore, Host, OmniStackCluster, PersistentVolume, Policy, VirtualMachine,
};
use crate::resource::{Resource, ResourceAccessor};
use crate::tasks::TaskAccessor;
use crate::Result;
use ovc_core::client::{ClientConfig, PollPolicy};
use ovc_core::config::OvcConfig;
use ovc_core::session::{Credentials, Session};
use ovc_core::task::TaskPoller;
use ovc_core::transport::{build_http_client, ApiEndpoint, Transport};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// State shared by every accessor created from one [`OvcClient`].
#[derive(Debug)]
pub(crate) struct ClientContext {
    pub(crate) transport: Transport,
    pub(crate) poller: TaskPoller<Transport>,
}

/// Builder for [`OvcClient`].
#[derive(Debug, Clone)]
pub struct OvcClientBuilder {
    host: String,
    credentials: Credentials,
    http_config: ClientConfig,
    ca_cert: Option<PathBuf>,
    poll_policy: PollPolicy,
}

impl OvcClientBuilder {
    /// Create a builder for the controller at `host` with default settings.
    ///
    /// `host` is either a bare address (`10.0.0.5`) or a full base URL.
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            credentials: Credentials::new(username, password),
            http_config: ClientConfig::new(),
            ca_cert: None,
            poll_policy: PollPolicy::new(),
        }
    }

    /// Create a builder from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ovc_core::Error::ConfigError`] if the configuration is invalid.
    pub fn from_config(config: &OvcConfig) -> Result<Self> {
        config.ensure_valid()?;

        Ok(Self {
            host: config.host.clone(),
            credentials: config.credentials(),
            http_config: config.client_config(),
            ca_cert: config.tls_ca_cert.clone(),
            poll_policy: config.poll_policy(),
        })
    }

    /// Override the HTTP client configuration.
    #[must_use]
    pub fn with_http_config(mut self, config: ClientConfig) -> Self {
        self.http_config = config;
        self
    }

    /// Trust an additional PEM CA certificate.
    #[must_use]
    pub fn with_ca_cert(mut self, path: PathBuf) -> Self {
        self.ca_cert = Some(path);
        self
    }

    /// Override the task polling policy.
    #[must_use]
    pub const fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.poll_policy = policy;
        self
    }

    /// Build the client and obtain the first access token.
    ///
    /// # Errors
    ///
    /// Returns configuration errors, or the error of the initial token request.
    pub async fn connect(self) -> Result<OvcClient> {
        let endpoint = ApiEndpoint::from_host(&self.host)?;
        let http = build_http_client(&self.http_config, self.ca_cert.as_deref())?;

        info!(endpoint = %endpoint, "Connecting to OVC");
        let session = Session::connect(endpoint, self.credentials, http).await?;

        let transport = Transport::new(Arc::new(session));
        let poller = TaskPoller::new(transport.clone(), self.poll_policy);

        Ok(OvcClient {
            context: Arc::new(ClientContext { transport, poller }),
        })
    }
}

/// Asynchronous OVC client.
///
/// Cloning is cheap; clones share the session and therefore the bearer token.
#[derive(Debug, Clone)]
pub struct OvcClient {
    context: Arc<ClientContext>,
}

impl OvcClient {
    /// Connect using a configuration.
    ///
    /// # Errors
    ///
    /// See [`OvcClientBuilder::connect`].
    pub async fn connect(config: &OvcConfig) -> Result<Self> {
        OvcClientBuilder::from_config(config)?.connect().await
    }

    /// Start building a client.
    #[must_use]
    pub fn builder(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> OvcClientBuilder {
        OvcClientBuilder::new(host, username, password)
    }

    /// The API base URL.
    #[must_use]
    pub fn endpoint(&self) -> &ApiEndpoint {
        self.context.transport.session().endpoint()
    }

    /// The shared session.
    #[must_use]
    pub fn session(&self) -> &Arc<Session> {
        self.context.transport.session()
    }

    /// The polling policy applied to mutating operations.
    #[must_use]
    pub fn poll_policy(&self) -> &PollPolicy {
        self.context.poller.policy()
    }

    /// Accessor for any resource kind.
    #[must_use]
    pub fn resource<T>(&self) -> ResourceAccessor<T>
    where
        T: Resource,
    {
        ResourceAccessor::new(Arc::clone(&self.context))
    }

    /// Virtual machines.
    #[must_use]
    pub fn virtual_machines(&self) -> ResourceAccessor<VirtualMachine> {
        self.resource()
    }

    /// Backups.
    #[must_use]
    pub fn backups(&self) -> ResourceAccessor<Backup> {
        self.resource()
    }

    /// Datastores.
    #[must_use]
    pub fn datastores(&self) -> ResourceAccessor<Datastore> {
        self.resource()
    }

    /// Hosts.
    #[must_use]
    pub fn hosts(&self) -> ResourceAccessor<Host> {
        self.resource()
    }

    /// OmniStack clusters.
    #[must_use]
    pub fn omnistack_clusters(&self) -> ResourceAccessor<OmniStackCluster> {
        self.resource()
    }

    /// Backup policies.
    #[must_use]
    pub fn policies(&self) -> ResourceAccessor<Policy> {
        self.resource()
    }

    /// Persistent volumes.
    #[must_use]
    pub fn persistent_volumes(&self) -> ResourceAccessor<PersistentVolume> {
        self.resource()
    }

    /// Tasks.
    #[must_use]
    pub fn tasks(&self) -> TaskAccessor {
        TaskAccessor::new(Arc::clone(&self.context))
    }
}
