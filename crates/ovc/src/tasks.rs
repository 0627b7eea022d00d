//! Task lookups.

use crate::client::ClientContext;
use crate::Result;
use ovc_core::id::TaskId;
use ovc_core::task::{decode_task, Task};
use ovc_core::transport::ApiRequest;
use ovc_core::CancellationToken;
use std::sync::Arc;

/// Accessor for `/tasks`.
#[derive(Debug, Clone)]
pub struct TaskAccessor {
    context: Arc<ClientContext>,
    cancel: Option<CancellationToken>,
}

impl TaskAccessor {
    pub(crate) fn new(context: Arc<ClientContext>) -> Self {
        Self {
            context,
            cancel: None,
        }
    }

    /// Abort fetches and waits made through this accessor when `token` is
    /// cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Fetch the current status of a task.
    ///
    /// # Errors
    ///
    /// Returns transport, API or decode errors.
    pub async fn get(&self, id: &TaskId) -> Result<Task> {
        let body = self.fetch(id).await?;
        decode_task(&body)
    }

    /// Wait for the task in a raw operation response to finish.
    ///
    /// # Errors
    ///
    /// See [`TaskPoller::wait_for_completion`](ovc_core::task::TaskPoller::wait_for_completion).
    pub async fn wait_for_completion(&self, response: &[u8]) -> Result<Task> {
        self.context
            .poller
            .wait_for_completion(response, self.cancel.as_ref())
            .await
    }

    /// Wait for a previously submitted task, identified by id.
    ///
    /// # Errors
    ///
    /// See [`TaskPoller::wait_for_completion`](ovc_core::task::TaskPoller::wait_for_completion).
    pub async fn wait(&self, id: &TaskId) -> Result<Task> {
        let body = self.fetch(id).await?;
        self.wait_for_completion(&body).await
    }

    async fn fetch(&self, id: &TaskId) -> Result<Vec<u8>> {
        let request = ApiRequest::get(format!("/tasks/{id}"));
        self.context
            .transport
            .request_cancellable(&request, self.cancel.as_ref())
            .await
    }
}
