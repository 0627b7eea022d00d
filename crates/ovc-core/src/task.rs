//! Task model and the completion poller.
//!
//! Mutating OVC calls answer immediately with a task envelope. The controller
//! never pushes completion, so [`TaskPoller`] re-fetches `GET /tasks/{id}` at
//! the policy interval until the task leaves `IN_PROGRESS`.

use crate::client::PollPolicy;
use crate::de::null_as_default;
use crate::id::TaskId;
use crate::transport::{cancellable, decode_json, ApiRequest, Transport};
use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Lifecycle state reported by the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskState {
    /// Task is still running
    InProgress,
    /// Task finished
    Complete,
    /// Task finished with an error
    Failed,
    /// Any other state string, preserved as sent
    Unknown(String),
    /// No state was reported
    #[default]
    Missing,
}

impl TaskState {
    /// Returns true while the controller is still working on the task.
    #[must_use]
    pub const fn is_in_progress(&self) -> bool {
        matches!(self, Self::InProgress)
    }

    /// Wire representation of the state.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::InProgress => "IN_PROGRESS",
            Self::Complete => "COMPLETE",
            Self::Failed => "FAILED",
            Self::Unknown(state) => state,
            Self::Missing => "",
        }
    }
}

impl From<String> for TaskState {
    fn from(state: String) -> Self {
        match state.as_str() {
            "IN_PROGRESS" => Self::InProgress,
            "COMPLETE" => Self::Complete,
            "FAILED" => Self::Failed,
            "" => Self::Missing,
            _ => Self::Unknown(state),
        }
    }
}

impl From<TaskState> for String {
    fn from(state: TaskState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a resource a task created or modified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffectedResource {
    /// Kind of the affected object, e.g. `virtual_machine`
    #[serde(default, deserialize_with = "null_as_default")]
    pub object_type: String,
    /// Identifier of the affected object
    #[serde(default, deserialize_with = "null_as_default")]
    pub object_id: String,
}

/// Server-side asynchronous operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Task identifier
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: TaskId,
    /// Current state
    #[serde(default, deserialize_with = "null_as_default")]
    pub state: TaskState,
    /// Progress indicator, 0 to 100
    #[serde(default, deserialize_with = "null_as_default")]
    pub percent_complete: i64,
    /// Resources the task produced or touched, in server order
    #[serde(default, deserialize_with = "null_as_default")]
    pub affected_objects: Vec<AffectedResource>,
    /// Failure code, when the controller reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i64>,
}

impl Task {
    /// First affected resource, if any.
    #[must_use]
    pub fn first_affected(&self) -> Option<&AffectedResource> {
        self.affected_objects.first()
    }

    /// Error code, `0` when none was reported.
    #[must_use]
    pub fn error_code_or_default(&self) -> i64 {
        self.error_code.unwrap_or_default()
    }
}

/// `{"task": {...}}` wrapper used by every task-producing response.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskEnvelope {
    /// The wrapped task
    #[serde(default)]
    pub task: Option<Task>,
}

/// Decode a task envelope from a response body.
///
/// # Errors
///
/// Returns [`Error::DecodeError`] if the body is not JSON or carries no task.
pub fn decode_task(body: &[u8]) -> Result<Task> {
    let envelope: TaskEnvelope = serde_json::from_slice(body)
        .map_err(|err| Error::DecodeError(format!("Failed to parse OVC task: {err}")))?;
    envelope
        .task
        .ok_or_else(|| Error::DecodeError("OVC response carries no task".to_string()))
}

/// Source of fresh task status bodies.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskStatusSource: Send + Sync {
    /// Fetch the raw `GET /tasks/{id}` body.
    async fn fetch_task_status(&self, id: &TaskId) -> Result<Vec<u8>>;
}

#[async_trait]
impl TaskStatusSource for Transport {
    async fn fetch_task_status(&self, id: &TaskId) -> Result<Vec<u8>> {
        self.request(&ApiRequest::get(format!("/tasks/{id}"))).await
    }
}

/// Waits for tasks to reach a terminal state.
#[derive(Debug, Clone)]
pub struct TaskPoller<S> {
    source: S,
    policy: PollPolicy,
}

impl<S> TaskPoller<S>
where
    S: TaskStatusSource,
{
    /// Create a poller over `source`.
    #[must_use]
    pub const fn new(source: S, policy: PollPolicy) -> Self {
        Self { source, policy }
    }

    /// The polling policy in use.
    #[must_use]
    pub const fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// The status source.
    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Decode `initial` and wait until the task is no longer in progress.
    ///
    /// An already-terminal response is returned without any further request.
    /// Every fetch error and decode error aborts the wait and is returned as is.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TaskTimeout`] when the attempt or time bound is exceeded and
    /// [`Error::Cancelled`] when `cancel` fires.
    pub async fn wait_for_completion(
        &self,
        initial: &[u8],
        cancel: Option<&CancellationToken>,
    ) -> Result<Task> {
        let task = decode_task(initial)?;
        if !task.state.is_in_progress() {
            debug!(task_id = %task.id, state = %task.state, "OVC task already finished");
            return Ok(task);
        }

        let id = task.id.clone();
        let bounded = async {
            match self.policy.timeout {
                Some(limit) => match tokio::time::timeout(limit, self.poll(task)).await {
                    Ok(result) => result,
                    Err(_) => Err(Error::TaskTimeout {
                        task_id: id.clone(),
                        elapsed: format!("{}ms", limit.as_millis()),
                    }),
                },
                None => self.poll(task).await,
            }
        };

        cancellable(cancel, || format!("Wait for task {id} cancelled"), bounded).await
    }

    async fn poll(&self, mut task: Task) -> Result<Task> {
        let mut attempts = 0_u32;

        while task.state.is_in_progress() {
            if self.policy.attempts_exhausted(attempts) {
                return Err(Error::TaskTimeout {
                    task_id: task.id,
                    elapsed: format!("{attempts} status checks"),
                });
            }

            tokio::time::sleep(self.policy.interval).await;

            let body = self.source.fetch_task_status(&task.id).await?;
            attempts += 1;
            task = decode_json::<TaskEnvelope>(&format!("/tasks/{}", task.id), &body)?
                .task
                .ok_or_else(|| {
                    Error::DecodeError(format!("Status of task {} carries no task", task.id))
                })?;

            debug!(
                task_id = %task.id,
                state = %task.state,
                percent = task.percent_complete,
                attempts,
                "Polled OVC task"
            );
        }

        Ok(task)
    }
}
