//! Typed asynchronous client for the SimpliVity OmniStack Virtual Controller
//! (OVC) REST API.
//!
//! [`OvcClient`] authenticates once and hands out one [`ResourceAccessor`] per
//! resource kind. Accessors list and look up entities, and run the mutating
//! operations (clone, move, backup, policy, power state) that the controller
//! executes as asynchronous tasks. Those calls wait for the task to finish and
//! return the resulting entity.
//!
//! ```no_run
//! # async fn demo() -> ovc::Result<()> {
//! use ovc::OvcClient;
//!
//! let client = OvcClient::builder("10.0.0.5", "admin", "secret").connect().await?;
//! let vm = client.virtual_machines().find_by_name("web-01").await?;
//! let clone = client
//!     .virtual_machines()
//!     .clone_vm(&vm.id, "web-01-clone", false)
//!     .await?;
//! println!("cloned {} as {}", vm.name, clone.id);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

pub mod client;
pub mod models;
pub mod persistent_volumes;
pub mod resource;
pub mod tasks;
pub mod virtual_machines;

pub use client::{OvcClient, OvcClientBuilder};
pub use models::{
    Backup, CreateBackupRequest, Datastore, Host, OmniStackCluster, PersistentVolume, Policy,
    PowerState, SetBackupParametersRequest, VirtualMachine,
};
pub use ovc_core::{CancellationToken, Error};
pub use resource::{Resource, ResourceAccessor, ResourceList};
pub use tasks::TaskAccessor;

/// Convenient result alias matching the shared OVC error type.
pub type Result<T> = ovc_core::Result<T>;

#[cfg(test)]
pub(crate) mod testing {
    use crate::OvcClient;
    use ovc_core::client::PollPolicy;
    use serde_json::{json, Value};
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Client connected to `server` with a mounted token endpoint and a fast
    /// poll interval.
    pub(crate) async fn mock_client(server: &MockServer) -> OvcClient {
        Mock::given(method("POST"))
            .and(path("/api/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "12345"
            })))
            .mount(server)
            .await;

        OvcClient::builder(format!("{}/api", server.uri()), "user", "pass")
            .with_poll_policy(PollPolicy::new().with_interval(Duration::from_millis(5)))
            .connect()
            .await
            .unwrap()
    }

    pub(crate) fn in_progress_task(id: &str) -> Value {
        json!({
            "task": {"id": id, "state": "IN_PROGRESS", "percent_complete": 0, "affected_objects": []}
        })
    }

    pub(crate) fn complete_task(id: &str, affected: &[&str], error_code: Option<i64>) -> Value {
        let affected: Vec<Value> = affected
            .iter()
            .map(|object_id| json!({"object_type": "", "object_id": object_id}))
            .collect();
        let mut task = json!({
            "id": id,
            "state": "COMPLETE",
            "percent_complete": 100,
            "affected_objects": affected
        });
        if let Some(code) = error_code {
            task["error_code"] = json!(code);
        }
        json!({ "task": task })
    }
}
