//! Virtual machine operations.
//!
//! Every mutating call submits the operation, waits for the resulting task and
//! checks that the task affected at least one object. Calls that produce a new
//! entity (clone, move, backup) then look it up by the first affected id.

use crate::models::{
    Backup, CreateBackupRequest, PowerState, SetBackupParametersRequest, VirtualMachine,
};
use crate::resource::{ResourceAccessor, ResourceList};
use crate::Result;
use ovc_core::client::MEDIA_TYPE_V1_11;
use ovc_core::id::{ClusterId, DatastoreId, PolicyId, VmId};
use ovc_core::transport::ApiRequest;
use ovc_core::Error;
use serde::Serialize;

#[derive(Serialize)]
struct CloneRequest<'a> {
    virtual_machine_name: &'a str,
    app_consistent: bool,
}

#[derive(Serialize)]
struct MoveRequest<'a> {
    virtual_machine_name: &'a str,
    destination_datastore_id: &'a DatastoreId,
}

#[derive(Serialize)]
struct SetPolicyRequest<'a> {
    policy_id: &'a PolicyId,
}

#[derive(Serialize)]
struct SetPolicyBatchRequest<'a> {
    policy_id: &'a PolicyId,
    virtual_machine_id: &'a [VmId],
}

fn operation_path(vm: &VmId, action: &str) -> String {
    format!("/virtual_machines/{vm}/{action}")
}

impl ResourceAccessor<VirtualMachine> {
    /// Clone `vm` as `name` and return the new virtual machine.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] when the task affected nothing, and
    /// any transport, API, decode or lookup error unchanged.
    pub async fn clone_vm(
        &self,
        vm: &VmId,
        name: &str,
        app_consistent: bool,
    ) -> Result<VirtualMachine> {
        let request = ApiRequest::post(operation_path(vm, "clone")).with_json(&CloneRequest {
            virtual_machine_name: name,
            app_consistent,
        })?;

        let task = self.run_operation("Clone", request).await?;
        self.resolve_affected(&task).await
    }

    /// Move `vm` to `datastore`, naming it `name` there.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] when the task affected nothing.
    pub async fn move_vm(
        &self,
        vm: &VmId,
        name: &str,
        datastore: &DatastoreId,
    ) -> Result<VirtualMachine> {
        let request = ApiRequest::post(operation_path(vm, "move")).with_json(&MoveRequest {
            virtual_machine_name: name,
            destination_datastore_id: datastore,
        })?;

        let task = self.run_operation("Move", request).await?;
        self.resolve_affected(&task).await
    }

    /// Back up `vm`, optionally storing the backup on `destination`.
    ///
    /// A `destination` overrides the one set in `request`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] when the task affected nothing.
    pub async fn create_backup(
        &self,
        vm: &VmId,
        request: CreateBackupRequest,
        destination: Option<&ClusterId>,
    ) -> Result<Backup> {
        let mut body = request;
        if let Some(cluster) = destination {
            body.destination = Some(cluster.clone());
        }

        let request = ApiRequest::post(operation_path(vm, "backup")).with_json(&body)?;
        let task = self.run_operation("Backup", request).await?;
        self.resolve_affected(&task).await
    }

    /// Assign `policy` to `vm`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] when the task affected nothing.
    pub async fn set_policy(&self, vm: &VmId, policy: &PolicyId) -> Result<()> {
        let request = ApiRequest::post(operation_path(vm, "set_policy"))
            .with_json(&SetPolicyRequest { policy_id: policy })?;

        self.run_operation("Set policy", request).await?;
        Ok(())
    }

    /// Assign `policy` to every VM in `vms` with a single task.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] without contacting the controller when
    /// `vms` is empty.
    pub async fn set_policy_for_multiple(&self, policy: &PolicyId, vms: &[VmId]) -> Result<()> {
        if vms.is_empty() {
            return Err(Error::InvalidRequest(
                "Pass a list of VM resources".to_string(),
            ));
        }

        let request = ApiRequest::post("/virtual_machines/set_policy").with_json(
            &SetPolicyBatchRequest {
                policy_id: policy,
                virtual_machine_id: vms,
            },
        )?;

        self.submit_and_wait(request).await?;
        Ok(())
    }

    /// Set the guest credentials and application-aware type used for
    /// application-consistent backups of `vm`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] when the task affected nothing.
    pub async fn set_backup_parameters(
        &self,
        vm: &VmId,
        parameters: &SetBackupParametersRequest,
    ) -> Result<()> {
        let request = ApiRequest::post(operation_path(vm, "backup_parameters"))
            .with_json(parameters)?
            .with_header("Content-Type", MEDIA_TYPE_V1_11);

        self.run_operation("Set backup parameters operation", request)
            .await?;
        Ok(())
    }

    /// Power `vm` on or off.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] when the task affected nothing.
    pub async fn update_power_state(&self, vm: &VmId, state: PowerState) -> Result<()> {
        let request = ApiRequest::post(operation_path(vm, state.action()))
            .with_header("Content-Type", MEDIA_TYPE_V1_11);

        self.run_operation("Setting power state operation", request)
            .await?;
        Ok(())
    }

    /// Power `vm` on.
    ///
    /// # Errors
    ///
    /// See [`ResourceAccessor::update_power_state`].
    pub async fn power_on(&self, vm: &VmId) -> Result<()> {
        self.update_power_state(vm, PowerState::On).await
    }

    /// Power `vm` off.
    ///
    /// # Errors
    ///
    /// See [`ResourceAccessor::update_power_state`].
    pub async fn power_off(&self, vm: &VmId) -> Result<()> {
        self.update_power_state(vm, PowerState::Off).await
    }

    /// Backups taken of `vm`.
    ///
    /// # Errors
    ///
    /// Returns transport, API or decode errors.
    pub async fn backups(&self, vm: &VmId) -> Result<ResourceList<Backup>> {
        self.fetch_list(ApiRequest::get(operation_path(vm, "backups")))
            .await
    }
}

#[cfg(test)]
mod tests {
    use crate::models::{CreateBackupRequest, PowerState, SetBackupParametersRequest};
    use crate::testing::{complete_task, in_progress_task, mock_client};
    use ovc_core::client::{MEDIA_TYPE_V1, MEDIA_TYPE_V1_11};
    use ovc_core::id::{ClusterId, DatastoreId, PolicyId, VmId};
    use ovc_core::Error;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_vm(server: &MockServer, id: &str, name: &str) {
        Mock::given(method("GET"))
            .and(path("/api/virtual_machines"))
            .and(query_param("id", id))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "offset": 0,
                "count": 1,
                "limit": 500,
                "virtual_machines": [{"id": id, "name": name, "state": "ALIVE"}]
            })))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn clone_polls_and_resolves_new_vm() {
        let server = MockServer::start().await;
        let client = mock_client(&server).await;

        Mock::given(method("POST"))
            .and(path("/api/virtual_machines/1/clone"))
            .and(header("content-type", MEDIA_TYPE_V1))
            .and(body_json(json!({
                "virtual_machine_name": "clone1",
                "app_consistent": false
            })))
            .respond_with(ResponseTemplate::new(202).set_body_json(in_progress_task("1")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/tasks/1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(complete_task("1", &["2"], None)),
            )
            .expect(1)
            .mount(&server)
            .await;
        mount_vm(&server, "2", "clone1").await;

        let vm = client
            .virtual_machines()
            .clone_vm(&VmId::new("1"), "clone1", false)
            .await
            .unwrap();
        assert_eq!(vm.id.as_str(), "2");
        assert_eq!(vm.name, "clone1");
    }

    #[tokio::test]
    async fn clone_without_affected_objects_fails_with_error_code() {
        let server = MockServer::start().await;
        let client = mock_client(&server).await;

        Mock::given(method("POST"))
            .and(path("/api/virtual_machines/1/clone"))
            .respond_with(
                ResponseTemplate::new(202).set_body_json(complete_task("1", &[], Some(42))),
            )
            .mount(&server)
            .await;

        let err = client
            .virtual_machines()
            .clone_vm(&VmId::new("1"), "clone1", true)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            Error::OperationFailed {
                operation: "Clone".to_string(),
                error_code: 42
            }
        );
        assert!(err.to_string().contains("Error code:42"));
    }

    #[tokio::test]
    async fn null_affected_objects_fail_with_error_code_after_poll() {
        let server = MockServer::start().await;
        let client = mock_client(&server).await;

        Mock::given(method("POST"))
            .and(path("/api/virtual_machines/1/clone"))
            .respond_with(ResponseTemplate::new(202).set_body_json(in_progress_task("4")))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/tasks/4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "task": {
                    "id": "4",
                    "state": "FAILED",
                    "percent_complete": 100,
                    "affected_objects": null,
                    "error_code": 17
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = client
            .virtual_machines()
            .clone_vm(&VmId::new("1"), "clone1", false)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            Error::OperationFailed {
                operation: "Clone".to_string(),
                error_code: 17
            }
        );
    }

    #[tokio::test]
    async fn move_sends_destination_datastore() {
        let server = MockServer::start().await;
        let client = mock_client(&server).await;

        Mock::given(method("POST"))
            .and(path("/api/virtual_machines/1/move"))
            .and(body_json(json!({
                "virtual_machine_name": "moved",
                "destination_datastore_id": "ds-2"
            })))
            .respond_with(
                ResponseTemplate::new(202).set_body_json(complete_task("7", &["1"], None)),
            )
            .expect(1)
            .mount(&server)
            .await;
        mount_vm(&server, "1", "moved").await;

        let vm = client
            .virtual_machines()
            .move_vm(&VmId::new("1"), "moved", &DatastoreId::new("ds-2"))
            .await
            .unwrap();
        assert_eq!(vm.name, "moved");
    }

    #[tokio::test]
    async fn move_failure_names_the_operation() {
        let server = MockServer::start().await;
        let client = mock_client(&server).await;

        Mock::given(method("POST"))
            .and(path("/api/virtual_machines/1/move"))
            .respond_with(ResponseTemplate::new(202).set_body_json(complete_task("7", &[], None)))
            .mount(&server)
            .await;

        let err = client
            .virtual_machines()
            .move_vm(&VmId::new("1"), "moved", &DatastoreId::new("ds-2"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Move was not successful. Error code:0");
    }

    #[tokio::test]
    async fn create_backup_uses_destination_cluster_and_resolves_backup() {
        let server = MockServer::start().await;
        let client = mock_client(&server).await;

        Mock::given(method("POST"))
            .and(path("/api/virtual_machines/1/backup"))
            .and(body_json(json!({
                "backup_name": "nightly",
                "retention": 60,
                "destination_id": "c-2"
            })))
            .respond_with(
                ResponseTemplate::new(202).set_body_json(complete_task("3", &["b-1"], None)),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/backups"))
            .and(query_param("id", "b-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "backups": [{"id": "b-1", "name": "nightly", "state": "PROTECTED"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let backup = client
            .virtual_machines()
            .create_backup(
                &VmId::new("1"),
                CreateBackupRequest::new("nightly").with_retention(60),
                Some(&ClusterId::new("c-2")),
            )
            .await
            .unwrap();
        assert_eq!(backup.id.as_str(), "b-1");
        assert_eq!(backup.state.as_deref(), Some("PROTECTED"));
    }

    #[tokio::test]
    async fn set_policy_requires_affected_objects() {
        let server = MockServer::start().await;
        let client = mock_client(&server).await;

        Mock::given(method("POST"))
            .and(path("/api/virtual_machines/1/set_policy"))
            .and(body_json(json!({"policy_id": "p-1"})))
            .respond_with(
                ResponseTemplate::new(202).set_body_json(complete_task("4", &[], Some(5))),
            )
            .expect(1)
            .mount(&server)
            .await;

        let err = client
            .virtual_machines()
            .set_policy(&VmId::new("1"), &PolicyId::new("p-1"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Set policy was not successful. Error code:5");
    }

    #[tokio::test]
    async fn set_policy_succeeds_without_lookup() {
        let server = MockServer::start().await;
        let client = mock_client(&server).await;

        Mock::given(method("POST"))
            .and(path("/api/virtual_machines/1/set_policy"))
            .respond_with(
                ResponseTemplate::new(202).set_body_json(complete_task("4", &["1"], None)),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/virtual_machines"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        client
            .virtual_machines()
            .set_policy(&VmId::new("1"), &PolicyId::new("p-1"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn batch_set_policy_with_empty_list_sends_nothing() {
        let server = MockServer::start().await;
        let client = mock_client(&server).await;

        Mock::given(method("POST"))
            .and(path("/api/virtual_machines/set_policy"))
            .respond_with(ResponseTemplate::new(202))
            .expect(0)
            .mount(&server)
            .await;

        let err = client
            .virtual_machines()
            .set_policy_for_multiple(&PolicyId::new("p-1"), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn batch_set_policy_does_not_require_affected_objects() {
        let server = MockServer::start().await;
        let client = mock_client(&server).await;

        Mock::given(method("POST"))
            .and(path("/api/virtual_machines/set_policy"))
            .and(body_json(json!({
                "policy_id": "p-1",
                "virtual_machine_id": ["1", "2"]
            })))
            .respond_with(ResponseTemplate::new(202).set_body_json(complete_task("5", &[], None)))
            .expect(1)
            .mount(&server)
            .await;

        client
            .virtual_machines()
            .set_policy_for_multiple(&PolicyId::new("p-1"), &[VmId::new("1"), VmId::new("2")])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn backup_parameters_use_v1_11_media_type() {
        let server = MockServer::start().await;
        let client = mock_client(&server).await;

        Mock::given(method("POST"))
            .and(path("/api/virtual_machines/1/backup_parameters"))
            .and(header("content-type", MEDIA_TYPE_V1_11))
            .and(body_json(json!({
                "guest_username": "admin",
                "guest_password": "pw",
                "app_aware_type": "VSS"
            })))
            .respond_with(
                ResponseTemplate::new(202).set_body_json(complete_task("6", &["1"], None)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let parameters = SetBackupParametersRequest::new("admin", "pw").with_app_aware_type("VSS");
        client
            .virtual_machines()
            .set_backup_parameters(&VmId::new("1"), &parameters)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn power_off_uses_v1_11_media_type_and_checks_result() {
        let server = MockServer::start().await;
        let client = mock_client(&server).await;

        Mock::given(method("POST"))
            .and(path("/api/virtual_machines/1/power_off"))
            .and(header("content-type", MEDIA_TYPE_V1_11))
            .respond_with(
                ResponseTemplate::new(202).set_body_json(complete_task("8", &[], Some(3))),
            )
            .expect(1)
            .mount(&server)
            .await;

        let err = client
            .virtual_machines()
            .update_power_state(&VmId::new("1"), "off".parse::<PowerState>().unwrap())
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Setting power state operation was not successful. Error code:3"
        );
    }

    #[tokio::test]
    async fn power_on_hits_power_on_path() {
        let server = MockServer::start().await;
        let client = mock_client(&server).await;

        Mock::given(method("POST"))
            .and(path("/api/virtual_machines/1/power_on"))
            .respond_with(
                ResponseTemplate::new(202).set_body_json(complete_task("8", &["1"], None)),
            )
            .expect(1)
            .mount(&server)
            .await;

        client
            .virtual_machines()
            .power_on(&VmId::new("1"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn backups_lists_vm_backups() {
        let server = MockServer::start().await;
        let client = mock_client(&server).await;

        Mock::given(method("GET"))
            .and(path("/api/virtual_machines/1/backups"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "offset": 0,
                "count": 2,
                "limit": 500,
                "backups": [{"id": "b-1", "name": "one"}, {"id": "b-2", "name": "two"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let backups = client
            .virtual_machines()
            .backups(&VmId::new("1"))
            .await
            .unwrap();
        assert_eq!(backups.count, 2);
        assert_eq!(backups.members[1].name, "two");
    }

    #[tokio::test]
    async fn submit_error_is_returned_unchanged() {
        let server = MockServer::start().await;
        let client = mock_client(&server).await;

        Mock::given(method("POST"))
            .and(path("/api/virtual_machines/1/clone"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "Bad Request",
                "message": "Invalid name",
                "status": "400"
            })))
            .mount(&server)
            .await;

        let err = client
            .virtual_machines()
            .clone_vm(&VmId::new("1"), "", false)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Error: Status code:400 - Invalid name");
    }
}
