//! Persistent volume operations.
//!
//! Every persistent volume endpoint requires the v1.16 media type, which the
//! accessor attaches to each request.

use crate::models::{Backup, CreateBackupRequest, PersistentVolume};
use crate::resource::{Resource, ResourceAccessor, ResourceList};
use crate::Result;
use ovc_core::id::{ClusterId, PersistentVolumeId, PolicyId};
use ovc_core::query::ListParams;
use ovc_core::transport::ApiRequest;
use ovc_core::Error;
use serde::Serialize;

#[derive(Serialize)]
struct SetPolicyBatchRequest<'a> {
    policy_id: &'a PolicyId,
    persistent_volume_id: &'a [PersistentVolumeId],
}

impl ResourceAccessor<PersistentVolume> {
    /// Assign `policy` to every volume in `volumes` with a single task.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] without contacting the controller when
    /// `volumes` is empty.
    pub async fn set_policy_for_multiple(
        &self,
        policy: &PolicyId,
        volumes: &[PersistentVolumeId],
    ) -> Result<()> {
        if volumes.is_empty() {
            return Err(Error::InvalidRequest(
                "Pass a list of PV resources".to_string(),
            ));
        }

        let path = format!("{}/set_policy", PersistentVolume::PATH);
        let request = ApiRequest::post(path).with_json(&SetPolicyBatchRequest {
            policy_id: policy,
            persistent_volume_id: volumes,
        })?;

        self.submit_and_wait(request).await?;
        Ok(())
    }

    /// Back up `volume`, optionally storing the backup on `destination`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] when the task affected nothing.
    pub async fn create_backup(
        &self,
        volume: &PersistentVolumeId,
        request: CreateBackupRequest,
        destination: Option<&ClusterId>,
    ) -> Result<Backup> {
        let mut body = request;
        if let Some(cluster) = destination {
            body.destination = Some(cluster.clone());
        }

        let path = format!("{}/{volume}/backup", PersistentVolume::PATH);
        let request = ApiRequest::post(path).with_json(&body)?;
        let task = self.run_operation("Backup", request).await?;
        self.resolve_affected(&task).await
    }

    /// Backups of the volume named `name`.
    ///
    /// # Errors
    ///
    /// Returns transport, API or decode errors.
    pub async fn backups(&self, name: &str) -> Result<ResourceList<Backup>> {
        self.related::<Backup>()
            .list(&ListParams::filter("pv", name))
            .await
    }
}
