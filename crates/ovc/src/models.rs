//! OVC entity models and operation request bodies.
//!
//! Entities are snapshots of controller state. Every field besides the id and
//! name is optional because the controller omits fields it was not asked for
//! (see [`ListParams::with_fields`](ovc_core::query::ListParams::with_fields)).

use chrono::{DateTime, Utc};
use ovc_core::de::null_as_default;
use ovc_core::id::{BackupId, ClusterId, DatastoreId, HostId, PersistentVolumeId, PolicyId, VmId};
use ovc_core::Error;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Replica placement of a virtual machine or persistent volume.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaSet {
    /// Replica role (`PRIMARY`, `SECONDARY`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Host holding the replica
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<HostId>,
}

/// A virtual machine managed by the federation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VirtualMachine {
    /// Virtual machine id.
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: VmId,
    /// Virtual machine name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Lifecycle state (`ALIVE`, `DELETED`, `REMOVED`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Creation timestamp as reported by the hypervisor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Deletion timestamp, if deleted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<String>,
    /// Name of the assigned backup policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_name: Option<String>,
    /// Assigned backup policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<PolicyId>,
    /// Name of the datastore holding the VM.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datastore_name: Option<String>,
    /// Datastore holding the VM.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datastore_id: Option<DatastoreId>,
    /// Name of the owning cluster.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub omnistack_cluster_name: Option<String>,
    /// Owning cluster.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub omnistack_cluster_id: Option<ClusterId>,
    /// Application-aware backup status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_aware_vm_status: Option<String>,
    /// Hypervisor object id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hypervisor_object_id: Option<String>,
    /// Hypervisor type (`VSPHERE`, `HYPERV`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hypervisor_type: Option<String>,
    /// Hypervisor management system address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hypervisor_management_system: Option<String>,
    /// Hypervisor management system name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hypervisor_management_system_name: Option<String>,
    /// Host running the VM.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_id: Option<HostId>,
    /// Hypervisor object id of the compute cluster's parent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute_cluster_parent_hypervisor_object_id: Option<String>,
    /// Compute cluster name. Older controllers misspell the key.
    #[serde(
        default,
        alias = "cumpute_cluster_name",
        skip_serializing_if = "Option::is_none"
    )]
    pub compute_cluster_name: Option<String>,
    /// Cluster groups the VM belongs to.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub cluster_group_ids: Vec<String>,
    /// Replica placement.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub replica_set: Vec<ReplicaSet>,
}

/// A point-in-time backup of a virtual machine or persistent volume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    /// Backup id.
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: BackupId,
    /// Backup name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Name of the backed-up VM.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_machine_name: Option<String>,
    /// Backed-up VM.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_machine_id: Option<VmId>,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Consistency type (`NONE`, `DEFAULT`, `VSS`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consistency_type: Option<String>,
    /// Backup type (`MANUAL`, `POLICY`).
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub backup_type: Option<String>,
    /// Name of the datastore the VM lived on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datastore_name: Option<String>,
    /// Datastore the VM lived on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datastore_id: Option<DatastoreId>,
    /// Time the VM was deleted, if it was.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_machine_deletion_time: Option<i64>,
    /// Whether the data was flushed before the snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_consistent: Option<bool>,
    /// Hypervisor object id of the compute cluster's parent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute_cluster_parent_hypervisor_object_id: Option<String>,
    /// Compute cluster parent name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute_cluster_parent_name: Option<String>,
    /// Backup state (`PROTECTED`, `SAVING`, `FAILED`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Cluster that stores the backup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub omnistack_cluster_id: Option<ClusterId>,
    /// Name of the cluster that stores the backup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub omnistack_cluster_name: Option<String>,
    /// Virtual machine type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_machine_type: Option<String>,
    /// State of the VM when the backup was taken.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_machine_state: Option<String>,
    /// Time replication to the destination finished.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_completion_time: Option<String>,
    /// Bytes sent to the destination.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent: Option<i64>,
    /// Seconds spent sending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_duration: Option<i64>,
    /// Logical size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    /// Unique (non-shared) size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_size_bytes: Option<i64>,
    /// Time the unique size was computed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_size_timestamp: Option<String>,
    /// Expiration time, absent when the backup never expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<String>,
    /// Hypervisor type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hypervisor_type: Option<String>,
    /// Cluster groups the backup belongs to.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub cluster_group_ids: Vec<String>,
}

/// NFS share exported by a datastore.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatastoreShare {
    /// Client address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Host name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Read-write access.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rw: Option<bool>,
}

/// A datastore provisioned on a cluster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Datastore {
    /// Datastore id.
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: DatastoreId,
    /// Datastore name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Default backup policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<PolicyId>,
    /// Name of the default backup policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_name: Option<String>,
    /// Mount directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount_directory: Option<String>,
    /// Owning cluster.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub omnistack_cluster_id: Option<ClusterId>,
    /// Name of the owning cluster.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub omnistack_cluster_name: Option<String>,
    /// Whether the datastore was deleted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
    /// Size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    /// Hypervisor object id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hypervisor_object_id: Option<String>,
    /// Hypervisor type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hypervisor_type: Option<String>,
    /// Hypervisor management system address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hypervisor_management_system: Option<String>,
    /// Hypervisor management system name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hypervisor_management_system_name: Option<String>,
    /// Hypervisor object id of the compute cluster's parent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute_cluster_parent_hypervisor_object_id: Option<String>,
    /// Compute cluster parent name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute_cluster_parent_name: Option<String>,
    /// NFS shares.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub shares: Vec<DatastoreShare>,
    /// Cluster groups the datastore belongs to.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub cluster_group_ids: Vec<String>,
}

/// An OmniStack host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Host {
    /// Host id.
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: HostId,
    /// Host name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Host type.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub host_type: Option<String>,
    /// Connection state (`ALIVE`, `FAULTY`, `MANAGED`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Upgrade state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upgrade_state: Option<String>,
    /// Software version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Hardware model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Owning cluster.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub omnistack_cluster_id: Option<ClusterId>,
    /// Name of the virtual controller running on the host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_controller_name: Option<String>,
    /// Management network address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub management_ip: Option<String>,
    /// Management network mask.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub management_mask: Option<String>,
    /// Management network MTU.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub management_mtu: Option<String>,
    /// Federation network address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub federation_ip: Option<String>,
    /// Federation network mask.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub federation_mask: Option<String>,
    /// Federation network MTU.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub federation_mtu: Option<String>,
    /// Storage network address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_ip: Option<String>,
    /// Storage network mask.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_mask: Option<String>,
    /// Storage network MTU.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_mtu: Option<String>,
    /// Cluster feature level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_feature_level: Option<i64>,
    /// Current feature level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_feature_level: Option<i64>,
    /// Feature level reachable by upgrade.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub potential_feature_level: Option<i64>,
    /// Whether backup policies are enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_enabled: Option<bool>,
    /// Whether an upgrade can be rolled back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_rollback: Option<bool>,
    /// Hypervisor object id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hypervisor_object_id: Option<String>,
    /// Hypervisor management system address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hypervisor_management_system: Option<String>,
    /// Hypervisor management system name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hypervisor_management_system_name: Option<String>,
    /// Compute cluster name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute_cluster_name: Option<String>,
    /// Compute cluster hypervisor object id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute_cluster_hypervisor_object_id: Option<String>,
    /// Hypervisor object id of the compute cluster's parent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute_cluster_parent_hypervisor_object_id: Option<String>,
    /// Compute cluster parent name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute_cluster_parent_name: Option<String>,
    /// Cluster groups the host belongs to.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub cluster_group_ids: Vec<String>,
}

/// `InfoSight` telemetry settings of a cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfosightConfiguration {
    /// Registered with `InfoSight`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infosight_registered: Option<bool>,
    /// Telemetry enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infosight_enabled: Option<bool>,
    /// Proxy used to reach `InfoSight`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infosight_proxy_url: Option<String>,
}

/// An OmniStack cluster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OmniStackCluster {
    /// Cluster id.
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: ClusterId,
    /// Cluster name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Cluster type.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub cluster_type: Option<String>,
    /// Software version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Cluster feature level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_feature_level: Option<i64>,
    /// Member host ids.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<HostId>,
    /// Arbiter address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arbiter_address: Option<String>,
    /// Whether the arbiter is reachable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arbiter_connected: Option<bool>,
    /// Hypervisor object id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hypervisor_object_id: Option<String>,
    /// Hypervisor parent object id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hypervisor_object_parent_id: Option<String>,
    /// Hypervisor parent object name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hypervisor_object_parent_name: Option<String>,
    /// Hypervisor type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hypervisor_type: Option<String>,
    /// Hypervisor management system address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hypervisor_management_system: Option<String>,
    /// Hypervisor management system name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hypervisor_management_system_name: Option<String>,
    /// `InfoSight` settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infosight_configuration: Option<InfosightConfiguration>,
    /// Whether Intersight Workload Optimizer is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iwo_enabled: Option<bool>,
    /// Cluster groups the cluster belongs to.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub cluster_group_ids: Vec<String>,
}

/// A backup policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    /// Policy id.
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: PolicyId,
    /// Policy name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Backup rules, passed through as sent.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<serde_json::Value>,
    /// Cluster groups the policy belongs to.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub cluster_group_ids: Vec<String>,
}

/// A Kubernetes persistent volume backed by the federation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistentVolume {
    /// Persistent volume id.
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: PersistentVolumeId,
    /// Persistent volume name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Lifecycle state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Deletion timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<String>,
    /// Name of the assigned backup policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_name: Option<String>,
    /// Assigned backup policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<PolicyId>,
    /// Name of the datastore holding the volume.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datastore_name: Option<String>,
    /// Datastore holding the volume.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datastore_id: Option<DatastoreId>,
    /// Name of the owning cluster.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub omnistack_cluster_name: Option<String>,
    /// Owning cluster.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub omnistack_cluster_id: Option<ClusterId>,
    /// Application-aware backup status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_aware_vm_status: Option<String>,
    /// Hypervisor object id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hypervisor_object_id: Option<String>,
    /// Hypervisor type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hypervisor_type: Option<String>,
    /// Hypervisor management system address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hypervisor_management_system: Option<String>,
    /// Hypervisor management system name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hypervisor_management_system_name: Option<String>,
    /// Host serving the volume.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_id: Option<HostId>,
    /// Hypervisor object id of the compute cluster's parent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute_cluster_parent_hypervisor_object_id: Option<String>,
    /// Compute cluster parent name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute_cluster_parent_name: Option<String>,
    /// Cluster groups the volume belongs to.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub cluster_group_ids: Vec<String>,
    /// Replica placement.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub replica_set: Vec<ReplicaSet>,
}

/// Body of a backup request for a VM or persistent volume.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreateBackupRequest {
    /// Name of the new backup.
    #[serde(rename = "backup_name", skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Consistency type; the controller defaults to `NONE`.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub consistency_type: String,
    /// Flush guest data to disk before the snapshot.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub app_consistent: bool,
    /// Minutes to keep the backup; 0 keeps it forever.
    #[serde(skip_serializing_if = "is_zero")]
    pub retention: u64,
    /// Cluster that stores the backup; the local cluster when unset.
    #[serde(rename = "destination_id", skip_serializing_if = "Option::is_none")]
    pub destination: Option<ClusterId>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_zero(value: &u64) -> bool {
    *value == 0
}

impl CreateBackupRequest {
    /// Create a request for a backup named `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the consistency type.
    #[must_use]
    pub fn with_consistency_type(mut self, consistency_type: impl Into<String>) -> Self {
        self.consistency_type = consistency_type.into();
        self
    }

    /// Request an application-consistent backup.
    #[must_use]
    pub const fn with_app_consistent(mut self, app_consistent: bool) -> Self {
        self.app_consistent = app_consistent;
        self
    }

    /// Set the retention in minutes.
    #[must_use]
    pub const fn with_retention(mut self, minutes: u64) -> Self {
        self.retention = minutes;
        self
    }

    /// Store the backup on `cluster`.
    #[must_use]
    pub fn with_destination(mut self, cluster: ClusterId) -> Self {
        self.destination = Some(cluster);
        self
    }
}

/// Body of a backup parameters request.
#[derive(Default, Serialize)]
pub struct SetBackupParametersRequest {
    /// Guest OS user name.
    #[serde(rename = "guest_username", skip_serializing_if = "String::is_empty")]
    pub username: String,
    /// Guest OS password.
    #[serde(
        rename = "guest_password",
        serialize_with = "serialize_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub password: Option<SecretString>,
    /// Skip the controller's VM validation.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub override_validation: bool,
    /// Application-aware type (`VSS`, `DEFAULT`, `NONE`).
    #[serde(skip_serializing_if = "String::is_empty")]
    pub app_aware_type: String,
}

#[allow(clippy::ref_option)]
fn serialize_secret<S>(secret: &Option<SecretString>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match secret {
        Some(secret) => serializer.serialize_str(secret.expose_secret()),
        None => serializer.serialize_none(),
    }
}

impl SetBackupParametersRequest {
    /// Create a request with guest credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Some(SecretString::from(password.into())),
            ..Self::default()
        }
    }

    /// Skip the controller's VM validation.
    #[must_use]
    pub const fn with_override_validation(mut self, override_validation: bool) -> Self {
        self.override_validation = override_validation;
        self
    }

    /// Set the application-aware type.
    #[must_use]
    pub fn with_app_aware_type(mut self, app_aware_type: impl Into<String>) -> Self {
        self.app_aware_type = app_aware_type.into();
        self
    }
}

impl fmt::Debug for SetBackupParametersRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetBackupParametersRequest")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("override_validation", &self.override_validation)
            .field("app_aware_type", &self.app_aware_type)
            .finish()
    }
}

/// Target power state of a virtual machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerState {
    /// Power the VM on
    On,
    /// Power the VM off
    Off,
}

impl PowerState {
    /// Operation path segment.
    #[must_use]
    pub const fn action(self) -> &'static str {
        match self {
            Self::On => "power_on",
            Self::Off => "power_off",
        }
    }
}

impl FromStr for PowerState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            _ => Err(Error::InvalidRequest("Pass a valid power state".to_string())),
        }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::On => "on",
            Self::Off => "off",
        })
    }
}
