//! Generic resource accessor.
//!
//! Every OVC collection supports the same list/filter/lookup calls, so a single
//! [`ResourceAccessor`] parameterized by the entity type serves all of them. The
//! [`Resource`] trait supplies what differs between kinds: the collection path,
//! the envelope field holding the members, and any per-kind headers.

use crate::client::ClientContext;
use crate::models::{
    Backup, Datastore, Host, OmniStackCluster, PersistentVolume, Policy, VirtualMachine,
};
use crate::Result;
use ovc_core::client::MEDIA_TYPE_V1_16;
use ovc_core::de::null_as_default;
use ovc_core::id::{BackupId, ClusterId, DatastoreId, HostId, PersistentVolumeId, PolicyId, VmId};
use ovc_core::query::ListParams;
use ovc_core::task::Task;
use ovc_core::transport::ApiRequest;
use ovc_core::{CancellationToken, Error};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Message of the error returned when a lookup matches nothing.
pub const NOT_FOUND_MESSAGE: &str = "Resource doesn't exist";

/// An OVC resource kind.
pub trait Resource: DeserializeOwned + Send + Sync + 'static {
    /// Identifier type.
    type Id: AsRef<str> + From<String> + fmt::Display + Send + Sync;

    /// Collection path below the API base, e.g. `/virtual_machines`.
    const PATH: &'static str;

    /// Envelope field holding the members of a list response.
    const COLLECTION: &'static str;

    /// Extra headers sent with every request for this kind.
    const HEADERS: &'static [(&'static str, &'static str)] = &[];

    /// The entity's identifier.
    fn id(&self) -> &Self::Id;

    /// The entity's name.
    fn name(&self) -> &str;
}

macro_rules! impl_resource {
    ($ty:ty, $id:ty, $path:literal, $collection:literal) => {
        impl_resource!($ty, $id, $path, $collection, &[]);
    };
    ($ty:ty, $id:ty, $path:literal, $collection:literal, $headers:expr) => {
        impl Resource for $ty {
            type Id = $id;
            const PATH: &'static str = $path;
            const COLLECTION: &'static str = $collection;
            const HEADERS: &'static [(&'static str, &'static str)] = $headers;

            fn id(&self) -> &Self::Id {
                &self.id
            }

            fn name(&self) -> &str {
                &self.name
            }
        }
    };
}

impl_resource!(VirtualMachine, VmId, "/virtual_machines", "virtual_machines");
impl_resource!(Backup, BackupId, "/backups", "backups");
impl_resource!(Datastore, DatastoreId, "/datastores", "datastores");
impl_resource!(Host, HostId, "/hosts", "hosts");
impl_resource!(
    OmniStackCluster,
    ClusterId,
    "/omnistack_clusters",
    "omnistack_clusters"
);
impl_resource!(Policy, PolicyId, "/policies", "policies");
impl_resource!(
    PersistentVolume,
    PersistentVolumeId,
    "/persistent_volumes",
    "persistent_volumes",
    &[("Accept", MEDIA_TYPE_V1_16), ("Content-Type", MEDIA_TYPE_V1_16)]
);

/// One page of a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceList<T> {
    /// Offset of the first member.
    pub offset: u64,
    /// Total number of matching entities.
    pub count: u64,
    /// Page size applied by the controller.
    pub limit: u64,
    /// Entities on this page, in server order.
    pub members: Vec<T>,
}

#[derive(Deserialize)]
struct RawList {
    #[serde(default, deserialize_with = "null_as_default")]
    offset: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    limit: u64,
    #[serde(flatten)]
    fields: serde_json::Map<String, serde_json::Value>,
}

impl<T> ResourceList<T>
where
    T: Resource,
{
    /// Decode a list envelope; a missing collection field means no members.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DecodeError`] if the body is not a valid envelope.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let mut raw: RawList = serde_json::from_slice(body).map_err(|err| {
            Error::DecodeError(format!("Failed to parse OVC {} list: {err}", T::COLLECTION))
        })?;

        let members = match raw.fields.remove(T::COLLECTION) {
            None | Some(serde_json::Value::Null) => Vec::new(),
            Some(value) => serde_json::from_value(value).map_err(|err| {
                Error::DecodeError(format!("Failed to parse OVC {}: {err}", T::COLLECTION))
            })?,
        };

        Ok(Self {
            offset: raw.offset,
            count: raw.count,
            limit: raw.limit,
            members,
        })
    }
}

impl<T> ResourceList<T> {
    /// Number of members on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns true if the page holds no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// First member, if any.
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.members.first()
    }
}

impl<T> IntoIterator for ResourceList<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.into_iter()
    }
}

/// Query and operation entry point for one resource kind.
pub struct ResourceAccessor<T> {
    context: Arc<ClientContext>,
    cancel: Option<CancellationToken>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for ResourceAccessor<T> {
    fn clone(&self) -> Self {
        Self {
            context: Arc::clone(&self.context),
            cancel: self.cancel.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for ResourceAccessor<T>
where
    T: Resource,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceAccessor")
            .field("path", &T::PATH)
            .field("cancellable", &self.cancel.is_some())
            .finish_non_exhaustive()
    }
}

impl<T> ResourceAccessor<T>
where
    T: Resource,
{
    pub(crate) fn new(context: Arc<ClientContext>) -> Self {
        Self {
            context,
            cancel: None,
            _marker: PhantomData,
        }
    }

    /// Abort requests and task waits made through this accessor when `token`
    /// is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Accessor for another kind sharing this accessor's client and
    /// cancellation token.
    #[must_use]
    pub fn related<U>(&self) -> ResourceAccessor<U>
    where
        U: Resource,
    {
        ResourceAccessor {
            context: Arc::clone(&self.context),
            cancel: self.cancel.clone(),
            _marker: PhantomData,
        }
    }

    /// List entities matching `params`.
    ///
    /// # Errors
    ///
    /// Returns transport, API or decode errors.
    pub async fn list(&self, params: &ListParams) -> Result<ResourceList<T>> {
        let request = ApiRequest::get(T::PATH).with_query(params.to_pairs());
        self.fetch_list(request).await
    }

    /// List entities whose `field` equals `value`.
    ///
    /// # Errors
    ///
    /// Returns transport, API or decode errors.
    pub async fn find_by(&self, field: &str, value: &str) -> Result<Vec<T>> {
        let list = self.list(&ListParams::filter(field, value)).await?;
        Ok(list.members)
    }

    /// First entity named `name`, in server order.
    ///
    /// Names are not unique; later matches are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when nothing matches.
    pub async fn find_by_name(&self, name: &str) -> Result<T> {
        self.find_first("name", name).await
    }

    /// The entity with identifier `id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when nothing matches.
    pub async fn find_by_id(&self, id: &T::Id) -> Result<T> {
        self.find_first("id", id.as_ref()).await
    }

    async fn find_first(&self, field: &str, value: &str) -> Result<T> {
        self.find_by(field, value)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                debug!(path = T::PATH, field, value, "OVC lookup matched nothing");
                Error::NotFound(NOT_FOUND_MESSAGE.to_string())
            })
    }

    /// Attach this kind's headers to `request`.
    pub(crate) fn prepare(&self, request: ApiRequest) -> ApiRequest {
        request.with_headers(T::HEADERS)
    }

    /// Send `request` with this kind's headers.
    pub(crate) async fn send(&self, request: ApiRequest) -> Result<Vec<u8>> {
        let request = self.prepare(request);
        self.context
            .transport
            .request_cancellable(&request, self.cancel.as_ref())
            .await
    }

    /// Send a `GET` and decode a list of `U` from the response.
    pub(crate) async fn fetch_list<U>(&self, request: ApiRequest) -> Result<ResourceList<U>>
    where
        U: Resource,
    {
        let body = self.send(request).await?;
        ResourceList::from_slice(&body)
    }

    /// Submit a task-producing request and wait for the task to finish.
    pub(crate) async fn submit_and_wait(&self, request: ApiRequest) -> Result<Task> {
        info!(path = request.path(), "Submitting OVC operation");
        let body = self.send(request).await?;
        self.context
            .poller
            .wait_for_completion(&body, self.cancel.as_ref())
            .await
    }

    /// Submit, wait, and require the finished task to report affected objects.
    pub(crate) async fn run_operation(&self, operation: &str, request: ApiRequest) -> Result<Task> {
        let task = self.submit_and_wait(request).await?;
        require_affected(operation, task)
    }

    /// Look up the first object the task affected as a `U`.
    pub(crate) async fn resolve_affected<U>(&self, task: &Task) -> Result<U>
    where
        U: Resource,
    {
        let affected = task
            .first_affected()
            .ok_or_else(|| Error::NotFound(NOT_FOUND_MESSAGE.to_string()))?;
        let id = U::Id::from(affected.object_id.clone());
        self.related::<U>().find_by_id(&id).await
    }
}

fn require_affected(operation: &str, task: Task) -> Result<Task> {
    if task.affected_objects.is_empty() {
        warn!(
            task_id = %task.id,
            state = %task.state,
            error_code = task.error_code_or_default(),
            "{operation} finished without affected objects"
        );
        return Err(Error::OperationFailed {
            operation: operation.to_string(),
            error_code: task.error_code_or_default(),
        });
    }
    Ok(task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::mock_client;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn assert_lookup_semantics<T>(server: &MockServer, accessor: ResourceAccessor<T>)
    where
        T: Resource + fmt::Debug,
    {
        Mock::given(method("GET"))
            .and(path(format!("/api{}", T::PATH)))
            .and(query_param("name", "dup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "offset": 0,
                "count": 2,
                "limit": 500,
                (T::COLLECTION): [
                    {"id": "first", "name": "dup"},
                    {"id": "second", "name": "dup"}
                ]
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/api{}", T::PATH)))
            .and(query_param("id", "first"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                (T::COLLECTION): [{"id": "first", "name": "dup"}]
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/api{}", T::PATH)))
            .and(query_param("name", "missing"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "offset": 0,
                "count": 0,
                "limit": 500,
                (T::COLLECTION): []
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/api{}", T::PATH)))
            .and(query_param("id", "missing"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 0})))
            .mount(server)
            .await;

        let by_name = accessor.find_by_name("dup").await.unwrap();
        assert_eq!(by_name.id().as_ref(), "first", "{}", T::PATH);
        assert_eq!(by_name.name(), "dup");

        let by_id = accessor
            .find_by_id(&T::Id::from("first".to_string()))
            .await
            .unwrap();
        assert_eq!(by_id.id().as_ref(), "first");

        let err = accessor.find_by_name("missing").await.unwrap_err();
        assert_eq!(err, Error::NotFound(NOT_FOUND_MESSAGE.to_string()));

        let err = accessor
            .find_by_id(&T::Id::from("missing".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err, Error::NotFound(NOT_FOUND_MESSAGE.to_string()));
    }

    #[tokio::test]
    async fn lookups_return_first_match_or_not_found_for_every_kind() {
        let server = MockServer::start().await;
        let client = mock_client(&server).await;

        assert_lookup_semantics(&server, client.virtual_machines()).await;
        assert_lookup_semantics(&server, client.backups()).await;
        assert_lookup_semantics(&server, client.datastores()).await;
        assert_lookup_semantics(&server, client.hosts()).await;
        assert_lookup_semantics(&server, client.omnistack_clusters()).await;
        assert_lookup_semantics(&server, client.policies()).await;
        assert_lookup_semantics(&server, client.persistent_volumes()).await;
    }

    #[tokio::test]
    async fn list_sends_default_limit_and_filters() {
        let server = MockServer::start().await;
        let client = mock_client(&server).await;

        Mock::given(method("GET"))
            .and(path("/api/datastores"))
            .and(query_param("limit", "500"))
            .and(query_param("offset", "0"))
            .and(query_param("show_optional_fields", "false"))
            .and(query_param("omnistack_cluster_id", "c1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "offset": 0,
                "count": 1,
                "limit": 500,
                "datastores": [{"id": "ds1", "name": "DS1", "size": 1024}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let params = ListParams::new()
            .with_limit(0)
            .with_filter("omnistack_cluster_id", "c1");
        let list = client.datastores().list(&params).await.unwrap();

        assert_eq!(list.count, 1);
        assert_eq!(list.limit, 500);
        assert_eq!(list.len(), 1);
        assert_eq!(list.first().unwrap().size, Some(1024));
    }

    #[tokio::test]
    async fn persistent_volume_queries_carry_versioned_media_type() {
        let server = MockServer::start().await;
        let client = mock_client(&server).await;

        Mock::given(method("GET"))
            .and(path("/api/persistent_volumes"))
            .and(header("accept", MEDIA_TYPE_V1_16))
            .and(header("content-type", MEDIA_TYPE_V1_16))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "persistent_volumes": [{"id": "pv1", "name": "claim-1"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let list = client
            .persistent_volumes()
            .list(&ListParams::new())
            .await
            .unwrap();
        assert_eq!(list.members[0].id.as_str(), "pv1");
    }

    #[test]
    fn list_envelope_without_collection_is_empty() {
        let list = ResourceList::<Host>::from_slice(br#"{"offset": 0, "count": 0, "limit": 500}"#)
            .unwrap();
        assert!(list.is_empty());

        let list =
            ResourceList::<Host>::from_slice(br#"{"hosts": null, "count": 0}"#).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn list_envelope_with_bad_members_is_decode_error() {
        let err = ResourceList::<Policy>::from_slice(br#"{"policies": {"id": 1}}"#).unwrap_err();
        assert!(matches!(err, Error::DecodeError(_)));
    }

    #[test]
    fn require_affected_reports_error_code() {
        let task = Task {
            error_code: Some(42),
            ..Task::default()
        };
        let err = require_affected("Clone", task).unwrap_err();
        assert_eq!(err.to_string(), "Clone was not successful. Error code:42");
    }
}
