use std::{
    collections::{BTreeMap, HashMap},
    io::Cursor,
    sync::Arc,
};

use chrono::{DateTime, Utc};
use logrestore_models::{
    logging::{CreateLogDetails, CreateLogGroupDetails, LogGroupSummary, LogSummary, PutLogsDetails},
    storage::{Bucket, ObjectListing, StorageObject},
};
use parking_lot::Mutex;

use crate::{
    LogIngestion, LogManagement, ObjectBody, ObjectStore, error::OciError, error::Result,
    object_storage::ListObjectsRequest,
};

struct StoredObject {
    time_created: Option<DateTime<Utc>>,
    body: Vec<u8>,
}

/// A created resource that stays out of listings for `hidden_for` more lookups.
struct Pending<T> {
    resource: T,
    hidden_for: u32,
}

#[derive(Default)]
struct CloudState {
    namespace: String,
    buckets: HashMap<String, BTreeMap<String, StoredObject>>,
    log_groups: Vec<Pending<LogGroupSummary>>,
    logs: Vec<Pending<LogSummary>>,
    visibility_delay: u32,
    next_id: u64,
    log_group_creations: usize,
    log_creations: usize,
    list_requests: Vec<ListObjectsRequest>,
    downloads: Vec<String>,
    pushes: Vec<(String, PutLogsDetails)>,
}

impl CloudState {
    fn next_ocid(&mut self, kind: &str) -> String {
        self.next_id += 1;
        format!("ocid1.{kind}.oc1..inmemory{}", self.next_id)
    }
}

/// Object storage, logging management and ingestion held in process memory.
#[derive(Clone, Default)]
pub struct InMemoryCloud {
    state: Arc<Mutex<CloudState>>,
}

impl InMemoryCloud {
    pub fn new(namespace: impl Into<String>) -> Self {
        let cloud = Self::default();
        cloud.state.lock().namespace = namespace.into();
        cloud
    }

    pub fn add_bucket(&self, bucket: impl Into<String>) {
        self.state.lock().buckets.entry(bucket.into()).or_default();
    }

    /// Store an object, creating the bucket if needed.
    pub fn put_object(
        &self,
        bucket: &str,
        name: impl Into<String>,
        time_created: Option<DateTime<Utc>>,
        body: Vec<u8>,
    ) {
        self.state
            .lock()
            .buckets
            .entry(bucket.to_string())
            .or_default()
            .insert(name.into(), StoredObject { time_created, body });
    }

    /// Hide newly created log groups and logs from the next `lookups` listings.
    pub fn set_visibility_delay(&self, lookups: u32) {
        self.state.lock().visibility_delay = lookups;
    }

    pub fn log_group_creations(&self) -> usize {
        self.state.lock().log_group_creations
    }

    pub fn log_creations(&self) -> usize {
        self.state.lock().log_creations
    }

    pub fn list_requests(&self) -> Vec<ListObjectsRequest> {
        self.state.lock().list_requests.clone()
    }

    /// Names of downloaded objects, in download order.
    pub fn downloads(&self) -> Vec<String> {
        self.state.lock().downloads.clone()
    }

    /// Every `put_logs` call as `(log_id, details)`, in call order.
    pub fn pushes(&self) -> Vec<(String, PutLogsDetails)> {
        self.state.lock().pushes.clone()
    }
}

impl ObjectStore for InMemoryCloud {
    fn get_namespace(&self, _compartment_id: &str) -> Result<String> {
        Ok(self.state.lock().namespace.clone())
    }

    fn get_bucket(&self, namespace: &str, bucket: &str) -> Result<Bucket> {
        let guard = self.state.lock();
        if guard.namespace != namespace || !guard.buckets.contains_key(bucket) {
            return Err(OciError::not_found(
                format!("/n/{namespace}/b/{bucket}/"),
                "bucket does not exist",
            ));
        }
        Ok(Bucket {
            name: bucket.to_string(),
            namespace: namespace.to_string(),
            compartment_id: None,
        })
    }

    fn list_objects(&self, request: &ListObjectsRequest) -> Result<ObjectListing> {
        let mut guard = self.state.lock();
        guard.list_requests.push(request.clone());

        let objects = guard.buckets.get(&request.bucket).ok_or_else(|| {
            OciError::not_found(
                format!("/n/{}/b/{}/o", request.namespace, request.bucket),
                "bucket does not exist",
            )
        })?;

        let limit = request.limit.max(1) as usize;
        let mut matching = objects
            .iter()
            .filter(|(name, _)| name.starts_with(&request.prefix))
            .filter(|(name, _)| {
                request
                    .start
                    .as_deref()
                    .map_or(true, |start| name.as_str() >= start)
            });

        let page = matching
            .by_ref()
            .take(limit)
            .map(|(name, object)| StorageObject {
                name: name.clone(),
                time_created: object.time_created,
            })
            .collect();
        let next_start_with = matching.next().map(|(name, _)| name.clone());

        Ok(ObjectListing {
            objects: page,
            next_start_with,
        })
    }

    fn get_object(&self, namespace: &str, bucket: &str, object_name: &str) -> Result<ObjectBody> {
        let mut guard = self.state.lock();
        let body = guard
            .buckets
            .get(bucket)
            .and_then(|objects| objects.get(object_name))
            .map(|object| object.body.clone())
            .ok_or_else(|| {
                OciError::not_found(
                    format!("/n/{namespace}/b/{bucket}/o/{object_name}"),
                    "object does not exist",
                )
            })?;
        guard.downloads.push(object_name.to_string());
        Ok(Box::new(Cursor::new(body)))
    }
}

impl LogManagement for InMemoryCloud {
    fn list_log_groups(
        &self,
        compartment_id: &str,
        display_name: &str,
    ) -> Result<Vec<LogGroupSummary>> {
        let mut guard = self.state.lock();
        Ok(visible(&mut guard.log_groups, |group| {
            group.compartment_id.as_deref() == Some(compartment_id)
                && group.display_name == display_name
        }))
    }

    fn create_log_group(&self, details: &CreateLogGroupDetails) -> Result<()> {
        let mut guard = self.state.lock();
        let id = guard.next_ocid("loggroup");
        let hidden_for = guard.visibility_delay;
        guard.log_group_creations += 1;
        guard.log_groups.push(Pending {
            resource: LogGroupSummary {
                id,
                display_name: details.display_name.clone(),
                compartment_id: Some(details.compartment_id.clone()),
            },
            hidden_for,
        });
        Ok(())
    }

    fn list_logs(
        &self,
        log_group_id: &str,
        log_type: &str,
        display_name: &str,
    ) -> Result<Vec<LogSummary>> {
        let mut guard = self.state.lock();
        if !guard
            .log_groups
            .iter()
            .any(|pending| pending.resource.id == log_group_id)
        {
            return Err(OciError::not_found(
                format!("/logGroups/{log_group_id}/logs"),
                "log group does not exist",
            ));
        }
        Ok(visible(&mut guard.logs, |log| {
            log.log_group_id.as_deref() == Some(log_group_id)
                && log.log_type.as_deref() == Some(log_type)
                && log.display_name == display_name
        }))
    }

    fn create_log(&self, log_group_id: &str, details: &CreateLogDetails) -> Result<()> {
        let mut guard = self.state.lock();
        let id = guard.next_ocid("log");
        let hidden_for = guard.visibility_delay;
        guard.log_creations += 1;
        guard.logs.push(Pending {
            resource: LogSummary {
                id,
                display_name: details.display_name.clone(),
                log_group_id: Some(log_group_id.to_string()),
                log_type: Some(details.log_type.clone()),
            },
            hidden_for,
        });
        Ok(())
    }
}

impl LogIngestion for InMemoryCloud {
    fn put_logs(&self, log_id: &str, details: &PutLogsDetails) -> Result<()> {
        let mut guard = self.state.lock();
        if !guard.logs.iter().any(|pending| pending.resource.id == log_id) {
            return Err(OciError::not_found(
                format!("/logs/{log_id}/actions/push"),
                "log does not exist",
            ));
        }
        guard.pushes.push((log_id.to_string(), details.clone()));
        Ok(())
    }
}

/// Matching resources that are already visible; hidden matches count down one lookup.
fn visible<T: Clone>(resources: &mut [Pending<T>], matches: impl Fn(&T) -> bool) -> Vec<T> {
    let mut found = Vec::new();
    for pending in resources.iter_mut().filter(|pending| matches(&pending.resource)) {
        if pending.hidden_for == 0 {
            found.push(pending.resource.clone());
        } else {
            pending.hidden_for -= 1;
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prefix: &str, limit: u32, start: Option<&str>) -> ListObjectsRequest {
        ListObjectsRequest {
            namespace: "ns".into(),
            bucket: "archive".into(),
            prefix: prefix.into(),
            limit,
            start: start.map(str::to_string),
        }
    }

    #[test]
    fn listing_pages_by_name() {
        let cloud = InMemoryCloud::new("ns");
        for name in ["logs/a", "logs/b", "logs/c", "other/d"] {
            cloud.put_object("archive", name, None, Vec::new());
        }

        let first = cloud.list_objects(&request("logs/", 2, None)).unwrap();
        let names: Vec<_> = first.objects.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, ["logs/a", "logs/b"]);
        assert_eq!(first.next_start_with.as_deref(), Some("logs/c"));

        let second = cloud
            .list_objects(&request("logs/", 2, Some("logs/c")))
            .unwrap();
        assert_eq!(second.objects.len(), 1);
        assert_eq!(second.next_start_with, None);
    }

    #[test]
    fn created_resources_appear_after_delay() {
        let cloud = InMemoryCloud::new("ns");
        cloud.set_visibility_delay(1);
        cloud
            .create_log_group(&CreateLogGroupDetails {
                compartment_id: "c1".into(),
                display_name: "grp".into(),
                description: None,
            })
            .unwrap();

        assert!(cloud.list_log_groups("c1", "grp").unwrap().is_empty());
        assert_eq!(cloud.list_log_groups("c1", "grp").unwrap().len(), 1);
        assert!(cloud.list_log_groups("c2", "grp").unwrap().is_empty());
    }

    #[test]
    fn push_to_unknown_log_fails() {
        let cloud = InMemoryCloud::new("ns");
        let details = PutLogsDetails {
            specversion: "1.0".into(),
            log_entry_batches: Vec::new(),
        };
        assert!(cloud.put_logs("missing", &details).unwrap_err().is_not_found());
    }
}
