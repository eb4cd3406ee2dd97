mod client;
mod endpoints;
mod error;
pub mod in_memory;
mod ingestion;
mod logging;
mod object_storage;
mod signer;

use std::io::Read;

use logrestore_models::{
    logging::{CreateLogDetails, CreateLogGroupDetails, LogGroupSummary, LogSummary, PutLogsDetails},
    storage::{Bucket, ObjectListing},
};

pub use client::OciClient;
pub use endpoints::OciEndpoints;
pub use error::{OciError, Result};
pub use in_memory::InMemoryCloud;
pub use object_storage::{ListObjectsRequest, ObjectPages};
pub use signer::RequestSigner;

/// Object body stream returned by [`ObjectStore::get_object`].
pub type ObjectBody = Box<dyn Read + Send>;

/// Object Storage operations used to locate and fetch archive objects.
pub trait ObjectStore {
    /// Object Storage namespace of the tenancy owning `compartment_id`.
    fn get_namespace(&self, compartment_id: &str) -> Result<String>;

    fn get_bucket(&self, namespace: &str, bucket: &str) -> Result<Bucket>;

    /// Fetch one page of objects. `request.start` resumes a previous listing.
    fn list_objects(&self, request: &ListObjectsRequest) -> Result<ObjectListing>;

    fn get_object(&self, namespace: &str, bucket: &str, object_name: &str) -> Result<ObjectBody>;
}

/// Logging management operations for log groups and logs.
pub trait LogManagement {
    fn list_log_groups(&self, compartment_id: &str, display_name: &str)
        -> Result<Vec<LogGroupSummary>>;

    /// Request creation of a log group. The group may not be listed right away.
    fn create_log_group(&self, details: &CreateLogGroupDetails) -> Result<()>;

    fn list_logs(
        &self,
        log_group_id: &str,
        log_type: &str,
        display_name: &str,
    ) -> Result<Vec<LogSummary>>;

    /// Request creation of a log in a group. The log may not be listed right away.
    fn create_log(&self, log_group_id: &str, details: &CreateLogDetails) -> Result<()>;
}

/// Logging ingestion; one call submits every batch in `details`.
pub trait LogIngestion {
    fn put_logs(&self, log_id: &str, details: &PutLogsDetails) -> Result<()>;
}
