pub mod enumerator;
mod error;
pub mod pipeline;
pub mod provisioner;
pub mod transform;

use log::info;
use logrestore_config::RestoreConfig;
use logrestore_oci::{LogIngestion, LogManagement, ObjectStore};

pub use error::{LineError, ProvisionError, RestoreError, Result};
pub use pipeline::{RestoreTarget, RestoredObject};

/// What a run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreSummary {
    pub namespace: String,
    pub matched: Vec<String>,
    pub log_group_id: Option<String>,
    pub log_id: Option<String>,
    pub restored: Vec<RestoredObject>,
}

/// Run one restore: enumerate, provision the destination, then restore each
/// matched object in turn.
pub fn run_restore<C>(config: &RestoreConfig, cloud: &C) -> Result<RestoreSummary>
where
    C: ObjectStore + LogManagement + LogIngestion + ?Sized,
{
    let namespace =
        cloud
            .get_namespace(&config.compartment_id)
            .map_err(|source| RestoreError::Namespace {
                compartment_id: config.compartment_id.clone(),
                source,
            })?;

    let matched = enumerator::find_archive_log_objects(
        cloud,
        &namespace,
        &config.bucket,
        &config.folder,
        &config.window,
        config.listing,
    )?;

    if matched.is_empty() {
        info!("There are no matching log archive files for the time period requested");
        return Ok(RestoreSummary {
            namespace,
            matched,
            log_group_id: None,
            log_id: None,
            restored: Vec::new(),
        });
    }

    let log_group_id =
        provisioner::ensure_log_group(cloud, &config.compartment_id, &config.provision)?;
    let log_id =
        provisioner::ensure_log(cloud, &log_group_id, &config.log_name, &config.provision)?;

    info!("Restoring archive logs....");
    let target = RestoreTarget {
        namespace: &namespace,
        bucket: &config.bucket,
        log_id: &log_id,
        work_dir: &config.work_dir,
    };
    let restored = pipeline::restore_logs(cloud, cloud, &target, &matched)?;
    info!("Completed processing {} archive log(s)....", restored.len());

    Ok(RestoreSummary {
        namespace,
        matched,
        log_group_id: Some(log_group_id),
        log_id: Some(log_id),
        restored,
    })
}
