use std::thread;

use log::info;
use logrestore_config::ProvisionPolicy;
use logrestore_models::{
    core::{RESTORE_LOG_GROUP_DESCRIPTION, RESTORE_LOG_GROUP_NAME},
    logging::{CUSTOM_LOG_TYPE, CreateLogDetails, CreateLogGroupDetails},
};
use logrestore_oci::LogManagement;

use crate::error::ProvisionError;

const LOG_GROUP: &str = "log group";
const LOG: &str = "log";

/// Id of the restore log group in `compartment_id`, creating it if absent.
pub fn ensure_log_group<L>(
    logging: &L,
    compartment_id: &str,
    policy: &ProvisionPolicy,
) -> Result<String, ProvisionError>
where
    L: LogManagement + ?Sized,
{
    let lookup = || {
        logging
            .list_log_groups(compartment_id, RESTORE_LOG_GROUP_NAME)
            .map(|groups| groups.into_iter().next().map(|group| group.id))
            .map_err(|source| ProvisionError::Lookup {
                kind: LOG_GROUP,
                name: RESTORE_LOG_GROUP_NAME.to_string(),
                source,
            })
    };

    if let Some(id) = lookup()? {
        return Ok(id);
    }

    info!("Creating log group {}...", RESTORE_LOG_GROUP_NAME);
    logging
        .create_log_group(&CreateLogGroupDetails {
            compartment_id: compartment_id.to_string(),
            display_name: RESTORE_LOG_GROUP_NAME.to_string(),
            description: Some(RESTORE_LOG_GROUP_DESCRIPTION.to_string()),
        })
        .map_err(|source| ProvisionError::Create {
            kind: LOG_GROUP,
            name: RESTORE_LOG_GROUP_NAME.to_string(),
            source,
        })?;

    await_visible(LOG_GROUP, RESTORE_LOG_GROUP_NAME, policy, lookup)
}

/// Id of the custom log `display_name` in `log_group_id`, creating it if absent.
pub fn ensure_log<L>(
    logging: &L,
    log_group_id: &str,
    display_name: &str,
    policy: &ProvisionPolicy,
) -> Result<String, ProvisionError>
where
    L: LogManagement + ?Sized,
{
    let lookup = || {
        logging
            .list_logs(log_group_id, CUSTOM_LOG_TYPE, display_name)
            .map(|logs| logs.into_iter().next().map(|log| log.id))
            .map_err(|source| ProvisionError::Lookup {
                kind: LOG,
                name: display_name.to_string(),
                source,
            })
    };

    if let Some(id) = lookup()? {
        return Ok(id);
    }

    info!("Creating archive restore log: {}", display_name);
    logging
        .create_log(
            log_group_id,
            &CreateLogDetails {
                display_name: display_name.to_string(),
                log_type: CUSTOM_LOG_TYPE.to_string(),
                is_enabled: None,
            },
        )
        .map_err(|source| ProvisionError::Create {
            kind: LOG,
            name: display_name.to_string(),
            source,
        })?;

    await_visible(LOG, display_name, policy, lookup)
}

/// Repeat `lookup` until the created resource is listed. Lookup errors end
/// the wait immediately.
fn await_visible<F>(
    kind: &'static str,
    name: &str,
    policy: &ProvisionPolicy,
    mut lookup: F,
) -> Result<String, ProvisionError>
where
    F: FnMut() -> Result<Option<String>, ProvisionError>,
{
    let attempts = policy.attempts.max(1);
    for attempt in 1..=attempts {
        if let Some(id) = lookup()? {
            return Ok(id);
        }
        if attempt < attempts {
            info!(
                "Waiting for {} '{}' to become available ({}/{})",
                kind, name, attempt, attempts
            );
            thread::sleep(policy.interval);
        }
    }

    Err(ProvisionError::NotVisible {
        kind,
        name: name.to_string(),
        attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use logrestore_oci::InMemoryCloud;
    use std::time::Duration;

    fn policy(attempts: u32) -> ProvisionPolicy {
        ProvisionPolicy {
            attempts,
            interval: Duration::ZERO,
        }
    }

    #[test]
    fn get_or_create_is_idempotent() {
        let cloud = InMemoryCloud::new("ns");

        let group = ensure_log_group(&cloud, "c1", &policy(1)).unwrap();
        let log = ensure_log(&cloud, &group, "archive-restore-log", &policy(1)).unwrap();
        assert_eq!(cloud.log_group_creations(), 1);
        assert_eq!(cloud.log_creations(), 1);

        assert_eq!(ensure_log_group(&cloud, "c1", &policy(1)).unwrap(), group);
        assert_eq!(
            ensure_log(&cloud, &group, "archive-restore-log", &policy(1)).unwrap(),
            log
        );
        assert_eq!(cloud.log_group_creations(), 1);
        assert_eq!(cloud.log_creations(), 1);
    }

    #[test]
    fn waits_for_created_group_to_be_listed() {
        let cloud = InMemoryCloud::new("ns");
        cloud.set_visibility_delay(2);

        let group = ensure_log_group(&cloud, "c1", &policy(3)).unwrap();
        assert!(group.starts_with("ocid1.loggroup."));
        assert_eq!(cloud.log_group_creations(), 1);
    }

    #[test]
    fn gives_up_when_never_listed() {
        let cloud = InMemoryCloud::new("ns");
        cloud.set_visibility_delay(5);

        let err = ensure_log_group(&cloud, "c1", &policy(2)).unwrap_err();
        assert!(matches!(err, ProvisionError::NotVisible { attempts: 2, .. }));
    }

    #[test]
    fn lookup_failure_is_not_retried() {
        let cloud = InMemoryCloud::new("ns");
        let err = ensure_log(&cloud, "ocid1.loggroup.missing", "restored", &policy(5)).unwrap_err();
        assert!(matches!(err, ProvisionError::Lookup { kind: "log", .. }));
        assert_eq!(cloud.log_creations(), 0);
    }
}
