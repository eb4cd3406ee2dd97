use std::process::ExitCode;

use log::{error, info};
use logrestore_config::{RestoreConfig, load_profile, parse_config};
use logrestore_models::errors::{RuntimeError, SendableError, error_chain};
use logrestore_oci::{OciClient, OciEndpoints, RequestSigner};
use logrestore_restore::run_restore;
use logrestore_utilities::startup;

fn main() -> ExitCode {
    let config = match parse_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Invalid arguments: {err}");
            return ExitCode::from(2);
        }
    };

    if let Err(err) = startup::startup("Log Restore", &config.log_file) {
        eprintln!("Failed to initialize logging: {err}");
        return ExitCode::FAILURE;
    }

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(
                "There was a problem with executing this restore process: {}",
                error_chain(&*err)
            );
            ExitCode::FAILURE
        }
    }
}

fn run(config: &RestoreConfig) -> Result<(), SendableError> {
    info!(
        "Restoring '{}' from bucket {} into log '{}'",
        config.folder, config.bucket, config.log_name
    );

    let client = build_client(config)?;
    let summary = run_restore(config, &client)?;

    let entries: usize = summary.restored.iter().map(|object| object.entries).sum();
    info!(
        "Restored {} log entries from {} of {} matched archive(s)",
        entries,
        summary.restored.len(),
        summary.matched.len()
    );
    Ok(())
}

fn build_client(config: &RestoreConfig) -> Result<OciClient, SendableError> {
    let profile = load_profile(&config.config_file, &config.profile)?;
    let region = profile.resolve_region(config.region.as_deref())?;
    info!("Using profile {} in region {}", config.profile, region);

    let signer = RequestSigner::from_key_file(profile.key_id(), &profile.key_file)?;
    let endpoints = OciEndpoints::for_region(&region)?;
    OciClient::new(signer, endpoints).map_err(|err| -> SendableError {
        Box::new(RuntimeError::new("restore.oci.client", err.to_string()))
    })
}
