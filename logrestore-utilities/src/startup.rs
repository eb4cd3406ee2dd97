use std::path::Path;

use log::info;
use logrestore_models::errors::SendableError;

use crate::logger::{self, print_env};

pub fn startup(name: &str, log_file: &Path) -> Result<(), SendableError> {
    logger::setup_logger(log_file)?;
    log_panics::init();

    info!("--- {} ---", name);
    print_env()?;

    Ok(())
}
