use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid timestamp '{value}', expected YYYY-MM-DD HH:MM:SS: {source}")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("unable to locate the home directory for the default OCI config file")]
    NoHomeDir,

    #[error("failed to read OCI config file {path}: {source}")]
    ReadProfile {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    #[error("profile '{profile}' not found in {path}")]
    MissingProfile { profile: String, path: PathBuf },

    #[error("profile '{profile}' in {path} has no '{key}' entry")]
    MissingKey {
        profile: String,
        path: PathBuf,
        key: &'static str,
    },

    #[error("no region configured; set OCI_REGION or 'region' in the OCI profile")]
    MissingRegion,
}
