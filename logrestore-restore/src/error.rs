use std::{io, path::PathBuf};

use logrestore_oci::OciError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RestoreError>;

/// Failure of one restore stage, with the bucket or object it concerned.
#[derive(Debug, Error)]
pub enum RestoreError {
    #[error("failed to look up the Object Storage namespace for compartment {compartment_id}: {source}")]
    Namespace {
        compartment_id: String,
        #[source]
        source: OciError,
    },

    #[error("failed to read bucket {bucket}: {source}")]
    Bucket {
        bucket: String,
        #[source]
        source: OciError,
    },

    #[error("failed to list objects in bucket {bucket}: {source}")]
    Listing {
        bucket: String,
        #[source]
        source: OciError,
    },

    #[error(transparent)]
    Provision(#[from] ProvisionError),

    #[error("archive object name '{0}' has no usable path components")]
    ObjectPath(String),

    #[error("failed to download {object}: {source}")]
    Download {
        object: String,
        #[source]
        source: OciError,
    },

    #[error("failed to write {} for {object}: {source}", .path.display())]
    LocalFile {
        object: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to decompress {object}: {source}")]
    Decompress {
        object: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid log entry in {object} at line {line}: {source}")]
    Parse {
        object: String,
        line: usize,
        #[source]
        source: LineError,
    },

    #[error("failed to submit entries of {object}: {source}")]
    Submit {
        object: String,
        #[source]
        source: OciError,
    },
}

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("failed to look up {kind} '{name}': {source}")]
    Lookup {
        kind: &'static str,
        name: String,
        #[source]
        source: OciError,
    },

    #[error("failed to create {kind} '{name}': {source}")]
    Create {
        kind: &'static str,
        name: String,
        #[source]
        source: OciError,
    },

    #[error("{kind} '{name}' was created but is still not listed after {attempts} lookup(s)")]
    NotVisible {
        kind: &'static str,
        name: String,
        attempts: u32,
    },
}

/// Why a single archive line could not become a log entry.
#[derive(Debug, Error)]
pub enum LineError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON object")]
    NotAnObject,

    #[error("missing field '{0}'")]
    MissingField(&'static str),
}
