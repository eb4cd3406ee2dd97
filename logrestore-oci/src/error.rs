use std::{io, path::PathBuf};

use reqwest::StatusCode;
use thiserror::Error;
use url::ParseError;

/// Result alias for OCI client operations.
pub type Result<T> = std::result::Result<T, OciError>;

#[derive(Debug, Error)]
pub enum OciError {
    /// The underlying HTTP client returned an error.
    #[error("OCI request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid OCI endpoint '{url}': {source}")]
    InvalidEndpoint {
        url: String,
        #[source]
        source: ParseError,
    },

    #[error("OCI endpoint '{0}' cannot carry a path")]
    CannotBeABase(String),

    #[error("failed to read private key {path}: {source}")]
    KeyFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unsupported or malformed private key: {0}")]
    PrivateKey(String),

    #[error("failed to sign request: {0}")]
    Signing(String),

    /// The service answered with a non-success HTTP status.
    #[error("OCI returned {status} for {url}: {code}: {message}{}", request_suffix(.opc_request_id))]
    Service {
        status: StatusCode,
        url: String,
        code: String,
        message: String,
        opc_request_id: Option<String>,
    },
}

impl OciError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, OciError::Service { status, .. } if *status == StatusCode::NOT_FOUND)
    }

    pub(crate) fn not_found(url: impl Into<String>, message: impl Into<String>) -> Self {
        OciError::Service {
            status: StatusCode::NOT_FOUND,
            url: url.into(),
            code: "NotFound".to_string(),
            message: message.into(),
            opc_request_id: None,
        }
    }
}

fn request_suffix(opc_request_id: &Option<String>) -> String {
    match opc_request_id {
        Some(id) => format!(" (opc-request-id {id})"),
        None => String::new(),
    }
}
