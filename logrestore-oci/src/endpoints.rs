use url::Url;

use crate::error::{OciError, Result};

const LOGGING_API_VERSION: &str = "20200531";
const INGESTION_API_VERSION: &str = "20200831";

/// Base URLs of the three OCI services the restore talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OciEndpoints {
    pub object_storage: Url,
    pub logging: Url,
    pub ingestion: Url,
}

impl OciEndpoints {
    /// Public endpoints of `region` in the commercial realm.
    pub fn for_region(region: &str) -> Result<Self> {
        Ok(Self {
            object_storage: parse(&format!("https://objectstorage.{region}.oraclecloud.com/"))?,
            logging: parse(&format!(
                "https://logging.{region}.oci.oraclecloud.com/{LOGGING_API_VERSION}/"
            ))?,
            ingestion: parse(&format!(
                "https://ingestion.logging.{region}.oci.oraclecloud.com/{INGESTION_API_VERSION}/"
            ))?,
        })
    }

    /// Serve every API from one base URL, keeping the per-service version paths.
    pub fn with_base(base: &str) -> Result<Self> {
        let base = format!("{}/", base.trim_end_matches('/'));
        Ok(Self {
            object_storage: parse(&base)?,
            logging: parse(&format!("{base}{LOGGING_API_VERSION}/"))?,
            ingestion: parse(&format!("{base}{INGESTION_API_VERSION}/"))?,
        })
    }
}

/// Append percent-encoded `segments` to `base`. Each segment is encoded on its
/// own, so object names containing `/` stay a single segment.
pub(crate) fn resolve(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| OciError::CannotBeABase(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn parse(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|source| OciError::InvalidEndpoint {
        url: raw.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_endpoints() {
        let endpoints = OciEndpoints::for_region("us-ashburn-1").unwrap();
        assert_eq!(
            endpoints.object_storage.as_str(),
            "https://objectstorage.us-ashburn-1.oraclecloud.com/"
        );
        assert_eq!(
            endpoints.logging.as_str(),
            "https://logging.us-ashburn-1.oci.oraclecloud.com/20200531/"
        );
        assert_eq!(
            endpoints.ingestion.as_str(),
            "https://ingestion.logging.us-ashburn-1.oci.oraclecloud.com/20200831/"
        );
    }

    #[test]
    fn object_names_stay_one_segment() {
        let endpoints = OciEndpoints::with_base("http://127.0.0.1:1234").unwrap();
        let url = resolve(
            &endpoints.object_storage,
            &["n", "ns", "b", "archive", "o", "logs/2021/a b.gz"],
        )
        .unwrap();
        assert_eq!(url.path(), "/n/ns/b/archive/o/logs%2F2021%2Fa%20b.gz");

        let url = resolve(&endpoints.logging, &["logGroups"]).unwrap();
        assert_eq!(url.path(), "/20200531/logGroups");
    }
}
