use logrestore_models::logging::PutLogsDetails;
use reqwest::Method;

use crate::{LogIngestion, client::OciClient, endpoints::resolve, error::Result};

impl LogIngestion for OciClient {
    fn put_logs(&self, log_id: &str, details: &PutLogsDetails) -> Result<()> {
        let url = resolve(
            &self.endpoints().ingestion,
            &["logs", log_id, "actions", "push"],
        )?;
        self.send_json(Method::PUT, url, details)?;
        Ok(())
    }
}
