use logrestore_models::logging::{
    CreateLogDetails, CreateLogGroupDetails, LogGroupSummary, LogSummary,
};
use reqwest::Method;

use crate::{LogManagement, client::OciClient, endpoints::resolve, error::Result};

impl LogManagement for OciClient {
    fn list_log_groups(
        &self,
        compartment_id: &str,
        display_name: &str,
    ) -> Result<Vec<LogGroupSummary>> {
        let mut url = resolve(&self.endpoints().logging, &["logGroups"])?;
        url.query_pairs_mut()
            .append_pair("compartmentId", compartment_id)
            .append_pair("displayName", display_name);
        Ok(self.get(url)?.json::<Vec<LogGroupSummary>>()?)
    }

    fn create_log_group(&self, details: &CreateLogGroupDetails) -> Result<()> {
        let url = resolve(&self.endpoints().logging, &["logGroups"])?;
        self.send_json(Method::POST, url, details)?;
        Ok(())
    }

    fn list_logs(
        &self,
        log_group_id: &str,
        log_type: &str,
        display_name: &str,
    ) -> Result<Vec<LogSummary>> {
        let mut url = resolve(
            &self.endpoints().logging,
            &["logGroups", log_group_id, "logs"],
        )?;
        url.query_pairs_mut()
            .append_pair("logType", log_type)
            .append_pair("displayName", display_name);
        Ok(self.get(url)?.json::<Vec<LogSummary>>()?)
    }

    fn create_log(&self, log_group_id: &str, details: &CreateLogDetails) -> Result<()> {
        let url = resolve(
            &self.endpoints().logging,
            &["logGroups", log_group_id, "logs"],
        )?;
        self.send_json(Method::POST, url, details)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OciEndpoints, RequestSigner};
    use mockito::{Matcher, Server};
    use serde_json::json;

    const KEY: &str = include_str!("../tests/fixtures/test_key.pem");

    fn client(server: &Server) -> OciClient {
        let signer = RequestSigner::from_pem("t/u/f", KEY).unwrap();
        OciClient::new(signer, OciEndpoints::with_base(&server.url()).unwrap()).unwrap()
    }

    #[test]
    fn lists_log_groups_by_display_name() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/20200531/logGroups")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("compartmentId".into(), "c1".into()),
                Matcher::UrlEncoded("displayName".into(), "Archive_Restore_Log_Grp".into()),
            ]))
            .with_body(r#"[{"id":"lg1","displayName":"Archive_Restore_Log_Grp","compartmentId":"c1"}]"#)
            .create();

        let groups = client(&server)
            .list_log_groups("c1", "Archive_Restore_Log_Grp")
            .unwrap();
        mock.assert();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].id, "lg1");
    }

    #[test]
    fn creates_custom_log() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/20200531/logGroups/lg1/logs")
            .match_header("x-content-sha256", Matcher::Any)
            .match_body(Matcher::Json(json!({
                "displayName": "archive-restore-log",
                "logType": "CUSTOM"
            })))
            .with_status(202)
            .with_header("opc-work-request-id", "wr1")
            .create();

        client(&server)
            .create_log(
                "lg1",
                &CreateLogDetails {
                    display_name: "archive-restore-log".into(),
                    log_type: "CUSTOM".into(),
                    is_enabled: None,
                },
            )
            .unwrap();
        mock.assert();
    }
}
