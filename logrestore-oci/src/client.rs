use std::time::Duration;

use log::debug;
use reqwest::{
    Method, Url,
    blocking::{Client, Response},
};
use serde::{Deserialize, Serialize};

use crate::{
    endpoints::OciEndpoints,
    error::{OciError, Result},
    signer::RequestSigner,
};

const OPC_REQUEST_ID: &str = "opc-request-id";

/// Blocking OCI REST client implementing [`crate::ObjectStore`],
/// [`crate::LogManagement`] and [`crate::LogIngestion`].
#[derive(Clone)]
pub struct OciClient {
    client: Client,
    signer: RequestSigner,
    endpoints: OciEndpoints,
}

#[derive(Deserialize)]
struct ServiceErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

impl OciClient {
    /// Construct a client with the default `reqwest::blocking::Client` configuration.
    pub fn new(signer: RequestSigner, endpoints: OciEndpoints) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(Duration::from_secs(300))
            .build()?;
        Ok(Self::with_client(client, signer, endpoints))
    }

    /// Construct a client using a preconfigured HTTP client instance.
    pub fn with_client(client: Client, signer: RequestSigner, endpoints: OciEndpoints) -> Self {
        Self {
            client,
            signer,
            endpoints,
        }
    }

    pub fn endpoints(&self) -> &OciEndpoints {
        &self.endpoints
    }

    pub(crate) fn get(&self, url: Url) -> Result<Response> {
        let request = self.client.get(url).build()?;
        self.execute(request)
    }

    pub(crate) fn send_json<T: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: &T,
    ) -> Result<Response> {
        let request = self.client.request(method, url).json(body).build()?;
        self.execute(request)
    }

    fn execute(&self, mut request: reqwest::blocking::Request) -> Result<Response> {
        self.signer.sign(&mut request)?;
        debug!("{} {}", request.method(), request.url());
        let response = self.client.execute(request)?;
        Self::handle_response(response)
    }

    fn handle_response(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().to_string();
        let opc_request_id = response
            .headers()
            .get(OPC_REQUEST_ID)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let text = response
            .text()
            .unwrap_or_else(|_| "<unable to read body>".into());
        let (code, message) = match serde_json::from_str::<ServiceErrorBody>(&text) {
            Ok(body) => (body.code, body.message),
            Err(_) => (
                status.canonical_reason().unwrap_or("Unknown").to_string(),
                text,
            ),
        };

        Err(OciError::Service {
            status,
            url,
            code,
            message,
            opc_request_id,
        })
    }
}
