use std::{fs, path::Path};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};
use chrono::Utc;
use reqwest::{
    Method,
    blocking::Request,
    header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, DATE, HOST, HeaderName, HeaderValue},
};
use rsa::{
    RsaPrivateKey,
    pkcs1::DecodeRsaPrivateKey,
    pkcs1v15::SigningKey,
    pkcs8::DecodePrivateKey,
    signature::{SignatureEncoding, Signer},
};
use sha2::{Digest, Sha256};

use crate::error::{OciError, Result};

const X_CONTENT_SHA256: &str = "x-content-sha256";
const REQUEST_TARGET: &str = "(request-target)";
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Signs requests with an OCI API key (HTTP signatures, `rsa-sha256`).
#[derive(Clone)]
pub struct RequestSigner {
    key_id: String,
    signing_key: SigningKey<Sha256>,
}

impl RequestSigner {
    pub fn new(key_id: impl Into<String>, private_key: RsaPrivateKey) -> Self {
        Self {
            key_id: key_id.into(),
            signing_key: SigningKey::<Sha256>::new(private_key),
        }
    }

    /// Accepts unencrypted PKCS#8 (`BEGIN PRIVATE KEY`) and PKCS#1
    /// (`BEGIN RSA PRIVATE KEY`) PEM documents.
    pub fn from_pem(key_id: impl Into<String>, pem: &str) -> Result<Self> {
        let private_key = match RsaPrivateKey::from_pkcs8_pem(pem) {
            Ok(key) => key,
            Err(pkcs8_err) => RsaPrivateKey::from_pkcs1_pem(pem).map_err(|pkcs1_err| {
                OciError::PrivateKey(format!("pkcs8: {pkcs8_err}; pkcs1: {pkcs1_err}"))
            })?,
        };
        Ok(Self::new(key_id, private_key))
    }

    pub fn from_key_file(key_id: impl Into<String>, path: &Path) -> Result<Self> {
        let pem = fs::read_to_string(path).map_err(|source| OciError::KeyFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_pem(key_id, &pem)
    }

    /// Add `date`, `host`, body digest headers and `authorization` to `request`.
    pub fn sign(&self, request: &mut Request) -> Result<()> {
        let host = host_header(request)?;
        let target = request_target(request);
        let with_body = [Method::POST, Method::PUT, Method::PATCH].contains(request.method());

        let headers = request.headers_mut();
        if !headers.contains_key(DATE) {
            headers.insert(DATE, header_value(&Utc::now().format(HTTP_DATE_FORMAT).to_string())?);
        }
        headers.insert(HOST, header_value(&host)?);

        let mut signed: Vec<(String, String)> = vec![
            ("date".to_string(), header_str(request, DATE.as_str())),
            (REQUEST_TARGET.to_string(), target),
            ("host".to_string(), host),
        ];

        if with_body {
            let body = request
                .body()
                .and_then(|body| body.as_bytes())
                .unwrap_or_default()
                .to_vec();
            let digest = BASE64_STANDARD.encode(Sha256::digest(&body));
            let headers = request.headers_mut();
            headers.insert(HeaderName::from_static(X_CONTENT_SHA256), header_value(&digest)?);
            headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
            if !headers.contains_key(CONTENT_TYPE) {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }

            for name in [CONTENT_LENGTH.as_str(), CONTENT_TYPE.as_str(), X_CONTENT_SHA256] {
                signed.push((name.to_string(), header_str(request, name)));
            }
        }

        let authorization = self.authorization(&signed);
        request
            .headers_mut()
            .insert(AUTHORIZATION, header_value(&authorization)?);
        Ok(())
    }

    fn authorization(&self, signed: &[(String, String)]) -> String {
        let signature = self
            .signing_key
            .sign(signing_string(signed).as_bytes())
            .to_bytes();
        let header_names = signed
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        format!(
            "Signature version=\"1\",keyId=\"{}\",algorithm=\"rsa-sha256\",headers=\"{}\",signature=\"{}\"",
            self.key_id,
            header_names,
            BASE64_STANDARD.encode(signature)
        )
    }
}

/// Newline separated `name: value` lines, in signing order.
pub(crate) fn signing_string(signed: &[(String, String)]) -> String {
    signed
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn request_target(request: &Request) -> String {
    let url = request.url();
    let mut target = format!("{} {}", request.method().as_str().to_lowercase(), url.path());
    if let Some(query) = url.query() {
        target.push('?');
        target.push_str(query);
    }
    target
}

fn host_header(request: &Request) -> Result<String> {
    let url = request.url();
    let host = url
        .host_str()
        .ok_or_else(|| OciError::Signing(format!("request URL {url} has no host")))?;
    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

fn header_str(request: &Request, name: &str) -> String {
    request
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|err| OciError::Signing(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::blocking::Client;
    use rsa::{
        RsaPublicKey,
        pkcs1v15::{Signature, VerifyingKey},
        signature::Verifier,
    };

    const PKCS8_KEY: &str = include_str!("../tests/fixtures/test_key.pem");
    const PKCS1_KEY: &str = include_str!("../tests/fixtures/test_key_pkcs1.pem");

    fn signature_param<'a>(authorization: &'a str, name: &str) -> &'a str {
        let marker = format!("{name}=\"");
        let start = authorization.find(&marker).unwrap() + marker.len();
        let rest = &authorization[start..];
        &rest[..rest.find('"').unwrap()]
    }

    #[test]
    fn loads_both_pem_encodings() {
        assert!(RequestSigner::from_pem("t/u/f", PKCS8_KEY).is_ok());
        assert!(RequestSigner::from_pem("t/u/f", PKCS1_KEY).is_ok());
        assert!(matches!(
            RequestSigner::from_pem("t/u/f", "not a key"),
            Err(OciError::PrivateKey(_))
        ));
    }

    #[test]
    fn signs_get_request() {
        let signer = RequestSigner::from_pem("tenancy/user/aa:bb", PKCS8_KEY).unwrap();
        let mut request = Client::new()
            .get("https://logging.us-ashburn-1.oci.oraclecloud.com/20200531/logGroups?compartmentId=c1")
            .header(DATE, "Sun, 10 Oct 2021 12:00:00 GMT")
            .build()
            .unwrap();

        signer.sign(&mut request).unwrap();

        let authorization = header_str(&request, AUTHORIZATION.as_str());
        assert_eq!(signature_param(&authorization, "keyId"), "tenancy/user/aa:bb");
        assert_eq!(signature_param(&authorization, "algorithm"), "rsa-sha256");
        assert_eq!(
            signature_param(&authorization, "headers"),
            "date (request-target) host"
        );
        assert!(request.headers().get(X_CONTENT_SHA256).is_none());

        let expected = signing_string(&[
            ("date".into(), "Sun, 10 Oct 2021 12:00:00 GMT".into()),
            (
                REQUEST_TARGET.into(),
                "get /20200531/logGroups?compartmentId=c1".into(),
            ),
            ("host".into(), "logging.us-ashburn-1.oci.oraclecloud.com".into()),
        ]);
        let raw = BASE64_STANDARD
            .decode(signature_param(&authorization, "signature"))
            .unwrap();
        let private_key = RsaPrivateKey::from_pkcs8_pem(PKCS8_KEY).unwrap();
        let verifying_key = VerifyingKey::<Sha256>::new(RsaPublicKey::from(&private_key));
        let signature = Signature::try_from(raw.as_slice()).unwrap();
        assert!(verifying_key.verify(expected.as_bytes(), &signature).is_ok());
    }

    #[test]
    fn signs_body_digest() {
        let signer = RequestSigner::from_pem("t/u/f", PKCS1_KEY).unwrap();
        let body = br#"{"specversion":"1.0","logEntryBatches":[]}"#.to_vec();
        let mut request = Client::new()
            .put("http://127.0.0.1:8080/20200831/logs/log1/actions/push")
            .body(body.clone())
            .build()
            .unwrap();

        signer.sign(&mut request).unwrap();

        let authorization = header_str(&request, AUTHORIZATION.as_str());
        assert_eq!(
            signature_param(&authorization, "headers"),
            "date (request-target) host content-length content-type x-content-sha256"
        );
        assert_eq!(
            header_str(&request, X_CONTENT_SHA256),
            BASE64_STANDARD.encode(Sha256::digest(&body))
        );
        assert_eq!(header_str(&request, "content-length"), body.len().to_string());
        assert_eq!(header_str(&request, "content-type"), "application/json");
        assert_eq!(header_str(&request, "host"), "127.0.0.1:8080");
    }
}
