use logrestore_models::storage::{Bucket, ObjectListing};

use crate::{
    ObjectBody, ObjectStore,
    client::OciClient,
    endpoints::resolve,
    error::Result,
};

const TIME_CREATED_FIELD: &str = "timeCreated";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListObjectsRequest {
    pub namespace: String,
    pub bucket: String,
    pub prefix: String,
    pub limit: u32,
    /// Name to resume from, as returned in `nextStartWith`.
    pub start: Option<String>,
}

impl ObjectStore for OciClient {
    fn get_namespace(&self, compartment_id: &str) -> Result<String> {
        let mut url = resolve(&self.endpoints().object_storage, &["n", ""])?;
        url.query_pairs_mut()
            .append_pair("compartmentId", compartment_id);
        Ok(self.get(url)?.json::<String>()?)
    }

    fn get_bucket(&self, namespace: &str, bucket: &str) -> Result<Bucket> {
        let url = resolve(
            &self.endpoints().object_storage,
            &["n", namespace, "b", bucket, ""],
        )?;
        Ok(self.get(url)?.json::<Bucket>()?)
    }

    fn list_objects(&self, request: &ListObjectsRequest) -> Result<ObjectListing> {
        let mut url = resolve(
            &self.endpoints().object_storage,
            &["n", &request.namespace, "b", &request.bucket, "o"],
        )?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("prefix", &request.prefix)
                .append_pair("limit", &request.limit.to_string())
                .append_pair("fields", TIME_CREATED_FIELD);
            if let Some(start) = &request.start {
                query.append_pair("start", start);
            }
        }
        Ok(self.get(url)?.json::<ObjectListing>()?)
    }

    fn get_object(&self, namespace: &str, bucket: &str, object_name: &str) -> Result<ObjectBody> {
        let url = resolve(
            &self.endpoints().object_storage,
            &["n", namespace, "b", bucket, "o", object_name],
        )?;
        Ok(Box::new(self.get(url)?))
    }
}

/// Lazy sequence of listing pages. With `follow_next` unset only the first
/// page is requested.
pub struct ObjectPages<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    request: ListObjectsRequest,
    follow_next: bool,
    done: bool,
}

impl<'a, S: ObjectStore + ?Sized> ObjectPages<'a, S> {
    pub fn new(store: &'a S, request: ListObjectsRequest, follow_next: bool) -> Self {
        Self {
            store,
            request,
            follow_next,
            done: false,
        }
    }
}

impl<S: ObjectStore + ?Sized> Iterator for ObjectPages<'_, S> {
    type Item = Result<ObjectListing>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.store.list_objects(&self.request) {
            Ok(page) => {
                match (&page.next_start_with, self.follow_next) {
                    (Some(next), true) => self.request.start = Some(next.clone()),
                    _ => self.done = true,
                }
                Some(Ok(page))
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OciEndpoints, RequestSigner};
    use mockito::{Matcher, Server};
    use std::io::Read;

    const KEY: &str = include_str!("../tests/fixtures/test_key.pem");

    fn client(server: &Server) -> OciClient {
        let signer = RequestSigner::from_pem("t/u/f", KEY).unwrap();
        let endpoints = OciEndpoints::with_base(&server.url()).unwrap();
        OciClient::new(signer, endpoints).unwrap()
    }

    fn request(start: Option<&str>) -> ListObjectsRequest {
        ListObjectsRequest {
            namespace: "ns".into(),
            bucket: "archive".into(),
            prefix: "logs/".into(),
            limit: 1000,
            start: start.map(str::to_string),
        }
    }

    #[test]
    fn namespace_lookup() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/n/")
            .match_query(Matcher::UrlEncoded("compartmentId".into(), "c1".into()))
            .match_header("authorization", Matcher::Regex("^Signature version=\"1\"".into()))
            .with_body("\"tenancy-ns\"")
            .create();

        assert_eq!(client(&server).get_namespace("c1").unwrap(), "tenancy-ns");
        mock.assert();
    }

    #[test]
    fn listing_requests_time_created() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/n/ns/b/archive/o")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("prefix".into(), "logs/".into()),
                Matcher::UrlEncoded("limit".into(), "1000".into()),
                Matcher::UrlEncoded("fields".into(), "timeCreated".into()),
            ]))
            .with_body(
                r#"{"objects":[{"name":"logs/a.gz","timeCreated":"2021-10-10T01:02:03.456Z"}],"nextStartWith":"logs/b.gz"}"#,
            )
            .create();

        let page = client(&server).list_objects(&request(None)).unwrap();
        mock.assert();
        assert_eq!(page.objects.len(), 1);
        assert_eq!(page.objects[0].name, "logs/a.gz");
        assert!(page.objects[0].time_created.is_some());
        assert_eq!(page.next_start_with.as_deref(), Some("logs/b.gz"));
    }

    #[test]
    fn object_body_streams() {
        let mut server = Server::new();
        let mock = server
            .mock(
                "GET",
                Matcher::Regex(r"^/n/ns/b/archive/o/logs(%2F|/)a\.gz$".into()),
            )
            .with_body(b"payload".as_slice())
            .create();

        let mut body = client(&server)
            .get_object("ns", "archive", "logs/a.gz")
            .unwrap();
        let mut read = Vec::new();
        body.read_to_end(&mut read).unwrap();
        mock.assert();
        assert_eq!(read, b"payload");
    }

    #[test]
    fn service_errors_carry_code_and_request_id() {
        let mut server = Server::new();
        server
            .mock("GET", "/n/ns/b/missing/")
            .with_status(404)
            .with_header("opc-request-id", "req-123")
            .with_body(r#"{"code":"BucketNotFound","message":"Either the bucket does not exist or you are not authorized"}"#)
            .create();

        let err = client(&server).get_bucket("ns", "missing").unwrap_err();
        assert!(err.is_not_found());
        match err {
            crate::OciError::Service {
                code,
                opc_request_id,
                ..
            } => {
                assert_eq!(code, "BucketNotFound");
                assert_eq!(opc_request_id.as_deref(), Some("req-123"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
