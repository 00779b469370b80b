// Copyright 2026 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Ensure the buckets and objects used by the sample exist.
//!
//! Both operations are idempotent: finding the resource already present is an
//! expected outcome, reported as [Provisioned::AlreadyExists].

use crate::Result;
use crate::config::StorageConfig;
use crate::error::{Error, to_http_error};
use auth::credentials::AccessTokenCredentials;
use bytes::Bytes;
use reqwest::StatusCode;

/// The outcome of an "ensure exists" operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provisioned {
    /// The resource was created by this call.
    Created,
    /// The resource existed before this call, it was not modified.
    AlreadyExists,
}

/// Creates buckets and objects using the [JSON API].
///
/// [JSON API]: https://cloud.google.com/storage/docs/json_api
#[derive(Clone, Debug)]
pub struct Provisioner {
    endpoint: String,
    credentials: AccessTokenCredentials,
}

impl Provisioner {
    pub fn new(config: &StorageConfig, credentials: AccessTokenCredentials) -> Self {
        Self {
            endpoint: config.endpoint().to_string(),
            credentials,
        }
    }

    /// Creates `bucket` in `project`, unless it already exists.
    #[tracing::instrument(skip(self))]
    pub async fn ensure_bucket(&self, project: &str, bucket: &str) -> Result<Provisioned> {
        let url = self.url(&["storage", "v1", "b"])?;
        let headers = self
            .credentials
            .headers()
            .await
            .map_err(Error::authentication)?;
        let response = self::client()?
            .post(url)
            .headers(headers)
            .query(&[("project", project)])
            .json(&serde_json::json!({ "name": bucket }))
            .send()
            .await
            .map_err(Error::io)?;
        let outcome = handle_response(response, StatusCode::CONFLICT).await?;
        tracing::info!("bucket {bucket}: {outcome:?}");
        Ok(outcome)
    }

    /// Creates `object` in `bucket` with the given contents, unless the object
    /// already exists.
    ///
    /// Existing objects are never overwritten, the request includes an
    /// `ifGenerationMatch=0` precondition.
    #[tracing::instrument(skip(self, contents), fields(size = contents.len()))]
    pub async fn ensure_object(
        &self,
        bucket: &str,
        object: &str,
        content_type: &str,
        contents: Bytes,
    ) -> Result<Provisioned> {
        let url = self.url(&["upload", "storage", "v1", "b", bucket, "o"])?;
        let headers = self
            .credentials
            .headers()
            .await
            .map_err(Error::authentication)?;
        let response = self::client()?
            .post(url)
            .headers(headers)
            .query(&[
                ("uploadType", "media"),
                ("name", object),
                ("ifGenerationMatch", "0"),
            ])
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(contents)
            .send()
            .await
            .map_err(Error::io)?;
        let outcome = handle_response(response, StatusCode::PRECONDITION_FAILED).await?;
        tracing::info!("object {bucket}/{object}: {outcome:?}");
        Ok(outcome)
    }

    fn url(&self, segments: &[&str]) -> Result<url::Url> {
        let mut url = url::Url::parse(&self.endpoint).map_err(Error::binding)?;
        url.path_segments_mut()
            .map_err(|_| Error::binding(format!("cannot use {} as a base URL", self.endpoint)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

fn client() -> Result<reqwest::Client> {
    reqwest::Client::builder().build().map_err(Error::io)
}

async fn handle_response(response: reqwest::Response, exists: StatusCode) -> Result<Provisioned> {
    let status = response.status();
    if status == exists {
        return Ok(Provisioned::AlreadyExists);
    }
    if !status.is_success() {
        return to_http_error(response).await;
    }
    Ok(Provisioned::Created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::tests::{FakeTokenProvider, test_credentials};
    use httptest::{Expectation, Server, matchers::*, responders::*};
    use serde_json::json;
    use test_case::test_case;

    type TestResult = anyhow::Result<()>;

    fn test_provisioner(server: &Server) -> Provisioner {
        let config = StorageConfig::default().with_endpoint(format!("http://{}", server.addr()));
        Provisioner::new(&config, test_credentials())
    }

    #[tokio::test]
    async fn ensure_bucket_created() -> TestResult {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/storage/v1/b"),
                request::query(url_decoded(contains(("project", "test-project")))),
                request::headers(contains(("authorization", "Bearer test-token"))),
                request::body(json_decoded(eq(json!({"name": "test-bucket"})))),
            ])
            .respond_with(json_encoded(json!({"name": "test-bucket"}))),
        );

        let provisioner = test_provisioner(&server);
        let outcome = provisioner
            .ensure_bucket("test-project", "test-bucket")
            .await?;
        assert_eq!(outcome, Provisioned::Created);
        Ok(())
    }

    #[tokio::test]
    async fn ensure_bucket_exists() -> TestResult {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/storage/v1/b"))
                .respond_with(status_code(409).body("conflict")),
        );

        let provisioner = test_provisioner(&server);
        let outcome = provisioner
            .ensure_bucket("test-project", "test-bucket")
            .await?;
        assert_eq!(outcome, Provisioned::AlreadyExists);
        Ok(())
    }

    #[test_case(400)]
    #[test_case(403)]
    #[test_case(412)]
    #[test_case(500)]
    #[tokio::test]
    async fn ensure_bucket_error(code: u16) -> TestResult {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/storage/v1/b"))
                .respond_with(status_code(code).body("uh-oh")),
        );

        let provisioner = test_provisioner(&server);
        let err = provisioner
            .ensure_bucket("test-project", "test-bucket")
            .await
            .unwrap_err();
        assert_eq!(err.http_status_code(), Some(code), "{err:?}");
        Ok(())
    }

    #[tokio::test]
    async fn ensure_object_created() -> TestResult {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/upload/storage/v1/b/test-bucket/o"),
                request::query(url_decoded(contains(("uploadType", "media")))),
                request::query(url_decoded(contains(("name", "folder/test-object.txt")))),
                request::query(url_decoded(contains(("ifGenerationMatch", "0")))),
                request::headers(contains(("authorization", "Bearer test-token"))),
                request::headers(contains(("content-type", "text/plain"))),
                request::body("sample signed url demo."),
            ])
            .respond_with(json_encoded(json!({"name": "folder/test-object.txt"}))),
        );

        let provisioner = test_provisioner(&server);
        let outcome = provisioner
            .ensure_object(
                "test-bucket",
                "folder/test-object.txt",
                "text/plain",
                Bytes::from_static(b"sample signed url demo."),
            )
            .await?;
        assert_eq!(outcome, Provisioned::Created);
        Ok(())
    }

    #[tokio::test]
    async fn ensure_object_exists() -> TestResult {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path(
                "POST",
                "/upload/storage/v1/b/test-bucket/o",
            ))
            .respond_with(status_code(412)),
        );

        let provisioner = test_provisioner(&server);
        let outcome = provisioner
            .ensure_object("test-bucket", "o", "text/plain", Bytes::new())
            .await?;
        assert_eq!(outcome, Provisioned::AlreadyExists);
        Ok(())
    }

    #[tokio::test]
    async fn ensure_object_error() -> TestResult {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path(
                "POST",
                "/upload/storage/v1/b/test-bucket/o",
            ))
            .respond_with(status_code(403).body("AccessDenied")),
        );

        let provisioner = test_provisioner(&server);
        let err = provisioner
            .ensure_object("test-bucket", "o", "text/plain", Bytes::new())
            .await
            .unwrap_err();
        assert_eq!(err.http_status_code(), Some(403), "{err:?}");
        assert!(err.to_string().contains("AccessDenied"), "{err}");
        Ok(())
    }

    #[tokio::test]
    async fn authentication_error() -> TestResult {
        let server = Server::run();
        let config = StorageConfig::default().with_endpoint(format!("http://{}", server.addr()));
        let provisioner = Provisioner::new(
            &config,
            AccessTokenCredentials::from(FakeTokenProvider::failing()),
        );
        let err = provisioner
            .ensure_bucket("test-project", "test-bucket")
            .await
            .unwrap_err();
        assert!(err.is_authentication(), "{err:?}");
        Ok(())
    }

    #[tokio::test]
    async fn bad_endpoint() -> TestResult {
        let config = StorageConfig::default().with_endpoint("not a url");
        let provisioner = Provisioner::new(&config, test_credentials());
        let err = provisioner
            .ensure_bucket("test-project", "test-bucket")
            .await
            .unwrap_err();
        assert!(err.is_binding(), "{err:?}");
        Ok(())
    }
}
