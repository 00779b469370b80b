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

//! Two-phase [resumable uploads] using the XML API.
//!
//! The [UploadInitiator] starts an upload session with an authenticated
//! `POST` and returns the session URL. The session URL is a capability:
//! any client holding it can complete the upload with the
//! [UploadSender], without further authentication.
//!
//! The sender transfers the payload in a single `PUT`. It does not resume
//! interrupted uploads. [UploadSender::query_status] reports how many bytes
//! the service has persisted, which is useful to diagnose a failed upload.
//!
//! [resumable uploads]: https://cloud.google.com/storage/docs/xml-api/resumable-upload

use crate::Result;
use crate::config::StorageConfig;
use crate::error::{Error, to_http_error};
use crate::signed_url::PATH_ENCODE_SET;
use auth::credentials::AccessTokenCredentials;
use bytes::Bytes;
use percent_encoding::utf8_percent_encode;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, DATE, HeaderValue};

const CONTENT_TYPE_TEXT: &str = "text/plain";
const RESUME_INCOMPLETE: StatusCode = StatusCode::PERMANENT_REDIRECT;

/// The URL of a resumable upload session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionUrl(String);

impl SessionUrl {
    pub fn new<T: Into<String>>(value: T) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The result of starting a resumable upload.
#[derive(Clone, Debug, PartialEq)]
pub struct InitiateResponse {
    /// The HTTP status returned by the service.
    pub status: StatusCode,
    /// The session URL, from the `Location` header.
    ///
    /// `None` if the service did not return a `Location` header. The upload
    /// cannot proceed in that case.
    pub session_url: Option<SessionUrl>,
    /// The response body.
    pub body: String,
}

/// The result of sending the upload payload.
#[derive(Clone, Debug, PartialEq)]
pub struct UploadResponse {
    /// The HTTP status returned by the service.
    pub status: StatusCode,
    /// The response body.
    pub body: String,
}

/// The state of a resumable upload session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResumableUploadStatus {
    /// The object is finalized.
    Finalized,
    /// The upload is incomplete, the service has persisted this many bytes.
    Partial(u64),
}

/// Starts resumable upload sessions.
#[derive(Clone, Debug)]
pub struct UploadInitiator {
    endpoint: String,
    bucket: String,
}

impl UploadInitiator {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            endpoint: config.endpoint().to_string(),
            bucket: config.bucket.clone(),
        }
    }

    /// Starts a resumable upload for `object`.
    #[tracing::instrument(skip(self, credentials), fields(bucket = %self.bucket))]
    pub async fn initiate(
        &self,
        object: &str,
        credentials: &AccessTokenCredentials,
    ) -> Result<InitiateResponse> {
        let encoded_object = utf8_percent_encode(object, PATH_ENCODE_SET);
        let url = format!("{}/{}/{}", self.endpoint, self.bucket, encoded_object);
        let url = url::Url::parse(&url).map_err(Error::binding)?;
        let headers = credentials.headers().await.map_err(Error::authentication)?;

        let response = self::client()?
            .post(url)
            .headers(headers)
            .header(DATE, crate::http_date::now())
            .header(CONTENT_LENGTH, HeaderValue::from_static("0"))
            .header(CONTENT_TYPE, CONTENT_TYPE_TEXT)
            .header("x-goog-resumable", "start")
            .send()
            .await
            .map_err(Error::io)?;
        self::handle_initiate_response(response).await
    }
}

async fn handle_initiate_response(response: reqwest::Response) -> Result<InitiateResponse> {
    let status = response.status();
    if !status.is_success() {
        return to_http_error(response).await;
    }
    let session_url = match response.headers().get(reqwest::header::LOCATION) {
        None => {
            tracing::warn!("the service returned {status} without a Location header");
            None
        }
        Some(location) => {
            let location = location.to_str().map_err(Error::deser)?;
            Some(SessionUrl::new(location))
        }
    };
    let body = response.text().await.map_err(Error::io)?;
    tracing::info!("initiation step returned {status}");
    Ok(InitiateResponse {
        status,
        session_url,
        body,
    })
}

/// Sends data to a resumable upload session.
#[derive(Clone, Debug, Default)]
pub struct UploadSender;

impl UploadSender {
    pub fn new() -> Self {
        Self
    }

    /// Uploads `payload` as the complete object contents.
    #[tracing::instrument(skip(self, session, payload), fields(size = payload.len()))]
    pub async fn send(&self, session: &SessionUrl, payload: Bytes) -> Result<UploadResponse> {
        let url = url::Url::parse(session.as_str()).map_err(Error::binding)?;
        let response = self::client()?
            .put(url)
            .header(DATE, crate::http_date::now())
            .header(CONTENT_LENGTH, payload.len())
            .header(CONTENT_TYPE, CONTENT_TYPE_TEXT)
            .body(payload)
            .send()
            .await
            .map_err(Error::io)?;
        let status = response.status();
        if !status.is_success() {
            return to_http_error(response).await;
        }
        let body = response.text().await.map_err(Error::io)?;
        tracing::info!("client data upload returned {status}");
        Ok(UploadResponse { status, body })
    }

    /// Queries how much of the upload the service has persisted.
    #[tracing::instrument(skip(self, session))]
    pub async fn query_status(&self, session: &SessionUrl) -> Result<ResumableUploadStatus> {
        let url = url::Url::parse(session.as_str()).map_err(Error::binding)?;
        let response = self::client()?
            .put(url)
            .header(CONTENT_LENGTH, HeaderValue::from_static("0"))
            .header(reqwest::header::CONTENT_RANGE, "bytes */*")
            .send()
            .await
            .map_err(Error::io)?;
        self::handle_query_response(response).await
    }

}

// A 308 response is "resume incomplete", it must not be followed as a
// redirect.
fn client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(Error::io)
}

async fn handle_query_response(response: reqwest::Response) -> Result<ResumableUploadStatus> {
    if response.status() == RESUME_INCOMPLETE {
        return self::parse_range(response).await;
    }
    if !response.status().is_success() {
        return to_http_error(response).await;
    }
    Ok(ResumableUploadStatus::Finalized)
}

async fn parse_range(response: reqwest::Response) -> Result<ResumableUploadStatus> {
    let Some(persisted) = self::parse_range_end(response.headers()) else {
        return to_http_error(response).await;
    };
    Ok(ResumableUploadStatus::Partial(persisted))
}

/// Returns the number of persisted bytes from the `Range:` header.
fn parse_range_end(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    let Some(range) = headers.get(reqwest::header::RANGE) else {
        // A missing `Range:` header indicates that no bytes are persisted.
        return Some(0_u64);
    };
    // Uploads are sequential, the persisted range always starts at zero.
    let end = std::str::from_utf8(range.as_bytes().strip_prefix(b"bytes=0-")?).ok()?;
    // The range is inclusive, `bytes=0-999` means 1000 bytes.
    end.parse::<u64>().ok().and_then(|e| e.checked_add(1))
}
