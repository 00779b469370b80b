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

//! Errors returned while fetching access tokens.

use http::StatusCode;
use std::error::Error;
use std::sync::Arc;

/// Represents an error fetching an access token.
///
/// The sample never retries, but the error still records whether a future
/// attempt may succeed. Applications that do retry should only do so for
/// transient errors.
#[derive(Clone, Debug)]
pub struct CredentialsError {
    is_transient: bool,
    message: Option<String>,
    source: Option<Arc<dyn Error + Send + Sync>>,
}

impl CredentialsError {
    /// Creates a new `CredentialsError` wrapping `source`.
    pub fn new<T>(is_transient: bool, source: T) -> Self
    where
        T: Error + Send + Sync + 'static,
    {
        Self {
            is_transient,
            message: None,
            source: Some(Arc::new(source)),
        }
    }

    /// Creates a new `CredentialsError` from a message.
    pub fn from_msg<T: Into<String>>(is_transient: bool, message: T) -> Self {
        Self {
            is_transient,
            message: Some(message.into()),
            source: None,
        }
    }

    /// Returns `true` if a future attempt may succeed.
    pub fn is_transient(&self) -> bool {
        self.is_transient
    }
}

impl std::error::Error for CredentialsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|arc| arc.as_ref() as &(dyn std::error::Error + 'static))
    }
}

const TRANSIENT_MSG: &str = "but future attempts may succeed";
const PERMANENT_MSG: &str = "and future attempts will not succeed";

impl std::fmt::Display for CredentialsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = if self.is_transient {
            TRANSIENT_MSG
        } else {
            PERMANENT_MSG
        };
        match (&self.message, &self.source) {
            (Some(m), _) => write!(f, "cannot fetch access token, {msg}: {m}"),
            (None, Some(s)) => write!(f, "cannot fetch access token, {msg}, source: {s}"),
            (None, None) => write!(f, "cannot fetch access token, {msg}"),
        }
    }
}

/// Status codes where a new token request may succeed.
pub(crate) fn is_transient_http_status(status: StatusCode) -> bool {
    status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
}

pub(crate) fn from_http_response(status: StatusCode, body: &str) -> CredentialsError {
    CredentialsError::from_msg(
        is_transient_http_status(status),
        format!("the token endpoint returned {status}: {body}"),
    )
}

pub(crate) fn non_transient<T>(source: T) -> CredentialsError
where
    T: Error + Send + Sync + 'static,
{
    CredentialsError::new(false, source)
}

pub(crate) fn non_transient_from_str<T: Into<String>>(message: T) -> CredentialsError {
    CredentialsError::from_msg(false, message)
}

pub(crate) fn transient<T>(source: T) -> CredentialsError
where
    T: Error + Send + Sync + 'static,
{
    CredentialsError::new(true, source)
}
