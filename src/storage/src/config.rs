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

use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://storage.googleapis.com";
pub const DEFAULT_BUCKET: &str = "dd_test_bucket_gcp_trial";
pub const DEFAULT_READ_OBJECT: &str = "sample_read_signedURL.txt";
pub const DEFAULT_WRITE_OBJECT: &str = "sample_write_client_uploads.txt";
pub const DEFAULT_EXPIRY: Duration = Duration::from_secs(60);

/// The settings shared by all the storage components.
///
/// # Example
/// ```
/// # use gcs_sample_storage::config::StorageConfig;
/// # use std::time::Duration;
/// let config = StorageConfig::default()
///     .with_bucket("my-bucket")
///     .with_expiry(Duration::from_secs(300));
/// assert_eq!(config.bucket, "my-bucket");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct StorageConfig {
    /// The Cloud Storage endpoint, used for signed URLs and API requests.
    pub endpoint: String,
    /// The bucket containing the sample objects.
    pub bucket: String,
    /// The object shared through a signed URL.
    pub read_object: String,
    /// The object written with a resumable upload.
    pub write_object: String,
    /// How long the signed URL remains valid.
    pub expiry: Duration,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            bucket: DEFAULT_BUCKET.to_string(),
            read_object: DEFAULT_READ_OBJECT.to_string(),
            write_object: DEFAULT_WRITE_OBJECT.to_string(),
            expiry: DEFAULT_EXPIRY,
        }
    }
}

impl StorageConfig {
    pub fn with_endpoint<V: Into<String>>(mut self, v: V) -> Self {
        self.endpoint = v.into();
        self
    }

    pub fn with_bucket<V: Into<String>>(mut self, v: V) -> Self {
        self.bucket = v.into();
        self
    }

    pub fn with_read_object<V: Into<String>>(mut self, v: V) -> Self {
        self.read_object = v.into();
        self
    }

    pub fn with_write_object<V: Into<String>>(mut self, v: V) -> Self {
        self.write_object = v.into();
        self
    }

    pub fn with_expiry(mut self, v: Duration) -> Self {
        self.expiry = v;
        self
    }

    /// The endpoint without any trailing `/`.
    pub(crate) fn endpoint(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }
}
