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

//! Cloud Storage access patterns for the sample application.
//!
//! This crate contains the storage-facing components:
//!
//! - [SignedUrlBuilder][signed_url::SignedUrlBuilder] creates [signed URLs]
//!   granting time-limited access to an object.
//! - [UploadInitiator][upload::UploadInitiator] and
//!   [UploadSender][upload::UploadSender] perform the two phases of a
//!   [resumable upload].
//! - [Provisioner][provision::Provisioner] ensures the bucket and objects used
//!   by the sample exist.
//!
//! All components receive their settings through a
//! [StorageConfig][config::StorageConfig].
//!
//! [signed URLs]: https://cloud.google.com/storage/docs/access-control/signed-urls
//! [resumable upload]: https://cloud.google.com/storage/docs/xml-api/resumable-upload

pub mod config;
pub mod error;
pub mod provision;
pub mod signed_url;
pub mod upload;

pub use error::Error;

/// The result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

pub(crate) mod http_date {
    /// Formats the current time as an [HTTP date].
    ///
    /// [HTTP date]: https://www.rfc-editor.org/rfc/rfc9110#name-date-time-formats
    pub(crate) fn now() -> String {
        chrono::Utc::now()
            .format("%a, %d %b %Y %H:%M:%S GMT")
            .to_string()
    }

    #[cfg(test)]
    mod tests {
        #[test]
        fn format() {
            let got = super::now();
            assert!(got.ends_with(" GMT"), "{got}");
            assert!(
                chrono::DateTime::parse_from_rfc2822(&got.replace("GMT", "+0000")).is_ok(),
                "{got}"
            );
        }
    }
}
