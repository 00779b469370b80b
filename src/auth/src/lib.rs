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

//! Service account authentication for the Cloud Storage sample.
//!
//! This crate loads a [service account key] file and exposes the two
//! capabilities the sample needs:
//!
//! - a [Signer][signer::Signer] that signs arbitrary bytes with the service
//!   account private key, used to create signed URLs, and
//! - [AccessTokenCredentials][credentials::AccessTokenCredentials] that
//!   exchange a self-signed JWT for an OAuth2 access token, used to
//!   authenticate requests to Cloud Storage.
//!
//! [service account key]: https://cloud.google.com/iam/docs/keys-create-delete#creating

pub mod build_errors;

/// Types and functions to work with service account [Credentials].
///
/// [Credentials]: https://cloud.google.com/docs/authentication#credentials
pub mod credentials;

pub mod errors;

pub mod signer;

/// Types and functions to work with auth [Tokens].
///
/// [Tokens]: https://cloud.google.com/docs/authentication#token
pub mod token;

/// A `Result` alias where the `Err` case is
/// `gcs_sample_auth::errors::CredentialsError`.
pub(crate) type Result<T> = std::result::Result<T, crate::errors::CredentialsError>;
