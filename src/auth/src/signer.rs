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

//! Types to sign arbitrary content on behalf of a principal.
//!
//! Signed URLs embed a signature over a canonical description of the request.
//! The [Signer] produces the raw signature bytes, the caller decides how to
//! encode them.

use bytes::Bytes;
use std::sync::Arc;

pub(crate) mod service_account;

pub type Result<T> = std::result::Result<T, SigningError>;

/// A cloneable handle to any [SigningProvider].
#[derive(Clone, Debug)]
pub struct Signer {
    pub(crate) inner: Arc<dyn dynamic::SigningProvider>,
}

impl<T> std::convert::From<T> for Signer
where
    T: SigningProvider + Send + Sync + 'static,
{
    fn from(value: T) -> Self {
        Self {
            inner: Arc::new(value),
        }
    }
}

impl Signer {
    /// The principal that authorizes the signature.
    pub async fn client_email(&self) -> Result<String> {
        self.inner.client_email().await
    }

    /// Signs `content` and returns the raw signature.
    pub async fn sign(&self, content: &[u8]) -> Result<Bytes> {
        self.inner.sign(content).await
    }
}

#[async_trait::async_trait]
pub trait SigningProvider: Send + Sync + std::fmt::Debug {
    // The principal signing the content. For service accounts this is the
    // client email, e.g. "sa-name@project-id.iam.gserviceaccount.com".
    async fn client_email(&self) -> Result<String>;
    // Signs the content using RSASSA-PKCS1-v1_5 with SHA-256.
    async fn sign(&self, content: &[u8]) -> Result<Bytes>;
}

pub(crate) mod dynamic {
    use super::{Bytes, Result};

    /// A dyn-compatible, crate-private version of `SigningProvider`.
    #[async_trait::async_trait]
    pub trait SigningProvider: Send + Sync + std::fmt::Debug {
        async fn client_email(&self) -> Result<String>;
        async fn sign(&self, content: &[u8]) -> Result<Bytes>;
    }

    #[async_trait::async_trait]
    impl<T> SigningProvider for T
    where
        T: super::SigningProvider + Send + Sync,
    {
        async fn client_email(&self) -> Result<String> {
            T::client_email(self).await
        }

        async fn sign(&self, content: &[u8]) -> Result<Bytes> {
            T::sign(self, content).await
        }
    }
}

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub struct SigningError(SigningErrorKind);

impl SigningError {
    /// A problem creating the signature.
    pub fn is_sign(&self) -> bool {
        matches!(self.0, SigningErrorKind::Sign(_))
    }

    /// Creates a signing error from a message.
    ///
    /// Useful when implementing [SigningProvider] in tests.
    pub fn from_msg<T: Into<String>>(message: T) -> SigningError {
        let message: String = message.into();
        SigningError::sign(message)
    }

    pub(crate) fn sign<T>(source: T) -> SigningError
    where
        T: Into<BoxError>,
    {
        SigningError(SigningErrorKind::Sign(source.into()))
    }
}

#[derive(thiserror::Error, Debug)]
enum SigningErrorKind {
    #[error("failed to sign content: {0}")]
    Sign(#[source] BoxError),
}
