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

use crate::credentials::service_account::sign_rsa_sha256;
use crate::signer::{Result, SigningError, SigningProvider};
use bytes::Bytes;
use rustls::sign::SigningKey;
use std::sync::Arc;

// Implements a local Signer using the service account private key.
#[derive(Clone, Debug)]
pub(crate) struct ServiceAccountSigner {
    signing_key: Arc<dyn SigningKey>,
    client_email: String,
}

impl ServiceAccountSigner {
    pub(crate) fn new(signing_key: Arc<dyn SigningKey>, client_email: String) -> Self {
        Self {
            signing_key,
            client_email,
        }
    }
}

#[async_trait::async_trait]
impl SigningProvider for ServiceAccountSigner {
    async fn client_email(&self) -> Result<String> {
        Ok(self.client_email.clone())
    }

    async fn sign(&self, content: &[u8]) -> Result<Bytes> {
        let signature =
            sign_rsa_sha256(self.signing_key.as_ref(), content).map_err(SigningError::sign)?;
        Ok(Bytes::from(signature))
    }
}
