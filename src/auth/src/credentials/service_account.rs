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

//! [Service Account] keys and the access tokens minted from them.
//!
//! A service account key is a JSON document in the format described by
//! [aip/4112]. It contains the client email identifying the service account
//! and an RSA private key. The private key signs URLs directly, and signs the
//! JWT assertion exchanged for an OAuth2 access token ([RFC 7523]).
//!
//! [aip/4112]: https://google.aip.dev/auth/4112
//! [RFC 7523]: https://datatracker.ietf.org/doc/html/rfc7523
//! [Service Account]: https://cloud.google.com/iam/docs/service-account-creds

mod jws;

use crate::Result;
use crate::build_errors::Error as BuildError;
use crate::errors;
use crate::token::{Token, TokenProvider};
use base64::prelude::{BASE64_URL_SAFE_NO_PAD, Engine as _};
use jws::{JwsClaims, JwsHeader};
use rustls::SignatureScheme;
use rustls::crypto::CryptoProvider;
use rustls::sign::SigningKey;
use rustls_pemfile::Item;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;

pub(crate) const SERVICE_ACCOUNT_TYPE: &str = "service_account";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// A representation of a [service account key] in the format described by [aip/4112].
///
/// [aip/4112]: https://google.aip.dev/auth/4112
/// [service account key]: https://cloud.google.com/iam/docs/keys-create-delete#creating
#[derive(serde::Deserialize, Clone)]
pub struct ServiceAccountKey {
    /// The client email address of the service account.
    /// (e.g., "my-sa@my-project.iam.gserviceaccount.com").
    pub client_email: String,
    /// ID of the service account's private key.
    #[serde(default)]
    pub private_key_id: String,
    /// The PEM-encoded private key, either PKCS#8 (`BEGIN PRIVATE KEY`) or
    /// PKCS#1 (`BEGIN RSA PRIVATE KEY`).
    pub private_key: String,
    /// The project id the service account belongs to.
    #[serde(default)]
    pub project_id: String,
    /// The endpoint used to exchange JWT assertions for access tokens.
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("private_key", &"[censored]")
            .field("project_id", &self.project_id)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

impl ServiceAccountKey {
    /// Loads the private key and verifies it can create RSA SHA-256 signatures.
    pub(crate) fn signing_key(&self) -> std::result::Result<Arc<dyn SigningKey>, BuildError> {
        let key_provider = CryptoProvider::get_default().map_or_else(
            || rustls::crypto::ring::default_provider().key_provider,
            |p| p.key_provider,
        );

        let item = rustls_pemfile::read_one(&mut self.private_key.as_bytes())
            .map_err(BuildError::parsing)?
            .ok_or_else(|| BuildError::parsing("missing PEM section in service account key"))?;
        let key = match item {
            Item::Pkcs8Key(item) => key_provider.load_private_key(item.into()),
            Item::Pkcs1Key(item) => key_provider.load_private_key(item.into()),
            other => {
                return Err(BuildError::invalid_key(format!(
                    "expected key to be in form of PKCS#8 or PKCS#1, found {other:?}"
                )));
            }
        };
        let key = key.map_err(BuildError::invalid_key)?;
        if key.choose_scheme(&[SignatureScheme::RSA_PKCS1_SHA256]).is_none() {
            return Err(BuildError::invalid_key(
                "the key does not support the RSA_PKCS1_SHA256 signature scheme",
            ));
        }
        Ok(key)
    }
}

/// Signs `content` with RSASSA-PKCS1-v1_5 using SHA-256.
pub(crate) fn sign_rsa_sha256(
    key: &dyn SigningKey,
    content: &[u8],
) -> std::result::Result<Vec<u8>, rustls::Error> {
    let signer = key
        .choose_scheme(&[SignatureScheme::RSA_PKCS1_SHA256])
        .ok_or_else(|| {
            rustls::Error::General("RSA_PKCS1_SHA256 is not supported by this key".to_string())
        })?;
    signer.sign(content)
}

/// Exchanges self-signed JWT assertions for OAuth2 access tokens.
#[derive(Debug)]
pub(crate) struct ServiceAccountTokenProvider {
    pub(crate) key: ServiceAccountKey,
    pub(crate) signing_key: Arc<dyn SigningKey>,
    pub(crate) scopes: String,
}

impl ServiceAccountTokenProvider {
    fn assertion(&self, now: OffsetDateTime) -> Result<String> {
        let header = JwsHeader {
            alg: "RS256",
            typ: "JWT",
            kid: Some(self.key.private_key_id.as_str()).filter(|k| !k.is_empty()),
        };
        let claims = JwsClaims::new(
            &self.key.client_email,
            &self.scopes,
            &self.key.token_uri,
            now,
        );
        let encoded_header_claims = format!("{}.{}", header.encode()?, claims.encode()?);
        let sig = sign_rsa_sha256(self.signing_key.as_ref(), encoded_header_claims.as_bytes())
            .map_err(errors::non_transient)?;
        Ok(format!(
            "{}.{}",
            encoded_header_claims,
            BASE64_URL_SAFE_NO_PAD.encode(sig)
        ))
    }
}

/// The request body of a JWT bearer token exchange.
#[derive(serde::Serialize)]
struct TokenRequest<'a> {
    grant_type: &'a str,
    assertion: &'a str,
}

/// The response of a JWT bearer token exchange.
#[derive(serde::Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
    expires_in: Option<u64>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

#[async_trait::async_trait]
impl TokenProvider for ServiceAccountTokenProvider {
    #[tracing::instrument(skip(self), fields(client_email = %self.key.client_email))]
    async fn token(&self) -> Result<Token> {
        let assertion = self.assertion(OffsetDateTime::now_utc())?;
        let client = reqwest::Client::builder()
            .build()
            .map_err(errors::non_transient)?;
        let response = client
            .post(self.key.token_uri.as_str())
            .form(&TokenRequest {
                grant_type: JWT_BEARER_GRANT,
                assertion: &assertion,
            })
            .send()
            .await
            .map_err(errors::transient)?;

        let status = response.status();
        if !status.is_success() {
            return Err(token_endpoint_error(status, response.text().await));
        }
        let response = response
            .json::<TokenResponse>()
            .await
            .map_err(errors::non_transient)?;
        tracing::debug!("token exchange succeeded");

        Ok(Token {
            token: response.access_token,
            token_type: response.token_type,
            expires_at: response
                .expires_in
                .map(|secs| tokio::time::Instant::now() + Duration::from_secs(secs)),
        })
    }
}

fn token_endpoint_error<E>(
    status: reqwest::StatusCode,
    body: std::result::Result<String, E>,
) -> errors::CredentialsError
where
    E: std::fmt::Display,
{
    tracing::warn!("token exchange failed with status {status}");
    match body {
        Ok(body) => errors::from_http_response(status, &body),
        Err(e) => {
            tracing::warn!("cannot read the token endpoint error response: {e}");
            errors::from_http_response(status, &format!("<cannot read the response body: {e}>"))
        }
    }
}
