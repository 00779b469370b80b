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

//! Create [V2 signed URLs] for Cloud Storage objects.
//!
//! A signed URL embeds an expiration time and a signature created with the
//! service account private key. Anyone holding the URL can perform the signed
//! operation until the URL expires, without any further authentication.
//!
//! [V2 signed URLs]: https://cloud.google.com/storage/docs/access-control/signed-urls-v2

use crate::config::StorageConfig;
use crate::error::SigningError;
use auth::signer::Signer;
use base64::prelude::{BASE64_STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use std::time::Duration;
use url::form_urlencoded;

/// https://cloud.google.com/storage/docs/request-endpoints#encoding
pub(crate) const PATH_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

const DEFAULT_LIFETIME: Duration = Duration::from_secs(60);

/// Computes the expiration of a signed URL as seconds since the Unix epoch.
///
/// The result is `floor((now_ms + lifetime_ms) / 1000)`.
pub fn expiry_timestamp(now: DateTime<Utc>, lifetime: Duration) -> i64 {
    let lifetime_ms = i64::try_from(lifetime.as_millis()).unwrap_or(i64::MAX);
    now.timestamp_millis()
        .saturating_add(lifetime_ms)
        .div_euclid(1000)
}

#[derive(Clone, Debug, PartialEq)]
enum Expiration {
    Lifetime(Duration),
    At(i64),
}

/// A builder for creating signed URLs.
///
/// # Example
/// ```no_run
/// # use gcs_sample_storage::signed_url::SignedUrlBuilder;
/// # async fn sample(signer: &auth::signer::Signer) -> anyhow::Result<()> {
/// let url = SignedUrlBuilder::for_object("my-bucket", "my-object.txt")
///     .sign_with(signer)
///     .await?;
/// println!("read the object using {url}");
/// # Ok(()) }
/// ```
#[derive(Clone, Debug)]
pub struct SignedUrlBuilder {
    bucket: String,
    object: String,
    method: String,
    expiration: Expiration,
    content_type: String,
    content_md5: String,
    endpoint: String,
    client_email: Option<String>,
}

impl SignedUrlBuilder {
    /// Creates a builder for a signed URL to `object` in `bucket`.
    pub fn for_object<B, O>(bucket: B, object: O) -> Self
    where
        B: Into<String>,
        O: Into<String>,
    {
        Self {
            bucket: bucket.into(),
            object: object.into(),
            method: "GET".to_string(),
            expiration: Expiration::Lifetime(DEFAULT_LIFETIME),
            content_type: String::new(),
            content_md5: String::new(),
            endpoint: crate::config::DEFAULT_ENDPOINT.to_string(),
            client_email: None,
        }
    }

    /// Creates a builder for the configured read object, using the configured
    /// endpoint and expiry.
    pub fn for_read_object(config: &StorageConfig) -> Self {
        Self::for_object(&config.bucket, &config.read_object)
            .with_endpoint(&config.endpoint)
            .with_lifetime(config.expiry)
    }

    /// Sets the HTTP method for the signed URL. Default is "GET".
    pub fn with_method<S: Into<String>>(mut self, method: S) -> Self {
        self.method = method.into();
        self
    }

    /// Sets how long the signed URL remains valid. Default is 60 seconds.
    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.expiration = Expiration::Lifetime(lifetime);
        self
    }

    /// Sets the expiration time as seconds since the Unix epoch.
    pub fn with_expires_at(mut self, expires_at: i64) -> Self {
        self.expiration = Expiration::At(expires_at);
        self
    }

    /// Sets the content type the request must send. Default is empty.
    pub fn with_content_type<S: Into<String>>(mut self, content_type: S) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Sets the base64 MD5 digest the request must send. Default is empty.
    pub fn with_content_md5<S: Into<String>>(mut self, content_md5: S) -> Self {
        self.content_md5 = content_md5.into();
        self
    }

    /// Sets the endpoint for the signed URL. Default is "https://storage.googleapis.com".
    pub fn with_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the principal in the signed URL. Default is the signer's client email.
    pub fn with_client_email<S: Into<String>>(mut self, client_email: S) -> Self {
        self.client_email = Some(client_email.into());
        self
    }

    /// Returns the expiration as seconds since the Unix epoch.
    ///
    /// With a lifetime, the expiration is computed from the current time.
    pub fn expires_at(&self) -> i64 {
        match &self.expiration {
            Expiration::At(t) => *t,
            Expiration::Lifetime(d) => expiry_timestamp(Utc::now(), *d),
        }
    }

    /// Returns the canonical string signed to create the URL.
    pub fn string_to_sign(&self) -> String {
        self.canonical_string(self.expires_at())
    }

    fn canonical_resource(&self) -> String {
        let encoded_object = utf8_percent_encode(&self.object, PATH_ENCODE_SET);
        format!("/{}/{}", self.bucket, encoded_object)
    }

    fn canonical_string(&self, expires_at: i64) -> String {
        [
            self.method.as_str(),
            self.content_md5.as_str(),
            self.content_type.as_str(),
            &expires_at.to_string(),
            &self.canonical_resource(),
        ]
        .join("\n")
    }

    /// Generates the signed URL using the provided signer.
    pub async fn sign_with(self, signer: &Signer) -> std::result::Result<String, SigningError> {
        let endpoint_url = url::Url::parse(&self.endpoint)
            .map_err(|e| SigningError::invalid_parameter("endpoint", e))?;
        if endpoint_url.host_str().is_none() {
            return Err(SigningError::invalid_parameter(
                "endpoint",
                "invalid endpoint host",
            ));
        }

        let expires_at = self.expires_at();
        let now = Utc::now().timestamp();
        if expires_at <= now {
            return Err(SigningError::invalid_parameter(
                "expiration",
                format!("{expires_at} is not after the current time {now}"),
            ));
        }

        let client_email = match &self.client_email {
            Some(email) => email.clone(),
            None => signer
                .client_email()
                .await
                .map_err(SigningError::signing)?,
        };

        let string_to_sign = self.canonical_string(expires_at);
        tracing::debug!(%string_to_sign, "signing URL");
        let signature = signer
            .sign(string_to_sign.as_bytes())
            .await
            .map_err(SigningError::signing)?;
        let signature = BASE64_STANDARD.encode(signature);

        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("GoogleAccessId", &client_email)
            .append_pair("Expires", &expires_at.to_string())
            .append_pair("Signature", &signature)
            .finish();

        Ok(format!(
            "{}{}?{}",
            self.endpoint.trim_end_matches('/'),
            self.canonical_resource(),
            query
        ))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use auth::signer::{SigningError as AuthSigningError, SigningProvider};
    use bytes::Bytes;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rsa::RsaPrivateKey;
    use rsa::pkcs1v15::{Signature, VerifyingKey};
    use rsa::pkcs8::{EncodePrivateKey, LineEnding};
    use rsa::signature::Verifier;
    use sha2::Sha256;
    use test_case::test_case;

    type TestResult = anyhow::Result<()>;

    #[derive(Debug)]
    struct MockSigner;

    #[async_trait::async_trait]
    impl SigningProvider for MockSigner {
        async fn client_email(&self) -> auth::signer::Result<String> {
            Ok("test@example.com".to_string())
        }

        async fn sign(&self, _content: &[u8]) -> auth::signer::Result<Bytes> {
            Ok(Bytes::from_static(b"test-signature"))
        }
    }

    pub(crate) fn service_account_json(private_key: &RsaPrivateKey) -> serde_json::Value {
        let pem = private_key
            .to_pkcs8_pem(LineEnding::LF)
            .expect("failed to encode key to PKCS#8 PEM")
            .to_string();
        serde_json::json!({
            "type": "service_account",
            "client_email": "test-sa@test-project.iam.gserviceaccount.com",
            "private_key_id": "test-private-key-id",
            "private_key": pem,
            "project_id": "test-project",
        })
    }

    fn in_one_hour() -> i64 {
        Utc::now().timestamp() + 3600
    }

    #[test_case(0, 60, 60; "exact second")]
    #[test_case(1_700_000_000_999, 60, 1_700_000_060; "rounds down")]
    #[test_case(1_700_000_000_001, 60, 1_700_000_060; "just after the second")]
    #[test_case(1_700_000_000_500, 3600, 1_700_003_600; "one hour")]
    fn expiry(now_ms: i64, lifetime_secs: u64, want: i64) -> TestResult {
        let now = Utc
            .timestamp_millis_opt(now_ms)
            .single()
            .ok_or_else(|| anyhow::anyhow!("invalid timestamp {now_ms}"))?;
        let got = expiry_timestamp(now, Duration::from_secs(lifetime_secs));
        assert_eq!(got, want);
        Ok(())
    }

    #[test]
    fn expiry_is_after_now() {
        let now = Utc::now();
        let got = expiry_timestamp(now, Duration::from_secs(60));
        assert_eq!(got, (now.timestamp_millis() + 60_000) / 1000);
        assert!(got > now.timestamp(), "{got} {now:?}");
    }

    #[test]
    fn string_to_sign() {
        let builder = SignedUrlBuilder::for_object("test-bucket", "test-object.txt")
            .with_expires_at(1_700_000_060);
        let want = "GET\n\n\n1700000060\n/test-bucket/test-object.txt";
        assert_eq!(builder.string_to_sign(), want);
        // Identical inputs produce identical bytes.
        assert_eq!(builder.clone().string_to_sign(), want);
    }

    #[test]
    fn string_to_sign_with_headers() {
        let builder = SignedUrlBuilder::for_object("test-bucket", "folder/test object.txt")
            .with_method("PUT")
            .with_content_type("text/plain")
            .with_content_md5("rL0Y20zC+Fzt72VPzMSk2A==")
            .with_expires_at(1_700_000_060);
        assert_eq!(
            builder.string_to_sign(),
            "PUT\nrL0Y20zC+Fzt72VPzMSk2A==\ntext/plain\n1700000060\n/test-bucket/folder/test%20object.txt"
        );
    }

    #[test]
    fn for_read_object() {
        let config = StorageConfig::default()
            .with_bucket("b")
            .with_read_object("r.txt")
            .with_expiry(Duration::from_secs(120));
        let builder = SignedUrlBuilder::for_read_object(&config);
        assert_eq!(builder.bucket, "b");
        assert_eq!(builder.object, "r.txt");
        assert_eq!(builder.endpoint, config.endpoint);
        assert_eq!(
            builder.expiration,
            Expiration::Lifetime(Duration::from_secs(120))
        );
    }

    #[tokio::test]
    async fn signed_url_generation() -> TestResult {
        let signer = Signer::from(MockSigner);
        let expires_at = in_one_hour();
        let url = SignedUrlBuilder::for_object("test-bucket", "test-object")
            .with_expires_at(expires_at)
            .sign_with(&signer)
            .await?;

        let want = format!(
            "https://storage.googleapis.com/test-bucket/test-object?GoogleAccessId=test%40example.com&Expires={expires_at}&Signature=dGVzdC1zaWduYXR1cmU%3D"
        );
        assert_eq!(url, want);
        Ok(())
    }

    #[tokio::test]
    async fn signed_url_custom_endpoint_and_email() -> TestResult {
        let signer = Signer::from(MockSigner);
        let url = SignedUrlBuilder::for_object("test-bucket", "test object")
            .with_endpoint("http://localhost:8080/")
            .with_client_email("other@example.com")
            .with_lifetime(Duration::from_secs(600))
            .sign_with(&signer)
            .await?;

        assert!(
            url.starts_with("http://localhost:8080/test-bucket/test%20object?GoogleAccessId=other%40example.com&Expires="),
            "{url}"
        );
        Ok(())
    }

    #[tokio::test]
    async fn signed_url_verifies() -> TestResult {
        let private_key = RsaPrivateKey::new(&mut rsa::rand_core::OsRng, 2048)?;
        let credentials =
            auth::credentials::Builder::from_json(service_account_json(&private_key)).build()?;
        let builder = SignedUrlBuilder::for_object("test-bucket", "sample_read_signedURL.txt")
            .with_expires_at(in_one_hour());
        let string_to_sign = builder.string_to_sign();
        let url = builder.sign_with(&credentials.signer()).await?;

        let parsed = url::Url::parse(&url)?;
        assert_eq!(parsed.path(), "/test-bucket/sample_read_signedURL.txt");
        let params = parsed.query_pairs().into_owned().collect::<Vec<_>>();
        let names = params.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["GoogleAccessId", "Expires", "Signature"]);
        assert_eq!(params[0].1, "test-sa@test-project.iam.gserviceaccount.com");

        let signature = BASE64_STANDARD.decode(&params[2].1)?;
        let signature = Signature::try_from(signature.as_slice())?;
        let verifying_key = VerifyingKey::<Sha256>::new(private_key.to_public_key());
        verifying_key.verify(string_to_sign.as_bytes(), &signature)?;

        let mut tampered = string_to_sign.into_bytes();
        tampered[0] ^= 0x01;
        assert!(verifying_key.verify(&tampered, &signature).is_err());
        Ok(())
    }

    #[tokio::test]
    async fn signed_url_error_signing() -> TestResult {
        #[derive(Debug)]
        struct FailSigner;
        #[async_trait::async_trait]
        impl SigningProvider for FailSigner {
            async fn client_email(&self) -> auth::signer::Result<String> {
                Ok("test@example.com".to_string())
            }
            async fn sign(&self, _content: &[u8]) -> auth::signer::Result<Bytes> {
                Err(AuthSigningError::from_msg("test"))
            }
        }
        let signer = Signer::from(FailSigner);
        let err = SignedUrlBuilder::for_object("b", "o")
            .sign_with(&signer)
            .await
            .unwrap_err();
        assert!(err.is_signing(), "{err:?}");
        Ok(())
    }

    #[tokio::test]
    async fn signed_url_error_endpoint() -> TestResult {
        let signer = Signer::from(MockSigner);
        let err = SignedUrlBuilder::for_object("b", "o")
            .with_endpoint("invalid-url")
            .sign_with(&signer)
            .await
            .unwrap_err();
        assert!(err.is_invalid_parameter(), "{err:?}");
        Ok(())
    }

    #[tokio::test]
    async fn signed_url_error_expired() -> TestResult {
        let signer = Signer::from(MockSigner);
        let err = SignedUrlBuilder::for_object("b", "o")
            .with_expires_at(Utc::now().timestamp() - 1)
            .sign_with(&signer)
            .await
            .unwrap_err();
        assert!(err.is_invalid_parameter(), "{err:?}");
        assert!(err.to_string().contains("expiration"), "{err}");
        Ok(())
    }
}
