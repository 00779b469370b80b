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

use anyhow::bail;
use clap::Parser;
use humantime::parse_duration;
use std::path::PathBuf;
use std::time::Duration;
use storage::config::{
    DEFAULT_BUCKET, DEFAULT_ENDPOINT, DEFAULT_READ_OBJECT, DEFAULT_WRITE_OBJECT, StorageConfig,
};

/// Configuration options for the sample.
#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = super::DESCRIPTION)]
pub struct Args {
    /// The service account key file.
    #[arg(
        long,
        env = "GOOGLE_APPLICATION_CREDENTIALS",
        default_value = "storage_writer.json"
    )]
    pub credentials: PathBuf,

    /// The project used to create the bucket.
    ///
    /// Defaults to the project of the service account.
    #[arg(long, env = "GCS_SAMPLE_PROJECT")]
    pub project: Option<String>,

    /// The Cloud Storage endpoint.
    #[arg(long, env = "GCS_SAMPLE_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// The bucket containing the sample objects.
    #[arg(long, env = "GCS_SAMPLE_BUCKET", default_value = DEFAULT_BUCKET)]
    pub bucket: String,

    /// The object shared through a signed URL.
    #[arg(long, env = "GCS_SAMPLE_READ_OBJECT", default_value = DEFAULT_READ_OBJECT)]
    pub read_object: String,

    /// The object written with a resumable upload.
    #[arg(long, env = "GCS_SAMPLE_WRITE_OBJECT", default_value = DEFAULT_WRITE_OBJECT)]
    pub write_object: String,

    /// How long the signed URL remains valid.
    #[arg(long, value_parser = parse_duration, default_value = "60s")]
    pub expiry: Duration,

    /// Wait this long after printing the signed URL, before starting the
    /// upload.
    #[arg(long, value_parser = parse_duration, default_value = "0s")]
    pub handoff_delay: Duration,

    /// Do not create the bucket and the read object.
    #[arg(long, default_value_t = false)]
    pub skip_provisioning: bool,

    /// Log at the DEBUG level.
    #[arg(long, default_value_t = false)]
    pub verbose: bool,
}

impl Args {
    /// Validates the arguments after parsing.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.expiry.as_secs() == 0 {
            bail!("the signed URL expiry must be at least one second")
        }
        if !(self.endpoint.starts_with("https://") || self.endpoint.starts_with("http://")) {
            bail!("the endpoint must be an http or https URL, got {}", self.endpoint)
        }
        if self.bucket.is_empty() {
            bail!("the bucket name cannot be empty")
        }
        if self.read_object.is_empty() || self.write_object.is_empty() {
            bail!("the object names cannot be empty")
        }
        Ok(())
    }

    pub fn storage_config(&self) -> StorageConfig {
        StorageConfig::default()
            .with_endpoint(&self.endpoint)
            .with_bucket(&self.bucket)
            .with_read_object(&self.read_object)
            .with_write_object(&self.write_object)
            .with_expiry(self.expiry)
    }
}
