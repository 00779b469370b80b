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

//! Demonstrates two ways for clients to access Cloud Storage objects.
//!
//! - A [signed URL] grants time-limited read access to an object.
//! - A [resumable upload] session URL lets a client upload an object.

mod args;

use anyhow::Context;
use args::Args;
use auth::credentials::Builder as CredentialsBuilder;
use bytes::Bytes;
use clap::Parser;
use storage::provision::Provisioner;
use storage::signed_url::SignedUrlBuilder;
use storage::upload::{UploadInitiator, UploadSender};

const DESCRIPTION: &str = concat!(
    "This program creates a signed URL to read a Cloud Storage object,",
    " and then uploads a second object using a resumable upload.",
    " The service account key must grant read and write access to the bucket."
);

const READ_OBJECT_CONTENTS: &[u8] = b"sample signed url demo.";
const UPLOAD_PAYLOAD: &str = "This is resumable upload demo.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    args.validate()?;
    enable_tracing(&args)?;
    tracing::info!("Configuration: {args:?}");

    run(&args).await
}

async fn run(args: &Args) -> anyhow::Result<()> {
    let credentials = CredentialsBuilder::new(&args.credentials)
        .build()
        .with_context(|| {
            format!(
                "cannot load the service account key from {}",
                args.credentials.display()
            )
        })?;
    let access_token = credentials.access_token_credentials();
    let config = args.storage_config();

    if !args.skip_provisioning {
        let project = args
            .project
            .clone()
            .unwrap_or_else(|| credentials.project_id().to_string());
        let provisioner = Provisioner::new(&config, access_token.clone());
        provisioner
            .ensure_bucket(&project, &config.bucket)
            .await
            .with_context(|| format!("cannot create bucket {}", config.bucket))?;
        provisioner
            .ensure_object(
                &config.bucket,
                &config.read_object,
                "text/plain",
                Bytes::from_static(READ_OBJECT_CONTENTS),
            )
            .await
            .with_context(|| format!("cannot create object {}", config.read_object))?;
    }

    let signed_url = SignedUrlBuilder::for_read_object(&config)
        .sign_with(&credentials.signer())
        .await
        .context("cannot create the signed URL")?;
    println!("{signed_url}");

    if !args.handoff_delay.is_zero() {
        println!("Sleeping for {} seconds.", args.handoff_delay.as_secs());
        tokio::time::sleep(args.handoff_delay).await;
    }

    let initiated = UploadInitiator::new(&config)
        .initiate(&config.write_object, &access_token)
        .await
        .context("cannot start the resumable upload")?;
    println!("Initiation step response code: {}", initiated.status.as_u16());
    if !initiated.body.is_empty() {
        println!("{}", initiated.body);
    }
    let Some(session_url) = initiated.session_url else {
        anyhow::bail!(
            "the initiation step returned {} without a session URL, skipping the upload",
            initiated.status
        );
    };
    println!("{session_url}");

    let sender = UploadSender::new();
    let response = match sender
        .send(&session_url, Bytes::from_static(UPLOAD_PAYLOAD.as_bytes()))
        .await
    {
        Ok(r) => r,
        Err(e) => {
            match sender.query_status(&session_url).await {
                Ok(status) => tracing::warn!("upload session status: {status:?}"),
                Err(q) => tracing::warn!("cannot query the upload session status: {q}"),
            }
            return Err(e).context("cannot upload the client data");
        }
    };
    println!(
        "Client data upload response code: {}",
        response.status.as_u16()
    );
    println!("{}", response.body);

    Ok(())
}

fn enable_tracing(args: &Args) -> anyhow::Result<()> {
    use tracing_subscriber::fmt::format::FmtSpan;

    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let subscriber = tracing_subscriber::fmt()
        .with_level(true)
        .with_thread_ids(true)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("cannot set the global tracing subscriber")
}
