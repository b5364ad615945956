//! S3-compatible [`ObjectBackend`].
//!
//! The AWS SDK is async while the pipeline is synchronous, so the backend
//! owns a small current-thread tokio runtime and blocks on each request.
//! One backend is shared by every upload; `Runtime::block_on` may be called
//! from several rayon workers at once.

use super::{ObjectBackend, ObjectPage, ObjectSummary, RemoteMirrorError};
use crate::config::RemoteConfig;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use chrono::{DateTime, Utc};
use tokio::runtime::Runtime;
use tracing::debug;

pub struct S3Backend {
    client: Client,
    runtime: Runtime,
    settings: RemoteConfig,
}

impl S3Backend {
    /// Build a client for the bucket described by `settings`.
    ///
    /// No request is made here, so a wrong bucket or bad credentials only
    /// show up on the first operation.
    pub fn from_config(settings: &RemoteConfig) -> Result<Self, RemoteMirrorError> {
        if !settings.is_configured() {
            return Err(RemoteMirrorError::Unavailable(
                "bucket or credentials not configured".into(),
            ));
        }
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| RemoteMirrorError::Unavailable(format!("tokio runtime: {e}")))?;

        let credentials = Credentials::new(
            &settings.access_key_id,
            &settings.secret_access_key,
            None,
            None,
            "pixel-forge",
        );
        let shared_config = runtime.block_on(
            aws_config::defaults(aws_config::BehaviorVersion::latest())
                .region(Region::new(settings.region.clone()))
                .credentials_provider(credentials)
                .load(),
        );

        let mut builder = aws_sdk_s3::config::Builder::from(&shared_config);
        if let Some(endpoint) = settings.endpoint() {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        debug!(bucket = %settings.bucket, region = %settings.region, "S3 client ready");

        Ok(Self {
            client: Client::from_conf(builder.build()),
            runtime,
            settings: settings.clone(),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.settings.bucket
    }
}

fn transport<E>(operation: &'static str, key: &str, err: E) -> RemoteMirrorError
where
    E: std::error::Error,
{
    RemoteMirrorError::Transport {
        operation,
        key: key.to_string(),
        message: DisplayErrorContext(&err).to_string(),
    }
}

fn to_utc(t: &aws_sdk_s3::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(t.secs(), t.subsec_nanos())
}

impl ObjectBackend for S3Backend {
    fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), RemoteMirrorError> {
        let mut request = self
            .client
            .put_object()
            .bucket(&self.settings.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body));
        if self.settings.public_read {
            request = request.acl(ObjectCannedAcl::PublicRead);
        }
        self.runtime
            .block_on(request.send())
            .map_err(|e| transport("PutObject", key, e))?;
        Ok(())
    }

    fn get_object(&self, key: &str) -> Result<Vec<u8>, RemoteMirrorError> {
        self.runtime.block_on(async {
            let response = self
                .client
                .get_object()
                .bucket(&self.settings.bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| transport("GetObject", key, e))?;
            let body = response
                .body
                .collect()
                .await
                .map_err(|e| transport("GetObject", key, e))?;
            Ok(body.into_bytes().to_vec())
        })
    }

    fn delete_object(&self, key: &str) -> Result<(), RemoteMirrorError> {
        let request = self
            .client
            .delete_object()
            .bucket(&self.settings.bucket)
            .key(key);
        self.runtime
            .block_on(request.send())
            .map_err(|e| transport("DeleteObject", key, e))?;
        Ok(())
    }

    fn list_page(&self, continuation: Option<&str>) -> Result<ObjectPage, RemoteMirrorError> {
        let mut request = self.client.list_objects_v2().bucket(&self.settings.bucket);
        if let Some(token) = continuation {
            request = request.continuation_token(token);
        }
        let output = self
            .runtime
            .block_on(request.send())
            .map_err(|e| transport("ListObjectsV2", &self.settings.bucket, e))?;

        let objects = output
            .contents()
            .iter()
            .map(|object| ObjectSummary {
                key: object.key().unwrap_or_default().to_string(),
                size: object.size().unwrap_or(0).max(0) as u64,
                last_modified: object.last_modified().and_then(to_utc),
            })
            .collect();
        let next = if output.is_truncated().unwrap_or(false) {
            output.next_continuation_token().map(str::to_string)
        } else {
            None
        };
        Ok(ObjectPage { objects, next })
    }

    fn public_url(&self, key: &str) -> String {
        self.settings.object_url(key)
    }
}
