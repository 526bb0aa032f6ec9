//! S3-compatible object storage client
//!
//! Works against AWS S3 or compatible services (MinIO by default) using
//! static credentials and, for MinIO, path-style addressing.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use aws_sdk_s3::Client;
use bytes::Bytes;
use futures::StreamExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info};

use super::{ObjectInfo, ObjectStore, StorageError, StoredObject};
use crate::config::StorageConfig;

/// Region that must not be sent as a location constraint
const DEFAULT_REGION: &str = "us-east-1";

/// S3 client bound to a single bucket
#[derive(Clone)]
pub struct S3Client {
    client: Client,
    bucket: String,
    region: String,
}

impl S3Client {
    /// Create a new S3 client
    pub async fn new(config: &StorageConfig) -> Self {
        info!(
            "Initializing S3 client for bucket {} at {}",
            config.bucket, config.endpoint
        );

        let credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "file-service",
        );

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .endpoint_url(&config.endpoint)
            .credentials_provider(credentials)
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.path_style)
            .build();

        Self {
            client: Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
            region: config.region.clone(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn create_bucket(&self) -> Result<(), StorageError> {
        let mut request = self.client.create_bucket().bucket(&self.bucket);
        if self.region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }

        match request.send().await {
            Ok(_) => {
                info!("Bucket created: {}", self.bucket);
                Ok(())
            }
            Err(err)
                if err.as_service_error().is_some_and(|e| {
                    e.is_bucket_already_owned_by_you() || e.is_bucket_already_exists()
                }) =>
            {
                debug!("Bucket {} was created concurrently", self.bucket);
                Ok(())
            }
            Err(err) => {
                error!("Failed to create bucket {}: {}", self.bucket, DisplayErrorContext(&err));
                Err(StorageError::BucketError(describe(&err)))
            }
        }
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn ensure_bucket(&self) -> Result<(), StorageError> {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => {
                debug!("Bucket {} already exists", self.bucket);
                Ok(())
            }
            Err(err)
                if is_missing(&err)
                    || err.as_service_error().is_some_and(|e| e.is_not_found()) =>
            {
                info!("Bucket {} does not exist, creating...", self.bucket);
                self.create_bucket().await
            }
            Err(err) => Err(StorageError::BucketError(describe(&err))),
        }
    }

    async fn put_object(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        debug!("Uploading object to S3: {} ({} bytes)", key, data.len());

        let content_length = data.len() as i64;
        let content_type = (!content_type.is_empty()).then(|| content_type.to_string());

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_length(content_length)
            .set_content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|err| {
                error!("S3 upload failed for {}: {}", key, DisplayErrorContext(&err));
                StorageError::UploadError(describe(&err))
            })?;

        info!("Object uploaded successfully: {}", key);
        Ok(())
    }

    async fn stat_object(&self, key: &str) -> Result<Option<ObjectInfo>, StorageError> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(output) => Ok(Some(ObjectInfo {
                key: key.to_string(),
                size: output.content_length(),
                content_type: output.content_type().map(str::to_string),
            })),
            Err(err)
                if is_missing(&err)
                    || err.as_service_error().is_some_and(|e| e.is_not_found()) =>
            {
                Ok(None)
            }
            Err(err) => Err(StorageError::DownloadError(describe(&err))),
        }
    }

    async fn get_object(&self, key: &str) -> Result<StoredObject, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                if is_missing(&err) || err.as_service_error().is_some_and(|e| e.is_no_such_key()) {
                    StorageError::NotFound(key.to_string())
                } else {
                    StorageError::DownloadError(describe(&err))
                }
            })?;

        let info = ObjectInfo {
            key: key.to_string(),
            size: output.content_length(),
            content_type: output.content_type().map(str::to_string),
        };
        let body = ReaderStream::new(output.body.into_async_read()).boxed();

        Ok(StoredObject { info, body })
    }

    async fn remove_object(&self, key: &str) -> Result<(), StorageError> {
        debug!("Deleting object from S3: {}", key);

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                error!("S3 delete failed for {}: {}", key, DisplayErrorContext(&err));
                StorageError::DeleteError(describe(&err))
            })?;

        info!("Object deleted successfully: {}", key);
        Ok(())
    }
}

/// HEAD responses carry no error body, so a bare 404 is the only signal
fn is_missing<E>(err: &SdkError<E>) -> bool {
    err.raw_response()
        .is_some_and(|response| response.status().as_u16() == 404)
}

fn describe<E>(err: &SdkError<E>) -> String
where
    E: std::error::Error + 'static,
{
    DisplayErrorContext(err).to_string()
}
