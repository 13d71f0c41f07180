use std::path::Path;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use segment_core::domain::ObjectLocation;
use segment_core::error::SegmentError;
use segment_core::ports::{ObjectReader, ObjectUploader, Result};
use tracing::debug;

const CSV_CONTENT_TYPE: &str = "text/csv";

/// Amazon S3 implementation of the object storage ports
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a client from the default AWS provider chain (env, profile, IMDS)
    pub async fn from_env() -> Self {
        let shared_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        Self::from_sdk_config(&shared_config)
    }

    pub fn from_sdk_config(shared_config: &SdkConfig) -> Self {
        Self::new(Client::new(shared_config))
    }
}

#[async_trait]
impl ObjectReader for S3ObjectStore {
    async fn get_object(&self, location: &ObjectLocation) -> Result<Vec<u8>> {
        let read_error = |message: String| SegmentError::StorageRead {
            location: location.to_string(),
            message,
        };

        let object = self
            .client
            .get_object()
            .bucket(&location.bucket)
            .key(&location.key)
            .send()
            .await
            .map_err(|e| read_error(DisplayErrorContext(&e).to_string()))?;

        let body = object
            .body
            .collect()
            .await
            .map_err(|e| read_error(e.to_string()))?
            .into_bytes();

        debug!(%location, bytes = body.len(), "Fetched object");
        Ok(body.to_vec())
    }
}

#[async_trait]
impl ObjectUploader for S3ObjectStore {
    async fn upload_file(&self, path: &Path, location: &ObjectLocation) -> Result<()> {
        let body = ByteStream::from_path(path).await.map_err(|e| {
            SegmentError::local_io(path, std::io::Error::new(std::io::ErrorKind::Other, e))
        })?;

        self.client
            .put_object()
            .bucket(&location.bucket)
            .key(&location.key)
            .content_type(CSV_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| SegmentError::StorageWrite {
                location: location.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        debug!(%location, path = %path.display(), "Uploaded object");
        Ok(())
    }
}
